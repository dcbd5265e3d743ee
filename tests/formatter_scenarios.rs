use hexterm::{decode, normalize, EditState, HexInputFormatter, Validity};

fn type_text(formatter: &HexInputFormatter, text: &str) -> (EditState, Validity) {
    let mut state = EditState::default();
    let mut last = Validity::Intermediate;
    for c in text.chars() {
        let mut candidate = state.with_inserted(c);
        let validity = formatter.validate(&mut candidate);
        if validity != Validity::Invalid {
            state = candidate;
        }
        last = validity;
    }
    (state, last)
}

#[test]
fn normalize_examples() {
    assert_eq!(normalize("012345"), "01 23 45");
    assert_eq!(normalize("1 23"), "01 23");
    assert_eq!(normalize("ab cd e"), "AB CD 0E");
    assert_eq!(normalize("  0a   0b "), "0A 0B");
}

#[test]
fn normalize_is_idempotent_on_acceptable_output() {
    for input in ["012345", "1 23", "ab cd e", "DE AD BE EF", "1 2 3"] {
        let once = normalize(input);
        assert_eq!(normalize(&once), once, "input {input:?}");
        assert!(decode(&once).is_ok(), "input {input:?}");
    }
}

#[test]
fn non_hex_is_rejected() {
    let mut state = EditState::at_end("gg");
    assert_eq!(HexInputFormatter::new().validate(&mut state), Validity::Invalid);
    assert_eq!(state.text, "gg");
}

#[test]
fn typing_a_long_frame_keeps_pairs() {
    let formatter = HexInputFormatter::new();
    let (state, validity) = type_text(&formatter, "48656c6c6f");
    assert_eq!(state.text, "48 65 6C 6C 6F");
    assert_eq!(state.cursor, state.text.chars().count());
    assert_eq!(validity, Validity::Acceptable);

    let (state, validity) = type_text(&formatter, "48656");
    assert_eq!(state.text, "48 65 6");
    assert_eq!(validity, Validity::Intermediate);
}

#[test]
fn stray_characters_are_dropped_while_typing() {
    let (state, _) = type_text(&HexInputFormatter::new(), "01x23");
    assert_eq!(state.text, "01 23");
}

#[test]
fn inserting_after_a_full_byte_starts_a_padded_one() {
    let mut state = EditState::new("01 23", 2).with_inserted('F');
    assert_eq!(HexInputFormatter::new().validate(&mut state), Validity::Acceptable);
    assert_eq!(state.text, "01 0F 23");
    assert_eq!(state.cursor, 5);
}

#[test]
fn byte_limit_caps_typing() {
    let formatter = HexInputFormatter::with_max_bytes(2);
    let (state, last) = type_text(&formatter, "aabbcc");
    assert_eq!(state.text, "AA BB");
    assert_eq!(last, Validity::Invalid);
}
