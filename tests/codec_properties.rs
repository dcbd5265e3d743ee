// Laws of the hex codec, checked over a deterministic spread of inputs.

use hexterm::{decode, encode, DecodeError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn samples() -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(0x4845_5854_4552_4D00_u64);

    let mut out = vec![Vec::new(), (0..=255).collect()];
    for len in [1usize, 2, 3, 7, 64, 513] {
        out.push((0..len).map(|_| rng.random::<u8>()).collect());
    }
    out
}

#[test]
fn decode_inverts_encode() {
    for bytes in samples() {
        assert_eq!(decode(&encode(&bytes)).ok(), Some(bytes));
    }
}

#[test]
fn encoded_text_is_well_formed() {
    for bytes in samples() {
        let text = encode(&bytes);
        assert!(!text.starts_with(' ') && !text.ends_with(' '));
        assert!(!text.contains("  "));
        for token in text.split(' ').filter(|t| !t.is_empty()) {
            assert_eq!(token.len(), 2);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        }
    }
}

#[test]
fn encode_normalizes_well_formed_text() {
    assert_eq!(decode("0a  1B 2c").map(|b| encode(&b)).ok(), Some("0A 1B 2C".to_string()));
    assert_eq!(decode("DEADBEEF").map(|b| encode(&b)).ok(), Some("DE AD BE EF".to_string()));
}

#[test]
fn decode_edge_cases() {
    assert_eq!(decode(""), Ok(Vec::new()));
    assert_eq!(decode("   "), Ok(Vec::new()));
    assert!(matches!(decode("1"), Err(DecodeError::OddLength { .. })));
    assert!(matches!(decode("1G"), Err(DecodeError::InvalidDigit { character: 'G', .. })));
    assert_eq!(decode("48 65 6C 6C 6F"), Ok(b"Hello".to_vec()));
}
