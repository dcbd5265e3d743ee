//! Hex input formatter.
//!
//! Keeps a free-form text field byte-aligned while the user types: separators are
//! inserted between byte pairs, stray single digits are zero-padded and hex digits
//! are uppercased. The interactive pass (`HexInputFormatter::validate`) also moves
//! the cursor so typing continues naturally; `normalize` is the one-shot variant
//! used when the field loses focus and before transmission.
//!
//! `,` is accepted as a byte separator and becomes a space.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Classification returned for every edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Validity {
    /// The edit must be rejected and the previous text kept.
    Invalid,
    /// Accepted provisionally: empty, or a byte is still being typed.
    Intermediate,
    /// Every token is a complete byte.
    Acceptable,
}

/// Text of an input field together with the cursor offset (in characters).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditState {
    pub text: String,
    pub cursor: usize,
}

impl EditState {
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        Self {
            text: text.into(),
            cursor,
        }
    }

    /// Cursor placed after the last character.
    pub fn at_end(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    /// Candidate state after typing `c` at the cursor.
    pub fn with_inserted(&self, c: char) -> Self {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cursor = self.cursor.min(chars.len());
        chars.insert(cursor, c);
        Self {
            text: chars.into_iter().collect(),
            cursor: cursor + 1,
        }
    }

    /// Candidate state after deleting the character before the cursor.
    pub fn with_backspace(&self) -> Self {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cursor = self.cursor.min(chars.len());
        if cursor == 0 {
            return self.clone();
        }
        chars.remove(cursor - 1);
        Self {
            text: chars.into_iter().collect(),
            cursor: cursor - 1,
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexInputFormatter {
    max_bytes: Option<usize>,
}

impl HexInputFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject edits that would hold more than `max_bytes` bytes.
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes: Some(max_bytes),
        }
    }

    /// Reformat `state` in place after an edit and classify the result.
    ///
    /// On `Invalid` the state is left untouched so the caller can restore the
    /// previous text.
    pub fn validate(&self, state: &mut EditState) -> Validity {
        if state.text.chars().all(is_separator) {
            return Validity::Intermediate;
        }
        if state.text.chars().any(|c| !c.is_ascii_hexdigit() && !is_separator(c)) {
            return Validity::Invalid;
        }

        let mut buffer = Buffer::new(&state.text, state.cursor);
        buffer.collapse_spaces();
        buffer.split_triples();
        buffer.pad_isolated();
        buffer.tidy();

        let validity = classify(&buffer.chars, self.max_bytes);
        if validity != Validity::Invalid {
            state.text = buffer.chars.iter().collect();
            state.cursor = buffer.cursor;
        }
        validity
    }
}

/// Normalize field content once, without cursor tracking.
///
/// `"012345"` becomes `"01 23 45"`, `"1 23"` becomes `"01 23"` and a trailing
/// lone digit is padded (`"ab cd e"` becomes `"AB CD 0E"`). A `;` ends the
/// payload. Characters that are not hex digits are kept so decoding can report
/// them.
pub fn normalize(text: &str) -> String {
    let text = text.split(';').next().unwrap_or_default();
    let mut buffer = Buffer::new(text, 0);
    buffer.collapse_spaces();
    buffer.split_triples();
    buffer.pad_isolated();
    buffer.pad_trailing();
    buffer.tidy();
    buffer.chars.into_iter().collect()
}

fn is_space(c: char) -> bool {
    c.is_ascii_whitespace()
}

fn is_separator(c: char) -> bool {
    is_space(c) || c == ','
}

fn classify(chars: &[char], max_bytes: Option<usize>) -> Validity {
    let text: String = chars.iter().collect();
    let tokens: Vec<&str> = text.split(' ').filter(|t| !t.is_empty()).collect();

    if let Some(max) = max_bytes {
        if tokens.len() > max {
            return Validity::Invalid;
        }
    }

    match tokens.last() {
        None => Validity::Intermediate,
        Some(last) if last.len() == 1 => Validity::Intermediate,
        Some(_) => Validity::Acceptable,
    }
}

struct Buffer {
    chars: Vec<char>,
    cursor: usize,
}

impl Buffer {
    fn new(text: &str, cursor: usize) -> Self {
        let chars: Vec<char> = text
            .chars()
            .map(|c| if c == ',' { ' ' } else { c })
            .collect();
        let cursor = cursor.min(chars.len());
        Self { chars, cursor }
    }

    /// Turn every whitespace run into a single space.
    fn collapse_spaces(&mut self) {
        let mut out = Vec::with_capacity(self.chars.len());
        let mut moved_to = None;
        let mut shift = 0;
        let mut i = 0;

        while i < self.chars.len() {
            if !is_space(self.chars[i]) {
                out.push(self.chars[i]);
                i += 1;
                continue;
            }

            let start = i;
            while i < self.chars.len() && is_space(self.chars[i]) {
                i += 1;
            }
            out.push(' ');

            if self.cursor > start && self.cursor < i {
                moved_to = Some(out.len());
            } else if self.cursor >= i {
                shift += i - start - 1;
            }
        }

        self.cursor = moved_to.unwrap_or(self.cursor - shift);
        self.chars = out;
    }

    /// Break every run of three digits by a space before the third one.
    fn split_triples(&mut self) {
        while let Some(start) = self
            .chars
            .windows(3)
            .position(|w| w.iter().all(char::is_ascii_hexdigit))
        {
            let at = start + 2;
            self.chars.insert(at, ' ');
            // Between the first and second digit the cursor stays put; from the
            // insertion point on it moves past the new separator.
            if self.cursor >= at {
                self.cursor += 1;
            }
        }
    }

    /// Zero-pad single digits that sit between separators.
    fn pad_isolated(&mut self) {
        while let Some(at) = (0..self.chars.len()).find(|&i| self.is_isolated_digit(i)) {
            self.chars.insert(at, '0');
            if self.cursor > at {
                self.cursor += 1;
            }
        }
    }

    fn is_isolated_digit(&self, i: usize) -> bool {
        self.chars[i].is_ascii_hexdigit()
            && (i == 0 || self.chars[i - 1] == ' ')
            && self.chars.get(i + 1).is_some_and(|&c| is_space(c))
    }

    fn pad_trailing(&mut self) {
        let len = self.chars.len();
        if len >= 2 && self.chars[len - 1].is_ascii_hexdigit() && self.chars[len - 2] == ' ' {
            self.chars.insert(len - 1, '0');
            if self.cursor >= len - 1 {
                self.cursor += 1;
            }
        }
    }

    /// Trim, collapse and uppercase.
    fn tidy(&mut self) {
        let leading = self.chars.iter().take_while(|&&c| is_space(c)).count();
        self.chars.drain(..leading);
        self.cursor = self.cursor.saturating_sub(leading);

        while self.chars.last().is_some_and(|&c| is_space(c)) {
            self.chars.pop();
        }

        self.collapse_spaces();
        for c in self.chars.iter_mut() {
            if c.is_ascii_hexdigit() {
                *c = c.to_ascii_uppercase();
            }
        }
        self.cursor = self.cursor.min(self.chars.len());
    }
}
