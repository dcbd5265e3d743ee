//! Byte ⇄ hex-text conversion shared by the receive display and the transmit path.
//!
//! Hex text is rendered as uppercase digit pairs separated by single spaces
//! (`"01 23 45"`). Decoding is tolerant of spacing but strict about digits.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// Which codec path a direction (send or receive) uses.
#[derive(
    EnumIter, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TransmitMode {
    #[default]
    #[display("ASCII")]
    Ascii,
    #[display("HEX")]
    Hex,
}

impl TransmitMode {
    pub fn toggled(self) -> Self {
        match self {
            TransmitMode::Ascii => TransmitMode::Hex,
            TransmitMode::Hex => TransmitMode::Ascii,
        }
    }
}

/// Errors produced while turning hex text back into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum DecodeError {
    #[display("hex text has an odd number of digits ({digits})")]
    OddLength { digits: usize },
    #[display("'{character}' at position {position} is not a hex digit")]
    InvalidDigit { character: char, position: usize },
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Render bytes as space-separated uppercase hex pairs.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().saturating_mul(3));
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
        out.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
    }
    out
}

/// Parse hex text into bytes. Spaces are ignored; every other character must be
/// a hex digit and the digit count must be even.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let mut nibbles = Vec::with_capacity(text.len());
    for (position, character) in text.chars().enumerate() {
        if character == ' ' {
            continue;
        }
        match character.to_digit(16) {
            Some(value) => nibbles.push(value as u8),
            None => {
                return Err(DecodeError::InvalidDigit {
                    character,
                    position,
                })
            }
        }
    }

    if nibbles.len() % 2 != 0 {
        return Err(DecodeError::OddLength {
            digits: nibbles.len(),
        });
    }

    Ok(nibbles
        .chunks_exact(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect())
}

/// Render bytes for display in the given mode. ASCII mode is a lossy UTF-8 passthrough.
pub fn render(bytes: &[u8], mode: TransmitMode) -> String {
    match mode {
        TransmitMode::Ascii => String::from_utf8_lossy(bytes).into_owned(),
        TransmitMode::Hex => encode(bytes),
    }
}
