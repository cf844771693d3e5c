//! Chunk text decoding with ordered encoding fallback.
//!
//! A chunk is only scanned for tokens after it decodes under one of the
//! configured encodings; a chunk that fails every encoding is treated as
//! binary and skipped. Tokens themselves are runs of ASCII letters, and all
//! supported encodings map the ASCII range identically, so the tokenizer can
//! work on the raw chunk bytes with exact file offsets once a chunk has
//! passed the decode gate.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Supported text encodings, tried in the order configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Utf8,
    Cp437,
    Latin1,
}

impl TextEncoding {
    /// Decode a chunk under this encoding. Returns `None` when the bytes are
    /// not valid for the encoding (only possible for UTF-8; the single-byte
    /// encodings are total).
    pub fn decode<'a>(&self, data: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(data).ok().map(Cow::Borrowed),
            TextEncoding::Cp437 => Some(Cow::Owned(
                data.iter().map(|&b| cp437_char(b)).collect::<String>(),
            )),
            TextEncoding::Latin1 => Some(Cow::Owned(
                data.iter().map(|&b| b as char).collect::<String>(),
            )),
        }
    }
}

/// Try each encoding in order; the first successful decode wins.
pub fn decode_any<'a>(data: &'a [u8], encodings: &[TextEncoding]) -> Option<Cow<'a, str>> {
    encodings.iter().find_map(|enc| enc.decode(data))
}

/// CP437 high half (0x80..=0xFF). The low half is ASCII.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

#[inline]
fn cp437_char(b: u8) -> char {
    if b < 0x80 {
        b as char
    } else {
        CP437_HIGH[(b - 0x80) as usize]
    }
}
