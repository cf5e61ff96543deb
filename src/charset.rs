//! Character set decoding and encoding.
//!
//! Documents are parsed and written as character streams; this module maps
//! those characters from and to bytes. Decoding is total: undecodable input
//! degrades to replacement characters instead of failing, because parsing a
//! properties document never fails outright.

/// The character sets supported for reading and writing documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Charset {
    /// UTF-8 (the default).
    #[default]
    Utf8,
    /// UTF-16, big endian, no byte order mark.
    Utf16Be,
    /// UTF-16, little endian, no byte order mark.
    Utf16Le,
    /// ISO-8859-1 (Latin-1), the traditional properties file encoding.
    Iso8859_1,
    /// US-ASCII.
    UsAscii,
}

impl Charset {
    /// Whether this charset can represent arbitrary unicode characters.
    ///
    /// The writer uses this to decide between emitting characters directly
    /// and falling back to `\uXXXX` escape sequences.
    pub fn is_unicode(self) -> bool {
        matches!(self, Charset::Utf8 | Charset::Utf16Be | Charset::Utf16Le)
    }

    /// Decode raw bytes into text. Never fails; malformed input yields
    /// replacement characters.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
            Charset::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Charset::Iso8859_1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Charset::UsAscii => bytes
                .iter()
                .map(|&b| {
                    if b <= 0x7f {
                        char::from(b)
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect(),
        }
    }

    /// Encode text into raw bytes. Characters the charset cannot represent
    /// become `?`. The writer's escaping rules ensure this does not happen
    /// for text produced by this crate.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Utf16Be => text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect(),
            Charset::Utf16Le => text
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect(),
            Charset::Iso8859_1 => text
                .chars()
                .map(|c| if u32::from(c) <= 0xff { c as u8 } else { b'?' })
                .collect(),
            Charset::UsAscii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

fn decode_utf16(bytes: &[u8], read_unit: fn([u8; 2]) -> u16) -> String {
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| read_unit([pair[0], pair[1]]))
        .collect();
    if bytes.len() % 2 != 0 {
        // a dangling byte cannot form a unit
        units.push(char::REPLACEMENT_CHARACTER as u16);
    }

    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
