/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Charset {
    #[default]
    Utf8,
    Ascii,
    Latin1,
    Utf16Le,
    Utf16Be,
}

impl Charset {
    /// Resolve a charset label, unknown labels fall back to UTF-8
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "us-ascii" | "ascii" => Charset::Ascii,
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => Charset::Latin1,
            "utf-16" | "utf-16le" | "utf16" => Charset::Utf16Le,
            "utf-16be" => Charset::Utf16Be,
            _ => Charset::Utf8,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Ascii => "us-ascii",
            Charset::Latin1 => "iso-8859-1",
            Charset::Utf16Le => "utf-16le",
            Charset::Utf16Be => "utf-16be",
        }
    }

    /// Decode bytes to text, invalid sequences are replaced by U+FFFD
    pub fn decode<'a>(&self, data: &'a [u8]) -> Cow<'a, str> {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(data),
            Charset::Ascii => {
                if data.is_ascii() {
                    String::from_utf8_lossy(data)
                } else {
                    Cow::Owned(
                        data.iter()
                            .map(|b| if b.is_ascii() { *b as char } else { '\u{FFFD}' })
                            .collect(),
                    )
                }
            }
            Charset::Latin1 => Cow::Owned(data.iter().map(|b| *b as char).collect()),
            Charset::Utf16Le => {
                let units: Vec<u16> = data
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                Cow::Owned(String::from_utf16_lossy(&units))
            }
            Charset::Utf16Be => {
                let units: Vec<u16> = data
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                Cow::Owned(String::from_utf16_lossy(&units))
            }
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label() {
        assert_eq!(Charset::from_label("UTF-8"), Charset::Utf8);
        assert_eq!(Charset::from_label("ISO-8859-1"), Charset::Latin1);
        assert_eq!(Charset::from_label("utf-16BE"), Charset::Utf16Be);
        assert_eq!(Charset::from_label("x-unknown"), Charset::Utf8);
    }

    #[test]
    fn decode() {
        assert_eq!(Charset::Latin1.decode(b"caf\xe9"), "café");
        assert_eq!(Charset::Utf8.decode("café".as_bytes()), "café");
        assert_eq!(Charset::Ascii.decode(b"a\xffb"), "a\u{FFFD}b");
        assert_eq!(Charset::Utf16Le.decode(&[0x68, 0x00, 0x69, 0x00]), "hi");
        assert_eq!(Charset::Utf16Be.decode(&[0x00, 0x68, 0x00, 0x69]), "hi");
    }
}
