// Copyright (c) 2023 Harry [Majored] [hello@majored.pw]
// MIT License (https://github.com/Majored/rs-async-zip/blob/main/LICENSE)

use crate::error::{Result, ZipError};

use std::borrow::Cow;

/// A string encoding supported by this crate.
#[derive(Debug, Clone, Copy)]
pub enum StringEncoding {
    Utf8,
    Raw,
}

/// A string wrapper for handling different encodings.
#[derive(Debug, Clone)]
pub struct ZipString {
    encoding: StringEncoding,
    raw: Vec<u8>,
    alternative: Option<Vec<u8>>,
}

impl ZipString {
    /// Constructs a new encoded string from its raw bytes and its encoding type.
    ///
    /// # Note
    /// If the provided encoding is [`StringEncoding::Utf8`] but the raw bytes are not valid UTF-8 (ie. a call to
    /// `std::str::from_utf8()` fails), the encoding is defaulted back to [`StringEncoding::Raw`].
    pub fn new(raw: Vec<u8>, mut encoding: StringEncoding) -> Self {
        if let StringEncoding::Utf8 = encoding {
            if std::str::from_utf8(&raw).is_err() {
                encoding = StringEncoding::Raw;
            }
        }

        Self { encoding, raw, alternative: None }
    }

    /// Constructs a new UTF-8 string with an alternative legacy representation.
    ///
    /// Used when a Unicode extra field supersedes the bytes stored in the header itself.
    pub fn new_with_alternative(string: String, alternative: Vec<u8>) -> Self {
        Self { encoding: StringEncoding::Utf8, raw: string.into_bytes(), alternative: Some(alternative) }
    }

    /// Returns the raw bytes for this string.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the encoding type for this string.
    pub fn encoding(&self) -> StringEncoding {
        self.encoding
    }

    /// Returns the alternative bytes (in the archive's legacy encoding) for this string.
    pub fn alternative(&self) -> Option<&[u8]> {
        self.alternative.as_deref()
    }

    /// Returns the raw bytes converted into a string slice.
    ///
    /// # Note
    /// A call to this method will only succeed if the encoding type is [`StringEncoding::Utf8`].
    pub fn as_str(&self) -> Result<&str> {
        if !matches!(self.encoding, StringEncoding::Utf8) {
            return Err(ZipError::StringNotUtf8);
        }

        // SAFETY:
        // "The bytes passed in must be valid UTF-8.'
        //
        // This function will error if self.encoding is not StringEncoding::Utf8.
        //
        // self.encoding is only ever StringEncoding::Utf8 if this variant was provided to the constructor AND the
        // call to `std::str::from_utf8()` within the constructor succeeded. Mutable access to the inner vector is
        // never given and no method implemented on this type mutates the inner vector.

        Ok(unsafe { std::str::from_utf8_unchecked(&self.raw) })
    }

    /// Returns the raw bytes converted to an owned string.
    ///
    /// # Note
    /// A call to this method will only succeed if the encoding type is [`StringEncoding::Utf8`].
    pub fn into_string(self) -> Result<String> {
        if !matches!(self.encoding, StringEncoding::Utf8) {
            return Err(ZipError::StringNotUtf8);
        }

        // SAFETY: See above.
        Ok(unsafe { String::from_utf8_unchecked(self.raw) })
    }

    /// Returns this string decoded into UTF-8.
    ///
    /// Raw bytes are interpreted as CP437, the OEM code page mandated for names and comments when the UTF-8 general
    /// purpose flag is clear. CP437 maps every byte to a character, so this conversion cannot fail.
    pub fn decoded(&self) -> Cow<'_, str> {
        match self.encoding {
            // SAFETY: See above.
            StringEncoding::Utf8 => Cow::Borrowed(unsafe { std::str::from_utf8_unchecked(&self.raw) }),
            StringEncoding::Raw => Cow::Owned(self.raw.iter().copied().map(cp437_to_char).collect()),
        }
    }
}

impl From<String> for ZipString {
    fn from(value: String) -> Self {
        Self { encoding: StringEncoding::Utf8, raw: value.into_bytes(), alternative: None }
    }
}

impl From<&str> for ZipString {
    fn from(value: &str) -> Self {
        Self { encoding: StringEncoding::Utf8, raw: value.as_bytes().to_vec(), alternative: None }
    }
}

/// The upper half of CP437, indexed by `byte - 0x80`.
#[rustfmt::skip]
const CP437_UPPER: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

fn cp437_to_char(byte: u8) -> char {
    if byte < 0x80 {
        byte as char
    } else {
        CP437_UPPER[(byte - 0x80) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_round_trip() {
        let string = ZipString::new("útf-8 ñame".as_bytes().to_vec(), StringEncoding::Utf8);
        assert!(matches!(string.encoding(), StringEncoding::Utf8));
        assert_eq!(string.as_str().unwrap(), "útf-8 ñame");
    }

    #[test]
    fn invalid_utf8_falls_back_to_raw() {
        let string = ZipString::new(vec![0x66, 0xff, 0x6f], StringEncoding::Utf8);
        assert!(matches!(string.encoding(), StringEncoding::Raw));
        assert!(string.as_str().is_err());
    }

    #[test]
    fn cp437_decoding() {
        // "sübdir/" in CP437.
        let string = ZipString::new(vec![0x73, 0x81, 0x62, 0x64, 0x69, 0x72, 0x2f], StringEncoding::Raw);
        assert_eq!(string.decoded(), "sübdir/");
    }
}
