//! Atomic field codecs that frame bodies are assembled from.
//!
//! A frame body is a fixed sequence of [`FieldSpec`]s. Each field knows how to
//! read itself from a [`ByteCursor`] and how to serialise a [`FieldValue`];
//! its size is always measured by serialising, never stored.

use std::fmt;

use crate::common::error::Result;
use crate::id3::cursor::ByteCursor;
use crate::id3::specs::{self, Encoding};

/// Wire representation of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// One byte selecting the encoding of the text fields that follow
    TextEncoding,
    /// ISO-639-2 code, three Latin-1 bytes
    Language,
    /// Exactly `len` Latin-1 bytes, padded with `pad` on write
    FixedString { len: usize, pad: u8 },
    Latin1NullTerminated,
    Latin1Rest,
    /// Text in the frame's encoding, up to its terminator
    TextNullTerminated,
    /// Text in the frame's encoding, up to the end of the frame
    TextRest,
    /// Big-endian integer of `n` bytes
    NumberFixed(usize),
    /// Big-endian integer filling the rest of the frame, written with at least `min` bytes
    NumberVariable { min: usize },
    /// Integer spread over `n` bytes of 7 significant bits each
    Synchsafe(usize),
    BooleanByte,
    BytesRest,
    /// Exactly `n` raw bytes
    BytesSized(usize),
}

/// A named field in a frame body layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec { name, kind }
    }
}

/// Current value of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(u64),
    Bytes(Vec<u8>),
    Bool(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<u64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{:?}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Bytes(b) => write!(f, "[{} bytes]", b.len()),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

fn decode_latin1(data: &[u8]) -> String {
    specs::decode_text(data, Encoding::Latin1)
}

fn encode_latin1(text: &str) -> Vec<u8> {
    specs::encode_text(text, Encoding::Latin1)
}

/// Drop trailing terminators so "text\0" and "text" decode alike.
fn strip_terminators(mut data: &[u8], encoding: Encoding) -> &[u8] {
    let unit = encoding.terminator_len();
    while data.len() >= unit && data[data.len() - unit..].iter().all(|&b| b == 0) {
        if unit == 2 && data.len() % 2 != 0 {
            break;
        }
        data = &data[..data.len() - unit];
    }
    data
}

impl FieldKind {
    /// Value of a freshly created field.
    pub fn default_value(&self) -> FieldValue {
        match *self {
            FieldKind::TextEncoding => FieldValue::Number(Encoding::Latin1 as u64),
            FieldKind::Language => FieldValue::Text("eng".to_string()),
            FieldKind::FixedString { .. }
            | FieldKind::Latin1NullTerminated
            | FieldKind::Latin1Rest
            | FieldKind::TextNullTerminated
            | FieldKind::TextRest => FieldValue::Text(String::new()),
            FieldKind::NumberFixed(_)
            | FieldKind::NumberVariable { .. }
            | FieldKind::Synchsafe(_) => FieldValue::Number(0),
            FieldKind::BooleanByte => FieldValue::Bool(false),
            FieldKind::BytesRest => FieldValue::Bytes(Vec::new()),
            FieldKind::BytesSized(n) => FieldValue::Bytes(vec![0; n]),
        }
    }

    /// Whether `value` has the right shape for this field.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self.default_value(), value),
            (FieldValue::Text(_), FieldValue::Text(_))
                | (FieldValue::Number(_), FieldValue::Number(_))
                | (FieldValue::Bytes(_), FieldValue::Bytes(_))
                | (FieldValue::Bool(_), FieldValue::Bool(_))
        )
    }

    /// Text fields whose bytes follow the frame's encoding byte.
    pub fn is_encoded_text(&self) -> bool {
        matches!(self, FieldKind::TextNullTerminated | FieldKind::TextRest)
    }

    /// Largest integer the field can hold, if bounded.
    pub fn max_number(&self) -> Option<u64> {
        match *self {
            FieldKind::TextEncoding => Some(u8::MAX as u64),
            FieldKind::NumberFixed(n) if n < 8 => Some((1u64 << (8 * n)) - 1),
            FieldKind::Synchsafe(n) if n < 9 => Some((1u64 << (7 * n)) - 1),
            _ => None,
        }
    }

    /// Read the field at the cursor position.
    pub fn read(&self, cursor: &mut ByteCursor<'_>, encoding: Encoding) -> Result<FieldValue> {
        let value = match *self {
            FieldKind::TextEncoding => FieldValue::Number(cursor.read_u8()? as u64),
            FieldKind::Language => {
                let raw = cursor.read_fixed(3)?;
                FieldValue::Text(decode_latin1(strip_terminators(raw, Encoding::Latin1)))
            }
            FieldKind::FixedString { len, pad } => {
                let raw = cursor.read_fixed(len)?;
                let end = raw
                    .iter()
                    .rposition(|&b| b != 0 && b != pad && b != b' ')
                    .map_or(0, |i| i + 1);
                FieldValue::Text(decode_latin1(&raw[..end]))
            }
            FieldKind::Latin1NullTerminated => {
                FieldValue::Text(decode_latin1(read_terminated(cursor, Encoding::Latin1)?))
            }
            FieldKind::Latin1Rest => {
                let raw = cursor.read_rest()?;
                FieldValue::Text(decode_latin1(strip_terminators(raw, Encoding::Latin1)))
            }
            FieldKind::TextNullTerminated => {
                FieldValue::Text(specs::decode_text(read_terminated(cursor, encoding)?, encoding))
            }
            FieldKind::TextRest => {
                let raw = cursor.read_rest()?;
                FieldValue::Text(specs::decode_text(strip_terminators(raw, encoding), encoding))
            }
            FieldKind::NumberFixed(n) => FieldValue::Number(cursor.read_uint(n)?),
            FieldKind::NumberVariable { .. } => {
                let raw = cursor.read_rest()?;
                if raw.len() > 8 {
                    log::warn!("{}-byte counter does not fit 64 bits, keeping the low bytes", raw.len());
                }
                let tail = &raw[raw.len().saturating_sub(8)..];
                FieldValue::Number(tail.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
            }
            FieldKind::Synchsafe(n) => {
                let raw = cursor.read_fixed(n)?;
                FieldValue::Number(raw.iter().fold(0u64, |acc, &b| (acc << 7) | (b & 0x7F) as u64))
            }
            FieldKind::BooleanByte => FieldValue::Bool(cursor.read_u8()? != 0),
            FieldKind::BytesRest => FieldValue::Bytes(cursor.read_rest()?.to_vec()),
            FieldKind::BytesSized(n) => FieldValue::Bytes(cursor.read_sized(n)?.to_vec()),
        };
        Ok(value)
    }

    /// Serialise `value` onto `out`. The field pads or cuts its own output.
    pub fn write(&self, value: &FieldValue, encoding: Encoding, out: &mut Vec<u8>) {
        let text = value.as_text().unwrap_or_default();
        let number = value.as_number().unwrap_or_default();

        match *self {
            FieldKind::TextEncoding => out.push(number as u8),
            FieldKind::Language => {
                let mut lang = encode_latin1(text);
                lang.resize(3, b' ');
                out.extend_from_slice(&lang);
            }
            FieldKind::FixedString { len, pad } => {
                let mut bytes = encode_latin1(text);
                bytes.resize(len, pad);
                out.extend_from_slice(&bytes);
            }
            FieldKind::Latin1NullTerminated => {
                out.extend_from_slice(&encode_latin1(text));
                out.push(0);
            }
            FieldKind::Latin1Rest => out.extend_from_slice(&encode_latin1(text)),
            FieldKind::TextNullTerminated => {
                out.extend_from_slice(&specs::encode_text(text, encoding));
                out.extend(std::iter::repeat(0u8).take(encoding.terminator_len()));
            }
            FieldKind::TextRest => out.extend_from_slice(&specs::encode_text(text, encoding)),
            FieldKind::NumberFixed(n) => {
                let bytes = number.to_be_bytes();
                let width = n.min(8);
                out.extend(std::iter::repeat(0u8).take(n - width));
                out.extend_from_slice(&bytes[8 - width..]);
            }
            FieldKind::NumberVariable { min } => {
                let bytes = number.to_be_bytes();
                let significant = 8 - (number.leading_zeros() as usize / 8);
                let width = significant.max(min);
                out.extend(std::iter::repeat(0u8).take(width.saturating_sub(8)));
                out.extend_from_slice(&bytes[8 - width.min(8)..]);
            }
            FieldKind::Synchsafe(n) => {
                for i in (0..n).rev() {
                    let shift = 7 * i;
                    let byte = if shift >= 64 { 0 } else { (number >> shift) & 0x7F };
                    out.push(byte as u8);
                }
            }
            FieldKind::BooleanByte => out.push(value.as_bool().unwrap_or_default() as u8),
            FieldKind::BytesRest => out.extend_from_slice(value.as_bytes().unwrap_or_default()),
            FieldKind::BytesSized(n) => {
                let mut bytes = value.as_bytes().unwrap_or_default().to_vec();
                bytes.resize(n, 0);
                out.extend_from_slice(&bytes);
            }
        }
    }

    /// Bytes `value` occupies once written.
    pub fn size(&self, value: &FieldValue, encoding: Encoding) -> usize {
        let mut buf = Vec::new();
        self.write(value, encoding, &mut buf);
        buf.len()
    }
}

fn read_terminated<'a>(cursor: &mut ByteCursor<'a>, encoding: Encoding) -> Result<&'a [u8]> {
    let (bytes, _, terminated) = cursor.read_null_terminated(encoding)?;
    if !terminated {
        log::warn!(
            "No terminator before the end of the frame, using the remaining {} bytes",
            bytes.len()
        );
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(kind: FieldKind, data: &[u8], encoding: Encoding) -> (FieldValue, usize) {
        let mut cursor = ByteCursor::new(data, data.len());
        let value = kind.read(&mut cursor, encoding).unwrap();
        (value, cursor.position())
    }

    #[test]
    fn fixed_string_trims_and_pads() {
        let kind = FieldKind::FixedString { len: 5, pad: b' ' };
        let (value, consumed) = read_all(kind, b"ab \0\0", Encoding::Latin1);
        assert_eq!(value, FieldValue::Text("ab".into()));
        assert_eq!(consumed, 5);

        let mut out = Vec::new();
        kind.write(&FieldValue::Text("abcdefg".into()), Encoding::Latin1, &mut out);
        assert_eq!(out, b"abcde");
        assert_eq!(kind.size(&FieldValue::Text("x".into()), Encoding::Latin1), 5);
    }

    #[test]
    fn null_terminated_text_size() {
        let kind = FieldKind::TextNullTerminated;
        let value = FieldValue::Text("desc".into());
        assert_eq!(kind.size(&value, Encoding::Latin1), 5);
        // BOM + 4 code units + 2-byte terminator
        assert_eq!(kind.size(&value, Encoding::Utf16), 12);

        let mut out = Vec::new();
        kind.write(&value, Encoding::Utf16, &mut out);
        out.extend_from_slice(b"tail");
        let mut cursor = ByteCursor::new(&out, out.len());
        assert_eq!(kind.read(&mut cursor, Encoding::Utf16).unwrap(), value);
        assert_eq!(cursor.position(), 12);
    }

    #[test_log::test]
    fn missing_terminator_falls_back_to_rest() {
        let (value, consumed) = read_all(FieldKind::Latin1NullTerminated, b"owner", Encoding::Latin1);
        assert_eq!(value, FieldValue::Text("owner".into()));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn text_rest_drops_trailing_terminator() {
        let (value, _) = read_all(FieldKind::TextRest, b"Title\0", Encoding::Latin1);
        assert_eq!(value, FieldValue::Text("Title".into()));
        let (value, _) = read_all(FieldKind::TextRest, b"A\0B", Encoding::Latin1);
        assert_eq!(value, FieldValue::Text("A\0B".into()));
    }

    #[test]
    fn numbers() {
        let (value, _) = read_all(FieldKind::NumberFixed(3), &[0x01, 0x00, 0x00], Encoding::Latin1);
        assert_eq!(value, FieldValue::Number(0x10000));

        let mut out = Vec::new();
        FieldKind::NumberVariable { min: 4 }.write(&FieldValue::Number(300), Encoding::Latin1, &mut out);
        assert_eq!(out, vec![0, 0, 1, 44]);

        let mut out = Vec::new();
        FieldKind::NumberVariable { min: 4 }.write(
            &FieldValue::Number(0x01_0000_0000),
            Encoding::Latin1,
            &mut out,
        );
        assert_eq!(out, vec![1, 0, 0, 0, 0]);

        let (value, _) = read_all(FieldKind::NumberVariable { min: 4 }, &[], Encoding::Latin1);
        assert_eq!(value, FieldValue::Number(0));
    }

    #[test]
    fn synchsafe_is_independent_of_plain() {
        let data = [0x00, 0x00, 0x02, 0x01];
        let (safe, _) = read_all(FieldKind::Synchsafe(4), &data, Encoding::Latin1);
        let (plain, _) = read_all(FieldKind::NumberFixed(4), &data, Encoding::Latin1);
        assert_eq!(safe, FieldValue::Number(257));
        assert_eq!(plain, FieldValue::Number(513));

        let mut out = Vec::new();
        FieldKind::Synchsafe(4).write(&FieldValue::Number(257), Encoding::Latin1, &mut out);
        assert_eq!(out, data);
    }

    #[test]
    fn overrun_is_bounds_error() {
        let mut cursor = ByteCursor::new(&[1, 2], 2);
        let err = FieldKind::NumberFixed(4)
            .read(&mut cursor, Encoding::Latin1)
            .unwrap_err();
        assert!(err.is_bounds_error());
    }

    #[test]
    fn value_shapes() {
        assert!(FieldKind::TextRest.accepts(&FieldValue::Text("x".into())));
        assert!(!FieldKind::TextRest.accepts(&FieldValue::Number(1)));
        assert!(FieldKind::BooleanByte.accepts(&FieldValue::Bool(true)));
        assert_eq!(FieldKind::NumberFixed(1).max_number(), Some(255));
        assert_eq!(FieldKind::Language.default_value(), FieldValue::Text("eng".into()));
    }
}
