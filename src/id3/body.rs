use crate::common::error::{Id3Error, Result};
use crate::id3::cursor::ByteCursor;
use crate::id3::datatype::{FieldKind, FieldSpec, FieldValue};
use crate::id3::header::Id3v2Version;
use crate::id3::schema::{self, FrameLayout};
use crate::id3::specs::Encoding;

/// Decoded payload of a frame: one value per field of its layout, in wire order.
#[derive(Debug, Clone)]
pub struct FrameBody {
    layout: &'static FrameLayout,
    values: Vec<FieldValue>,
    read_size: Option<usize>,
}

impl PartialEq for FrameBody {
    // The size a body was read with is history, not content
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.layout, other.layout) && self.values == other.values
    }
}

impl Eq for FrameBody {}

impl FrameBody {
    /// Body with default values for `id`.
    pub fn new(id: &str) -> Result<Self> {
        let layout = schema::lookup(id).ok_or_else(|| {
            Id3Error::InvalidArgument(format!("no body layout for frame {}", id))
        })?;
        Ok(Self::from_layout(layout))
    }

    pub fn from_layout(layout: &'static FrameLayout) -> Self {
        FrameBody {
            layout,
            values: layout.fields.iter().map(|f| f.kind.default_value()).collect(),
            read_size: None,
        }
    }

    /// Decode the body of frame `id` from `data`, of which `declared` bytes belong to it.
    ///
    /// Fields are read in layout order. Running out of declared bytes before the
    /// last field is an `InvalidFrame`; bytes left over after it are ignored.
    pub fn read(id: &str, version: Id3v2Version, data: &[u8], declared: usize) -> Result<Self> {
        let layout = schema::lookup(id)
            .ok_or_else(|| Id3Error::invalid_frame(id, "no body layout"))?;

        let mut cursor = ByteCursor::new(data, declared);
        let mut encoding = Encoding::Latin1;
        let mut values = Vec::with_capacity(layout.fields.len());

        for spec in layout.fields {
            let value = spec.kind.read(&mut cursor, encoding).map_err(|e| {
                if e.is_bounds_error() {
                    Id3Error::invalid_frame(
                        id,
                        format!("not enough data for field {}: {}", spec.name, e),
                    )
                } else {
                    e
                }
            })?;

            if spec.kind == FieldKind::TextEncoding {
                let byte = value.as_number().unwrap_or_default() as u8;
                encoding = Encoding::from_byte(byte).ok_or_else(|| {
                    Id3Error::invalid_frame(id, format!("invalid text encoding {}", byte))
                })?;
                if !encoding.is_supported(version) {
                    log::debug!("{}: encoding {:?} is not defined for {}", id, encoding, version);
                }
            }
            values.push(value);
        }

        if cursor.position() < declared {
            log::warn!(
                "{}: ignoring {} trailing bytes after the last field",
                id,
                declared - cursor.position()
            );
        }

        Ok(FrameBody {
            layout,
            values,
            read_size: Some(declared),
        })
    }

    /// Serialise the body. The size always follows from the current values.
    pub fn write(&self, version: Id3v2Version) -> Vec<u8> {
        let encoding = self.write_encoding(version);
        let mut out = Vec::new();
        for (spec, value) in self.layout.fields.iter().zip(&self.values) {
            match spec.kind {
                FieldKind::TextEncoding => out.push(encoding as u8),
                kind => kind.write(value, encoding, &mut out),
            }
        }
        out
    }

    pub fn size(&self, version: Id3v2Version) -> usize {
        self.write(version).len()
    }

    /// Size the body had when it was read, if it was.
    pub fn read_size(&self) -> Option<usize> {
        self.read_size
    }

    pub fn layout(&self) -> &'static FrameLayout {
        self.layout
    }

    /// Key telling this frame apart from others with the same id.
    pub fn identifier(&self, frame_id: &str) -> String {
        let mut key = frame_id.to_string();
        for name in self.layout.qualifiers {
            key.push(':');
            match self.get(name) {
                Some(FieldValue::Text(s)) => key.push_str(s),
                Some(FieldValue::Number(n)) => key.push_str(itoa::Buffer::new().format(*n)),
                _ => {}
            }
        }
        key
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSpec, &FieldValue)> + '_ {
        self.layout.fields.iter().zip(&self.values)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.layout.fields.iter().position(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.index_of(name).map(|i| &self.values[i])
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn get_number(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    /// Replace the value of field `name`.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<()> {
        let idx = self.index_of(name).ok_or_else(|| {
            Id3Error::InvalidArgument(format!("{} body has no field {}", self.layout.name, name))
        })?;
        let kind = self.layout.fields[idx].kind;
        if !kind.accepts(&value) {
            return Err(Id3Error::InvalidArgument(format!(
                "wrong value type for field {}",
                name
            )));
        }
        if let (Some(max), Some(n)) = (kind.max_number(), value.as_number()) {
            if n > max {
                return Err(Id3Error::InvalidArgument(format!(
                    "{} does not fit field {} (max {})",
                    n, name, max
                )));
            }
        }
        if kind == FieldKind::TextEncoding && Encoding::from_byte(value.as_number().unwrap_or(0) as u8).is_none() {
            return Err(Id3Error::InvalidArgument("invalid text encoding".into()));
        }
        self.values[idx] = value;
        Ok(())
    }

    pub fn set_text_field(&mut self, name: &str, value: &str) -> Result<()> {
        self.set(name, FieldValue::Text(value.to_string()))
    }

    fn primary_field(&self) -> Option<usize> {
        self.index_of("text").or_else(|| self.index_of("url"))
    }

    /// Main text of the frame: the text of text-like frames, the URL of link frames.
    pub fn text(&self) -> &str {
        self.primary_field()
            .and_then(|i| self.values[i].as_text())
            .unwrap_or_default()
    }

    pub fn set_text(&mut self, value: &str) -> Result<()> {
        let idx = self.primary_field().ok_or_else(|| {
            Id3Error::InvalidArgument(format!("{} body has no text", self.layout.name))
        })?;
        self.values[idx] = FieldValue::Text(value.to_string());
        Ok(())
    }

    /// Main text split into its NUL-separated values.
    pub fn values(&self) -> Vec<&str> {
        let text = self.text();
        if text.is_empty() {
            Vec::new()
        } else {
            text.split('\0').collect()
        }
    }

    /// Encoding the body was read with or set to (Latin-1 for bodies without one).
    pub fn encoding(&self) -> Encoding {
        self.get_number("text_encoding")
            .and_then(|n| Encoding::from_byte(n as u8))
            .unwrap_or(Encoding::Latin1)
    }

    pub fn set_encoding(&mut self, encoding: Encoding) -> Result<()> {
        self.set("text_encoding", FieldValue::Number(encoding as u64))
    }

    /// Encoding used when writing for `version`.
    pub fn write_encoding(&self, version: Id3v2Version) -> Encoding {
        let texts = self
            .fields()
            .filter(|(spec, _)| spec.kind.is_encoded_text())
            .filter_map(|(_, value)| value.as_text());
        self.encoding().for_write(version, texts)
    }

    /// One-line summary of the body.
    pub fn pprint(&self) -> String {
        match self.layout.name {
            "text" => self.values().join("/"),
            "url" => self.text().to_string(),
            "paired text" => self
                .values()
                .chunks(2)
                .map(|pair| pair.join("="))
                .collect::<Vec<_>>()
                .join("/"),
            _ => self
                .fields()
                .filter(|(spec, _)| spec.kind != FieldKind::TextEncoding)
                .map(|(spec, value)| format!("{}={}", spec.name, value))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V24: Id3v2Version = Id3v2Version::V24;
    const V23: Id3v2Version = Id3v2Version::V23;

    #[test]
    fn text_body_round_trip() {
        let data = b"\x00Title";
        let body = FrameBody::read("TIT2", V24, data, data.len()).unwrap();
        assert_eq!(body.text(), "Title");
        assert_eq!(body.read_size(), Some(6));
        assert_eq!(body.write(V24), data.to_vec());
        assert_eq!(body.size(V24), 6);
    }

    #[test]
    fn comment_identifier() {
        let data = b"\x00engdesc\x00Some text";
        let body = FrameBody::read("COMM", V23, data, data.len()).unwrap();
        assert_eq!(body.identifier("COMM"), "COMM:desc:eng");
        assert_eq!(body.text(), "Some text");
        assert_eq!(body.get_text("language"), Some("eng"));
    }

    #[test]
    fn overrun_is_invalid_frame() {
        // POPM needs a rating byte after the email
        let data = b"a@b";
        let err = FrameBody::read("POPM", V24, data, data.len()).unwrap_err();
        assert!(matches!(err, Id3Error::InvalidFrame { .. }));
    }

    #[test_log::test]
    fn trailing_bytes_are_tolerated() {
        // SEEK holds a single 4-byte offset
        let data = [0u8, 0, 1, 0, 0xAA, 0xBB];
        let body = FrameBody::read("SEEK", V24, &data, data.len()).unwrap();
        assert_eq!(body.get_number("offset"), Some(256));
        assert_eq!(body.write(V24), vec![0, 0, 1, 0]);
    }

    #[test]
    fn invalid_encoding_byte() {
        let data = b"\x07Title";
        assert!(matches!(
            FrameBody::read("TIT2", V24, data, data.len()),
            Err(Id3Error::InvalidFrame { .. })
        ));
    }

    #[test]
    fn encoding_upgrade_on_write() {
        let mut body = FrameBody::new("TIT2").unwrap();
        body.set_text("\u{263A}").unwrap();
        assert_eq!(body.encoding(), Encoding::Latin1);
        let bytes = body.write(V23);
        assert_eq!(bytes[0], Encoding::Utf16 as u8);
        assert_eq!(&bytes[1..3], &[0xFF, 0xFE]);

        body.set_encoding(Encoding::Utf8).unwrap();
        assert_eq!(body.write(V24)[0], Encoding::Utf8 as u8);
        assert_eq!(body.write(V23)[0], Encoding::Utf16 as u8);
    }

    #[test]
    fn defaults_and_equality() {
        let a = FrameBody::new("COMM").unwrap();
        let mut b = FrameBody::new("COMM").unwrap();
        assert_eq!(a, b);
        b.set_encoding(Encoding::Utf16).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn set_validates_values() {
        let mut body = FrameBody::new("APIC").unwrap();
        assert!(body.set("picture_type", FieldValue::Number(3)).is_ok());
        assert!(body.set("picture_type", FieldValue::Number(300)).is_err());
        assert!(body.set("picture_type", FieldValue::Text("3".into())).is_err());
        assert!(body.set("no_such_field", FieldValue::Number(0)).is_err());
        assert!(body.set("text_encoding", FieldValue::Number(9)).is_err());
    }

    #[test]
    fn values_split_on_nul() {
        let mut body = FrameBody::new("TCON").unwrap();
        assert!(body.values().is_empty());
        body.set_text("Rock\0Jazz").unwrap();
        assert_eq!(body.values(), vec!["Rock", "Jazz"]);
        assert_eq!(body.pprint(), "Rock/Jazz");
    }
}
