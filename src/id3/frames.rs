use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::common::config::ParsingMode;
use crate::common::error::{Id3Error, Result};
use crate::id3::body::FrameBody;
use crate::id3::cursor::ByteCursor;
use crate::id3::datatype::{FieldKind, FieldValue};
use crate::id3::header::Id3v2Version;
use crate::id3::schema;
use crate::id3::specs::Encoding;
use crate::id3::unsynch;

/// Frame status and format flags.
///
/// ID3v2.2 frames have no flags; ID3v2.3 and ID3v2.4 place the same
/// concepts at different bit positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameFlags {
    pub tag_alter_preservation: bool,
    pub file_alter_preservation: bool,
    pub read_only: bool,
    pub grouping: bool,
    pub compression: bool,
    pub encryption: bool,
    /// ID3v2.4 only
    pub unsynchronisation: bool,
    /// ID3v2.4 only
    pub data_length_indicator: bool,
}

impl FrameFlags {
    pub fn parse(bits: u16, version: Id3v2Version) -> Self {
        match version {
            Id3v2Version::V22 => FrameFlags::default(),
            Id3v2Version::V23 => FrameFlags {
                tag_alter_preservation: bits & 0x8000 != 0,
                file_alter_preservation: bits & 0x4000 != 0,
                read_only: bits & 0x2000 != 0,
                compression: bits & 0x0080 != 0,
                encryption: bits & 0x0040 != 0,
                grouping: bits & 0x0020 != 0,
                unsynchronisation: false,
                data_length_indicator: false,
            },
            Id3v2Version::V24 => FrameFlags {
                tag_alter_preservation: bits & 0x4000 != 0,
                file_alter_preservation: bits & 0x2000 != 0,
                read_only: bits & 0x1000 != 0,
                grouping: bits & 0x0040 != 0,
                compression: bits & 0x0008 != 0,
                encryption: bits & 0x0004 != 0,
                unsynchronisation: bits & 0x0002 != 0,
                data_length_indicator: bits & 0x0001 != 0,
            },
        }
    }

    pub fn to_bits(self, version: Id3v2Version) -> u16 {
        let set = |flag: bool, bit: u16| if flag { bit } else { 0 };
        match version {
            Id3v2Version::V22 => 0,
            Id3v2Version::V23 => {
                set(self.tag_alter_preservation, 0x8000)
                    | set(self.file_alter_preservation, 0x4000)
                    | set(self.read_only, 0x2000)
                    | set(self.compression, 0x0080)
                    | set(self.encryption, 0x0040)
                    | set(self.grouping, 0x0020)
            }
            Id3v2Version::V24 => {
                set(self.tag_alter_preservation, 0x4000)
                    | set(self.file_alter_preservation, 0x2000)
                    | set(self.read_only, 0x1000)
                    | set(self.grouping, 0x0040)
                    | set(self.compression, 0x0008)
                    | set(self.encryption, 0x0004)
                    | set(self.unsynchronisation, 0x0002)
                    | set(self.data_length_indicator, 0x0001)
            }
        }
    }
}

/// What a frame carries after its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameContent {
    Body(FrameBody),
    /// Encrypted payload, kept exactly as read
    Encrypted(Vec<u8>),
    /// Payload of a frame the version has no body for, kept exactly as read
    Unsupported(Vec<u8>),
}

/// A parsed ID3v2 frame.
#[derive(Debug, Clone)]
pub struct Frame {
    id: String,
    pub flags: FrameFlags,
    pub group_id: Option<u8>,
    pub encryption_method: Option<u8>,
    /// Size of the payload before compression, as stored with an opaque frame
    data_length: Option<u32>,
    content: FrameContent,
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.content == other.content
    }
}

impl Eq for Frame {}

/// Outcome of reading one frame from a frame stream.
#[derive(Debug)]
pub enum FrameRead {
    /// A frame and the bytes it occupied, header included
    Frame(Frame, usize),
    /// A frame whose body could not be decoded, dropped
    Skipped { id: String, size: usize },
    /// Padding or garbage: the frame stream ends here
    End,
}

impl Frame {
    /// Frame with a default body, for an id the version defines.
    pub fn new(id: &str, version: Id3v2Version) -> Result<Self> {
        if !schema::is_valid_id(id, version) {
            return Err(Id3Error::InvalidArgument(format!(
                "{} is not a valid {} frame id",
                id, version
            )));
        }
        let layout = schema::layout_for(id, version).ok_or_else(|| {
            Id3Error::InvalidArgument(format!("{} has no {} frame body", id, version))
        })?;
        Ok(Self::with_body(id, FrameBody::from_layout(layout)))
    }

    /// Text-like frame holding `value`.
    pub fn text(id: &str, value: &str) -> Result<Self> {
        let mut body = FrameBody::new(id)?;
        body.set_text(value)?;
        Ok(Self::with_body(id, body))
    }

    pub fn with_body(id: &str, body: FrameBody) -> Self {
        Frame {
            id: id.to_string(),
            flags: FrameFlags::default(),
            group_id: None,
            encryption_method: None,
            data_length: None,
            content: FrameContent::Body(body),
        }
    }

    /// Opaque frame carrying `raw` verbatim.
    pub fn unsupported(id: &str, raw: Vec<u8>) -> Self {
        Frame {
            id: id.to_string(),
            flags: FrameFlags::default(),
            group_id: None,
            encryption_method: None,
            data_length: None,
            content: FrameContent::Unsupported(raw),
        }
    }

    /// Same frame under another id.
    pub(crate) fn renamed(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Key telling this frame apart from others with the same id (`TXXX:desc`).
    pub fn identifier(&self) -> String {
        match &self.content {
            FrameContent::Body(body) => body.identifier(&self.id),
            _ => self.id.clone(),
        }
    }

    pub fn content(&self) -> &FrameContent {
        &self.content
    }

    pub fn body(&self) -> Option<&FrameBody> {
        match &self.content {
            FrameContent::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut FrameBody> {
        match &mut self.content {
            FrameContent::Body(body) => Some(body),
            _ => None,
        }
    }

    /// Payload of an opaque frame.
    pub fn raw(&self) -> Option<&[u8]> {
        match &self.content {
            FrameContent::Encrypted(raw) | FrameContent::Unsupported(raw) => Some(raw),
            FrameContent::Body(_) => None,
        }
    }

    pub(crate) fn raw_mut(&mut self) -> Option<&mut Vec<u8>> {
        match &mut self.content {
            FrameContent::Encrypted(raw) | FrameContent::Unsupported(raw) => Some(raw),
            FrameContent::Body(_) => None,
        }
    }

    pub fn data_length(&self) -> Option<u32> {
        self.data_length
    }

    pub(crate) fn set_data_length(&mut self, length: Option<u32>) {
        self.data_length = length;
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self.content, FrameContent::Encrypted(_))
    }

    pub fn is_opaque(&self) -> bool {
        !matches!(self.content, FrameContent::Body(_))
    }

    /// Main text of the frame, empty for frames without one.
    pub fn text_value(&self) -> &str {
        self.body().map(FrameBody::text).unwrap_or_default()
    }

    /// Get a human-readable representation.
    pub fn pprint(&self) -> String {
        match &self.content {
            FrameContent::Body(body) => format!("{}={}", self.id, body.pprint()),
            FrameContent::Encrypted(raw) => format!("{}=[encrypted, {} bytes]", self.id, raw.len()),
            FrameContent::Unsupported(raw) => format!("{}=[{} bytes]", self.id, raw.len()),
        }
    }

    /// Read the frame at the start of `data`, the rest of the tag's frame area.
    pub fn read(data: &[u8], version: Id3v2Version, mode: ParsingMode) -> Result<FrameRead> {
        Self::read_in_tag(data, version, mode, 7, false)
    }

    /// `size_bits` is 8 for ID3v2.4 tags whose frame sizes are plain integers.
    /// `tag_unsync` is the ID3v2.4 tag header flag, undone on every frame payload.
    pub(crate) fn read_in_tag(
        data: &[u8],
        version: Id3v2Version,
        mode: ParsingMode,
        size_bits: u8,
        tag_unsync: bool,
    ) -> Result<FrameRead> {
        let header_len = version.frame_header_len();
        if data.len() < header_len || data[0] == 0 {
            return Ok(FrameRead::End);
        }

        let mut cursor = ByteCursor::new(data, header_len);
        let id_bytes = cursor.read_fixed(version.frame_id_len())?;
        let id = match std::str::from_utf8(id_bytes) {
            Ok(id) if schema::is_valid_id(id, version) => id,
            _ => {
                log::warn!("Invalid frame id {:?}, treating the rest as padding", id_bytes);
                return Ok(FrameRead::End);
            }
        };

        let size_kind = match (version, size_bits) {
            (Id3v2Version::V22, _) => FieldKind::NumberFixed(3),
            (Id3v2Version::V24, 7) => FieldKind::Synchsafe(4),
            _ => FieldKind::NumberFixed(4),
        };
        let declared = size_kind
            .read(&mut cursor, Encoding::Latin1)?
            .as_number()
            .unwrap_or_default() as usize;
        let flag_bits = match version {
            Id3v2Version::V22 => 0,
            _ => cursor.read_uint(2)? as u16,
        };
        let tag_unsync = tag_unsync && version == Id3v2Version::V24;

        let available = data.len() - header_len;
        let size = if declared > available {
            match mode {
                ParsingMode::Relaxed => {
                    log::warn!(
                        "{}: declared size {} exceeds the {} bytes left, clamping",
                        id,
                        declared,
                        available
                    );
                    available
                }
                _ => {
                    return Err(Id3Error::Truncated {
                        needed: header_len + declared,
                        available: data.len(),
                    })
                }
            }
        } else {
            declared
        };

        let consumed = header_len + size;
        let payload = &data[header_len..consumed];

        match Self::decode(id, version, flag_bits, tag_unsync, payload) {
            Ok(frame) => {
                log::debug!("Read {} ({} bytes)", frame.id, size);
                Ok(FrameRead::Frame(frame, consumed))
            }
            Err(e @ Id3Error::InvalidFrame { .. }) if mode != ParsingMode::Strict => {
                log::warn!("Dropping frame: {}", e);
                Ok(FrameRead::Skipped {
                    id: id.to_string(),
                    size: consumed,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Decode a frame payload (everything after the frame header).
    ///
    /// `tag_unsync` comes from the tag header. It is not folded into the
    /// frame's own flags, so opaque frames keep the header bits they were read with.
    fn decode(
        id: &str,
        version: Id3v2Version,
        flag_bits: u16,
        tag_unsync: bool,
        payload: &[u8],
    ) -> Result<Frame> {
        if payload.is_empty() {
            return Err(Id3Error::invalid_frame(id, "empty frame"));
        }

        let flags = FrameFlags::parse(flag_bits, version);
        let mut frame = Frame {
            id: id.to_string(),
            flags,
            group_id: None,
            encryption_method: None,
            data_length: None,
            content: FrameContent::Unsupported(Vec::new()),
        };

        let mut cursor = ByteCursor::new(payload, payload.len());
        frame
            .read_extras(&mut cursor, version)
            .map_err(|e| Id3Error::invalid_frame(id, format!("too short for its flags: {}", e)))?;
        let raw = cursor.read_rest()?;

        if flags.encryption || schema::layout_for(id, version).is_none() {
            // Without its own unsync flag the payload can only be kept once the
            // tag-level unsynchronisation is undone
            let raw = if tag_unsync && !flags.unsynchronisation {
                match unsynch::decode(raw) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        log::warn!("{}: {}, keeping the payload as read", id, e);
                        frame.flags.unsynchronisation = true;
                        raw.to_vec()
                    }
                }
            } else {
                raw.to_vec()
            };
            frame.content = if flags.encryption {
                FrameContent::Encrypted(raw)
            } else {
                FrameContent::Unsupported(raw)
            };
            return Ok(frame);
        }

        let mut bytes = Cow::Borrowed(raw);
        if flags.unsynchronisation || tag_unsync {
            match unsynch::decode(&bytes) {
                Ok(decoded) => bytes = Cow::Owned(decoded),
                Err(e) => {
                    log::warn!("{}: {}, keeping the frame undecoded", id, e);
                    frame.flags.unsynchronisation = true;
                    frame.content = FrameContent::Unsupported(raw.to_vec());
                    return Ok(frame);
                }
            }
        }
        let body = FrameBody::read(id, version, &bytes, bytes.len())?;
        frame.content = FrameContent::Body(body);
        Ok(frame)
    }

    /// Read the optional bytes between frame header and payload, in version order.
    fn read_extras(&mut self, cursor: &mut ByteCursor<'_>, version: Id3v2Version) -> Result<()> {
        let flags = self.flags;
        match version {
            Id3v2Version::V22 => {}
            Id3v2Version::V23 => {
                if flags.compression {
                    let size = FieldKind::NumberFixed(4).read(cursor, Encoding::Latin1)?;
                    self.data_length = size.as_number().map(|n| n as u32);
                }
                if flags.encryption {
                    self.encryption_method = Some(cursor.read_u8()?);
                }
                if flags.grouping {
                    self.group_id = Some(cursor.read_u8()?);
                }
            }
            Id3v2Version::V24 => {
                if flags.grouping {
                    self.group_id = Some(cursor.read_u8()?);
                }
                if flags.encryption {
                    self.encryption_method = Some(cursor.read_u8()?);
                }
                if flags.data_length_indicator {
                    let size = FieldKind::Synchsafe(4).read(cursor, Encoding::Latin1)?;
                    self.data_length = size.as_number().map(|n| n as u32);
                }
            }
        }
        Ok(())
    }

    fn write_extras(
        &self,
        flags: FrameFlags,
        version: Id3v2Version,
        data_length: Option<u32>,
        out: &mut Vec<u8>,
    ) {
        let length = FieldValue::Number(data_length.unwrap_or_default() as u64);
        match version {
            Id3v2Version::V22 => {}
            Id3v2Version::V23 => {
                if flags.compression {
                    FieldKind::NumberFixed(4).write(&length, Encoding::Latin1, out);
                }
                if flags.encryption {
                    out.push(self.encryption_method.unwrap_or_default());
                }
                if flags.grouping {
                    out.push(self.group_id.unwrap_or_default());
                }
            }
            Id3v2Version::V24 => {
                if flags.grouping {
                    out.push(self.group_id.unwrap_or_default());
                }
                if flags.encryption {
                    out.push(self.encryption_method.unwrap_or_default());
                }
                if flags.data_length_indicator {
                    FieldKind::Synchsafe(4).write(&length, Encoding::Latin1, out);
                }
            }
        }
    }

    /// Serialise the frame, header included.
    pub fn write(&self, version: Id3v2Version) -> Result<Vec<u8>> {
        self.write_with(version, false)
    }

    /// Serialise the frame, unsynchronising a body frame's payload when
    /// `unsync` is set (ID3v2.4 only, earlier versions unsynchronise whole tags).
    pub(crate) fn write_with(&self, version: Id3v2Version, unsync: bool) -> Result<Vec<u8>> {
        if !schema::is_valid_id(&self.id, version) {
            return Err(Id3Error::invalid_frame(
                &self.id,
                format!("not a valid {} frame id", version),
            ));
        }

        let mut flags = self.flags;
        let mut payload = Vec::new();

        match &self.content {
            FrameContent::Body(body) => {
                let mut data = body.write(version);
                let plain_len = data.len() as u32;

                flags.encryption = false;
                flags.grouping = flags.grouping && self.group_id.is_some();
                if version == Id3v2Version::V22 {
                    flags = FrameFlags::default();
                }
                if flags.compression {
                    data = deflate(&data)?;
                }
                flags.unsynchronisation = false;
                if version == Id3v2Version::V24 && unsync && unsynch::needs_unsync(&data) {
                    data = unsynch::encode(&data);
                    flags.unsynchronisation = true;
                }
                if version == Id3v2Version::V24 {
                    flags.data_length_indicator = flags.compression
                        || flags.unsynchronisation
                        || self.flags.data_length_indicator;
                } else {
                    flags.data_length_indicator = false;
                }

                self.write_extras(flags, version, Some(plain_len), &mut payload);
                payload.extend_from_slice(&data);
            }
            FrameContent::Encrypted(raw) | FrameContent::Unsupported(raw) => {
                if version == Id3v2Version::V22 {
                    flags = FrameFlags::default();
                }
                // A compressed ID3v2.4 payload carries its inflated size
                if version == Id3v2Version::V24 && flags.compression && self.data_length.is_some() {
                    flags.data_length_indicator = true;
                }
                self.write_extras(flags, version, self.data_length, &mut payload);
                payload.extend_from_slice(raw);
            }
        }

        let size = payload.len();
        if size > version.max_frame_size() {
            return Err(Id3Error::invalid_frame(
                &self.id,
                format!("{} bytes do not fit a {} frame", size, version),
            ));
        }

        let mut out = Vec::with_capacity(version.frame_header_len() + size);
        out.extend_from_slice(self.id.as_bytes());
        let size_value = FieldValue::Number(size as u64);
        match version {
            Id3v2Version::V22 => FieldKind::NumberFixed(3).write(&size_value, Encoding::Latin1, &mut out),
            Id3v2Version::V23 => FieldKind::NumberFixed(4).write(&size_value, Encoding::Latin1, &mut out),
            Id3v2Version::V24 => FieldKind::Synchsafe(4).write(&size_value, Encoding::Latin1, &mut out),
        }
        if version != Id3v2Version::V22 {
            out.extend_from_slice(&flags.to_bits(version).to_be_bytes());
        }
        out.extend_from_slice(&payload);
        Ok(out)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pprint())
    }
}

fn inflate(id: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    decoder
        .read_to_end(&mut result)
        .map_err(|e| Id3Error::BadCompressedData(format!("{}: {}", id, e)))?;
    Ok(result)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
