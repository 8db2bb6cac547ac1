use std::io::Write;

use crate::common::config::{ParsingMode, TagOptions};
use crate::common::error::{Id3Error, Result};
use crate::id3::frames::{Frame, FrameRead};
use crate::id3::header::{determine_bpi, frame_crc, ExtendedHeader, ID3Flags, ID3Header, Id3v2Version};
use crate::id3::schema;
use crate::id3::unsynch;
use crate::id3::{convert, dump, writer};

/// An ID3v2 tag of one version.
///
/// Frames are kept in an ordered multimap keyed by frame id: ids appear in the
/// order they were first seen, and frames sharing an id keep their relative
/// order. Keys of the form `ID:qualifier` (`TXXX:BARCODE`, `COMM:desc:eng`)
/// address single frames among repeated ones.
#[derive(Debug, Clone)]
pub struct Id3v2Tag {
    version: Id3v2Version,
    pub flags: ID3Flags,
    extended: Option<ExtendedHeader>,
    frames: Vec<(String, Vec<Frame>)>,
    padding: usize,
    options: TagOptions,
}

impl PartialEq for Id3v2Tag {
    // Same version and same frames per id; the order of ids is not significant
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.frames.len() == other.frames.len()
            && self.frames.iter().all(|(id, frames)| {
                other
                    .frames
                    .iter()
                    .any(|(other_id, other_frames)| other_id == id && other_frames == frames)
            })
    }
}

impl Id3v2Tag {
    pub fn new(version: Id3v2Version) -> Self {
        Self::with_options(version, TagOptions::default())
    }

    pub fn with_options(version: Id3v2Version, options: TagOptions) -> Self {
        Id3v2Tag {
            version,
            flags: ID3Flags::default(),
            extended: None,
            frames: Vec::with_capacity(16),
            padding: 0,
            options,
        }
    }

    /// Parse the tag at the start of `data`.
    pub fn read(data: &[u8], options: TagOptions) -> Result<Self> {
        let header = ID3Header::parse(data, 0)?;
        let version = header.version;
        let mode = options.parsing_mode;

        if header.flags.compression {
            return Err(Id3Error::InvalidTag(
                "ID3v2.2 tag compression is not supported".into(),
            ));
        }

        let declared_end = ID3Header::LEN + header.size as usize;
        let end = if declared_end > data.len() {
            if mode == ParsingMode::Strict {
                return Err(Id3Error::Truncated {
                    needed: declared_end,
                    available: data.len(),
                });
            }
            log::warn!(
                "Tag declares {} bytes, only {} available",
                declared_end,
                data.len()
            );
            data.len()
        } else {
            declared_end
        };

        let mut tag = Self::with_options(version, options);
        tag.flags = header.flags;

        // ID3v2.2 and ID3v2.3 unsynchronise everything after the header
        let raw = &data[ID3Header::LEN..end];
        let body = if header.flags.unsynchronisation && version != Id3v2Version::V24 {
            match unsynch::decode(raw) {
                Ok(decoded) => decoded,
                Err(e) if mode == ParsingMode::Strict => return Err(e),
                Err(e) => {
                    log::warn!("{}, decoding leniently", e);
                    unsynch::decode_lenient(raw)
                }
            }
        } else {
            raw.to_vec()
        };

        let mut start = 0;
        if header.flags.extended {
            let (extended, len) = ExtendedHeader::parse(&body, version)?;
            start = len;
            tag.extended = Some(extended);
        }
        let area = &body[start..];

        if let Some(expected) = tag.extended.as_ref().and_then(|ext| ext.crc) {
            let covered = match (version, &tag.extended) {
                (Id3v2Version::V23, Some(ext)) => {
                    &area[..area.len().saturating_sub(ext.padding_size as usize)]
                }
                _ => area,
            };
            let actual = frame_crc(covered);
            if actual != expected {
                log::warn!(
                    "Tag CRC mismatch: stored {:08X}, computed {:08X}",
                    expected,
                    actual
                );
            }
        }

        let size_bits = match version {
            Id3v2Version::V24 => determine_bpi(area),
            _ => 8,
        };
        let tag_unsync = header.flags.unsynchronisation && version == Id3v2Version::V24;

        let mut pos = 0;
        while pos < area.len() {
            match Frame::read_in_tag(&area[pos..], version, mode, size_bits, tag_unsync) {
                Ok(FrameRead::Frame(frame, consumed)) => {
                    tag.push_frame(frame);
                    pos += consumed;
                }
                Ok(FrameRead::Skipped { size, .. }) => pos += size,
                Ok(FrameRead::End) => break,
                Err(e) if e.is_bounds_error() && mode != ParsingMode::Strict => {
                    log::warn!("Abandoning the frame stream at offset {}: {}", pos, e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        tag.padding = area.len().saturating_sub(pos);

        log::debug!(
            "Read {} with {} frames and {} bytes of padding",
            version,
            tag.frame_count(),
            tag.padding
        );
        Ok(tag)
    }

    /// Render the complete tag, header included.
    pub fn write(&self, options: &TagOptions) -> Result<Vec<u8>> {
        writer::render_tag(self, options)
    }

    /// Render the tag into `writer`.
    pub fn dump_to<W: Write>(&self, writer: &mut W, options: &TagOptions) -> Result<()> {
        let data = self.write(options)?;
        writer.write_all(&data)?;
        Ok(())
    }

    pub fn version(&self) -> Id3v2Version {
        self.version
    }

    pub fn options(&self) -> &TagOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: TagOptions) {
        self.options = options;
    }

    pub fn extended_header(&self) -> Option<&ExtendedHeader> {
        self.extended.as_ref()
    }

    /// Padding found after the last frame when the tag was read.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Frame ids in first-seen order.
    pub fn frame_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.frames.iter().map(|(id, _)| id.as_str())
    }

    /// All frames, grouped by id.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.frames.iter().flat_map(|(_, frames)| frames.iter())
    }

    fn split_key(key: &str) -> (&str, bool) {
        match key.split_once(':') {
            Some((id, _)) => (id, true),
            None => (key, false),
        }
    }

    fn slot(&self, id: &str) -> Option<&Vec<Frame>> {
        self.frames.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub(crate) fn frames_for_mut(&mut self, id: &str) -> Option<&mut Vec<Frame>> {
        self.frames.iter_mut().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    /// Frames stored under `key`: a frame id, or an id with qualifiers.
    pub fn get_frames(&self, key: &str) -> Vec<&Frame> {
        let (id, qualified) = Self::split_key(key);
        self.slot(id)
            .map(|frames| {
                frames
                    .iter()
                    .filter(|f| !qualified || f.identifier() == key)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First readable frame under `key`; encrypted frames are skipped.
    pub fn get_frame(&self, key: &str) -> Option<&Frame> {
        self.get_frames(key).into_iter().find(|f| !f.is_encrypted())
    }

    pub fn get_encrypted_frame(&self, key: &str) -> Option<&Frame> {
        self.get_frames(key).into_iter().find(|f| f.is_encrypted())
    }

    fn check_frame(&self, frame: &Frame) -> Result<()> {
        let id = frame.id();
        if !schema::is_valid_id(id, self.version) {
            return Err(Id3Error::InvalidArgument(format!(
                "{} is not a valid {} frame id",
                id, self.version
            )));
        }
        if !frame.is_opaque() && !schema::is_known(id, self.version) {
            return Err(Id3Error::InvalidArgument(format!(
                "{} is not defined for {}",
                id, self.version
            )));
        }
        Ok(())
    }

    /// Append without any cardinality check, as frames come off the wire.
    pub(crate) fn push_frame(&mut self, frame: Frame) {
        match self.frames_for_mut(frame.id()) {
            Some(frames) => frames.push(frame),
            None => self.frames.push((frame.id().to_string(), vec![frame])),
        }
    }

    /// Store `frame`, replacing any frame it would be ambiguous with: frames with
    /// the same identifier for repeatable ids, every frame of the id otherwise.
    pub fn set_frame(&mut self, frame: Frame) -> Result<()> {
        self.check_frame(&frame)?;
        let id = frame.id().to_string();
        if schema::is_repeatable(&id) {
            let identifier = frame.identifier();
            if let Some(frames) = self.frames_for_mut(&id) {
                if let Some(pos) = frames.iter().position(|f| f.identifier() == identifier) {
                    frames[pos] = frame;
                    frames.retain({
                        let mut seen = false;
                        move |f| {
                            if f.identifier() != identifier {
                                return true;
                            }
                            let keep = !seen;
                            seen = true;
                            keep
                        }
                    });
                    return Ok(());
                }
            }
            self.push_frame(frame);
        } else {
            match self.frames_for_mut(&id) {
                Some(frames) => *frames = vec![frame],
                None => self.frames.push((id, vec![frame])),
            }
        }
        Ok(())
    }

    /// Append `frame` when its id may repeat, otherwise replace the existing one.
    pub fn add_frame(&mut self, frame: Frame) -> Result<()> {
        self.check_frame(&frame)?;
        if schema::is_repeatable(frame.id()) {
            self.push_frame(frame);
            Ok(())
        } else {
            if self.slot(frame.id()).is_some_and(|f| !f.is_empty()) {
                log::debug!("{} does not repeat, replacing the existing frame", frame.id());
            }
            self.set_frame(frame)
        }
    }

    /// Remove the frames stored under `key`, returning how many were removed.
    pub fn remove_frames(&mut self, key: &str) -> usize {
        let (id, qualified) = Self::split_key(key);
        let Some(frames) = self.frames_for_mut(id) else {
            return 0;
        };
        let before = frames.len();
        if qualified {
            frames.retain(|f| f.identifier() != key);
        } else {
            frames.clear();
        }
        let removed = before - frames.len();
        self.frames.retain(|(_, frames)| !frames.is_empty());
        removed
    }

    /// Replace every frame under `id` with `frames`, keeping the id's position.
    pub(crate) fn replace_slot(&mut self, id: &str, frames: Vec<Frame>) {
        if frames.is_empty() {
            self.frames.retain(|(k, _)| k != id);
            return;
        }
        match self.frames_for_mut(id) {
            Some(slot) => *slot = frames,
            None => self.frames.push((id.to_string(), frames)),
        }
    }

    /// Total number of frames, opaque ones included.
    pub fn frame_count(&self) -> usize {
        self.frames.iter().map(|(_, frames)| frames.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(|(_, frames)| frames.is_empty())
    }

    /// Indented tree of the tag, for diagnostics.
    pub fn structure(&self) -> String {
        dump::structure(self)
    }

    /// Build an equivalent tag of another version.
    pub fn convert(&self, target: Id3v2Version) -> Id3v2Tag {
        convert::convert_tag(self, target)
    }
}
