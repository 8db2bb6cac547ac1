use crate::id3::header::Id3v2Version;
use crate::id3::specs::Encoding;

/// How strictly malformed frames are treated while reading a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsingMode {
    /// Any invalid frame aborts the whole read.
    Strict,
    /// Invalid frames are dropped and parsing continues with the next frame.
    #[default]
    BestAttempt,
    /// Like `BestAttempt`, and a frame overrunning the tag is clamped to the
    /// bytes that are actually there instead of ending the frame stream.
    Relaxed,
}

/// Options threaded through reading, writing and field mapping.
///
/// There is no global instance: every tag container carries its own copy, and
/// `read`/`write` take one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagOptions {
    pub parsing_mode: ParsingMode,
    /// Version used when a new tag is created without an explicit version.
    pub preferred_version: Id3v2Version,
    /// Cut over-long values to the field maximum instead of failing.
    pub truncate_text: bool,
    /// Write genres by name (`Rock`) rather than by ID3v1 index (`(17)`).
    pub write_genres_as_text: bool,
    /// Padding appended after the frames when rendering.
    pub preferred_padding: usize,
    /// Apply unsynchronisation when rendering.
    pub unsynchronise: bool,
    /// Write an extended header carrying a CRC-32 of the frame data.
    pub write_crc: bool,
    /// Encoding for frames created by the field mapping layer.
    /// `None` picks Latin-1 when the text allows it, the version default otherwise.
    pub default_encoding: Option<Encoding>,
}

impl TagOptions {
    pub const fn new() -> Self {
        TagOptions {
            parsing_mode: ParsingMode::BestAttempt,
            preferred_version: Id3v2Version::V24,
            truncate_text: false,
            write_genres_as_text: true,
            preferred_padding: 1024,
            unsynchronise: false,
            write_crc: false,
            default_encoding: None,
        }
    }

    pub const fn parsing_mode(mut self, mode: ParsingMode) -> Self {
        self.parsing_mode = mode;
        self
    }

    pub const fn preferred_version(mut self, version: Id3v2Version) -> Self {
        self.preferred_version = version;
        self
    }

    pub const fn truncate_text(mut self, truncate: bool) -> Self {
        self.truncate_text = truncate;
        self
    }

    pub const fn write_genres_as_text(mut self, as_text: bool) -> Self {
        self.write_genres_as_text = as_text;
        self
    }

    pub const fn preferred_padding(mut self, padding: usize) -> Self {
        self.preferred_padding = padding;
        self
    }

    pub const fn unsynchronise(mut self, unsynchronise: bool) -> Self {
        self.unsynchronise = unsynchronise;
        self
    }

    pub const fn write_crc(mut self, write_crc: bool) -> Self {
        self.write_crc = write_crc;
        self
    }

    pub const fn default_encoding(mut self, encoding: Option<Encoding>) -> Self {
        self.default_encoding = encoding;
        self
    }
}

impl Default for TagOptions {
    fn default() -> Self {
        Self::new()
    }
}
