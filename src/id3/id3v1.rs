use crate::common::config::TagOptions;
use crate::common::error::{Id3Error, Result};
use crate::field::{FieldKey, TagFields};
use crate::id3::dump;
use crate::id3::header::Id3v2Version;
use crate::id3::specs::{self, Encoding, GENRES};
use crate::id3::tags::Id3v2Tag;

pub const TAG_LEN: usize = 128;

pub const TITLE_LEN: usize = 30;
pub const ARTIST_LEN: usize = 30;
pub const ALBUM_LEN: usize = 30;
pub const YEAR_LEN: usize = 4;
pub const COMMENT_LEN: usize = 30;
/// Comment length once the last two bytes hold an ID3v1.1 track number
pub const COMMENT_V11_LEN: usize = 28;

/// Check if file data ends with an ID3v1 tag.
/// Returns the offset of the TAG if found.
pub fn find_id3v1(data: &[u8]) -> Option<usize> {
    if data.len() < TAG_LEN {
        return None;
    }
    let tag_offset = data.len() - TAG_LEN;
    if &data[tag_offset..tag_offset + 3] == b"TAG" {
        Some(tag_offset)
    } else {
        None
    }
}

/// ID3v1 / ID3v1.1 tag: fixed-width Latin-1 fields in a 128-byte trailer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Id3v1Tag {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub comment: String,
    /// ID3v1.1 track number, 1-255
    pub track: Option<u8>,
    /// Index into [`GENRES`]
    pub genre: Option<u8>,
    options: TagOptions,
}

impl Id3v1Tag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TagOptions) -> Self {
        Id3v1Tag {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &TagOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: TagOptions) {
        self.options = options;
    }

    /// Parse the tag in the last 128 bytes of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let offset = find_id3v1(data).ok_or(Id3Error::TagNotFound)?;
        let tag = &data[offset..offset + TAG_LEN];

        // ID3v1.1: a zero byte before a non-zero last comment byte marks a track number
        let (comment_end, track) = if tag[125] == 0 && tag[126] != 0 {
            (125, Some(tag[126]))
        } else {
            (127, None)
        };

        let parsed = Id3v1Tag {
            title: decode_v1_string(&tag[3..33]),
            artist: decode_v1_string(&tag[33..63]),
            album: decode_v1_string(&tag[63..93]),
            year: decode_v1_string(&tag[93..97]),
            comment: decode_v1_string(&tag[97..comment_end]),
            track,
            genre: (tag[127] != 0xFF).then_some(tag[127]),
            options: TagOptions::default(),
        };
        log::debug!("Read ID3v1{} tag", if track.is_some() { ".1" } else { "" });
        Ok(parsed)
    }

    /// Serialise the tag. Fields longer than their slot are cut.
    pub fn write(&self) -> [u8; TAG_LEN] {
        let mut tag = [0u8; TAG_LEN];
        tag[0..3].copy_from_slice(b"TAG");
        write_v1_string(&mut tag[3..33], &self.title);
        write_v1_string(&mut tag[33..63], &self.artist);
        write_v1_string(&mut tag[63..93], &self.album);
        write_v1_string(&mut tag[93..97], &self.year);
        match self.track {
            Some(track) => {
                write_v1_string(&mut tag[97..125], &self.comment);
                tag[125] = 0;
                tag[126] = track;
            }
            None => write_v1_string(&mut tag[97..127], &self.comment),
        }
        tag[127] = self.genre.unwrap_or(0xFF);
        tag
    }

    pub fn genre_name(&self) -> Option<&'static str> {
        self.genre.and_then(|idx| GENRES.get(idx as usize).copied())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.artist.is_empty()
            && self.album.is_empty()
            && self.year.is_empty()
            && self.comment.is_empty()
            && self.track.is_none()
            && self.genre.is_none()
    }

    /// Indented tree of the tag, for diagnostics.
    pub fn structure(&self) -> String {
        dump::structure_v1(self)
    }

    /// Room left for the comment, which shares its slot with the track number.
    pub fn comment_len(&self) -> usize {
        if self.track.is_some() {
            COMMENT_V11_LEN
        } else {
            COMMENT_LEN
        }
    }
}

impl From<&Id3v2Tag> for Id3v1Tag {
    /// Best-effort downgrade: values are cut to fit and genres without an
    /// ID3v1 index are left out.
    fn from(v2: &Id3v2Tag) -> Self {
        let text = |key: FieldKey, max: usize| {
            v2.get_first(key)
                .map(|value| truncate_chars(&value, max))
                .unwrap_or_default()
        };

        let track = v2
            .get_first(FieldKey::Track)
            .and_then(|t| t.parse::<u8>().ok())
            .filter(|&t| t != 0);
        let comment_len = if track.is_some() { COMMENT_V11_LEN } else { COMMENT_LEN };

        Id3v1Tag {
            title: text(FieldKey::Title, TITLE_LEN),
            artist: text(FieldKey::Artist, ARTIST_LEN),
            album: text(FieldKey::Album, ALBUM_LEN),
            year: text(FieldKey::Year, YEAR_LEN),
            comment: text(FieldKey::Comment, comment_len),
            track,
            genre: v2.get_first(FieldKey::Genre).and_then(|g| specs::genre_index(&g)),
            options: *v2.options(),
        }
    }
}

impl Id3v2Tag {
    /// Build a `version` tag holding the fields of an ID3v1 tag.
    ///
    /// Values the field layer rejects (a year like `19xx`) are skipped with a
    /// warning, the other fields still carry over.
    pub fn from_id3v1(v1: &Id3v1Tag, version: Id3v2Version) -> Id3v2Tag {
        let mut tag = Id3v2Tag::with_options(version, *v1.options());
        for key in [
            FieldKey::Title,
            FieldKey::Artist,
            FieldKey::Album,
            FieldKey::Year,
            FieldKey::Comment,
            FieldKey::Track,
            FieldKey::Genre,
        ] {
            if let Some(value) = v1.get_first(key) {
                if let Err(e) = tag.set_field(key, &[value.as_str()]) {
                    log::warn!("Skipping ID3v1 {} {:?}: {}", key, value, e);
                }
            }
        }
        tag
    }
}

/// First `max` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Decode an ID3v1 fixed-length string, trimming nulls and trailing spaces.
fn decode_v1_string(data: &[u8]) -> String {
    let end = memchr::memchr(0, data).unwrap_or(data.len());
    let s = specs::decode_text(&data[..end], Encoding::Latin1);
    s.trim_end().to_string()
}

fn write_v1_string(dest: &mut [u8], text: &str) {
    let bytes = specs::encode_text(text, Encoding::Latin1);
    let len = bytes.len().min(dest.len());
    dest[..len].copy_from_slice(&bytes[..len]);
}
