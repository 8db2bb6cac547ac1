pub mod body;
pub mod convert;
pub mod cursor;
pub mod datatype;
pub mod dump;
pub mod frames;
pub mod header;
pub mod id3v1;
pub mod schema;
pub mod specs;
pub mod tags;
pub mod unsynch;
pub mod writer;

use std::path::Path;

use crate::common::config::TagOptions;
use crate::common::error::{Id3Error, Result};
use crate::common::util;
use crate::id3::id3v1::Id3v1Tag;
use crate::id3::tags::Id3v2Tag;

/// The tags found in one file.
#[derive(Debug, Clone, Default)]
pub struct LoadedTags {
    pub id3v2: Option<Id3v2Tag>,
    pub id3v1: Option<Id3v1Tag>,
}

/// Load the ID3v2 tag at the start of a file and the ID3v1 trailer at its end.
pub fn load_id3<P: AsRef<Path>>(path: P, options: TagOptions) -> Result<LoadedTags> {
    let map = util::map_file(path)?;
    load_id3_from_data(&map, options)
}

/// Like [`load_id3`], over data already in memory.
///
/// Fails with `TagNotFound` when neither tag is present.
pub fn load_id3_from_data(data: &[u8], options: TagOptions) -> Result<LoadedTags> {
    let id3v2 = if data.starts_with(b"ID3") {
        let region = util::id3v2_region(data).unwrap_or(data);
        Some(Id3v2Tag::read(region, options)?)
    } else {
        None
    };

    let id3v1 = match util::id3v1_region(data) {
        Some(region) => {
            let mut tag = Id3v1Tag::parse(region)?;
            tag.set_options(options);
            Some(tag)
        }
        None => None,
    };

    if id3v2.is_none() && id3v1.is_none() {
        return Err(Id3Error::TagNotFound);
    }
    Ok(LoadedTags { id3v2, id3v1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id3::frames::Frame;
    use crate::id3::header::Id3v2Version;

    #[test]
    fn both_tags_from_one_buffer() {
        let mut v2 = Id3v2Tag::new(Id3v2Version::V23);
        v2.add_frame(Frame::text("TIT2", "Song").unwrap()).unwrap();
        let mut data = v2.write(&TagOptions::default()).unwrap();
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        let mut v1 = Id3v1Tag::new();
        v1.title = "Song".into();
        data.extend_from_slice(&v1.write());

        let loaded = load_id3_from_data(&data, TagOptions::default()).unwrap();
        assert_eq!(loaded.id3v2.unwrap().get_frame("TIT2").unwrap().text_value(), "Song");
        assert_eq!(loaded.id3v1.unwrap().title, "Song");
    }

    #[test]
    fn no_tags() {
        assert!(matches!(
            load_id3_from_data(&[0u8; 200], TagOptions::default()),
            Err(Id3Error::TagNotFound)
        ));
    }

    #[test]
    fn unsupported_version_is_reported() {
        let data = b"ID3\x05\x00\x00\x00\x00\x00\x00".to_vec();
        assert!(matches!(
            load_id3_from_data(&data, TagOptions::default()),
            Err(Id3Error::UnsupportedVersion(_))
        ));
    }
}
