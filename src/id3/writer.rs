use crate::common::config::TagOptions;
use crate::common::error::{Id3Error, Result};
use crate::id3::header::{frame_crc, BitPaddedInt, ExtendedHeader, ID3Flags, ID3Header, Id3v2Version};
use crate::id3::tags::Id3v2Tag;
use crate::id3::unsynch;

/// Build a complete ID3v2 tag from frames, ready to place in a file.
/// Returns the full tag data including header and padding.
///
/// Every frame size is recomputed from its current content. ID3v2.4 frames are
/// unsynchronised one by one, earlier versions unsynchronise the whole tag.
pub fn render_tag(tag: &Id3v2Tag, options: &TagOptions) -> Result<Vec<u8>> {
    let version = tag.version();
    let per_frame_unsync = options.unsynchronise && version == Id3v2Version::V24;

    let mut frame_data = Vec::with_capacity(4096);
    for frame in tag.frames() {
        frame_data.extend_from_slice(&frame.write_with(version, per_frame_unsync)?);
    }

    let padding = options.preferred_padding;
    let extended = extended_header(tag, options, &frame_data, padding);

    let mut flags = ID3Flags {
        experimental: tag.flags.experimental,
        extended: extended.is_some(),
        ..Default::default()
    };

    let mut body = match &extended {
        Some(ext) => {
            let mut body = ext.render(version);
            body.extend_from_slice(&frame_data);
            body
        }
        None => frame_data,
    };

    if options.unsynchronise && version != Id3v2Version::V24 && unsynch::needs_unsync(&body) {
        body = unsynch::encode(&body);
        flags.unsynchronisation = true;
    }

    let total_size = body.len() + padding;
    if total_size as u64 > BitPaddedInt::syncsafe_max(4) {
        return Err(Id3Error::InvalidTag(format!(
            "{} bytes do not fit an ID3v2 tag",
            total_size
        )));
    }

    let mut out = ID3Header::render(version, flags, total_size as u32);
    out.reserve(total_size);
    out.extend_from_slice(&body);
    out.resize(out.len() + padding, 0);

    log::debug!(
        "Rendered {} with {} frames, {} bytes",
        version,
        tag.frame_count(),
        out.len()
    );
    Ok(out)
}

/// Extended header to write, if any: a CRC when asked for, or the ID3v2.4
/// update and restriction flags the tag was read with.
fn extended_header(
    tag: &Id3v2Tag,
    options: &TagOptions,
    frame_data: &[u8],
    padding: usize,
) -> Option<ExtendedHeader> {
    let version = tag.version();
    if version == Id3v2Version::V22 {
        return None;
    }

    let mut ext = match (version, tag.extended_header()) {
        (Id3v2Version::V24, Some(read)) if read.update || read.restrictions.is_some() => {
            ExtendedHeader {
                crc: None,
                padding_size: 0,
                update: read.update,
                restrictions: read.restrictions,
            }
        }
        _ if options.write_crc => ExtendedHeader::default(),
        _ => return None,
    };

    if options.write_crc {
        let crc = match version {
            // ID3v2.3 covers the frames only, ID3v2.4 the frames and padding
            Id3v2Version::V23 => frame_crc(frame_data),
            _ => {
                let mut covered = frame_data.to_vec();
                covered.resize(frame_data.len() + padding, 0);
                frame_crc(&covered)
            }
        };
        ext.crc = Some(crc);
    }
    if version == Id3v2Version::V23 {
        ext.padding_size = padding as u32;
    }
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id3::frames::Frame;

    fn sample(version: Id3v2Version) -> Id3v2Tag {
        let mut tag = Id3v2Tag::new(version);
        let title = if version == Id3v2Version::V22 { "TT2" } else { "TIT2" };
        tag.add_frame(Frame::text(title, "Caf\u{00E9} \u{00FF}\u{00E9}").unwrap())
            .unwrap();
        tag
    }

    #[test]
    fn header_and_padding() {
        let tag = sample(Id3v2Version::V24);
        let options = TagOptions::default().preferred_padding(100);
        let data = tag.write(&options).unwrap();
        assert_eq!(&data[..5], b"ID3\x04\x00");
        assert_eq!(data[5], 0);
        let header = ID3Header::parse(&data, 0).unwrap();
        assert_eq!(header.full_size() as usize, data.len());
        assert!(data.ends_with(&[0u8; 100]));
    }

    #[test]
    fn round_trip_every_version() {
        for version in [Id3v2Version::V22, Id3v2Version::V23, Id3v2Version::V24] {
            let tag = sample(version);
            let data = tag.write(&TagOptions::default()).unwrap();
            let read = Id3v2Tag::read(&data, TagOptions::default()).unwrap();
            assert_eq!(read, tag, "{}", version);
        }
    }

    #[test]
    fn crc_is_verified_on_read() {
        for version in [Id3v2Version::V23, Id3v2Version::V24] {
            let tag = sample(version);
            let options = TagOptions::default().write_crc(true).preferred_padding(16);
            let data = tag.write(&options).unwrap();
            assert_eq!(data[5] & 0x40, 0x40);

            let read = Id3v2Tag::read(&data, TagOptions::default()).unwrap();
            let ext = read.extended_header().unwrap();
            assert!(ext.crc.is_some());
            assert_eq!(read, tag);
        }
    }

    #[test]
    fn whole_tag_unsync_v23() {
        let tag = sample(Id3v2Version::V23);
        let options = TagOptions::default().unsynchronise(true);
        let data = tag.write(&options).unwrap();
        assert_eq!(data[5] & 0x80, 0x80);
        let read = Id3v2Tag::read(&data, TagOptions::default()).unwrap();
        assert_eq!(read, tag);
    }

    #[test]
    fn frame_unsync_v24() {
        let tag = sample(Id3v2Version::V24);
        let options = TagOptions::default().unsynchronise(true);
        let data = tag.write(&options).unwrap();
        assert_eq!(data[5] & 0x80, 0);
        let read = Id3v2Tag::read(&data, TagOptions::default()).unwrap();
        assert!(read.get_frame("TIT2").unwrap().flags.unsynchronisation);
        assert_eq!(read, tag);
    }
}
