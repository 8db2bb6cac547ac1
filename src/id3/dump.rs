//! Indented tree dumps of tags, for diagnostics.

use std::fmt::{self, Write};

use crate::id3::datatype::FieldKind;
use crate::id3::frames::{Frame, FrameContent, FrameFlags};
use crate::id3::id3v1::Id3v1Tag;
use crate::id3::specs::PictureType;
use crate::id3::tags::Id3v2Tag;

const INDENT: &str = "  ";

pub fn structure(tag: &Id3v2Tag) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_tag(tag, &mut out);
    out
}

pub fn structure_v1(tag: &Id3v1Tag) -> String {
    let mut out = String::new();
    let _ = write_v1(tag, &mut out);
    out
}

fn write_tag(tag: &Id3v2Tag, out: &mut String) -> fmt::Result {
    writeln!(out, "{} tag", tag.version())?;
    writeln!(
        out,
        "{}flags: unsynchronisation={} extended={} experimental={}",
        INDENT, tag.flags.unsynchronisation, tag.flags.extended, tag.flags.experimental
    )?;
    if let Some(ext) = tag.extended_header() {
        write!(out, "{}extended header:", INDENT)?;
        if let Some(crc) = ext.crc {
            write!(out, " crc={:08X}", crc)?;
        }
        if ext.padding_size > 0 {
            write!(out, " padding={}", ext.padding_size)?;
        }
        if ext.update {
            write!(out, " update")?;
        }
        if let Some(restrictions) = ext.restrictions {
            write!(out, " restrictions={:02X}", restrictions)?;
        }
        writeln!(out)?;
    }
    for frame in tag.frames() {
        write_frame(frame, out)?;
    }
    writeln!(out, "{}padding: {}", INDENT, tag.padding())
}

fn flag_names(flags: &FrameFlags) -> Vec<&'static str> {
    [
        (flags.tag_alter_preservation, "tag-alter"),
        (flags.file_alter_preservation, "file-alter"),
        (flags.read_only, "read-only"),
        (flags.grouping, "grouping"),
        (flags.compression, "compression"),
        (flags.encryption, "encryption"),
        (flags.unsynchronisation, "unsync"),
        (flags.data_length_indicator, "data-length"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect()
}

fn write_frame(frame: &Frame, out: &mut String) -> fmt::Result {
    write!(out, "{}frame {}", INDENT, frame.identifier())?;
    let flags = flag_names(&frame.flags);
    if !flags.is_empty() {
        write!(out, " [{}]", flags.join(", "))?;
    }
    if let Some(group) = frame.group_id {
        write!(out, " group={}", group)?;
    }
    writeln!(out)?;

    match frame.content() {
        FrameContent::Body(body) => {
            writeln!(out, "{}{}body: {}", INDENT, INDENT, body.layout().name)?;
            for (spec, value) in body.fields() {
                if spec.kind == FieldKind::TextEncoding {
                    writeln!(out, "{0}{0}{0}{1}: {2:?}", INDENT, spec.name, body.encoding())?;
                } else if spec.name == "picture_type" {
                    let kind = PictureType::from_byte(value.as_number().unwrap_or_default() as u8);
                    writeln!(out, "{0}{0}{0}{1}: {2} ({3:?})", INDENT, spec.name, value, kind)?;
                } else {
                    writeln!(out, "{0}{0}{0}{1}: {2}", INDENT, spec.name, value)?;
                }
            }
        }
        FrameContent::Encrypted(raw) => {
            writeln!(
                out,
                "{0}{0}encrypted: method={1} {2} bytes",
                INDENT,
                frame.encryption_method.unwrap_or_default(),
                raw.len()
            )?;
        }
        FrameContent::Unsupported(raw) => {
            writeln!(out, "{0}{0}unsupported: {1} bytes", INDENT, raw.len())?;
        }
    }
    Ok(())
}

fn write_v1(tag: &Id3v1Tag, out: &mut String) -> fmt::Result {
    writeln!(out, "ID3v1{} tag", if tag.track.is_some() { ".1" } else { "" })?;
    for (name, value) in [
        ("title", &tag.title),
        ("artist", &tag.artist),
        ("album", &tag.album),
        ("year", &tag.year),
        ("comment", &tag.comment),
    ] {
        writeln!(out, "{}{}: {:?}", INDENT, name, value)?;
    }
    if let Some(track) = tag.track {
        writeln!(out, "{}track: {}", INDENT, track)?;
    }
    match (tag.genre, tag.genre_name()) {
        (Some(idx), Some(name)) => writeln!(out, "{}genre: {} ({})", INDENT, name, idx),
        (Some(idx), None) => writeln!(out, "{}genre: {}", INDENT, idx),
        _ => Ok(()),
    }
}
