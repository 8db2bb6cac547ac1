//! Translation between ID3v2.2, ID3v2.3 and ID3v2.4 frame sets.
//!
//! Most frames only change their id. Dates, involved-people lists, pictures
//! and moods change shape as well and are rebuilt here.

use crate::id3::body::FrameBody;
use crate::id3::datatype::FieldValue;
use crate::id3::frames::Frame;
use crate::id3::header::Id3v2Version;
use crate::id3::schema;
use crate::id3::specs::{self, Encoding};
use crate::id3::tags::Id3v2Tag;
use crate::id3::unsynch;

/// ID3v2.2 ids and their ID3v2.3 counterparts.
const V22_TO_V23: &[(&str, &str)] = &[
    ("BUF", "RBUF"),
    ("CNT", "PCNT"),
    ("COM", "COMM"),
    ("CRA", "AENC"),
    ("EQU", "EQUA"),
    ("ETC", "ETCO"),
    ("GEO", "GEOB"),
    ("IPL", "IPLS"),
    ("LNK", "LINK"),
    ("MCI", "MCDI"),
    ("MLL", "MLLT"),
    ("PIC", "APIC"),
    ("POP", "POPM"),
    ("REV", "RVRB"),
    ("RVA", "RVAD"),
    ("SLT", "SYLT"),
    ("STC", "SYTC"),
    ("TAL", "TALB"),
    ("TBP", "TBPM"),
    ("TCM", "TCOM"),
    ("TCO", "TCON"),
    ("TCP", "TCMP"),
    ("TCR", "TCOP"),
    ("TDA", "TDAT"),
    ("TDY", "TDLY"),
    ("TEN", "TENC"),
    ("TFT", "TFLT"),
    ("TIM", "TIME"),
    ("TKE", "TKEY"),
    ("TLA", "TLAN"),
    ("TLE", "TLEN"),
    ("TMT", "TMED"),
    ("TOA", "TOPE"),
    ("TOF", "TOFN"),
    ("TOL", "TOLY"),
    ("TOR", "TORY"),
    ("TOT", "TOAL"),
    ("TP1", "TPE1"),
    ("TP2", "TPE2"),
    ("TP3", "TPE3"),
    ("TP4", "TPE4"),
    ("TPA", "TPOS"),
    ("TPB", "TPUB"),
    ("TRC", "TSRC"),
    ("TRD", "TRDA"),
    ("TRK", "TRCK"),
    ("TS2", "TSO2"),
    ("TSA", "TSOA"),
    ("TSC", "TSOC"),
    ("TSI", "TSIZ"),
    ("TSP", "TSOP"),
    ("TSS", "TSSE"),
    ("TST", "TSOT"),
    ("TT1", "TIT1"),
    ("TT2", "TIT2"),
    ("TT3", "TIT3"),
    ("TXT", "TEXT"),
    ("TXX", "TXXX"),
    ("TYE", "TYER"),
    ("UFI", "UFID"),
    ("ULT", "USLT"),
    ("WAF", "WOAF"),
    ("WAR", "WOAR"),
    ("WAS", "WOAS"),
    ("WCM", "WCOM"),
    ("WCP", "WCOP"),
    ("WPB", "WPUB"),
    ("WXX", "WXXX"),
];

/// Roles of an involved-people list that ID3v2.4 keeps in TIPL; any other
/// role names a musician and goes to TMCL.
pub const INVOLVED_ROLES: &[&str] = &["producer", "engineer", "mix", "arranger", "DJ-mix"];

pub fn v22_to_v23(id: &str) -> Option<&'static str> {
    V22_TO_V23.iter().find(|(old, _)| *old == id).map(|(_, new)| *new)
}

pub fn v23_to_v22(id: &str) -> Option<&'static str> {
    V22_TO_V23.iter().find(|(_, new)| *new == id).map(|(old, _)| *old)
}

/// Id of the frame representing `id` in `to`, for frames that only change name.
pub fn convert_frame_id(id: &str, from: Id3v2Version, to: Id3v2Version) -> Option<String> {
    use Id3v2Version::*;

    // Go through ID3v2.3 ids, which both other versions translate to
    let v23 = match from {
        V22 => v22_to_v23(id)?.to_string(),
        V23 | V24 => id.to_string(),
    };
    let converted = match to {
        V22 => v23_to_v22(&v23)?.to_string(),
        V23 | V24 => v23,
    };
    schema::is_known(&converted, to).then_some(converted)
}

/// Components of an ID3v2.4 timestamp in ID3v2.3 form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitDate {
    /// `YYYY`
    pub year: Option<String>,
    /// `DDMM`, or `MM` when the timestamp has no day
    pub date: Option<String>,
    /// `HHMM`
    pub time: Option<String>,
}

fn digits(text: &str, range: std::ops::Range<usize>) -> Option<&str> {
    text.get(range)
        .filter(|part| part.bytes().all(|b| b.is_ascii_digit()))
}

fn separated(text: &str, at: usize, sep: char, len: usize) -> Option<&str> {
    if !text.get(at..)?.starts_with(sep) {
        return None;
    }
    digits(text, at + 1..at + 1 + len)
}

/// Split `yyyy[-MM[-dd[THH[:mm[:ss]]]]]` without inventing missing parts.
pub fn split_timestamp(timestamp: &str) -> SplitDate {
    let ts = timestamp.trim();
    let year = digits(ts, 0..4);
    let month = year.and_then(|_| separated(ts, 4, '-', 2));
    let day = month.and_then(|_| separated(ts, 7, '-', 2));
    let hour = day.and_then(|_| separated(ts, 10, 'T', 2));
    let minute = hour.and_then(|_| separated(ts, 13, ':', 2));

    SplitDate {
        year: year.map(str::to_string),
        date: match (month, day) {
            (Some(month), Some(day)) => Some(format!("{}{}", day, month)),
            (Some(month), None) => Some(month.to_string()),
            _ => None,
        },
        time: match (hour, minute) {
            (Some(hour), Some(minute)) => Some(format!("{}{}", hour, minute)),
            _ => None,
        },
    }
}

/// Merge TYER, TDAT and TIME values into an ID3v2.4 timestamp, leaving out
/// whatever is missing. The time is only kept alongside a full date.
pub fn merge_timestamp(year: Option<&str>, date: Option<&str>, time: Option<&str>) -> Option<String> {
    let mut out = String::new();
    if let Some(year) = year.and_then(|y| digits(y.trim(), 0..4)) {
        out.push_str(year);
    }

    let date = date.map(str::trim);
    let mut has_day = false;
    match date {
        Some(d) if d.len() == 4 && digits(d, 0..4).is_some() => {
            out.push('-');
            out.push_str(&d[2..4]);
            out.push('-');
            out.push_str(&d[0..2]);
            has_day = true;
        }
        Some(d) if d.len() == 2 && digits(d, 0..2).is_some() => {
            out.push('-');
            out.push_str(d);
        }
        _ => {}
    }

    if has_day {
        if let Some(t) = time.map(str::trim).filter(|t| t.len() == 4 && digits(t, 0..4).is_some()) {
            out.push('T');
            out.push_str(&t[0..2]);
            out.push(':');
            out.push_str(&t[2..4]);
        }
    }

    (!out.is_empty()).then_some(out)
}

/// Ids of the split date frames (year, date, time, original year) of a version.
pub fn date_ids(version: Id3v2Version) -> [&'static str; 4] {
    match version {
        Id3v2Version::V22 => ["TYE", "TDA", "TIM", "TOR"],
        _ => ["TYER", "TDAT", "TIME", "TORY"],
    }
}

fn text_frame(id: &str, text: &str, encoding: Encoding) -> Option<Frame> {
    let mut body = FrameBody::new(id).ok()?;
    body.set_text(text).ok()?;
    body.set_encoding(encoding).ok()?;
    Some(Frame::with_body(id, body))
}

fn latin1_text_frame(id: &str, text: &str) -> Option<Frame> {
    text_frame(id, text, Encoding::Latin1)
}

/// Rebuild `body` under the layout of `to_id`, copying fields by name.
fn convert_body(body: &FrameBody, to_id: &str, from: Id3v2Version, to: Id3v2Version) -> Option<FrameBody> {
    let layout = schema::lookup(to_id)?;
    if std::ptr::eq(layout, body.layout()) {
        return Some(body.clone());
    }

    let mut converted = FrameBody::from_layout(layout);
    for (spec, value) in body.fields() {
        let value = match (spec.name, value) {
            ("image_format", FieldValue::Text(format)) => {
                converted
                    .set("mime_type", FieldValue::Text(specs::image_format_to_mime(format)))
                    .ok()?;
                continue;
            }
            ("mime_type", FieldValue::Text(mime)) if converted.get("image_format").is_some() => {
                converted
                    .set("image_format", FieldValue::Text(specs::mime_to_image_format(mime)))
                    .ok()?;
                continue;
            }
            ("frame_id", FieldValue::Text(linked)) => {
                FieldValue::Text(convert_frame_id(linked, from, to).unwrap_or_else(|| linked.clone()))
            }
            (_, value) => value.clone(),
        };
        if converted.get(spec.name).is_some() {
            converted.set(spec.name, value).ok()?;
        }
    }
    Some(converted)
}

/// Convert a frame that keeps its meaning across versions.
fn convert_frame(frame: &Frame, from: Id3v2Version, to: Id3v2Version) -> Option<Frame> {
    let id = match convert_frame_id(frame.id(), from, to) {
        Some(id) => id,
        // Ids no version defines travel unchanged between ID3v2.3 and ID3v2.4
        None if frame.is_opaque()
            && from != Id3v2Version::V22
            && to != Id3v2Version::V22
            && !schema::is_known(frame.id(), from) =>
        {
            frame.id().to_string()
        }
        None => return None,
    };

    match frame.body() {
        Some(body) => {
            let body = convert_body(body, &id, from, to)?;
            let mut converted = Frame::with_body(&id, body);
            converted.flags = frame.flags;
            converted.group_id = frame.group_id;
            Some(converted)
        }
        None => {
            if to == Id3v2Version::V22 {
                log::warn!("{} cannot keep its opaque payload in {}", frame.id(), to);
                return None;
            }
            let mut converted = frame.clone().renamed(&id);
            if from == Id3v2Version::V24 && converted.flags.unsynchronisation {
                let raw = converted.raw_mut()?;
                match unsynch::decode(raw) {
                    Ok(decoded) => *raw = decoded,
                    Err(e) => {
                        log::warn!("{}: {}", frame.id(), e);
                        return None;
                    }
                }
                converted.flags.unsynchronisation = false;
            }
            if to == Id3v2Version::V24 {
                converted.flags.data_length_indicator =
                    converted.flags.compression && converted.data_length().is_some();
            } else if converted.flags.compression && converted.data_length().is_none() {
                log::warn!("{}: compressed without a decompressed size", frame.id());
                converted.set_data_length(Some(0));
            }
            Some(converted)
        }
    }
}

fn body_encoding(frame: &Frame) -> Encoding {
    frame.body().map(FrameBody::encoding).unwrap_or(Encoding::Latin1)
}

/// Build an equivalent tag of version `target`. Frames the target version
/// cannot represent are dropped with a warning.
pub fn convert_tag(source: &Id3v2Tag, target: Id3v2Version) -> Id3v2Tag {
    let from = source.version();
    let mut out = Id3v2Tag::with_options(target, *source.options());
    out.flags.experimental = source.flags.experimental;

    if from == target {
        for frame in source.frames() {
            out.push_frame(frame.clone());
        }
        return out;
    }

    let crossing_v24 = (from == Id3v2Version::V24) != (target == Id3v2Version::V24);
    let source_dates = date_ids(from);

    let mut year = None;
    let mut date = None;
    let mut time = None;
    let mut original_year = None;
    let mut timestamp = None;
    let mut original_timestamp = None;
    let mut involved: Vec<(String, String)> = Vec::new();
    let mut musicians: Vec<(String, String)> = Vec::new();
    let mut pair_encoding = None;

    for frame in source.frames() {
        let id = frame.id();

        if crossing_v24 && frame.body().is_some() {
            let text = frame.text_value().to_string();
            if from == Id3v2Version::V24 {
                match id {
                    "TDRC" => {
                        timestamp = Some(text);
                        continue;
                    }
                    "TDOR" => {
                        original_timestamp = Some(text);
                        continue;
                    }
                    _ => {}
                }
            } else if let Some(pos) = source_dates.iter().position(|d| *d == id) {
                let slot = match pos {
                    0 => &mut year,
                    1 => &mut date,
                    2 => &mut time,
                    _ => &mut original_year,
                };
                *slot = Some(text);
                continue;
            }

            if schema::is_paired(id) {
                let body = frame.body();
                pair_encoding.get_or_insert(body_encoding(frame));
                let values = body.map(FrameBody::values).unwrap_or_default();
                for pair in values.chunks(2) {
                    let role = pair[0].to_string();
                    let name = pair.get(1).copied().unwrap_or_default().to_string();
                    let involved_role = id == "TIPL"
                        || (from != Id3v2Version::V24 && INVOLVED_ROLES.contains(&pair[0]));
                    if involved_role {
                        involved.push((role, name));
                    } else {
                        musicians.push((role, name));
                    }
                }
                continue;
            }
        }

        if from == Id3v2Version::V24 && id == "TMOO" {
            if target == Id3v2Version::V23 {
                if let Some(body) = frame.body() {
                    let mut txxx = FrameBody::from_layout(&schema::USER_TEXT);
                    let moved = txxx
                        .set_text_field("description", "MOOD")
                        .and_then(|_| txxx.set_text(body.text()))
                        .and_then(|_| txxx.set_encoding(body.encoding()));
                    if moved.is_ok() {
                        out.push_frame(Frame::with_body("TXXX", txxx));
                        continue;
                    }
                }
            }
            log::warn!("TMOO has no {} equivalent, dropping it", target);
            continue;
        }
        let is_mood = matches!(id, "TXXX" | "TXX")
            && frame.body().and_then(|b| b.get_text("description")) == Some("MOOD");
        if target == Id3v2Version::V24 && is_mood {
            if let Some(tmoo) = text_frame("TMOO", frame.text_value(), body_encoding(frame)) {
                out.push_frame(tmoo);
                continue;
            }
        }

        match convert_frame(frame, from, target) {
            Some(converted) => out.push_frame(converted),
            None => log::warn!("{} has no {} equivalent, dropping it", id, target),
        }
    }

    if crossing_v24 {
        if target == Id3v2Version::V24 {
            let merged = merge_timestamp(year.as_deref(), date.as_deref(), time.as_deref());
            if let Some(frame) = merged.and_then(|ts| latin1_text_frame("TDRC", &ts)) {
                out.push_frame(frame);
            }
            if let Some(frame) = original_year.and_then(|y| latin1_text_frame("TDOR", y.trim())) {
                out.push_frame(frame);
            }
        } else {
            let [year_id, date_id, time_id, original_id] = date_ids(target);
            if let Some(ts) = timestamp {
                let split = split_timestamp(&ts);
                for (id, value) in [(year_id, split.year), (date_id, split.date), (time_id, split.time)] {
                    if let Some(frame) = value.and_then(|v| latin1_text_frame(id, &v)) {
                        out.push_frame(frame);
                    }
                }
            }
            if let Some(year) = original_timestamp.and_then(|ts| split_timestamp(&ts).year) {
                if let Some(frame) = latin1_text_frame(original_id, &year) {
                    out.push_frame(frame);
                }
            }
        }

        let encoding = pair_encoding.unwrap_or(Encoding::Latin1);
        let pair_frames: Vec<(&str, Vec<(String, String)>)> = match target {
            Id3v2Version::V24 => vec![("TIPL", involved), ("TMCL", musicians)],
            Id3v2Version::V23 => vec![("IPLS", [musicians, involved].concat())],
            Id3v2Version::V22 => vec![("IPL", [musicians, involved].concat())],
        };
        for (id, pairs) in pair_frames {
            if pairs.is_empty() {
                continue;
            }
            let text = pairs
                .iter()
                .flat_map(|(role, name)| [role.as_str(), name.as_str()])
                .collect::<Vec<_>>()
                .join("\0");
            if let Some(frame) = text_frame(id, &text, encoding) {
                out.push_frame(frame);
            }
        }
    }

    log::debug!(
        "Converted {} to {}: {} of {} frames kept",
        from,
        target,
        out.frame_count(),
        source.frame_count()
    );
    out
}
