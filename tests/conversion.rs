use id3kit::{FieldKey, Frame, Id3v2Tag, Id3v2Version, TagFields, TagOptions};

const V22: Id3v2Version = Id3v2Version::V22;
const V23: Id3v2Version = Id3v2Version::V23;
const V24: Id3v2Version = Id3v2Version::V24;

fn tag_with(version: Id3v2Version, frames: &[(&str, &str)]) -> Id3v2Tag {
    let mut tag = Id3v2Tag::new(version);
    for (id, value) in frames {
        tag.add_frame(Frame::text(id, value).unwrap()).unwrap();
    }
    tag
}

fn text_of<'a>(tag: &'a Id3v2Tag, id: &str) -> Option<&'a str> {
    tag.get_frame(id).map(Frame::text_value)
}

#[test]
fn full_date_survives_a_v24_round_trip() {
    let source = tag_with(V23, &[("TYER", "2006"), ("TDAT", "3006"), ("TIME", "1234")]);

    let v24 = source.convert(V24);
    assert_eq!(text_of(&v24, "TDRC"), Some("2006-06-30T12:34"));
    assert!(v24.get_frame("TYER").is_none());

    let back = v24.convert(V23);
    assert_eq!(text_of(&back, "TYER"), Some("2006"));
    assert_eq!(text_of(&back, "TDAT"), Some("3006"));
    assert_eq!(text_of(&back, "TIME"), Some("1234"));
    assert!(back.get_frame("TDRC").is_none());
    assert_eq!(back, source);
}

#[test]
fn partial_date_does_not_gain_a_day() {
    let source = tag_with(V24, &[("TDRC", "2006-06")]);

    let v23 = source.convert(V23);
    assert_eq!(text_of(&v23, "TYER"), Some("2006"));
    assert_eq!(text_of(&v23, "TDAT"), Some("06"));
    assert!(v23.get_frame("TIME").is_none());
    assert_eq!(v23.get_first(FieldKey::Year).as_deref(), Some("2006-06"));

    let back = v23.convert(V24);
    assert_eq!(text_of(&back, "TDRC"), Some("2006-06"));
}

#[test]
fn date_without_year() {
    let source = tag_with(V23, &[("TDAT", "3006")]);
    let v24 = source.convert(V24);
    assert_eq!(text_of(&v24, "TDRC"), Some("-06-30"));
}

#[test]
fn time_without_a_day_is_dropped() {
    let source = tag_with(V23, &[("TYER", "1999"), ("TIME", "2200")]);
    let v24 = source.convert(V24);
    assert_eq!(text_of(&v24, "TDRC"), Some("1999"));
}

#[test]
fn v22_dates_and_ids() {
    let source = tag_with(V22, &[("TT2", "Title"), ("TYE", "2001"), ("TDA", "0102")]);
    let v24 = source.convert(V24);
    assert_eq!(text_of(&v24, "TIT2"), Some("Title"));
    assert_eq!(text_of(&v24, "TDRC"), Some("2001-02-01"));

    let v22 = v24.convert(V22);
    assert_eq!(text_of(&v22, "TT2"), Some("Title"));
    assert_eq!(text_of(&v22, "TYE"), Some("2001"));
    assert_eq!(text_of(&v22, "TDA"), Some("0102"));
}

#[test]
fn involved_people_round_trip() {
    let mut v23 = Id3v2Tag::new(V23);
    v23.add_field(FieldKey::Performer, &["guitar", "Ann"]).unwrap();
    v23.set_field(FieldKey::Producer, &["Cid"]).unwrap();

    let v24 = v23.convert(V24);
    assert_eq!(text_of(&v24, "TMCL"), Some("guitar\0Ann"));
    assert_eq!(text_of(&v24, "TIPL"), Some("producer\0Cid"));
    assert_eq!(v24.get_all(FieldKey::Performer), vec!["guitar\0Ann"]);
    assert_eq!(v24.get_all(FieldKey::Producer), vec!["Cid"]);

    let back = v24.convert(V23);
    assert_eq!(text_of(&back, "IPLS"), Some("guitar\0Ann\0producer\0Cid"));
    assert_eq!(back.get_all(FieldKey::Performer), v23.get_all(FieldKey::Performer));
}

#[test]
fn mood_crosses_versions() {
    let mut v24 = Id3v2Tag::new(V24);
    v24.set_field(FieldKey::Mood, &["Calm"]).unwrap();
    assert!(v24.get_frame("TMOO").is_some());

    let v23 = v24.convert(V23);
    assert!(v23.get_frame("TMOO").is_none());
    assert_eq!(v23.get_all(FieldKey::Mood), vec!["Calm"]);
    assert_eq!(v23.convert(V24).get_all(FieldKey::Mood), vec!["Calm"]);

    let v22 = v24.convert(V22);
    assert!(!v22.supports(FieldKey::Mood));
    assert!(v22.get_all(FieldKey::Mood).is_empty());
}

#[test]
fn generic_fields_agree_across_versions() {
    let mut v24 = Id3v2Tag::new(V24);
    v24.set_field(FieldKey::Title, &["Song"]).unwrap();
    v24.set_field(FieldKey::Artist, &["A", "B"]).unwrap();
    v24.set_field(FieldKey::Track, &["3"]).unwrap();
    v24.set_field(FieldKey::TrackTotal, &["12"]).unwrap();
    v24.set_field(FieldKey::Year, &["2010-05-04"]).unwrap();
    v24.set_field(FieldKey::Comment, &["Nice"]).unwrap();
    v24.set_field(FieldKey::Barcode, &["0042"]).unwrap();

    let keys = [
        FieldKey::Title,
        FieldKey::Artist,
        FieldKey::Track,
        FieldKey::TrackTotal,
        FieldKey::Year,
        FieldKey::Comment,
        FieldKey::Barcode,
    ];
    for version in [V23, V22] {
        let converted = v24.convert(version);
        for key in keys {
            assert_eq!(converted.get_all(key), v24.get_all(key), "{} in {}", key, version);
        }
    }
}

#[test]
fn converted_tags_render() {
    let source = tag_with(V23, &[("TIT2", "Title"), ("TYER", "2006"), ("TDAT", "3006")]);
    let v24 = source.convert(V24);
    let written = v24.write(&TagOptions::default()).unwrap();
    let read = Id3v2Tag::read(&written, TagOptions::default()).unwrap();
    assert_eq!(read.version(), V24);
    assert_eq!(read, v24);
}
