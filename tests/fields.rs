use id3kit::{
    load_id3, load_id3_from_data, FieldKey, Id3Error, Id3v1Tag, Id3v2Tag, Id3v2Version,
    TagFields, TagOptions,
};

const V22: Id3v2Version = Id3v2Version::V22;
const V23: Id3v2Version = Id3v2Version::V23;
const V24: Id3v2Version = Id3v2Version::V24;

fn reread(tag: &Id3v2Tag) -> Id3v2Tag {
    let data = tag.write(tag.options()).unwrap();
    Id3v2Tag::read(&data, *tag.options()).unwrap()
}

#[test]
fn added_values_keep_their_order() {
    for version in [V22, V23, V24] {
        for key in [FieldKey::Artist, FieldKey::Composer, FieldKey::Barcode] {
            let mut tag = Id3v2Tag::new(version);
            for value in ["A", "B", "C"] {
                tag.add_field(key, &[value]).unwrap();
            }
            assert_eq!(tag.get_field_count(key), 3, "{} in {}", key, version);
            for (index, expected) in ["A", "B", "C"].into_iter().enumerate() {
                assert_eq!(tag.get_field_at(key, index).as_deref(), Some(expected));
            }
            assert_eq!(tag.get_field_at(key, 3), None);
            assert_eq!(reread(&tag).get_all(key), vec!["A", "B", "C"]);
        }
    }
}

#[test_log::test]
fn truncation_policy() {
    let mut strict = Id3v2Tag::new(V24);
    let err = strict.set_field(FieldKey::Key, &["Abmin"]).unwrap_err();
    assert!(matches!(err, Id3Error::FieldLengthExceeded { max: 3, .. }));
    assert!(err.is_contract_violation());
    assert!(strict.is_empty());

    let mut lenient = Id3v2Tag::with_options(V24, TagOptions::new().truncate_text(true));
    lenient.set_field(FieldKey::Key, &["Abmin"]).unwrap();
    let value = lenient.get_first(FieldKey::Key).unwrap();
    assert_eq!(value, "Abm");
    assert_eq!(value.chars().count(), 3);

    let mut v1 = Id3v1Tag::new();
    let long = "t".repeat(40);
    assert!(v1.set_field(FieldKey::Title, &[long.as_str()]).is_err());
    v1.set_options(TagOptions::new().truncate_text(true));
    v1.set_field(FieldKey::Title, &[long.as_str()]).unwrap();
    assert_eq!(v1.title.len(), 30);
}

#[test]
fn unsupported_keys() {
    let mut tag = Id3v2Tag::new(V22);
    assert!(matches!(
        tag.set_field(FieldKey::Mood, &["Calm"]),
        Err(Id3Error::UnsupportedField { .. })
    ));
    assert!(matches!(
        tag.create_field(FieldKey::Mood, &["Calm"]),
        Err(Id3Error::UnsupportedField { .. })
    ));
    assert!(tag.get_all(FieldKey::Mood).is_empty());
    assert!(matches!(
        tag.set_field(FieldKey::Title, &[]),
        Err(Id3Error::InvalidArgument(_))
    ));
    assert!(tag.is_empty());
}

#[test]
fn performers_survive_rendering() {
    for version in [V22, V23, V24] {
        let mut tag = Id3v2Tag::new(version);
        tag.add_field(FieldKey::Performer, &["vocals", "Ann"]).unwrap();
        tag.add_field(FieldKey::Performer, &["bass\0Bob"]).unwrap();
        tag.set_field(FieldKey::Engineer, &["Cid"]).unwrap();
        tag.set_field(FieldKey::Arranger, &["Dee"]).unwrap();

        let read = reread(&tag);
        assert_eq!(
            read.get_all(FieldKey::Performer),
            vec!["vocals\0Ann", "bass\0Bob"],
            "{}",
            version
        );
        assert_eq!(read.get_all(FieldKey::Engineer), vec!["Cid"]);
        assert_eq!(read.get_all(FieldKey::Arranger), vec!["Dee"]);

        let mut edited = read.clone();
        edited.delete_field(FieldKey::Engineer).unwrap();
        assert_eq!(edited.get_field_count(FieldKey::Performer), 2);
        assert_eq!(edited.get_all(FieldKey::Arranger), vec!["Dee"]);
    }
}

#[test]
fn genre_references() {
    let mut tag = Id3v2Tag::new(V23);
    tag.set_field(FieldKey::Genre, &["(17)(32)Remix"]).unwrap();
    assert_eq!(tag.get_all(FieldKey::Genre), vec!["Rock", "Classical", "Remix"]);

    let mut tag = Id3v2Tag::new(V24);
    tag.set_field(FieldKey::Genre, &["Rock", "Vaporwave"]).unwrap();
    tag.add_field(FieldKey::Genre, &["Jazz"]).unwrap();
    assert_eq!(reread(&tag).get_all(FieldKey::Genre), vec!["Rock", "Vaporwave", "Jazz"]);
}

#[test]
fn repeated_urls_and_comments() {
    let mut tag = Id3v2Tag::new(V24);
    tag.add_field(FieldKey::UrlOfficialArtistSite, &["http://one.example"]).unwrap();
    tag.add_field(FieldKey::UrlOfficialArtistSite, &["http://two.example"]).unwrap();
    tag.set_field(FieldKey::UrlDiscogsReleaseSite, &["http://discogs.example/r1"]).unwrap();
    assert!(matches!(
        tag.set_field(FieldKey::UrlLyricsSite, &["http://\u{263A}.example"]),
        Err(Id3Error::InvalidArgument(_))
    ));

    let read = reread(&tag);
    assert_eq!(read.get_frames("WOAR").len(), 2);
    assert_eq!(
        read.get_all(FieldKey::UrlOfficialArtistSite),
        vec!["http://one.example", "http://two.example"]
    );
    assert_eq!(
        read.get_first(FieldKey::UrlDiscogsReleaseSite).as_deref(),
        Some("http://discogs.example/r1")
    );

    let mut tag = read;
    tag.set_field(FieldKey::UrlOfficialArtistSite, &["http://three.example"]).unwrap();
    assert_eq!(tag.get_all(FieldKey::UrlOfficialArtistSite), vec!["http://three.example"]);

    tag.set_field(FieldKey::Comment, &["General"]).unwrap();
    tag.set_user_text("NOTE", "kept").unwrap();
    tag.delete_field(FieldKey::Comment).unwrap();
    assert!(!tag.has_field(FieldKey::Comment));
    assert_eq!(tag.user_text("NOTE").as_deref(), Some("kept"));
}

#[test]
fn unique_ids_and_ratings_render() {
    let mut tag = Id3v2Tag::new(V23);
    tag.set_field(FieldKey::MusicbrainzTrackId, &["b1a9c0e9-d987-4042-ae91-78d6a3267d69"])
        .unwrap();
    tag.set_field(FieldKey::Rating, &["196"]).unwrap();
    assert!(tag.set_field(FieldKey::Rating, &["300"]).is_err());

    let read = reread(&tag);
    assert_eq!(
        read.get_first(FieldKey::MusicbrainzTrackId).as_deref(),
        Some("b1a9c0e9-d987-4042-ae91-78d6a3267d69")
    );
    assert_eq!(read.get_first(FieldKey::Rating).as_deref(), Some("196"));
}

#[test]
fn every_key_has_a_place_in_v24() {
    let tag = Id3v2Tag::new(V24);
    for key in FieldKey::ALL {
        assert!(tag.supports(*key), "{}", key);
        assert_eq!(key.as_str().parse::<FieldKey>().unwrap(), *key);
    }
    assert!("NOT_A_KEY".parse::<FieldKey>().is_err());
}

fn file_data() -> Vec<u8> {
    let mut v2 = Id3v2Tag::new(V23);
    v2.set_field(FieldKey::Title, &["Front"]).unwrap();
    v2.set_field(FieldKey::Artist, &["Band"]).unwrap();

    let mut v1 = Id3v1Tag::new();
    v1.set_field(FieldKey::Title, &["Back"]).unwrap();
    v1.set_field(FieldKey::Track, &["9"]).unwrap();
    v1.set_field(FieldKey::Genre, &["Jazz"]).unwrap();

    let mut data = v2.write(&TagOptions::new().preferred_padding(64)).unwrap();
    data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
    data.extend(std::iter::repeat(0x55).take(400));
    data.extend_from_slice(&v1.write());
    data
}

#[test]
fn loads_both_tags() {
    let loaded = load_id3_from_data(&file_data(), TagOptions::default()).unwrap();

    let v2 = loaded.id3v2.unwrap();
    assert_eq!(v2.version(), V23);
    assert_eq!(v2.get_first(FieldKey::Title).as_deref(), Some("Front"));
    assert_eq!(v2.padding(), 64);

    let v1 = loaded.id3v1.unwrap();
    assert_eq!(v1.get_first(FieldKey::Title).as_deref(), Some("Back"));
    assert_eq!(v1.get_first(FieldKey::Track).as_deref(), Some("9"));
    assert_eq!(v1.get_first(FieldKey::Genre).as_deref(), Some("Jazz"));

    let upgraded = Id3v2Tag::from_id3v1(&v1, V24);
    assert_eq!(upgraded.get_first(FieldKey::Title).as_deref(), Some("Back"));
    assert_eq!(upgraded.get_first(FieldKey::Genre).as_deref(), Some("Jazz"));

    assert!(matches!(
        load_id3_from_data(&[0x55; 300], TagOptions::default()),
        Err(Id3Error::TagNotFound)
    ));
}

#[test]
fn loads_from_a_file() {
    let path = std::env::temp_dir().join(format!("id3kit-load-{}.mp3", std::process::id()));
    std::fs::write(&path, file_data()).unwrap();
    let loaded = load_id3(&path, TagOptions::default());
    std::fs::remove_file(&path).unwrap();

    let loaded = loaded.unwrap();
    assert_eq!(
        loaded.id3v2.unwrap().get_first(FieldKey::Artist).as_deref(),
        Some("Band")
    );
    assert!(loaded.id3v1.is_some());

    assert!(matches!(
        load_id3(std::env::temp_dir().join("id3kit-missing.mp3"), TagOptions::default()),
        Err(Id3Error::Io(_))
    ));
}
