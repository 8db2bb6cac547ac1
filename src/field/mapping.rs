//! Where each [`FieldKey`] lives in each ID3v2 version.

use crate::field::key::FieldKey;
use crate::id3::header::Id3v2Version;

pub const MUSICBRAINZ_UFID_OWNER: &str = "http://musicbrainz.org";

/// Frame representation of a key in one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTarget {
    /// Text frame, values NUL-separated
    Text(&'static str),
    /// Text frame of genre names or ID3v1 genre references
    Genre(&'static str),
    /// One half of an `n/m` frame
    NumberPart { id: &'static str, total: bool },
    /// ID3v2.4 timestamp frame
    Timestamp(&'static str),
    /// Timestamp split across year, `DDMM` and `HHMM` frames
    SplitDate {
        year: &'static str,
        date: &'static str,
        time: &'static str,
    },
    /// User text frame with a fixed description
    UserText {
        id: &'static str,
        description: &'static str,
    },
    /// User URL frame with a fixed description
    UserUrl {
        id: &'static str,
        description: &'static str,
    },
    /// URL frame, one frame per value
    Url(&'static str),
    /// Comment-like frame with an empty description, one frame per value
    Described(&'static str),
    /// Musician credits: role/name pairs outside the involved-people roles
    Performer(&'static str),
    /// Involved-people pairs with one fixed role
    Role {
        id: &'static str,
        role: &'static str,
    },
    /// Unique file identifier of one owner
    UniqueId {
        id: &'static str,
        owner: &'static str,
    },
    /// Popularimeter rating, 0-255
    Rating(&'static str),
}

impl FieldTarget {
    /// Frame ids the target reads and writes.
    pub fn frame_ids(&self) -> Vec<&'static str> {
        match *self {
            FieldTarget::Text(id)
            | FieldTarget::Genre(id)
            | FieldTarget::NumberPart { id, .. }
            | FieldTarget::Timestamp(id)
            | FieldTarget::UserText { id, .. }
            | FieldTarget::UserUrl { id, .. }
            | FieldTarget::Url(id)
            | FieldTarget::Described(id)
            | FieldTarget::Performer(id)
            | FieldTarget::Role { id, .. }
            | FieldTarget::UniqueId { id, .. }
            | FieldTarget::Rating(id) => vec![id],
            FieldTarget::SplitDate { year, date, time } => vec![year, date, time],
        }
    }
}

/// Plain text keys: (key, ID3v2.3/ID3v2.4 id, ID3v2.2 id).
const TEXT_KEYS: &[(FieldKey, &str, &str)] = &[
    (FieldKey::Album, "TALB", "TAL"),
    (FieldKey::AlbumArtist, "TPE2", "TP2"),
    (FieldKey::AlbumArtistSort, "TSO2", "TS2"),
    (FieldKey::AlbumSort, "TSOA", "TSA"),
    (FieldKey::Artist, "TPE1", "TP1"),
    (FieldKey::ArtistSort, "TSOP", "TSP"),
    (FieldKey::Bpm, "TBPM", "TBP"),
    (FieldKey::Compilation, "TCMP", "TCP"),
    (FieldKey::Composer, "TCOM", "TCM"),
    (FieldKey::ComposerSort, "TSOC", "TSC"),
    (FieldKey::Conductor, "TPE3", "TP3"),
    (FieldKey::Copyright, "TCOP", "TCR"),
    (FieldKey::Encoder, "TENC", "TEN"),
    (FieldKey::Grouping, "TIT1", "TT1"),
    (FieldKey::Isrc, "TSRC", "TRC"),
    (FieldKey::Key, "TKEY", "TKE"),
    (FieldKey::Language, "TLAN", "TLA"),
    (FieldKey::Lyricist, "TEXT", "TXT"),
    (FieldKey::Media, "TMED", "TMT"),
    (FieldKey::OriginalArtist, "TOPE", "TOA"),
    (FieldKey::RecordLabel, "TPUB", "TPB"),
    (FieldKey::Remixer, "TPE4", "TP4"),
    (FieldKey::Subtitle, "TIT3", "TT3"),
    (FieldKey::Title, "TIT2", "TT2"),
    (FieldKey::TitleSort, "TSOT", "TST"),
];

/// Keys stored in user text frames: (key, description).
const USER_TEXT_KEYS: &[(FieldKey, &str)] = &[
    (FieldKey::Barcode, "BARCODE"),
    (FieldKey::CatalogNo, "CATALOGNUMBER"),
    (FieldKey::MusicbrainzArtistId, "MusicBrainz Artist Id"),
    (FieldKey::MusicbrainzReleaseId, "MusicBrainz Album Id"),
    (FieldKey::MusicipId, "MusicIP PUID"),
];

/// Keys stored in user URL frames: (key, description).
const USER_URL_KEYS: &[(FieldKey, &str)] = &[
    (FieldKey::UrlDiscogsReleaseSite, "DISCOGS_RELEASE"),
    (FieldKey::UrlLyricsSite, "LYRICS_SITE"),
    (FieldKey::UrlWikipediaArtistSite, "WIKIPEDIA_ARTIST"),
];

/// Involved-people roles of the role keys.
pub fn role_of(key: FieldKey) -> Option<&'static str> {
    match key {
        FieldKey::Producer => Some("producer"),
        FieldKey::Engineer => Some("engineer"),
        FieldKey::Mixer => Some("mix"),
        FieldKey::Arranger => Some("arranger"),
        FieldKey::DjMixer => Some("DJ-mix"),
        _ => None,
    }
}

/// How `key` is stored in a `version` tag, or `None` when it cannot be.
pub fn target(key: FieldKey, version: Id3v2Version) -> Option<FieldTarget> {
    use Id3v2Version::*;

    let v22 = version == V22;
    let pick = |modern: &'static str, old: &'static str| if v22 { old } else { modern };

    if let Some(&(_, modern, old)) = TEXT_KEYS.iter().find(|(k, _, _)| *k == key) {
        return Some(FieldTarget::Text(pick(modern, old)));
    }
    if let Some(&(_, description)) = USER_TEXT_KEYS.iter().find(|(k, _)| *k == key) {
        return Some(FieldTarget::UserText {
            id: pick("TXXX", "TXX"),
            description,
        });
    }
    if let Some(&(_, description)) = USER_URL_KEYS.iter().find(|(k, _)| *k == key) {
        return Some(FieldTarget::UserUrl {
            id: pick("WXXX", "WXX"),
            description,
        });
    }
    if let Some(role) = role_of(key) {
        let id = match version {
            V24 => "TIPL",
            V23 => "IPLS",
            V22 => "IPL",
        };
        return Some(FieldTarget::Role { id, role });
    }

    let target = match key {
        FieldKey::Genre => FieldTarget::Genre(pick("TCON", "TCO")),
        FieldKey::Track | FieldKey::TrackTotal => FieldTarget::NumberPart {
            id: pick("TRCK", "TRK"),
            total: key == FieldKey::TrackTotal,
        },
        FieldKey::DiscNo | FieldKey::DiscTotal => FieldTarget::NumberPart {
            id: pick("TPOS", "TPA"),
            total: key == FieldKey::DiscTotal,
        },
        FieldKey::Year => match version {
            V24 => FieldTarget::Timestamp("TDRC"),
            V23 => FieldTarget::SplitDate {
                year: "TYER",
                date: "TDAT",
                time: "TIME",
            },
            V22 => FieldTarget::SplitDate {
                year: "TYE",
                date: "TDA",
                time: "TIM",
            },
        },
        FieldKey::OriginalYear => FieldTarget::Text(match version {
            V24 => "TDOR",
            V23 => "TORY",
            V22 => "TOR",
        }),
        FieldKey::Mood => match version {
            V24 => FieldTarget::Text("TMOO"),
            V23 => FieldTarget::UserText {
                id: "TXXX",
                description: "MOOD",
            },
            V22 => return None,
        },
        FieldKey::Comment => FieldTarget::Described(pick("COMM", "COM")),
        FieldKey::Lyrics => FieldTarget::Described(pick("USLT", "ULT")),
        FieldKey::UrlOfficialArtistSite => FieldTarget::Url(pick("WOAR", "WAR")),
        FieldKey::MusicbrainzTrackId => FieldTarget::UniqueId {
            id: pick("UFID", "UFI"),
            owner: MUSICBRAINZ_UFID_OWNER,
        },
        FieldKey::Rating => FieldTarget::Rating(pick("POPM", "POP")),
        FieldKey::Performer => FieldTarget::Performer(match version {
            V24 => "TMCL",
            V23 => "IPLS",
            V22 => "IPL",
        }),
        _ => return None,
    };
    Some(target)
}
