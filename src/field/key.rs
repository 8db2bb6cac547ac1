use std::fmt;
use std::str::FromStr;

use crate::common::error::Id3Error;

macro_rules! field_keys {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Version-independent metadata concepts.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FieldKey {
            $($variant),+
        }

        impl FieldKey {
            pub const ALL: &'static [FieldKey] = &[$(FieldKey::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(FieldKey::$variant => $name),+
                }
            }
        }
    };
}

field_keys! {
    Album => "ALBUM",
    AlbumArtist => "ALBUM_ARTIST",
    AlbumArtistSort => "ALBUM_ARTIST_SORT",
    AlbumSort => "ALBUM_SORT",
    Arranger => "ARRANGER",
    Artist => "ARTIST",
    ArtistSort => "ARTIST_SORT",
    Barcode => "BARCODE",
    Bpm => "BPM",
    CatalogNo => "CATALOG_NO",
    Comment => "COMMENT",
    Compilation => "COMPILATION",
    Composer => "COMPOSER",
    ComposerSort => "COMPOSER_SORT",
    Conductor => "CONDUCTOR",
    Copyright => "COPYRIGHT",
    DiscNo => "DISC_NO",
    DiscTotal => "DISC_TOTAL",
    DjMixer => "DJMIXER",
    Encoder => "ENCODER",
    Engineer => "ENGINEER",
    Genre => "GENRE",
    Grouping => "GROUPING",
    Isrc => "ISRC",
    Key => "KEY",
    Language => "LANGUAGE",
    Lyricist => "LYRICIST",
    Lyrics => "LYRICS",
    Media => "MEDIA",
    Mixer => "MIXER",
    Mood => "MOOD",
    MusicbrainzArtistId => "MUSICBRAINZ_ARTISTID",
    MusicbrainzReleaseId => "MUSICBRAINZ_RELEASEID",
    MusicbrainzTrackId => "MUSICBRAINZ_TRACK_ID",
    MusicipId => "MUSICIP_ID",
    OriginalArtist => "ORIGINAL_ARTIST",
    OriginalYear => "ORIGINAL_YEAR",
    Performer => "PERFORMER",
    Producer => "PRODUCER",
    Rating => "RATING",
    RecordLabel => "RECORD_LABEL",
    Remixer => "REMIXER",
    Subtitle => "SUBTITLE",
    Title => "TITLE",
    TitleSort => "TITLE_SORT",
    Track => "TRACK",
    TrackTotal => "TRACK_TOTAL",
    UrlDiscogsReleaseSite => "URL_DISCOGS_RELEASE_SITE",
    UrlOfficialArtistSite => "URL_OFFICIAL_ARTIST_SITE",
    UrlLyricsSite => "URL_LYRICS_SITE",
    UrlWikipediaArtistSite => "URL_WIKIPEDIA_ARTIST_SITE",
    Year => "YEAR",
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = Id3Error;

    /// Case-insensitive key name, e.g. `album_artist`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Id3Error::InvalidArgument(format!("unknown field key {}", s)))
    }
}
