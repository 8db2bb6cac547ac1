use crate::id3::header::Id3v2Version;

/// Text encoding types used in ID3v2 frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Encoding {
    Latin1 = 0,
    Utf16 = 1,
    Utf16Be = 2,
    Utf8 = 3,
}

impl Encoding {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Encoding::Latin1),
            1 => Some(Encoding::Utf16),
            2 => Some(Encoding::Utf16Be),
            3 => Some(Encoding::Utf8),
            _ => None,
        }
    }

    /// Default encoding for text that Latin-1 cannot hold.
    pub fn default_for_version(version: Id3v2Version) -> Self {
        if version == Id3v2Version::V24 {
            Encoding::Utf8
        } else {
            Encoding::Utf16
        }
    }

    /// UTF-16BE without BOM and UTF-8 only exist from ID3v2.4 on.
    pub fn is_supported(self, version: Id3v2Version) -> bool {
        match self {
            Encoding::Latin1 | Encoding::Utf16 => true,
            Encoding::Utf16Be | Encoding::Utf8 => version == Id3v2Version::V24,
        }
    }

    /// Encoding actually written for `texts` stored with `self` in a `version` tag.
    pub fn for_write<'a, I>(self, version: Id3v2Version, texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            Encoding::Latin1 => {
                if texts.into_iter().all(is_latin1) {
                    Encoding::Latin1
                } else {
                    Encoding::Utf16
                }
            }
            enc if enc.is_supported(version) => enc,
            _ => Encoding::Utf16,
        }
    }

    /// Size of the null terminator for the encoding.
    pub fn terminator_len(self) -> usize {
        match self {
            Encoding::Latin1 | Encoding::Utf8 => 1,
            Encoding::Utf16 | Encoding::Utf16Be => 2,
        }
    }
}

/// Whether every character of `text` fits in ISO-8859-1.
pub fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| (c as u32) <= 0xFF)
}

/// Decode text from bytes using the specified encoding.
///
/// NUL-separated segments of UTF-16 text are decoded one by one, each with
/// its own BOM; a segment without BOM keeps the byte order of the previous one.
pub fn decode_text(data: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Latin1 => {
            // Fast path: if all bytes are ASCII, avoid per-char conversion
            if data.is_ascii() {
                String::from_utf8_lossy(data).into_owned()
            } else {
                data.iter().map(|&b| b as char).collect()
            }
        }
        Encoding::Utf16 => {
            let mut out = String::new();
            let mut big_endian = false;
            for (i, segment) in utf16_segments(data).enumerate() {
                if i > 0 {
                    out.push('\0');
                }
                let body = match segment {
                    [0xFF, 0xFE, rest @ ..] => {
                        big_endian = false;
                        rest
                    }
                    [0xFE, 0xFF, rest @ ..] => {
                        big_endian = true;
                        rest
                    }
                    // No BOM: inherit the byte order, little-endian to start with
                    other => other,
                };
                let decoder = if big_endian {
                    encoding_rs::UTF_16BE
                } else {
                    encoding_rs::UTF_16LE
                };
                let (text, _) = decoder.decode_without_bom_handling(body);
                out.push_str(&text);
            }
            out
        }
        Encoding::Utf16Be => {
            let (result, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(data);
            result.into_owned()
        }
        Encoding::Utf8 => {
            // Some writers prefix UTF-8 text with a BOM
            let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
            match std::str::from_utf8(data) {
                Ok(s) => s.to_string(),
                Err(_) => String::from_utf8_lossy(data).into_owned(),
            }
        }
    }
}

/// Split UTF-16 data on code-unit aligned double-NUL separators.
fn utf16_segments(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = Some(data);
    std::iter::from_fn(move || {
        let current = rest?;
        match find_null_terminator(current, Encoding::Utf16) {
            Some(pos) => {
                rest = Some(&current[pos + 2..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Encode text to bytes using the specified encoding.
///
/// For UTF-16 every NUL-separated value gets its own BOM.
pub fn encode_text(text: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Latin1 => text
            .chars()
            .map(|c| if c as u32 <= 0xFF { c as u8 } else { b'?' })
            .collect(),
        Encoding::Utf16 => {
            let mut result = Vec::with_capacity(2 + text.len() * 2);
            for (i, segment) in text.split('\0').enumerate() {
                if i > 0 {
                    result.extend_from_slice(&[0, 0]);
                }
                result.extend_from_slice(&[0xFF, 0xFE]); // BOM (LE)
                for c in segment.encode_utf16() {
                    result.extend_from_slice(&c.to_le_bytes());
                }
            }
            result
        }
        Encoding::Utf16Be => {
            let mut result = Vec::with_capacity(text.len() * 2);
            for c in text.encode_utf16() {
                result.extend_from_slice(&c.to_be_bytes());
            }
            result
        }
        Encoding::Utf8 => text.as_bytes().to_vec(),
    }
}

/// Find the null terminator for the given encoding.
/// Returns the position of the null terminator (not including it).
pub fn find_null_terminator(data: &[u8], encoding: Encoding) -> Option<usize> {
    match encoding {
        Encoding::Latin1 | Encoding::Utf8 => memchr::memchr(0, data),
        Encoding::Utf16 | Encoding::Utf16Be => {
            // Only terminators that start on a code unit boundary count
            memchr::memchr_iter(0, data)
                .filter(|&pos| pos % 2 == 0)
                .find(|&pos| data.get(pos + 1) == Some(&0))
        }
    }
}

/// Picture type enum matching ID3v2 APIC frame specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PictureType {
    Other = 0,
    FileIcon = 1,
    OtherFileIcon = 2,
    CoverFront = 3,
    CoverBack = 4,
    LeafletPage = 5,
    Media = 6,
    LeadArtist = 7,
    Artist = 8,
    Conductor = 9,
    Band = 10,
    Composer = 11,
    Lyricist = 12,
    RecordingLocation = 13,
    DuringRecording = 14,
    DuringPerformance = 15,
    MovieCapture = 16,
    AFishEvenBrighter = 17,
    Illustration = 18,
    BandLogo = 19,
    PublisherLogo = 20,
}

impl PictureType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            1 => PictureType::FileIcon,
            2 => PictureType::OtherFileIcon,
            3 => PictureType::CoverFront,
            4 => PictureType::CoverBack,
            5 => PictureType::LeafletPage,
            6 => PictureType::Media,
            7 => PictureType::LeadArtist,
            8 => PictureType::Artist,
            9 => PictureType::Conductor,
            10 => PictureType::Band,
            11 => PictureType::Composer,
            12 => PictureType::Lyricist,
            13 => PictureType::RecordingLocation,
            14 => PictureType::DuringRecording,
            15 => PictureType::DuringPerformance,
            16 => PictureType::MovieCapture,
            17 => PictureType::AFishEvenBrighter,
            18 => PictureType::Illustration,
            19 => PictureType::BandLogo,
            20 => PictureType::PublisherLogo,
            _ => PictureType::Other,
        }
    }
}

/// Map an ID3v2.2 three-character image format to a MIME type.
pub fn image_format_to_mime(format: &str) -> String {
    match format.trim().to_ascii_uppercase().as_str() {
        "JPG" | "JPEG" => "image/jpeg".to_string(),
        "PNG" => "image/png".to_string(),
        "GIF" => "image/gif".to_string(),
        "BMP" => "image/bmp".to_string(),
        "-->" => "-->".to_string(),
        other => format!("image/{}", other.to_ascii_lowercase()),
    }
}

/// Map a MIME type to an ID3v2.2 three-character image format.
pub fn mime_to_image_format(mime: &str) -> String {
    match mime.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "JPG".to_string(),
        "image/png" => "PNG".to_string(),
        "image/gif" => "GIF".to_string(),
        "image/bmp" => "BMP".to_string(),
        "-->" => "-->".to_string(),
        other => {
            let subtype = other.rsplit('/').next().unwrap_or(other);
            subtype.to_ascii_uppercase().chars().take(3).collect()
        }
    }
}

/// ID3v1 genre list (index → genre name).
pub const GENRES: &[&str] = &[
    "Blues", "Classic Rock", "Country", "Dance", "Disco", "Funk", "Grunge",
    "Hip-Hop", "Jazz", "Metal", "New Age", "Oldies", "Other", "Pop", "R&B",
    "Rap", "Reggae", "Rock", "Techno", "Industrial", "Alternative", "Ska",
    "Death Metal", "Pranks", "Soundtrack", "Euro-Techno", "Ambient",
    "Trip-Hop", "Vocal", "Jazz+Funk", "Fusion", "Trance", "Classical",
    "Instrumental", "Acid", "House", "Game", "Sound Clip", "Gospel", "Noise",
    "AlternRock", "Bass", "Soul", "Punk", "Space", "Meditative",
    "Instrumental Pop", "Instrumental Rock", "Ethnic", "Gothic", "Darkwave",
    "Techno-Industrial", "Electronic", "Pop-Folk", "Eurodance", "Dream",
    "Southern Rock", "Comedy", "Cult", "Gangsta", "Top 40", "Christian Rap",
    "Pop/Funk", "Jungle", "Native American", "Cabaret", "New Wave",
    "Psychedelic", "Rave", "Showtunes", "Trailer", "Lo-Fi", "Tribal",
    "Acid Punk", "Acid Jazz", "Polka", "Retro", "Musical", "Rock & Roll",
    "Hard Rock", "Folk", "Folk-Rock", "National Folk", "Swing", "Fast Fusion",
    "Bebop", "Latin", "Revival", "Celtic", "Bluegrass", "Avantgarde",
    "Gothic Rock", "Progressive Rock", "Psychedelic Rock", "Symphonic Rock",
    "Slow Rock", "Big Band", "Chorus", "Easy Listening", "Acoustic", "Humour",
    "Speech", "Chanson", "Opera", "Chamber Music", "Sonata", "Symphony",
    "Booty Bass", "Primus", "Porn Groove", "Satire", "Slow Jam", "Club",
    "Tango", "Samba", "Folklore", "Ballad", "Power Ballad", "Rhythmic Soul",
    "Freestyle", "Duet", "Punk Rock", "Drum Solo", "A capella", "Euro-House",
    "Dance Hall", "Goa", "Drum & Bass", "Club-House", "Hardcore Techno",
    "Terror", "Indie", "BritPop", "Negerpunk", "Polsk Punk", "Beat",
    "Christian Gangsta Rap", "Heavy Metal", "Black Metal", "Crossover",
    "Contemporary Christian", "Christian Rock", "Merengue", "Salsa",
    "Thrash Metal", "Anime", "Jpop", "Synthpop", "Abstract", "Art Rock",
    "Baroque", "Bhangra", "Big Beat", "Breakbeat", "Chillout", "Downtempo",
    "Dub", "EBM", "Eclectic", "Electro", "Electroclash", "Emo", "Experimental",
    "Garage", "Global", "IDM", "Illbient", "Industro-Goth", "Jam Band",
    "Krautrock", "Leftfield", "Lounge", "Math Rock", "New Romantic",
    "Nu-Breakz", "Post-Punk", "Post-Rock", "Psytrance", "Shoegaze",
    "Space Rock", "Trop Rock", "World Music", "Neoclassical", "Audiobook",
    "Audio Theatre", "Neue Deutsche Welle", "Podcast", "Indie Rock",
    "G-Funk", "Dubstep", "Garage Rock", "Psybient",
];

/// Index of a genre name in the ID3v1 list, case-insensitively.
pub fn genre_index(name: &str) -> Option<u8> {
    GENRES
        .iter()
        .position(|g| g.eq_ignore_ascii_case(name.trim()))
        .map(|i| i as u8)
}

/// Resolve a single numeric genre reference.
fn numeric_genre(num: usize, fallback: &str) -> String {
    match GENRES.get(num) {
        Some(name) => (*name).to_string(),
        None => fallback.to_string(),
    }
}

/// Parse TCON (content type / genre) value.
/// Handles formats like: "Rock", "(17)", "(17)Rock", "17", "(RX)", "(CR)"
pub fn parse_genre(text: &str) -> Vec<String> {
    let mut genres = Vec::new();
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return genres;
    }

    let mut remaining = trimmed;

    while !remaining.is_empty() {
        if let Some(after_paren) = remaining.strip_prefix('(') {
            // "((" escapes a literal parenthesis in ID3v2.3
            if after_paren.starts_with('(') {
                genres.push(after_paren.to_string());
                break;
            }
            if let Some(close) = after_paren.find(')') {
                let inner = &after_paren[..close];
                remaining = &after_paren[close + 1..];

                match inner {
                    "RX" => genres.push("Remix".to_string()),
                    "CR" => genres.push("Cover".to_string()),
                    _ => match inner.parse::<usize>() {
                        Ok(num) => genres.push(numeric_genre(num, &format!("Unknown({})", num))),
                        Err(_) => genres.push(inner.to_string()),
                    },
                }
            } else {
                // No close paren, take the rest as-is
                genres.push(remaining.to_string());
                break;
            }
        } else {
            // Null-separated genres (ID3v2.4)
            for part in remaining.split('\0') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                match part {
                    "RX" => genres.push("Remix".to_string()),
                    "CR" => genres.push("Cover".to_string()),
                    _ => match part.parse::<usize>() {
                        Ok(num) => genres.push(numeric_genre(num, part)),
                        Err(_) => genres.push(part.to_string()),
                    },
                }
            }
            break;
        }
    }

    // "(17)Rock" names the same genre twice
    genres.dedup();

    if genres.is_empty() {
        genres.push(trimmed.to_string());
    }

    genres
}

/// Encode a genre name for a TCON frame.
///
/// Known ID3v1 genres are written as a numeric reference unless `as_text`
/// is set: `(17)` up to ID3v2.3, a bare `17` in ID3v2.4.
pub fn encode_genre(name: &str, version: Id3v2Version, as_text: bool) -> String {
    if as_text {
        return name.to_string();
    }
    match genre_index(name) {
        Some(idx) if version == Id3v2Version::V24 => {
            let mut buf = itoa::Buffer::new();
            buf.format(idx).to_string()
        }
        Some(idx) => {
            let mut buf = itoa::Buffer::new();
            format!("({})", buf.format(idx))
        }
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_segments_carry_bom() {
        let encoded = encode_text("a\0b", Encoding::Utf16);
        assert_eq!(
            encoded,
            vec![0xFF, 0xFE, b'a', 0, 0, 0, 0xFF, 0xFE, b'b', 0]
        );
        assert_eq!(decode_text(&encoded, Encoding::Utf16), "a\0b");
    }

    #[test]
    fn utf16_inherits_byte_order() {
        // Big-endian BOM on the first segment, none on the second
        let data = [0xFE, 0xFF, 0, b'x', 0, 0, 0, b'y'];
        assert_eq!(decode_text(&data, Encoding::Utf16), "x\0y");
    }

    #[test]
    fn utf16_terminator_alignment() {
        // 0x0100 followed by 0x0041: the zero bytes straddle a code unit boundary
        let data = [0x00, 0x01, 0x00, 0x41, 0x00, 0x00];
        assert_eq!(find_null_terminator(&data, Encoding::Utf16), Some(4));
        assert_eq!(find_null_terminator(b"ab\0c", Encoding::Latin1), Some(2));
    }

    #[test]
    fn latin1_replaces_unrepresentable() {
        assert_eq!(encode_text("a\u{263A}", Encoding::Latin1), b"a?".to_vec());
        assert_eq!(decode_text(&[0xE9], Encoding::Latin1), "\u{e9}");
    }

    #[test]
    fn write_encoding_policy() {
        let v23 = Id3v2Version::V23;
        assert_eq!(Encoding::Latin1.for_write(v23, ["plain"]), Encoding::Latin1);
        assert_eq!(Encoding::Latin1.for_write(v23, ["\u{263A}"]), Encoding::Utf16);
        assert_eq!(Encoding::Utf8.for_write(v23, ["x"]), Encoding::Utf16);
        assert_eq!(Encoding::Utf16Be.for_write(v23, ["x"]), Encoding::Utf16);
        assert_eq!(
            Encoding::Utf8.for_write(Id3v2Version::V24, ["x"]),
            Encoding::Utf8
        );
    }

    #[test]
    fn genre_references() {
        assert_eq!(parse_genre("(17)"), vec!["Rock"]);
        assert_eq!(parse_genre("(17)Rock"), vec!["Rock"]);
        assert_eq!(parse_genre("17\0Jazz"), vec!["Rock", "Jazz"]);
        assert_eq!(parse_genre("(RX)(CR)"), vec!["Remix", "Cover"]);
        assert_eq!(parse_genre("Shoegaze Revival"), vec!["Shoegaze Revival"]);
    }

    #[test]
    fn genre_encoding_per_version() {
        assert_eq!(encode_genre("Rock", Id3v2Version::V23, false), "(17)");
        assert_eq!(encode_genre("rock", Id3v2Version::V24, false), "17");
        assert_eq!(encode_genre("Rock", Id3v2Version::V24, true), "Rock");
        assert_eq!(encode_genre("Vaporwave", Id3v2Version::V23, false), "Vaporwave");
    }

    #[test]
    fn picture_format_mapping() {
        assert_eq!(image_format_to_mime("JPG"), "image/jpeg");
        assert_eq!(mime_to_image_format("image/png"), "PNG");
        assert_eq!(mime_to_image_format("image/webp"), "WEB");
    }
}
