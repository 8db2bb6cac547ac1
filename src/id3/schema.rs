//! Frame body layouts and per-version frame registries.
//!
//! Every frame id with a known body maps to a [`FrameLayout`]: the ordered
//! fields of its body. Ids known to a version but without a layout here are
//! kept as opaque frames.

use crate::id3::datatype::FieldKind::*;
use crate::id3::datatype::FieldSpec;
use crate::id3::header::Id3v2Version;

/// Body layout shared by a family of frame ids.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameLayout {
    /// Family name used in diagnostics
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
    /// Fields appended to the frame id to tell repeated frames apart
    pub qualifiers: &'static [&'static str],
}

const fn f(name: &'static str, kind: crate::id3::datatype::FieldKind) -> FieldSpec {
    FieldSpec::new(name, kind)
}

pub static TEXT: FrameLayout = FrameLayout {
    name: "text",
    fields: &[f("text_encoding", TextEncoding), f("text", TextRest)],
    qualifiers: &[],
};

/// TIPL, TMCL and IPLS: role/name pairs as alternating NUL-separated values
pub static PAIRED_TEXT: FrameLayout = FrameLayout {
    name: "paired text",
    fields: &[f("text_encoding", TextEncoding), f("text", TextRest)],
    qualifiers: &[],
};

pub static USER_TEXT: FrameLayout = FrameLayout {
    name: "user text",
    fields: &[
        f("text_encoding", TextEncoding),
        f("description", TextNullTerminated),
        f("text", TextRest),
    ],
    qualifiers: &["description"],
};

pub static URL: FrameLayout = FrameLayout {
    name: "url",
    fields: &[f("url", Latin1Rest)],
    qualifiers: &[],
};

pub static USER_URL: FrameLayout = FrameLayout {
    name: "user url",
    fields: &[
        f("text_encoding", TextEncoding),
        f("description", TextNullTerminated),
        f("url", Latin1Rest),
    ],
    qualifiers: &["description"],
};

pub static COMMENT: FrameLayout = FrameLayout {
    name: "comment",
    fields: &[
        f("text_encoding", TextEncoding),
        f("language", Language),
        f("description", TextNullTerminated),
        f("text", TextRest),
    ],
    qualifiers: &["description", "language"],
};

pub static PICTURE: FrameLayout = FrameLayout {
    name: "picture",
    fields: &[
        f("text_encoding", TextEncoding),
        f("mime_type", Latin1NullTerminated),
        f("picture_type", NumberFixed(1)),
        f("description", TextNullTerminated),
        f("picture_data", BytesRest),
    ],
    qualifiers: &["description"],
};

/// ID3v2.2 PIC: three-character image format instead of a MIME type
pub static PICTURE_V22: FrameLayout = FrameLayout {
    name: "picture",
    fields: &[
        f("text_encoding", TextEncoding),
        f("image_format", FixedString { len: 3, pad: b' ' }),
        f("picture_type", NumberFixed(1)),
        f("description", TextNullTerminated),
        f("picture_data", BytesRest),
    ],
    qualifiers: &["description"],
};

pub static UNIQUE_FILE_ID: FrameLayout = FrameLayout {
    name: "unique file id",
    fields: &[f("owner", Latin1NullTerminated), f("identifier", BytesRest)],
    qualifiers: &["owner"],
};

pub static POPULARIMETER: FrameLayout = FrameLayout {
    name: "popularimeter",
    fields: &[
        f("email", Latin1NullTerminated),
        f("rating", NumberFixed(1)),
        f("counter", NumberVariable { min: 4 }),
    ],
    qualifiers: &["email"],
};

pub static PLAY_COUNTER: FrameLayout = FrameLayout {
    name: "play counter",
    fields: &[f("counter", NumberVariable { min: 4 })],
    qualifiers: &[],
};

pub static PRIVATE: FrameLayout = FrameLayout {
    name: "private",
    fields: &[f("owner", Latin1NullTerminated), f("data", BytesRest)],
    qualifiers: &["owner"],
};

pub static GENERAL_OBJECT: FrameLayout = FrameLayout {
    name: "general object",
    fields: &[
        f("text_encoding", TextEncoding),
        f("mime_type", Latin1NullTerminated),
        f("filename", TextNullTerminated),
        f("description", TextNullTerminated),
        f("data", BytesRest),
    ],
    qualifiers: &["description"],
};

pub static RECOMMENDED_BUFFER: FrameLayout = FrameLayout {
    name: "recommended buffer size",
    fields: &[
        f("buffer_size", NumberFixed(3)),
        f("embedded_info", BooleanByte),
        f("offset", NumberVariable { min: 4 }),
    ],
    qualifiers: &[],
};

pub static MUSIC_CD_ID: FrameLayout = FrameLayout {
    name: "music cd identifier",
    fields: &[f("toc", BytesRest)],
    qualifiers: &[],
};

/// ID3v2.2 encrypted meta frame
pub static ENCRYPTED_META: FrameLayout = FrameLayout {
    name: "encrypted meta",
    fields: &[
        f("owner", Latin1NullTerminated),
        f("description", Latin1NullTerminated),
        f("data", BytesRest),
    ],
    qualifiers: &["owner"],
};

pub static ENCRYPTION_REGISTRATION: FrameLayout = FrameLayout {
    name: "encryption method registration",
    fields: &[
        f("owner", Latin1NullTerminated),
        f("method", NumberFixed(1)),
        f("data", BytesRest),
    ],
    qualifiers: &["owner"],
};

pub static GROUP_REGISTRATION: FrameLayout = FrameLayout {
    name: "group identification registration",
    fields: &[
        f("owner", Latin1NullTerminated),
        f("group_symbol", NumberFixed(1)),
        f("data", BytesRest),
    ],
    qualifiers: &["owner"],
};

pub static TERMS_OF_USE: FrameLayout = FrameLayout {
    name: "terms of use",
    fields: &[
        f("text_encoding", TextEncoding),
        f("language", Language),
        f("text", TextRest),
    ],
    qualifiers: &["language"],
};

pub static AUDIO_ENCRYPTION: FrameLayout = FrameLayout {
    name: "audio encryption",
    fields: &[
        f("owner", Latin1NullTerminated),
        f("preview_start", NumberFixed(2)),
        f("preview_length", NumberFixed(2)),
        f("encryption_info", BytesRest),
    ],
    qualifiers: &["owner"],
};

pub static EVENT_TIMING: FrameLayout = FrameLayout {
    name: "event timing codes",
    fields: &[f("time_stamp_format", NumberFixed(1)), f("events", BytesRest)],
    qualifiers: &[],
};

pub static TEMPO_CODES: FrameLayout = FrameLayout {
    name: "synchronised tempo codes",
    fields: &[f("time_stamp_format", NumberFixed(1)), f("tempo_data", BytesRest)],
    qualifiers: &[],
};

pub static LOOKUP_TABLE: FrameLayout = FrameLayout {
    name: "mpeg location lookup table",
    fields: &[
        f("frames_between_reference", NumberFixed(2)),
        f("bytes_between_reference", NumberFixed(3)),
        f("millis_between_reference", NumberFixed(3)),
        f("bits_for_bytes_deviation", NumberFixed(1)),
        f("bits_for_millis_deviation", NumberFixed(1)),
        f("deviations", BytesRest),
    ],
    qualifiers: &[],
};

pub static REVERB: FrameLayout = FrameLayout {
    name: "reverb",
    fields: &[f("settings", BytesSized(12))],
    qualifiers: &[],
};

pub static RELATIVE_VOLUME: FrameLayout = FrameLayout {
    name: "relative volume adjustment",
    fields: &[
        f("increment_flags", NumberFixed(1)),
        f("bits_used", NumberFixed(1)),
        f("adjustments", BytesRest),
    ],
    qualifiers: &[],
};

pub static SEEK_FRAME: FrameLayout = FrameLayout {
    name: "seek",
    fields: &[f("offset", NumberFixed(4))],
    qualifiers: &[],
};

pub static SEEK_INDEX: FrameLayout = FrameLayout {
    name: "audio seek point index",
    fields: &[
        f("data_start", NumberFixed(4)),
        f("data_length", NumberFixed(4)),
        f("index_points", NumberFixed(2)),
        f("bits_per_point", NumberFixed(1)),
        f("points", BytesRest),
    ],
    qualifiers: &[],
};

pub static COMMERCIAL: FrameLayout = FrameLayout {
    name: "commercial",
    fields: &[
        f("text_encoding", TextEncoding),
        f("price", Latin1NullTerminated),
        f("valid_until", FixedString { len: 8, pad: b'0' }),
        f("contact_url", Latin1NullTerminated),
        f("received_as", NumberFixed(1)),
        f("seller", TextNullTerminated),
        f("description", TextNullTerminated),
        f("logo_mime_type", Latin1NullTerminated),
        f("logo", BytesRest),
    ],
    qualifiers: &[],
};

pub static OWNERSHIP: FrameLayout = FrameLayout {
    name: "ownership",
    fields: &[
        f("text_encoding", TextEncoding),
        f("price", Latin1NullTerminated),
        f("purchase_date", FixedString { len: 8, pad: b'0' }),
        f("seller", TextRest),
    ],
    qualifiers: &[],
};

pub static SIGNATURE: FrameLayout = FrameLayout {
    name: "signature",
    fields: &[f("group_symbol", NumberFixed(1)), f("signature", BytesRest)],
    qualifiers: &[],
};

pub static POSITION: FrameLayout = FrameLayout {
    name: "position synchronisation",
    fields: &[
        f("time_stamp_format", NumberFixed(1)),
        f("position", NumberVariable { min: 4 }),
    ],
    qualifiers: &[],
};

pub static LINKED_INFO: FrameLayout = FrameLayout {
    name: "linked information",
    fields: &[
        f("frame_id", FixedString { len: 4, pad: b' ' }),
        f("url", Latin1NullTerminated),
        f("id_data", Latin1Rest),
    ],
    qualifiers: &[],
};

pub static LINKED_INFO_V22: FrameLayout = FrameLayout {
    name: "linked information",
    fields: &[
        f("frame_id", FixedString { len: 3, pad: b' ' }),
        f("url", Latin1NullTerminated),
        f("id_data", Latin1Rest),
    ],
    qualifiers: &[],
};

/// Body layout for a frame id, if it has one.
pub fn lookup(id: &str) -> Option<&'static FrameLayout> {
    let layout = match id {
        "TXXX" | "TXX" => &USER_TEXT,
        "WXXX" | "WXX" => &USER_URL,
        "TIPL" | "TMCL" | "IPLS" | "IPL" => &PAIRED_TEXT,
        "COMM" | "COM" | "USLT" | "ULT" => &COMMENT,
        "APIC" => &PICTURE,
        "PIC" => &PICTURE_V22,
        "UFID" | "UFI" => &UNIQUE_FILE_ID,
        "POPM" | "POP" => &POPULARIMETER,
        "PCNT" | "CNT" => &PLAY_COUNTER,
        "PRIV" => &PRIVATE,
        "GEOB" | "GEO" => &GENERAL_OBJECT,
        "RBUF" | "BUF" => &RECOMMENDED_BUFFER,
        "MCDI" | "MCI" => &MUSIC_CD_ID,
        "CRM" => &ENCRYPTED_META,
        "ENCR" => &ENCRYPTION_REGISTRATION,
        "GRID" => &GROUP_REGISTRATION,
        "USER" => &TERMS_OF_USE,
        "AENC" | "CRA" => &AUDIO_ENCRYPTION,
        "ETCO" | "ETC" => &EVENT_TIMING,
        "SYTC" | "STC" => &TEMPO_CODES,
        "MLLT" | "MLL" => &LOOKUP_TABLE,
        "RVRB" | "REV" => &REVERB,
        "RVAD" | "RVA" => &RELATIVE_VOLUME,
        "SEEK" => &SEEK_FRAME,
        "ASPI" => &SEEK_INDEX,
        "COMR" => &COMMERCIAL,
        "OWNE" => &OWNERSHIP,
        "SIGN" => &SIGNATURE,
        "POSS" => &POSITION,
        "LINK" => &LINKED_INFO,
        "LNK" => &LINKED_INFO_V22,
        _ if id.starts_with('T') => &TEXT,
        _ if id.starts_with('W') => &URL,
        _ => return None,
    };
    Some(layout)
}

const V22_FRAMES: &[&str] = &[
    "BUF", "CNT", "COM", "CRA", "CRM", "ETC", "EQU", "GEO", "IPL", "LNK", "MCI", "MLL",
    "PIC", "POP", "REV", "RVA", "SLT", "STC", "TAL", "TBP", "TCM", "TCO", "TCR", "TDA",
    "TDY", "TEN", "TFT", "TIM", "TKE", "TLA", "TLE", "TMT", "TOA", "TOF", "TOL", "TOR",
    "TOT", "TP1", "TP2", "TP3", "TP4", "TPA", "TPB", "TRC", "TRD", "TRK", "TSI", "TSS",
    "TT1", "TT2", "TT3", "TXT", "TXX", "TYE", "UFI", "ULT", "WAF", "WAR", "WAS", "WCM",
    "WCP", "WPB", "WXX",
    // iTunes extensions
    "TCP", "TS2", "TSA", "TSC", "TSP", "TST",
];

const V23_FRAMES: &[&str] = &[
    "AENC", "APIC", "COMM", "COMR", "ENCR", "EQUA", "ETCO", "GEOB", "GRID", "IPLS",
    "LINK", "MCDI", "MLLT", "OWNE", "PCNT", "POPM", "POSS", "PRIV", "RBUF", "RVAD",
    "RVRB", "SYLT", "SYTC", "TALB", "TBPM", "TCOM", "TCON", "TCOP", "TDAT", "TDLY",
    "TENC", "TEXT", "TFLT", "TIME", "TIT1", "TIT2", "TIT3", "TKEY", "TLAN", "TLEN",
    "TMED", "TOAL", "TOFN", "TOLY", "TOPE", "TORY", "TOWN", "TPE1", "TPE2", "TPE3",
    "TPE4", "TPOS", "TPUB", "TRCK", "TRDA", "TRSN", "TRSO", "TSIZ", "TSRC", "TSSE",
    "TXXX", "TYER", "UFID", "USER", "USLT", "WCOM", "WCOP", "WOAF", "WOAR", "WOAS",
    "WORS", "WPAY", "WPUB", "WXXX",
    // iTunes extensions
    "TCMP", "TSO2", "TSOA", "TSOC", "TSOP", "TSOT",
];

const V24_FRAMES: &[&str] = &[
    "AENC", "APIC", "ASPI", "COMM", "COMR", "ENCR", "EQU2", "ETCO", "GEOB", "GRID",
    "LINK", "MCDI", "MLLT", "OWNE", "PCNT", "POPM", "POSS", "PRIV", "RBUF", "RVA2",
    "RVRB", "SEEK", "SIGN", "SYLT", "SYTC", "TALB", "TBPM", "TCOM", "TCON", "TCOP",
    "TDEN", "TDLY", "TDOR", "TDRC", "TDRL", "TDTG", "TENC", "TEXT", "TFLT", "TIPL",
    "TIT1", "TIT2", "TIT3", "TKEY", "TLAN", "TLEN", "TMCL", "TMED", "TMOO", "TOAL",
    "TOFN", "TOLY", "TOPE", "TOWN", "TPE1", "TPE2", "TPE3", "TPE4", "TPOS", "TPRO",
    "TPUB", "TRCK", "TRSN", "TRSO", "TSOA", "TSOP", "TSOT", "TSRC", "TSSE", "TSST",
    "TXXX", "UFID", "USER", "USLT", "WCOM", "WCOP", "WOAF", "WOAR", "WOAS", "WORS",
    "WPAY", "WPUB", "WXXX",
    // iTunes extensions
    "TCMP", "TSO2", "TSOC",
];

/// Frame ids defined for a version.
pub fn registry(version: Id3v2Version) -> &'static [&'static str] {
    match version {
        Id3v2Version::V22 => V22_FRAMES,
        Id3v2Version::V23 => V23_FRAMES,
        Id3v2Version::V24 => V24_FRAMES,
    }
}

pub fn is_known(id: &str, version: Id3v2Version) -> bool {
    registry(version).contains(&id)
}

/// Layout for `id` when the version both defines the frame and has a body for it.
pub fn layout_for(id: &str, version: Id3v2Version) -> Option<&'static FrameLayout> {
    if is_known(id, version) {
        lookup(id)
    } else {
        None
    }
}

/// Whether `id` is well formed for the version (length and character set).
pub fn is_valid_id(id: &str, version: Id3v2Version) -> bool {
    id.len() == version.frame_id_len()
        && id
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Frames that may appear more than once in a tag.
pub fn is_repeatable(id: &str) -> bool {
    matches!(
        id,
        "TXXX" | "TXX" | "WXXX" | "WXX" | "COMM" | "COM" | "USLT" | "ULT" | "APIC" | "PIC"
            | "UFID" | "UFI" | "POPM" | "POP" | "PRIV" | "GEOB" | "GEO" | "ENCR" | "GRID"
            | "AENC" | "CRA" | "CRM" | "LINK" | "LNK" | "SIGN" | "SYLT" | "SLT" | "USER"
            | "WCOM" | "WCM" | "WOAR" | "WAR" | "RVA2" | "EQU2"
    )
}

/// Paired role/name frames.
pub fn is_paired(id: &str) -> bool {
    lookup(id).is_some_and(|layout| std::ptr::eq(layout, &PAIRED_TEXT))
}

/// Longest text, in characters, a frame can hold.
pub fn max_text_len(id: &str, version: Id3v2Version) -> usize {
    match id {
        "TYER" | "TDAT" | "TIME" | "TORY" | "TYE" | "TDA" | "TIM" | "TOR" => 4,
        "TKEY" | "TKE" => 3,
        // Leave room for the encoding byte and a UTF-16 BOM
        _ => (version.max_frame_size() - 3) / 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_families() {
        assert_eq!(lookup("TIT2"), Some(&TEXT));
        assert_eq!(lookup("TP1"), Some(&TEXT));
        assert_eq!(lookup("WOAR"), Some(&URL));
        assert_eq!(lookup("TXXX"), Some(&USER_TEXT));
        assert_eq!(lookup("PIC"), Some(&PICTURE_V22));
        assert!(lookup("XYZ1").is_none());
        assert!(lookup("SYLT").is_none());
        assert!(is_paired("TMCL"));
        assert!(!is_paired("TIT2"));
    }

    #[test]
    fn registries_per_version() {
        assert!(layout_for("TDRC", Id3v2Version::V24).is_some());
        assert!(layout_for("TDRC", Id3v2Version::V23).is_none());
        assert!(layout_for("TYER", Id3v2Version::V23).is_some());
        assert!(layout_for("TYE", Id3v2Version::V22).is_some());
        assert!(is_known("SYLT", Id3v2Version::V23));
        assert!(is_valid_id("TT2", Id3v2Version::V22));
        assert!(!is_valid_id("TIT2", Id3v2Version::V22));
        assert!(!is_valid_id("tit2", Id3v2Version::V24));
    }

    #[test]
    fn text_limits() {
        assert_eq!(max_text_len("TKEY", Id3v2Version::V24), 3);
        assert_eq!(max_text_len("TDA", Id3v2Version::V22), 4);
        assert!(max_text_len("TIT2", Id3v2Version::V23) > 1_000_000);
    }
}
