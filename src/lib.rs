//! ID3v1 and ID3v2 (2.2, 2.3, 2.4) tag codec with a version-independent
//! field layer.
//!
//! [`Id3v2Tag`] reads and writes whole tags and gives direct frame access;
//! [`TagFields`] maps generic [`FieldKey`]s onto the frames of each version.

pub mod common;
pub mod field;
pub mod id3;

#[cfg(feature = "python")]
mod python;

pub use common::config::{ParsingMode, TagOptions};
pub use common::error::{Id3Error, Result};
pub use field::{FieldKey, TagFields};
pub use id3::frames::{Frame, FrameContent, FrameFlags};
pub use id3::header::Id3v2Version;
pub use id3::id3v1::Id3v1Tag;
pub use id3::specs::Encoding;
pub use id3::tags::Id3v2Tag;
pub use id3::{load_id3, load_id3_from_data, LoadedTags};
