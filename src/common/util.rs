use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::common::error::Result;
use crate::id3::header::ID3Header;

/// Memory-map a file read-only.
///
/// The map is only borrowed for the duration of a parse; frames copy whatever
/// they keep, so the map can be dropped as soon as the tag has been read.
pub fn map_file<P: AsRef<Path>>(path: P) -> Result<Mmap> {
    let file = File::open(path)?;
    // SAFETY: the map is read-only and lives no longer than the parse that uses it.
    // Concurrent truncation by another process is the caller's concern.
    let map = unsafe { Mmap::map(&file)? };
    Ok(map)
}

/// Slice covering exactly one ID3v2 tag (header included) at the start of `data`.
///
/// Returns `None` when there is no tag at offset 0. The slice may be shorter than
/// the size the header declares if the file is truncated; a strict tag read
/// reports that as `Truncated`, the other modes read what is there.
pub fn id3v2_region(data: &[u8]) -> Option<&[u8]> {
    let header = ID3Header::parse(data, 0).ok()?;
    let end = (header.full_size() as usize).min(data.len());
    Some(&data[..end])
}

/// The 128-byte ID3v1 trailer, if the data ends with one.
pub fn id3v1_region(data: &[u8]) -> Option<&[u8]> {
    crate::id3::id3v1::find_id3v1(data).map(|offset| &data[offset..offset + 128])
}
