use crate::common::error::{Id3Error, Result};

/// A 0xFF followed by this byte would look like an MPEG sync word.
fn is_false_sync(next: u8) -> bool {
    next >= 0xE0
}

/// Decode unsynchronised data.
/// Removes 0x00 bytes that follow 0xFF bytes.
/// Fails if the data still contains a false sync, which unsynchronised data cannot.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        output.push(b);
        if b == 0xFF {
            match data.get(i + 1) {
                Some(0x00) => {
                    // Skip the 0x00 byte after 0xFF
                    i += 2;
                    continue;
                }
                Some(&next) if is_false_sync(next) => return Err(Id3Error::BadUnsynchData),
                _ => {}
            }
        }
        i += 1;
    }
    Ok(output)
}

/// Like [`decode`], but leaves false syncs in place instead of failing.
pub fn decode_lenient(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        output.push(data[i]);
        if data[i] == 0xFF && data.get(i + 1) == Some(&0x00) {
            i += 2;
        } else {
            i += 1;
        }
    }
    output
}

/// Whether `data` contains anything unsynchronisation would have to escape.
pub fn needs_unsync(data: &[u8]) -> bool {
    memchr::memchr_iter(0xFF, data).any(|pos| match data.get(pos + 1) {
        Some(&next) => next == 0x00 || is_false_sync(next),
        None => true,
    })
}

/// Encode data with unsynchronisation.
/// Inserts 0x00 after every 0xFF that is followed by 0x00, a false sync, or the end of data.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() + data.len() / 10);
    let mut start = 0;
    for pos in memchr::memchr_iter(0xFF, data) {
        output.extend_from_slice(&data[start..=pos]);
        start = pos + 1;
        let escape = match data.get(pos + 1) {
            Some(&next) => next == 0x00 || is_false_sync(next),
            None => true,
        };
        if escape {
            output.push(0x00);
        }
    }
    output.extend_from_slice(&data[start..]);
    output
}
