use std::fmt;

use crate::common::error::{Id3Error, Result};

/// Syncsafe integer encoding used in ID3v2 tags.
/// Each byte uses only 7 bits (MSB is always 0).
pub struct BitPaddedInt;

impl BitPaddedInt {
    /// Decode an integer from bytes.
    /// `bits` is the number of significant bits per byte (7 for syncsafe, 8 for normal).
    pub fn decode(data: &[u8], bits: u8) -> u32 {
        let mut result: u32 = 0;
        let mask = (1u32 << bits) - 1;
        for &b in data {
            result = (result << bits) | (b as u32 & mask);
        }
        result
    }

    /// Decode standard syncsafe (7 bits per byte).
    pub fn syncsafe(data: &[u8]) -> u32 {
        Self::decode(data, 7)
    }

    /// Decode as normal integer (8 bits per byte).
    pub fn normal(data: &[u8]) -> u32 {
        Self::decode(data, 8)
    }

    /// Encode an integer into `width` bytes with `bits` significant bits each.
    pub fn encode(value: u32, width: usize, bits: u8) -> Vec<u8> {
        let mut result = vec![0u8; width];
        let mask = (1u32 << bits) - 1;
        let mut val = value;
        for i in (0..width).rev() {
            result[i] = (val & mask) as u8;
            val >>= bits;
        }
        result
    }

    /// Largest value representable in `width` syncsafe bytes.
    pub fn syncsafe_max(width: usize) -> u64 {
        (1u64 << (7 * width)) - 1
    }

    /// Check if data could be a valid syncsafe integer (no high bits set).
    pub fn has_valid_padding(data: &[u8]) -> bool {
        data.iter().all(|&b| b & 0x80 == 0)
    }
}

/// Major version of an ID3v2 tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Id3v2Version {
    V22,
    V23,
    V24,
}

impl Id3v2Version {
    pub fn from_major(major: u8) -> Option<Self> {
        match major {
            2 => Some(Id3v2Version::V22),
            3 => Some(Id3v2Version::V23),
            4 => Some(Id3v2Version::V24),
            _ => None,
        }
    }

    pub fn major(self) -> u8 {
        match self {
            Id3v2Version::V22 => 2,
            Id3v2Version::V23 => 3,
            Id3v2Version::V24 => 4,
        }
    }

    /// Length of a frame identifier (3 for v2.2, 4 otherwise).
    pub fn frame_id_len(self) -> usize {
        match self {
            Id3v2Version::V22 => 3,
            _ => 4,
        }
    }

    /// Length of a frame header.
    pub fn frame_header_len(self) -> usize {
        match self {
            Id3v2Version::V22 => 6,
            _ => 10,
        }
    }

    /// Largest frame body the frame header can describe.
    pub fn max_frame_size(self) -> usize {
        match self {
            Id3v2Version::V22 => 0x00FF_FFFF,
            // The tag size is syncsafe, so no frame can exceed 28 bits in practice
            Id3v2Version::V23 | Id3v2Version::V24 => BitPaddedInt::syncsafe_max(4) as usize,
        }
    }
}

impl fmt::Display for Id3v2Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID3v2.{}", self.major())
    }
}

/// ID3v2 header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ID3Flags {
    pub unsynchronisation: bool,
    pub extended: bool,
    pub experimental: bool,
    pub footer: bool,
    /// ID3v2.2 only, no compression scheme was ever defined for it
    pub compression: bool,
}

impl ID3Flags {
    pub fn parse(flag_byte: u8, version: Id3v2Version) -> Self {
        let v2 = version == Id3v2Version::V22;
        ID3Flags {
            unsynchronisation: flag_byte & 0x80 != 0,
            extended: !v2 && flag_byte & 0x40 != 0,
            experimental: !v2 && flag_byte & 0x20 != 0,
            footer: version == Id3v2Version::V24 && flag_byte & 0x10 != 0,
            compression: v2 && flag_byte & 0x40 != 0,
        }
    }

    pub fn to_byte(self, version: Id3v2Version) -> u8 {
        let mut b = 0u8;
        if self.unsynchronisation {
            b |= 0x80;
        }
        match version {
            Id3v2Version::V22 => {
                if self.compression {
                    b |= 0x40;
                }
            }
            _ => {
                if self.extended {
                    b |= 0x40;
                }
                if self.experimental {
                    b |= 0x20;
                }
                if self.footer && version == Id3v2Version::V24 {
                    b |= 0x10;
                }
            }
        }
        b
    }
}

/// Parsed ID3v2 header (10 bytes).
#[derive(Debug, Clone)]
pub struct ID3Header {
    pub version: Id3v2Version,
    pub revision: u8,
    pub flags: ID3Flags,
    pub size: u32,   // Tag size excluding header (10 bytes)
    pub offset: u64, // Offset of the ID3 header in the file
}

impl ID3Header {
    pub const LEN: usize = 10;

    /// Parse an ID3v2 header from the first 10 bytes.
    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        if data.len() < Self::LEN {
            return Err(Id3Error::TagNotFound);
        }

        // Check magic "ID3"
        if &data[0..3] != b"ID3" {
            return Err(Id3Error::TagNotFound);
        }

        let major = data[3];
        let revision = data[4];

        let version = Id3v2Version::from_major(major).ok_or_else(|| {
            Id3Error::UnsupportedVersion(format!("ID3v2.{}.{}", major, revision))
        })?;

        if revision == 0xFF {
            return Err(Id3Error::InvalidTag(format!(
                "revision byte 0xFF is not allowed (ID3v2.{})",
                major
            )));
        }

        let flags = ID3Flags::parse(data[5], version);

        // Size is always syncsafe in the header
        if !BitPaddedInt::has_valid_padding(&data[6..10]) {
            return Err(Id3Error::InvalidTag(
                "tag size is not a syncsafe integer".into(),
            ));
        }
        let size = BitPaddedInt::syncsafe(&data[6..10]);

        Ok(ID3Header {
            version,
            revision,
            flags,
            size,
            offset,
        })
    }

    /// Full tag size including 10-byte header (and optional 10-byte footer).
    pub fn full_size(&self) -> u32 {
        let mut s = self.size + 10;
        if self.flags.footer {
            s += 10;
        }
        s
    }

    /// Render a header for a tag whose body (everything after the header) is `size` bytes.
    pub fn render(version: Id3v2Version, flags: ID3Flags, size: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(b"ID3");
        out.push(version.major());
        out.push(0); // revision
        out.push(flags.to_byte(version));
        out.extend_from_slice(&BitPaddedInt::encode(size, 4, 7));
        out
    }
}

/// Optional header following the tag header in ID3v2.3 and ID3v2.4.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedHeader {
    /// CRC-32 of the frame data, as stored in the tag
    pub crc: Option<u32>,
    /// ID3v2.3 only: size of the padding following the frames
    pub padding_size: u32,
    /// ID3v2.4 only: the tag is an update of an earlier tag
    pub update: bool,
    /// ID3v2.4 only: raw tag restrictions byte
    pub restrictions: Option<u8>,
}

impl ExtendedHeader {
    /// Parse an extended header at the start of `data`, returning it with the
    /// number of bytes it occupies.
    pub fn parse(data: &[u8], version: Id3v2Version) -> Result<(Self, usize)> {
        if data.len() < 4 {
            return Err(Id3Error::Truncated {
                needed: 4,
                available: data.len(),
            });
        }

        match version {
            Id3v2Version::V22 => Err(Id3Error::InvalidTag(
                "ID3v2.2 has no extended header".into(),
            )),
            Id3v2Version::V23 => {
                // Size excludes the size field itself: 6, or 10 with a CRC
                let size = BitPaddedInt::normal(&data[0..4]) as usize;
                if size != 6 && size != 10 {
                    return Err(Id3Error::InvalidTag(format!(
                        "invalid ID3v2.3 extended header size {}",
                        size
                    )));
                }
                let total = size + 4;
                if data.len() < total {
                    return Err(Id3Error::Truncated {
                        needed: total,
                        available: data.len(),
                    });
                }

                let flags = u16::from_be_bytes([data[4], data[5]]);
                let padding_size = BitPaddedInt::normal(&data[6..10]);
                let crc = if flags & 0x8000 != 0 && size == 10 {
                    Some(BitPaddedInt::normal(&data[10..14]))
                } else {
                    None
                };

                Ok((
                    ExtendedHeader {
                        crc,
                        padding_size,
                        ..Default::default()
                    },
                    total,
                ))
            }
            Id3v2Version::V24 => {
                // Size includes the size field itself
                let size = BitPaddedInt::syncsafe(&data[0..4]) as usize;
                if size < 6 {
                    return Err(Id3Error::InvalidTag(format!(
                        "invalid ID3v2.4 extended header size {}",
                        size
                    )));
                }
                if data.len() < size {
                    return Err(Id3Error::Truncated {
                        needed: size,
                        available: data.len(),
                    });
                }

                let flags = data[5];
                let mut header = ExtendedHeader::default();
                let mut pos = 6usize;

                // Each flag that is set is followed by its data, prefixed with a length byte
                let mut flag_data = |pos: &mut usize| -> Result<&[u8]> {
                    let len = *data.get(*pos).ok_or(Id3Error::Truncated {
                        needed: *pos + 1,
                        available: size,
                    })? as usize;
                    let start = *pos + 1;
                    let end = start + len;
                    if end > size {
                        return Err(Id3Error::BoundsExceeded {
                            requested: len,
                            remaining: size.saturating_sub(start),
                        });
                    }
                    *pos = end;
                    Ok(&data[start..end])
                };

                if flags & 0x40 != 0 {
                    flag_data(&mut pos)?;
                    header.update = true;
                }
                if flags & 0x20 != 0 {
                    let crc = flag_data(&mut pos)?;
                    // 35 bits spread over 5 syncsafe bytes
                    let mut value: u64 = 0;
                    for &b in crc {
                        value = (value << 7) | u64::from(b & 0x7F);
                    }
                    header.crc = Some(value as u32);
                }
                if flags & 0x10 != 0 {
                    let restrictions = flag_data(&mut pos)?;
                    header.restrictions = restrictions.first().copied();
                }

                Ok((header, size))
            }
        }
    }

    /// Render the extended header.
    pub fn render(&self, version: Id3v2Version) -> Vec<u8> {
        let mut out = Vec::new();
        match version {
            Id3v2Version::V22 => {}
            Id3v2Version::V23 => {
                let size: u32 = if self.crc.is_some() { 10 } else { 6 };
                out.extend_from_slice(&size.to_be_bytes());
                let flags: u16 = if self.crc.is_some() { 0x8000 } else { 0 };
                out.extend_from_slice(&flags.to_be_bytes());
                out.extend_from_slice(&self.padding_size.to_be_bytes());
                if let Some(crc) = self.crc {
                    out.extend_from_slice(&crc.to_be_bytes());
                }
            }
            Id3v2Version::V24 => {
                let mut flags = 0u8;
                let mut flag_data = Vec::new();
                if self.update {
                    flags |= 0x40;
                    flag_data.push(0);
                }
                if let Some(crc) = self.crc {
                    flags |= 0x20;
                    flag_data.push(5);
                    flag_data.extend_from_slice(&BitPaddedInt::encode(crc, 5, 7));
                }
                if let Some(restrictions) = self.restrictions {
                    flags |= 0x10;
                    flag_data.push(1);
                    flag_data.push(restrictions);
                }
                let size = 6 + flag_data.len() as u32;
                out.extend_from_slice(&BitPaddedInt::encode(size, 4, 7));
                out.push(1); // number of flag bytes
                out.push(flags);
                out.extend_from_slice(&flag_data);
            }
        }
        out
    }
}

/// CRC-32 over the frame data, as stored in the extended header.
pub fn frame_crc(frame_data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(frame_data);
    crc.sum()
}

/// Determine BPI (Bits Per Integer byte) for frame sizes in ID3v2.4.
/// Some encoders (notably iTunes) incorrectly use normal integers instead of syncsafe.
/// This function heuristically determines which encoding is used.
pub fn determine_bpi(data: &[u8]) -> u8 {
    fn walk(data: &[u8], bits: u8) -> (u32, usize) {
        let mut pos = 0usize;
        let mut valid = 0u32;
        while pos + 10 <= data.len() {
            if data[pos] == 0 {
                break;
            }
            // Check if frame ID is valid (uppercase ASCII or digits)
            let id = &data[pos..pos + 4];
            if !id.iter().all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
                break;
            }
            let size = BitPaddedInt::decode(&data[pos + 4..pos + 8], bits) as usize;
            if pos + 10 + size > data.len() {
                break;
            }
            valid += 1;
            pos += 10 + size;
        }
        (valid, pos)
    }

    let (syncsafe_valid, syncsafe_end) = walk(data, 7);
    let (normal_valid, normal_end) = walk(data, 8);

    // Prefer syncsafe unless normal integers walk further through the frames
    if normal_valid > syncsafe_valid
        || (normal_valid == syncsafe_valid && normal_end > syncsafe_end && syncsafe_end < data.len()
            && data[syncsafe_end] != 0)
    {
        8
    } else {
        7
    }
}
