use byteorder::{BigEndian, ByteOrder};

use crate::common::error::{Id3Error, Result};
use crate::id3::specs::{self, Encoding};

/// Read position over a byte region with a declared end.
///
/// `limit` is where the current frame says its data stops. It may lie past the
/// end of the slice when the frame is truncated, so the two failure modes stay
/// distinct: crossing `limit` is `BoundsExceeded`, running off the slice before
/// reaching `limit` is `Truncated`.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8], limit: usize) -> Self {
        ByteCursor {
            data,
            pos: 0,
            limit,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the declared end.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn check(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Id3Error::BoundsExceeded {
                requested: n,
                remaining: self.remaining(),
            });
        }
        if self.pos + n > self.data.len() {
            return Err(Id3Error::Truncated {
                needed: self.pos + n,
                available: self.data.len(),
            });
        }
        Ok(())
    }

    /// Read exactly `n` bytes.
    pub fn read_fixed(&mut self, n: usize) -> Result<&'a [u8]> {
        self.check(n)?;
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_fixed(1)?[0])
    }

    /// Read an `n`-byte big-endian integer (1 to 8 bytes).
    pub fn read_uint(&mut self, n: usize) -> Result<u64> {
        if n == 0 || n > 8 {
            return Err(Id3Error::InvalidArgument(format!(
                "cannot read a {}-byte integer",
                n
            )));
        }
        let bytes = self.read_fixed(n)?;
        Ok(BigEndian::read_uint(bytes, n))
    }

    /// Read up to the encoding's null terminator.
    ///
    /// Returns the text bytes (terminator excluded), the bytes consumed
    /// (terminator included) and whether a terminator was found. Without one
    /// the rest of the available data is returned.
    pub fn read_null_terminated(&mut self, encoding: Encoding) -> Result<(&'a [u8], usize, bool)> {
        let end = self.limit.min(self.data.len());
        let window = &self.data[self.pos.min(end)..end];

        match specs::find_null_terminator(window, encoding) {
            Some(idx) => {
                let consumed = idx + encoding.terminator_len();
                self.pos += consumed;
                Ok((&window[..idx], consumed, true))
            }
            None => {
                if self.limit > self.data.len() {
                    return Err(Id3Error::Truncated {
                        needed: self.limit,
                        available: self.data.len(),
                    });
                }
                self.pos += window.len();
                Ok((window, window.len(), false))
            }
        }
    }

    /// Read a field whose length is given by the caller.
    pub fn read_sized(&mut self, n: usize) -> Result<&'a [u8]> {
        self.read_fixed(n)
    }

    /// Read everything up to the declared end.
    pub fn read_rest(&mut self) -> Result<&'a [u8]> {
        self.read_fixed(self.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_reads() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut cursor = ByteCursor::new(&data, 4);
        assert_eq!(cursor.read_u8().unwrap(), 1);
        assert_eq!(cursor.read_uint(2).unwrap(), 0x0203);
        assert_eq!(cursor.remaining(), 1);
        assert!(matches!(
            cursor.read_fixed(2),
            Err(Id3Error::BoundsExceeded {
                requested: 2,
                remaining: 1
            })
        ));
        assert_eq!(cursor.read_rest().unwrap(), &[4]);
        assert!(cursor.is_empty());
    }

    #[test]
    fn truncated_before_limit() {
        let data = [1u8, 2];
        let mut cursor = ByteCursor::new(&data, 10);
        assert!(matches!(
            cursor.read_fixed(4),
            Err(Id3Error::Truncated {
                needed: 4,
                available: 2
            })
        ));
        assert!(cursor.read_rest().is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn null_terminated() {
        let data = b"abc\0def";
        let mut cursor = ByteCursor::new(data, data.len());
        let (text, consumed, terminated) = cursor.read_null_terminated(Encoding::Latin1).unwrap();
        assert_eq!(text, b"abc");
        assert_eq!(consumed, 4);
        assert!(terminated);

        let (text, consumed, terminated) = cursor.read_null_terminated(Encoding::Latin1).unwrap();
        assert_eq!(text, b"def");
        assert_eq!(consumed, 3);
        assert!(!terminated);
        assert!(cursor.is_empty());
    }

    #[test]
    fn null_terminated_respects_limit() {
        // The terminator lies past the declared end and must not be seen
        let data = b"ab\0";
        let mut cursor = ByteCursor::new(data, 2);
        let (text, _, terminated) = cursor.read_null_terminated(Encoding::Latin1).unwrap();
        assert_eq!(text, b"ab");
        assert!(!terminated);
    }

    #[test]
    fn utf16_terminator() {
        let data = [0xFF, 0xFE, b'a', 0, 0, 0, b'z'];
        let mut cursor = ByteCursor::new(&data, data.len());
        let (text, consumed, terminated) = cursor.read_null_terminated(Encoding::Utf16).unwrap();
        assert_eq!(text, &[0xFF, 0xFE, b'a', 0]);
        assert_eq!(consumed, 6);
        assert!(terminated);
        assert_eq!(cursor.read_rest().unwrap(), b"z");
    }
}
