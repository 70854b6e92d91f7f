use crate::parser::{ParseError, Result};
use byteorder::{BigEndian, ByteOrder};

/// Sequential, bounds-checked big-endian reader over a byte region.
///
/// Every read either consumes exactly the requested bytes or fails with
/// [`ParseError::OutOfData`] and leaves the cursor untouched. Offsets reported
/// in errors are absolute, so a view handed to a box decoder still points at
/// the right place in the file.
#[derive(Debug, Clone)]
pub struct BinaryStream<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> BinaryStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// A stream whose first byte sits at absolute offset `base`.
    pub fn with_base(data: &'a [u8], base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    /// Absolute offset of the cursor.
    pub fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn has_bytes_available(&self) -> bool {
        self.remaining() > 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(ParseError::OutOfData {
                offset: self.offset(),
                needed: n as u64,
                available: self.remaining() as u64,
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Everything left in the view.
    pub fn read_all_data(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }

    /// Read up to and including a NUL byte, returning the text before it.
    ///
    /// Running out of data before the terminator is an error; the end of the
    /// view never terminates a string.
    pub fn read_nul_terminated_string(&mut self) -> Result<String> {
        let rest = &self.data[self.pos..];
        match rest.iter().position(|&b| b == 0) {
            Some(n) => {
                let text = String::from_utf8_lossy(&rest[..n]).into_owned();
                self.pos += n + 1;
                Ok(text)
            }
            None => Err(ParseError::OutOfData {
                offset: self.offset(),
                needed: rest.len() as u64 + 1,
                available: rest.len() as u64,
            }),
        }
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Split off the next `len` bytes as an independent view.
    ///
    /// The cursor of `self` moves past the whole region immediately, so how
    /// much of the returned view gets consumed has no effect on what follows.
    pub fn slice(&mut self, len: usize) -> Result<BinaryStream<'a>> {
        let base = self.offset();
        let bytes = self.take(len)?;
        Ok(BinaryStream::with_base(bytes, base))
    }
}
