use byteorder::{ByteOrder, LittleEndian};

use crate::{LumpName, WadError};

/// Bounds checked little-endian reads at absolute offsets in to a byte slice.
///
/// Every fixed layout record in a WAD is decoded through this so that an
/// overrun is always reported as [`WadError::Truncated`] instead of a panic.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8], WadError> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(WadError::Truncated {
                offset,
                wanted: len,
                len: self.data.len(),
            })
    }

    /// A cursor over `len` bytes starting at `offset`. Offsets given to the
    /// new cursor are relative to `offset`.
    pub fn sub(&self, offset: usize, len: usize) -> Result<ByteCursor<'a>, WadError> {
        self.bytes(offset, len).map(ByteCursor::new)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, WadError> {
        Ok(self.bytes(offset, 1)?[0])
    }

    pub fn read_i16(&self, offset: usize) -> Result<i16, WadError> {
        Ok(LittleEndian::read_i16(self.bytes(offset, 2)?))
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, WadError> {
        Ok(LittleEndian::read_u16(self.bytes(offset, 2)?))
    }

    pub fn read_i32(&self, offset: usize) -> Result<i32, WadError> {
        Ok(LittleEndian::read_i32(self.bytes(offset, 4)?))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32, WadError> {
        Ok(LittleEndian::read_u32(self.bytes(offset, 4)?))
    }

    /// Read an 8 byte, NUL padded, name
    pub fn read_name(&self, offset: usize) -> Result<LumpName, WadError> {
        Ok(LumpName::from_raw(self.bytes(offset, LumpName::LEN)?))
    }

    /// Compare the leading bytes against a signature. Data shorter than the
    /// signature is an error rather than a mismatch.
    pub fn starts_with(&self, signature: &[u8]) -> Result<bool, WadError> {
        Ok(self.bytes(0, signature.len())? == signature)
    }

    /// Split in to consecutive `size` byte records. Any trailing partial
    /// record is not yielded, callers check `len() % size` first.
    pub fn records(&self, size: usize) -> impl ExactSizeIterator<Item = ByteCursor<'a>> + 'a {
        self.data.chunks_exact(size.max(1)).map(ByteCursor::new)
    }
}
