//! Bounds-checked big-endian cursor over a transaction byte stream.
//!
//! Every failure is reported as `MalformedTransaction` with the byte offset
//! at which the read was attempted.

use crate::error::CoreError;

pub(super) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Peek at the next four bytes as a `u32` without consuming them.
    pub fn peek_u32(&self) -> Result<u32, CoreError> {
        let bytes = self.peek(4, "u32")?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// The next `N` bytes, if that many remain, without consuming them.
    pub fn peek_array<const N: usize>(&self) -> Option<[u8; N]> {
        self.bytes
            .get(self.pos..self.pos + N)
            .and_then(|slice| <[u8; N]>::try_from(slice).ok())
    }

    pub fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], CoreError> {
        let slice = self.peek(len, what)?;
        self.pos += len;
        Ok(slice)
    }

    pub fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], CoreError> {
        let slice = self.take(N, what)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn u16(&mut self, what: &str) -> Result<u16, CoreError> {
        Ok(u16::from_be_bytes(self.array(what)?))
    }

    pub fn u32(&mut self, what: &str) -> Result<u32, CoreError> {
        Ok(u32::from_be_bytes(self.array(what)?))
    }

    pub fn u64(&mut self, what: &str) -> Result<u64, CoreError> {
        Ok(u64::from_be_bytes(self.array(what)?))
    }

    /// Read a `u32` element count and check that `count * min_item_len`
    /// bytes are still available, so a corrupt count cannot trigger a huge
    /// allocation.
    pub fn count(&mut self, min_item_len: usize, what: &str) -> Result<usize, CoreError> {
        let at = self.pos;
        let count = self.u32(what)? as usize;
        let needed = count.saturating_mul(min_item_len);
        if needed > self.remaining() {
            return Err(CoreError::malformed(
                at,
                format!(
                    "{what} count {count} needs at least {needed} bytes, {} remain",
                    self.remaining()
                ),
            ));
        }
        Ok(count)
    }

    /// Length-prefixed byte string.
    pub fn bytes(&mut self, what: &str) -> Result<Vec<u8>, CoreError> {
        let len = self.count(1, what)?;
        Ok(self.take(len, what)?.to_vec())
    }

    fn peek(&self, len: usize, what: &str) -> Result<&'a [u8], CoreError> {
        if len > self.remaining() {
            return Err(CoreError::malformed(
                self.pos,
                format!(
                    "truncated {what}: need {len} bytes, {} remain",
                    self.remaining()
                ),
            ));
        }
        Ok(&self.bytes[self.pos..self.pos + len])
    }
}
