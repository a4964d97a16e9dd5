//! Bounds-checked byte cursor for wire parsing.
//!
//! All multi-byte reads are big-endian, matching the RLOG wire format.
//! Every out-of-bounds read surfaces as [`Error::Truncated`], so the
//! decoder has a single place where truncation is detected.

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, position: 0 }
    }

    /// Current byte offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Moves the cursor backwards by up to `count` bytes.
    pub fn rewind(&mut self, count: usize) {
        self.position = self.position.saturating_sub(count);
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Reads one byte, or `None` at end of buffer.
    pub fn try_read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.position)?;
        self.position += 1;
        Some(byte)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.read_bytes(2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.read_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_be_bytes(raw))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(count)
            .ok_or(Error::Truncated("length overflow"))?;
        if end > self.data.len() {
            return Err(Error::Truncated("unexpected end of buffer"));
        }
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_big_endian() {
        let mut cursor = Cursor::new(&[0x00, 0x2A, 0x00, 0x00, 0x00, 0x2A]);
        assert_eq!(cursor.read_i16().unwrap(), 42);
        assert_eq!(cursor.read_i32().unwrap(), 42);
        assert!(cursor.is_empty());
    }

    #[test]
    fn f64_round_trip() {
        let bytes = 1.25f64.to_be_bytes();
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(cursor.read_f64().unwrap(), 1.25);
    }

    #[test]
    fn out_of_bounds_read_is_truncated() {
        let mut cursor = Cursor::new(&[0x01]);
        assert!(matches!(cursor.read_i16(), Err(Error::Truncated(_))));
    }

    #[test]
    fn try_read_u8_at_end() {
        let mut cursor = Cursor::new(&[0x07]);
        assert_eq!(cursor.try_read_u8(), Some(0x07));
        assert_eq!(cursor.try_read_u8(), None);
    }

    #[test]
    fn rewind_saturates_at_start() {
        let mut cursor = Cursor::new(&[0x01, 0x02, 0x03]);
        cursor.read_u8().unwrap();
        cursor.rewind(7);
        assert_eq!(cursor.position(), 0);
    }
}
