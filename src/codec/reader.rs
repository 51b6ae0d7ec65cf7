use encoding_rs::WINDOWS_1251;

use crate::error::{Error, Result};
use crate::model::Position;

/// Longest string the format is allowed to declare before we treat the
/// length prefix as garbage.
pub const MAX_STRING_LEN: usize = 1024 * 1024;

/// Length prefix some editors write for "no string".
const NULL_STRING: u32 = 0xFFFF_FFFF;

/// Binary reader for H3M map data
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to an absolute offset. Offsets past the end are clamped so the
    /// next read reports `OutOfData` instead of indexing out of bounds.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(Error::OutOfData {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let bytes = self.read_array::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        Ok(self.read_u16_le()? as i16)
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_array::<4>()?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(self.read_u32_le()? as i32)
    }

    /// Read a u32 count and reject it when it exceeds `max`.
    pub fn read_count(&mut self, field: &'static str, max: usize) -> Result<usize> {
        let offset = self.pos;
        let count = self.read_u32_le()? as usize;
        if count > max {
            return Err(Error::OversizedField { field, offset, len: count, max });
        }
        Ok(count)
    }

    /// Read an H3M string: u32 length followed by CP-1251 bytes, no terminator.
    pub fn read_string(&mut self) -> Result<String> {
        let offset = self.pos;
        let len = self.read_u32_le()?;
        if len == 0 || len == NULL_STRING {
            return Ok(String::new());
        }
        let len = len as usize;
        if len > MAX_STRING_LEN {
            // leave the cursor on the bogus prefix so resync sees it
            self.pos = offset;
            return Err(Error::OversizedField {
                field: "string length",
                offset,
                len,
                max: MAX_STRING_LEN,
            });
        }
        let bytes = match self.read_bytes(len) {
            Ok(b) => b,
            Err(e) => {
                self.pos = offset;
                return Err(e);
            }
        };
        let (text, _) = WINDOWS_1251.decode_without_bom_handling(bytes);
        Ok(text.into_owned())
    }

    /// Read a map coordinate (x, y, z bytes)
    pub fn read_position(&mut self) -> Result<Position> {
        let [x, y, z] = self.read_array::<3>()?;
        Ok(Position { x, y, z })
    }

    /// Read remaining bytes
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16_le().unwrap(), 0x0302);
        assert_eq!(reader.read_u32_le().unwrap(), 0x07060504);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_signed_and_bool() {
        let data = [0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x02];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_i16_le().unwrap(), -2);
        assert_eq!(reader.read_i32_le().unwrap(), -1);
        assert!(!reader.read_bool().unwrap());
        assert!(reader.read_bool().unwrap());
    }

    #[test]
    fn test_out_of_data_does_not_advance() {
        let data = [0x01, 0x02];
        let mut reader = BinaryReader::new(&data);
        reader.read_u8().unwrap();
        match reader.read_u32_le() {
            Err(Error::OutOfData { offset, need, have }) => {
                assert_eq!((offset, need, have), (1, 4, 1));
            }
            other => panic!("expected OutOfData, got {other:?}"),
        }
        assert_eq!(reader.position(), 1);
        assert!(reader.skip(2).is_err());
        assert_eq!(reader.read_u8().unwrap(), 0x02);
    }

    #[test]
    fn test_read_string_cp1251() {
        // "Мир" in Windows-1251
        let data = [0x03, 0x00, 0x00, 0x00, 0xCC, 0xE8, 0xF0];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_string().unwrap(), "Мир");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_string_empty_and_sentinel() {
        let data = [0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x42];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_string().unwrap(), "");
        assert_eq!(reader.read_string().unwrap(), "");
        assert_eq!(reader.read_u8().unwrap(), 0x42);
    }

    #[test]
    fn test_read_string_oversized() {
        let len = (MAX_STRING_LEN as u32 + 1).to_le_bytes();
        let mut reader = BinaryReader::new(&len);
        assert!(matches!(
            reader.read_string(),
            Err(Error::OversizedField { offset: 0, .. })
        ));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_set_position_clamps() {
        let data = [0x01, 0x02, 0x03, 0x00];
        let mut reader = BinaryReader::new(&data);
        reader.set_position(10);
        assert_eq!(reader.position(), 4);
        assert!(reader.read_u8().is_err());
        reader.set_position(1);
        assert_eq!(reader.read_position().unwrap(), Position { x: 2, y: 3, z: 0 });
    }
}
