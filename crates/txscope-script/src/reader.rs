//! Primitive decoding of Bitcoin wire data.

use crate::error::ReadError;
use bitcoin::hashes::sha256d;
use bitcoin::hashes::Hash;

/// Cursor over a raw byte stream.
///
/// All integer reads are little-endian, matching the Bitcoin wire format.
/// Reads never panic; running off the end of the buffer returns
/// [`ReadError::Truncated`] and leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads `needed` bytes, advancing the cursor.
    pub fn read_bytes(&mut self, needed: usize) -> Result<&'a [u8], ReadError> {
        if self.remaining() < needed {
            return Err(ReadError::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReadError> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads a Bitcoin variable-length integer.
    ///
    /// A first byte below 0xFD is the value itself; 0xFD, 0xFE and 0xFF
    /// announce a 2-, 4- or 8-byte little-endian value.
    pub fn read_var_int(&mut self) -> Result<u64, ReadError> {
        match self.read_u8()? {
            0xFD => self.read_u16().map(u64::from),
            0xFE => self.read_u32().map(u64::from),
            0xFF => self.read_u64(),
            n => Ok(u64::from(n)),
        }
    }

    /// Reads a 32-byte hash from its wire encoding.
    ///
    /// Hashes travel the wire in reverse of their conventional rendering;
    /// the returned value displays in the familiar txid/block-hash order.
    pub fn read_reversed_hash(&mut self) -> Result<sha256d::Hash, ReadError> {
        let slice = self.read_bytes(32)?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(sha256d::Hash::from_byte_array(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_integers() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 0x0302);
        assert_eq!(reader.read_u32().unwrap(), 0x08070605);
        assert!(reader.is_exhausted());

        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u64().unwrap(), 0x0807060504030201);
    }

    #[test]
    fn var_int_widths() {
        let mut reader = ByteReader::new(&[0xFC]);
        assert_eq!(reader.read_var_int().unwrap(), 0xFC);

        let mut reader = ByteReader::new(&[0xFD, 0xFD, 0x00]);
        assert_eq!(reader.read_var_int().unwrap(), 0xFD);

        let mut reader = ByteReader::new(&[0xFD, 0xFF, 0xFF]);
        assert_eq!(reader.read_var_int().unwrap(), 0xFFFF);

        let mut reader = ByteReader::new(&[0xFE, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(reader.read_var_int().unwrap(), 0x10000);

        let mut reader = ByteReader::new(&[0xFF, 0, 0, 0, 0, 0, 0, 0, 0x80]);
        assert_eq!(reader.read_var_int().unwrap(), 0x8000000000000000);
    }

    #[test]
    fn truncation_is_an_error_not_a_panic() {
        let mut reader = ByteReader::new(&[0x01, 0x02]);
        assert_eq!(
            reader.read_u32(),
            Err(ReadError::Truncated {
                needed: 4,
                remaining: 2
            })
        );
        // The cursor did not move.
        assert_eq!(reader.position(), 0);

        let mut reader = ByteReader::new(&[0xFD, 0x01]);
        assert!(reader.read_var_int().is_err());

        let mut reader = ByteReader::new(&[0u8; 16]);
        assert!(reader.read_reversed_hash().is_err());
    }

    #[test]
    fn reversed_hash_renders_in_display_order() {
        let mut wire = [0u8; 32];
        wire[0] = 0xAA;
        wire[31] = 0x11;
        let mut reader = ByteReader::new(&wire);
        let hash = reader.read_reversed_hash().unwrap();
        let rendered = hash.to_string();
        assert!(rendered.starts_with("11"));
        assert!(rendered.ends_with("aa"));
    }
}
