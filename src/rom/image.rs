//! Big-Endian-Bytequelle für die ROM-Decoder.
//!
//! Die Datei- und Interleave-Logik des ROM-Ladens liegt beim Aufrufer;
//! hier kommt nur das fertig zusammengesetzte Abbild an. Alle Zugriffe
//! sind geprüft — ein Überlauf liefert [`TrackError::MalformedRecord`]
//! statt eines Panics.

use crate::error::{TrackError, TrackResult};

/// Ein zusammengesetztes ROM-Abbild im Speicher.
#[derive(Debug, Clone)]
pub struct RomImage {
    data: Vec<u8>,
}

impl RomImage {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn bytes(&self, address: u32, count: usize) -> TrackResult<&[u8]> {
        let start = address as usize;
        let end = start + count;
        if end > self.data.len() {
            return Err(TrackError::MalformedRecord {
                address,
                reason: "read past end of image",
            });
        }
        Ok(&self.data[start..end])
    }

    pub fn read_u8(&self, address: u32) -> TrackResult<u8> {
        Ok(self.bytes(address, 1)?[0])
    }

    pub fn read_u16(&self, address: u32) -> TrackResult<u16> {
        let b = self.bytes(address, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&self, address: u32) -> TrackResult<u32> {
        let b = self.bytes(address, 4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i16(&self, address: u32) -> TrackResult<i16> {
        Ok(self.read_u16(address)? as i16)
    }

    /// Fortlaufender Lesezeiger ab `address`.
    pub fn cursor(&self, address: u32) -> RomCursor<'_> {
        RomCursor {
            image: self,
            pos: address,
        }
    }
}

/// Lesezeiger über einem [`RomImage`]; rückt bei jedem Zugriff weiter.
#[derive(Debug, Clone)]
pub struct RomCursor<'a> {
    image: &'a RomImage,
    pos: u32,
}

impl RomCursor<'_> {
    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn next_u8(&mut self) -> TrackResult<u8> {
        let v = self.image.read_u8(self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn next_u16(&mut self) -> TrackResult<u16> {
        let v = self.image.read_u16(self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn next_i16(&mut self) -> TrackResult<i16> {
        Ok(self.next_u16()? as i16)
    }

    pub fn next_u32(&mut self) -> TrackResult<u32> {
        let v = self.image.read_u32(self.pos)?;
        self.pos += 4;
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_reads() {
        let rom = RomImage::new(vec![0x12, 0x34, 0x56, 0x78, 0xFF, 0xFF]);

        assert_eq!(rom.read_u8(0).unwrap(), 0x12);
        assert_eq!(rom.read_u16(0).unwrap(), 0x1234);
        assert_eq!(rom.read_u32(0).unwrap(), 0x12345678);
        assert_eq!(rom.read_i16(4).unwrap(), -1);
    }

    #[test]
    fn test_cursor_advances() {
        let rom = RomImage::new(vec![0x00, 0x01, 0x00, 0x02, 0xAB]);
        let mut cursor = rom.cursor(0);

        assert_eq!(cursor.next_u16().unwrap(), 1);
        assert_eq!(cursor.next_u16().unwrap(), 2);
        assert_eq!(cursor.next_u8().unwrap(), 0xAB);
        assert_eq!(cursor.pos(), 5);
    }

    #[test]
    fn test_overrun_is_malformed_record() {
        let rom = RomImage::new(vec![0x00; 4]);

        assert!(matches!(
            rom.read_u32(1),
            Err(TrackError::MalformedRecord { address: 1, .. })
        ));
        assert!(matches!(
            rom.read_u8(4),
            Err(TrackError::MalformedRecord { .. })
        ));
    }
}
