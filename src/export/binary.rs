//! Big-Endian-Bytesenke mit Positionszähler.
//!
//! Der Exporter rechnet sein Layout vorab aus und prüft beim Schreiben
//! gegen die geplante Position; dafür muss die Senke ihre aktuelle
//! Schreibposition kennen. Datei-I/O bleibt Sache des Aufrufers.

#[derive(Debug, Default)]
pub struct BinaryWriter {
    buffer: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aktuelle Schreibposition in Bytes.
    pub fn pos(&self) -> usize {
        self.buffer.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn push_u8(&mut self, v: u8) {
        self.buffer.push(v);
    }

    pub fn push_i8(&mut self, v: i8) {
        self.buffer.push(v as u8);
    }

    pub fn push_u16(&mut self, v: u16) {
        self.buffer.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_i16(&mut self, v: i16) {
        self.buffer.extend_from_slice(&v.to_be_bytes());
    }

    pub fn push_u32(&mut self, v: u32) {
        self.buffer.extend_from_slice(&v.to_be_bytes());
    }
}
