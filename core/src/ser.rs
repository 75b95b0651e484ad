//! Little-endian wire serialization for consensus hashing
//!
//! Message hashes and signature digests are computed over explicit byte
//! streams, never over serde output. Integers are little-endian and byte
//! strings are compact-size prefixed, bit-exact with the existing network.

use crate::hash::Hash256;
use crate::outpoint::Outpoint;

/// Append-only byte stream builder.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        WireWriter { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16_le(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64_le(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Variable-length integer: 1, 3, 5 or 9 bytes depending on magnitude.
    pub fn write_compact_size(&mut self, n: u64) {
        if n < 0xfd {
            self.buf.push(n as u8);
        } else if n <= 0xffff {
            self.buf.push(0xfd);
            self.write_u16_le(n as u16);
        } else if n <= 0xffff_ffff {
            self.buf.push(0xfe);
            self.write_u32_le(n as u32);
        } else {
            self.buf.push(0xff);
            self.write_u64_le(n);
        }
    }

    pub fn write_bytes(&mut self, raw: &[u8]) {
        self.buf.extend_from_slice(raw);
    }

    /// Compact-size length prefix followed by the raw bytes.
    pub fn write_var_bytes(&mut self, raw: &[u8]) {
        self.write_compact_size(raw.len() as u64);
        self.buf.extend_from_slice(raw);
    }

    pub fn write_var_str(&mut self, s: &str) {
        self.write_var_bytes(s.as_bytes());
    }

    /// Raw 32 bytes, no length prefix.
    pub fn write_hash(&mut self, h: &Hash256) {
        self.buf.extend_from_slice(h.as_bytes());
    }

    /// txid followed by the little-endian output index.
    pub fn write_outpoint(&mut self, o: &Outpoint) {
        self.write_hash(&o.txid);
        self.write_u32_le(o.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_size_encodings() {
        let mut w = WireWriter::new();
        w.write_compact_size(0);
        w.write_compact_size(0xfc);
        w.write_compact_size(0xfd);
        w.write_compact_size(0xffff);
        w.write_compact_size(0x1_0000);
        w.write_compact_size(0x1_0000_0000);
        assert_eq!(
            w.into_bytes(),
            vec![
                0x00, // 0
                0xfc, // 252
                0xfd, 0xfd, 0x00, // 253
                0xfd, 0xff, 0xff, // 65535
                0xfe, 0x00, 0x00, 0x01, 0x00, // 65536
                0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, // 2^32
            ]
        );
    }

    #[test]
    fn test_integers_are_little_endian() {
        let mut w = WireWriter::new();
        w.write_u32_le(0x0102_0304);
        w.write_i64_le(-1);
        assert_eq!(
            w.into_bytes(),
            vec![0x04, 0x03, 0x02, 0x01, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn test_var_str_prefixes_length() {
        let mut w = WireWriter::new();
        w.write_var_str("abc");
        assert_eq!(w.into_bytes(), vec![3, b'a', b'b', b'c']);
    }

    #[test]
    fn test_outpoint_layout() {
        let o = Outpoint::new(Hash256([0x11; 32]), 7);
        let mut w = WireWriter::new();
        w.write_outpoint(&o);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[..32], &[0x11; 32]);
        assert_eq!(&bytes[32..], &[7, 0, 0, 0]);
    }
}
