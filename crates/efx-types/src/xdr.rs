//! Minimal XDR encoder.
//!
//! Only encoding is provided: identifiers such as pool ids, contract ids and
//! ledger-key hashes are defined as hashes over the canonical XDR form of a
//! value, so the engine needs to reproduce those bytes exactly. All integers
//! are big-endian and opaque data is zero-padded to a 4-byte boundary.

/// Append-only XDR byte buffer.
#[derive(Debug, Default, Clone)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u32(v as u32);
    }

    /// Fixed-length opaque data, padded to a multiple of four bytes.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.pad(bytes.len());
    }

    /// Variable-length opaque data: `u32` length prefix then padded bytes.
    pub fn write_var(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_fixed(bytes);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_var(s.as_bytes());
    }

    /// Optional value: a boolean discriminant followed by the value if present.
    pub fn write_option<T: ToXdr>(&mut self, value: Option<&T>) {
        match value {
            Some(v) => {
                self.write_bool(true);
                v.write_xdr(self);
            }
            None => self.write_bool(false),
        }
    }

    /// Variable-length array of encodable values.
    pub fn write_array<T: ToXdr>(&mut self, items: &[T]) {
        self.write_u32(items.len() as u32);
        for item in items {
            item.write_xdr(self);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn pad(&mut self, len: usize) {
        let rem = len % 4;
        if rem != 0 {
            self.buf.extend(std::iter::repeat(0u8).take(4 - rem));
        }
    }
}

/// Types with a canonical XDR encoding.
pub trait ToXdr {
    fn write_xdr(&self, w: &mut XdrWriter);

    fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        self.write_xdr(&mut w);
        w.into_bytes()
    }
}
