//! Binary serialization helpers.
//!
//! Provides the Bitcoin `VarInt` codec and the `BtcReader`/`BtcWriter`
//! cursor types used to read and write consensus-serialized data
//! (little-endian integers, length-prefixed byte strings).

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// VarInt
// ---------------------------------------------------------------------------

/// Bitcoin's variable-length unsigned integer ("CompactSize").
///
/// Values below 0xfd take one byte. Larger values are a marker byte
/// (0xfd, 0xfe, 0xff) followed by 2, 4 or 8 little-endian bytes. The
/// encoder always picks the narrowest form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Decode a VarInt at the start of `data`.
    ///
    /// # Returns
    /// `(value, bytes_consumed)`, or `UnexpectedEof` when `data` is shorter
    /// than the width announced by its first byte.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), PrimitivesError> {
        let mut reader = BtcReader::new(data);
        let value = reader.read_varint()?;
        Ok((value, reader.position()))
    }

    /// Encoded width in bytes.
    pub fn length(&self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }

    /// Minimal wire encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length());
        match self.0 {
            v @ 0..=0xfc => out.push(v as u8),
            v @ 0xfd..=0xffff => {
                out.push(0xfd);
                out.extend_from_slice(&(v as u16).to_le_bytes());
            }
            v @ 0x1_0000..=0xffff_ffff => {
                out.push(0xfe);
                out.extend_from_slice(&(v as u32).to_le_bytes());
            }
            v => {
                out.push(0xff);
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarInt {
    fn from(value: u64) -> Self {
        VarInt(value)
    }
}

impl From<usize> for VarInt {
    fn from(value: usize) -> Self {
        VarInt(value as u64)
    }
}

// ---------------------------------------------------------------------------
// BtcReader
// ---------------------------------------------------------------------------

/// Forward-only cursor over consensus-serialized bytes.
///
/// A read that would pass the end of the buffer fails with
/// `PrimitivesError::UnexpectedEof` and does not move the cursor.
pub struct BtcReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BtcReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BtcReader { data, pos: 0 }
    }

    /// Consume the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        let slice = self.peek(n).ok_or(PrimitivesError::UnexpectedEof)?;
        self.pos += n;
        Ok(slice)
    }

    /// The next `n` bytes without consuming them, or `None` if fewer remain.
    pub fn peek(&self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        self.data.get(self.pos..end)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        self.read_array::<1>().map(|[b]| b)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Read a VarInt.
    ///
    /// On underflow the cursor is restored to the VarInt's first byte.
    pub fn read_varint(&mut self) -> Result<VarInt, PrimitivesError> {
        let start = self.pos;
        let first = self.read_u8()?;
        let value = match first {
            0xff => self.read_u64_le(),
            0xfe => self.read_u32_le().map(u64::from),
            0xfd => self.read_u16_le().map(u64::from),
            b => Ok(u64::from(b)),
        };
        value.map(VarInt).map_err(|e| {
            self.pos = start;
            e
        })
    }

    /// Read a VarInt length prefix followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], PrimitivesError> {
        let start = self.pos;
        let len = self.read_varint()?.value();
        let len = usize::try_from(len).map_err(|_| PrimitivesError::UnexpectedEof)?;
        self.read_bytes(len).map_err(|e| {
            self.pos = start;
            e
        })
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

// ---------------------------------------------------------------------------
// BtcWriter
// ---------------------------------------------------------------------------

/// Append-only buffer for consensus serialization.
#[derive(Debug, Default)]
pub struct BtcWriter {
    buf: Vec<u8>,
}

impl BtcWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        BtcWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    pub fn write_u16_le(&mut self, val: u16) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, val: u32) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, val: u64) {
        self.write_bytes(&val.to_le_bytes());
    }

    pub fn write_varint(&mut self, varint: VarInt) {
        self.write_bytes(&varint.to_bytes());
    }

    /// Append a VarInt length prefix followed by `bytes`.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(VarInt::from(bytes.len()));
        self.write_bytes(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- VarInt decode --

    #[test]
    fn test_decode_varint_widths() {
        // (encoding, value, consumed); trailing bytes stay unread
        let cases: &[(&[u8], u64, usize)] = &[
            (&[0xff, 0, 0, 0, 0, 0, 0, 0, 0], 0, 9),
            (&[0xfe, 0, 0, 0, 0], 0, 5),
            (&[0xfd, 0, 0], 0, 3),
            (&[0x01, 0xaa, 0xbb], 1, 1),
        ];
        for (bytes, value, consumed) in cases {
            assert_eq!(VarInt::from_bytes(bytes).unwrap(), (VarInt(*value), *consumed));
        }
    }

    #[test]
    fn test_decode_varint_truncated() {
        assert!(VarInt::from_bytes(&[]).is_err());
        assert!(VarInt::from_bytes(&[0xfd, 0x01]).is_err());
        assert!(VarInt::from_bytes(&[0xfe, 0x01, 0x02, 0x03]).is_err());
        assert!(VarInt::from_bytes(&[0xff, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }

    // -- VarInt encode --

    #[test]
    fn test_varint_boundaries() {
        let cases: Vec<(u64, Vec<u8>)> = vec![
            (0, vec![0x00]),
            (1, vec![0x01]),
            (0xfc, vec![0xfc]),
            (0xfd, vec![0xfd, 0xfd, 0x00]),
            (0xffff, vec![0xfd, 0xff, 0xff]),
            (0x10000, vec![0xfe, 0x00, 0x00, 0x01, 0x00]),
            (0xffff_ffff, vec![0xfe, 0xff, 0xff, 0xff, 0xff]),
            (0x1_0000_0000, vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]),
            (u64::MAX, vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
        ];

        for (value, expected) in cases {
            let vi = VarInt(value);
            assert_eq!(vi.length(), expected.len(), "length mismatch for {}", value);
            assert_eq!(vi.to_bytes(), expected, "encoding mismatch for {}", value);

            let (decoded, consumed) = VarInt::from_bytes(&expected).unwrap();
            assert_eq!(decoded, vi, "decode mismatch for {}", value);
            assert_eq!(consumed, expected.len());
        }
    }

    // -- BtcReader / BtcWriter --

    #[test]
    fn test_reader_writer_roundtrip() {
        let mut writer = BtcWriter::new();
        writer.write_u8(0x42);
        writer.write_u16_le(0x1234);
        writer.write_u32_le(0xDEADBEEF);
        writer.write_u64_le(0x0102030405060708);
        writer.write_varint(VarInt(300));
        writer.write_var_bytes(b"hello");

        let data = writer.into_bytes();
        let mut reader = BtcReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.read_u32_le().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0102030405060708);
        assert_eq!(reader.read_varint().unwrap(), VarInt(300));
        assert_eq!(reader.read_var_bytes().unwrap(), b"hello");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_eof_keeps_position() {
        let mut reader = BtcReader::new(&[0x01, 0xfd, 0x05]);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert!(matches!(reader.read_varint(), Err(PrimitivesError::UnexpectedEof)));
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.remaining(), 2);
    }

    #[test]
    fn test_reader_peek() {
        let reader = BtcReader::new(&[0x00, 0x01, 0x02]);
        assert_eq!(reader.peek(2), Some(&[0x00, 0x01][..]));
        assert_eq!(reader.peek(4), None);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_read_var_bytes_truncated() {
        let mut reader = BtcReader::new(&[0x03, 0xaa, 0xbb]);
        assert!(reader.read_var_bytes().is_err());
        assert_eq!(reader.position(), 0);
    }
}
