//! Typed little-endian byte I/O over a seekable stream.
//!
//! [`DtaReader`] and [`DtaWriter`] wrap any `Read + Seek` / `Write + Seek` and provide
//! the fixed-width integer/float reads and writes, fixed-length padded string
//! handling, and position bookkeeping (`tell`/`seek`/`skip`) that every other codec
//! module builds on. All multi-byte values are little-endian (spec §6: "All
//! multi-byte integers and floats are little-endian").

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{DtaError, Result};

/// Typed reader over a little-endian `.dta` byte stream.
pub struct DtaReader<R> {
    inner: R,
}

impl<R: Read + Seek> DtaReader<R> {
    /// Wraps an existing reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consumes the reader, returning the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current byte offset from the start of the stream.
    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seeks to an absolute byte offset.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Skips forward `n` bytes from the current position.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(n as i64))?;
        Ok(())
    }

    /// Reads exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    /// Reads a signed 8-bit integer.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.inner.read_i8()?)
    }

    /// Reads a little-endian signed 16-bit integer.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.inner.read_i16::<LittleEndian>()?)
    }

    /// Reads a little-endian unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    /// Reads a little-endian signed 32-bit integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    /// Reads a little-endian unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    /// Reads a little-endian signed 64-bit integer.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.inner.read_i64::<LittleEndian>()?)
    }

    /// Reads a little-endian 32-bit float.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(self.inner.read_f32::<LittleEndian>()?)
    }

    /// Reads a little-endian 64-bit float.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(self.inner.read_f64::<LittleEndian>()?)
    }

    /// Reads `len` bytes and returns the null-terminated prefix as a UTF-8 string
    /// (lossy). The string is the bytes up to the first `0x00` byte, or the full
    /// field if no zero byte is present (spec §4.3).
    pub fn read_fixed_string(&mut self, len: usize) -> Result<String> {
        let buf = self.read_bytes(len)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }

    /// Reads a literal ASCII tag (e.g. `<header>`) and fails with
    /// [`DtaError::FormatError`] if the bytes at the current position don't match.
    pub fn expect_tag(&mut self, tag: &[u8]) -> Result<()> {
        let got = self.read_bytes(tag.len())?;
        if got != tag {
            return Err(DtaError::FormatError(format!(
                "expected tag {:?}, found {:?}",
                String::from_utf8_lossy(tag),
                String::from_utf8_lossy(&got)
            )));
        }
        Ok(())
    }

    /// Peeks at the next `n` bytes without advancing the stream position.
    pub fn peek_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let pos = self.tell()?;
        let buf = self.read_bytes(n)?;
        self.seek_to(pos)?;
        Ok(buf)
    }
}

/// Typed writer over a little-endian `.dta` byte stream.
pub struct DtaWriter<W> {
    inner: W,
}

impl<W: Write + Seek> DtaWriter<W> {
    /// Wraps an existing writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Consumes the writer, returning the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Current byte offset from the start of the stream.
    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seeks to an absolute byte offset.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Writes a literal ASCII tag.
    pub fn write_tag(&mut self, tag: &[u8]) -> Result<()> {
        self.inner.write_all(tag)?;
        Ok(())
    }

    /// Writes raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        Ok(self.inner.write_u8(v)?)
    }

    /// Writes a signed 8-bit integer.
    pub fn write_i8(&mut self, v: i8) -> Result<()> {
        Ok(self.inner.write_i8(v)?)
    }

    /// Writes a little-endian signed 16-bit integer.
    pub fn write_i16(&mut self, v: i16) -> Result<()> {
        Ok(self.inner.write_i16::<LittleEndian>(v)?)
    }

    /// Writes a little-endian unsigned 16-bit integer.
    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        Ok(self.inner.write_u16::<LittleEndian>(v)?)
    }

    /// Writes a little-endian signed 32-bit integer.
    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        Ok(self.inner.write_i32::<LittleEndian>(v)?)
    }

    /// Writes a little-endian unsigned 32-bit integer.
    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        Ok(self.inner.write_u32::<LittleEndian>(v)?)
    }

    /// Writes a little-endian signed 64-bit integer.
    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        Ok(self.inner.write_i64::<LittleEndian>(v)?)
    }

    /// Writes a little-endian 32-bit float.
    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        Ok(self.inner.write_f32::<LittleEndian>(v)?)
    }

    /// Writes a little-endian 64-bit float.
    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        Ok(self.inner.write_f64::<LittleEndian>(v)?)
    }

    /// Writes `s` null-padded (or truncated) to exactly `len` bytes.
    pub fn write_fixed_string(&mut self, s: &str, len: usize) -> Result<()> {
        let mut buf = vec![0u8; len];
        let bytes = s.as_bytes();
        let n = bytes.len().min(len);
        buf[..n].copy_from_slice(&bytes[..n]);
        self.write_bytes(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip_scalars() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = DtaWriter::new(&mut buf);
            w.write_i16(-7).unwrap();
            w.write_i32(123_456).unwrap();
            w.write_f64(3.5).unwrap();
        }
        buf.set_position(0);
        let mut r = DtaReader::new(&mut buf);
        assert_eq!(r.read_i16().unwrap(), -7);
        assert_eq!(r.read_i32().unwrap(), 123_456);
        assert_eq!(r.read_f64().unwrap(), 3.5);
    }

    #[test]
    fn fixed_string_null_trim() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = DtaWriter::new(&mut buf);
            w.write_fixed_string("abc", 8).unwrap();
        }
        buf.set_position(0);
        let mut r = DtaReader::new(&mut buf);
        assert_eq!(r.read_fixed_string(8).unwrap(), "abc");
    }

    #[test]
    fn expect_tag_mismatch_errors() {
        let mut buf = Cursor::new(b"<wrong>".to_vec());
        let mut r = DtaReader::new(&mut buf);
        assert!(r.expect_tag(b"<header>").is_err());
    }
}
