//! strL heap codec: the optional `<strls>` section holding variable-length
//! string (and binary) payloads addressed by `(v, o)` references from the data
//! body (spec §4.5).
//!
//! This crate only ever materializes strL content as text (spec §1 Non-goal:
//! binary/BLOB strL payloads are out of scope — they decode to `None` if
//! encountered). strLs are never re-emitted on write: the heap this crate writes
//! is always empty, and strL-typed columns are converted to fixed-width text (or
//! excluded if too long) by [`crate::write_prep`].

use std::collections::HashMap;
use std::io::{Read, Seek, Write};

use crate::error::Result;
use crate::header::Release;
use crate::io::{DtaReader, DtaWriter};
use crate::tags;

/// A `(v, o)` strL reference as packed in the data body, used as the heap key.
pub type StrLKey = (u32, u32);

const GSO_TAG: &[u8] = b"GSO";
const GSO_KIND_TEXT: u8 = 130;

/// Reads one GSO record's `v`/`o` header pair (spec §4.5): `v` is always i32,
/// `o` is i32 on release 117 but widens to i64 on release 118.
fn read_gso_vo<R: Read + Seek>(reader: &mut DtaReader<R>, release: Release) -> Result<StrLKey> {
    let v = reader.read_i32()? as u32;
    let o = match release {
        Release::R117 => reader.read_i32()? as u32,
        Release::R118 => reader.read_i64()? as u32,
    };
    Ok((v, o))
}

/// Reads every `GSO` record between the current position and `end_offset`,
/// returning a lookup table from `(v, o)` to decoded text. Binary-safe
/// payloads (flag byte 129) are not text and are skipped.
pub fn read_strls<R: Read + Seek>(
    reader: &mut DtaReader<R>,
    release: Release,
    end_offset: u64,
) -> Result<HashMap<StrLKey, String>> {
    reader.expect_tag(tags::STRLS_OPEN)?;

    let mut heap = HashMap::new();
    while reader.tell()? < end_offset {
        reader.expect_tag(GSO_TAG)?;
        let (v, o) = read_gso_vo(reader, release)?;
        let kind = reader.read_u8()?;
        let len = reader.read_u32()? as usize;
        let data = reader.read_bytes(len)?;

        if kind == GSO_KIND_TEXT {
            let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
            let text = String::from_utf8_lossy(&data[..end]).into_owned();
            heap.insert((v, o), text);
        }
    }

    reader.expect_tag(tags::STRLS_CLOSE)?;
    Ok(heap)
}

/// Writes an always-empty `<strls>` section (spec §9 "strLs are never re-emitted").
pub fn write_empty_strls<W: Write + Seek>(writer: &mut DtaWriter<W>) -> Result<()> {
    writer.write_tag(tags::STRLS_OPEN)?;
    writer.write_tag(tags::STRLS_CLOSE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn write_gso(buf: &mut Vec<u8>, release: Release, v: u32, o: u32, text: &str) {
        buf.extend_from_slice(GSO_TAG);
        buf.extend_from_slice(&v.to_le_bytes());
        match release {
            Release::R117 => buf.extend_from_slice(&o.to_le_bytes()),
            Release::R118 => buf.extend_from_slice(&(o as i64).to_le_bytes()),
        }
        buf.push(GSO_KIND_TEXT);
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&data);
    }

    #[test]
    fn reads_text_records() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(tags::STRLS_OPEN);
        write_gso(&mut bytes, Release::R118, 1, 1, "hello world");
        write_gso(&mut bytes, Release::R118, 1, 2, "a longer strL value");
        let strls_close_at = bytes.len() as u64;
        bytes.extend_from_slice(tags::STRLS_CLOSE);

        let mut buf = Cursor::new(bytes);
        let mut r = DtaReader::new(&mut buf);
        let heap = read_strls(&mut r, Release::R118, strls_close_at).unwrap();

        assert_eq!(heap.get(&(1, 1)).unwrap(), "hello world");
        assert_eq!(heap.get(&(1, 2)).unwrap(), "a longer strL value");
    }

    #[test]
    fn reads_text_records_release_117() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(tags::STRLS_OPEN);
        write_gso(&mut bytes, Release::R117, 1, 1, "hello world");
        let strls_close_at = bytes.len() as u64;
        bytes.extend_from_slice(tags::STRLS_CLOSE);

        let mut buf = Cursor::new(bytes);
        let mut r = DtaReader::new(&mut buf);
        let heap = read_strls(&mut r, Release::R117, strls_close_at).unwrap();

        assert_eq!(heap.get(&(1, 1)).unwrap(), "hello world");
    }

    #[test]
    fn empty_strls_round_trips() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = DtaWriter::new(&mut buf);
            write_empty_strls(&mut w).unwrap();
        }
        let end = tags::STRLS_OPEN.len() as u64;
        buf.set_position(0);
        let mut r = DtaReader::new(&mut buf);
        let heap = read_strls(&mut r, Release::R118, end).unwrap();
        assert!(heap.is_empty());
    }
}
