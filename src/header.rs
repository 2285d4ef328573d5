//! Header codec: the fixed 67-byte magic/release envelope, the variable/observation
//! counts, the dataset label and timestamp, and the 14-entry section offset map
//! (spec §4.2).

use std::io::{Read, Seek, Write};

use serde::Serialize;

use crate::error::{DtaError, Result};
use crate::io::{DtaReader, DtaWriter};
use crate::tags;

/// Number of i64 entries in the `<map>` section.
pub const MAP_ENTRIES: usize = 14;

/// Canonical positions within the 14-entry `<map>` offset table (spec §4.2).
/// A streaming reader never needs to dereference these (it processes sections
/// sequentially); the writer fills them in after the body is known.
pub mod map_index {
    pub const STATA_DTA: usize = 0;
    pub const MAP: usize = 1;
    pub const VARIABLE_TYPES: usize = 2;
    pub const VARNAMES: usize = 3;
    pub const SORTLIST: usize = 4;
    pub const FORMATS: usize = 5;
    pub const VALUE_LABEL_NAMES: usize = 6;
    pub const VARIABLE_LABELS: usize = 7;
    pub const CHARACTERISTICS: usize = 8;
    pub const DATA: usize = 9;
    pub const STRLS: usize = 10;
    pub const VALUE_LABELS: usize = 11;
    pub const STATA_DTA_CLOSE: usize = 12;
    pub const EOF: usize = 13;
}

/// Release 117 (Stata 13) or 118 (Stata 14). Only these two are supported
/// (spec §1 Non-goals, §4.2 `UnsupportedVersion`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Release {
    R117,
    R118,
}

impl Release {
    pub fn as_u16(self) -> u16 {
        match self {
            Release::R117 => 117,
            Release::R118 => 118,
        }
    }

    /// Field widths that differ by release (spec §4.3 table).
    pub fn variable_name_len(self) -> usize {
        match self {
            Release::R117 => 33,
            Release::R118 => 129,
        }
    }

    pub fn format_len(self) -> usize {
        match self {
            Release::R117 => 49,
            Release::R118 => 57,
        }
    }

    pub fn value_label_name_len(self) -> usize {
        match self {
            Release::R117 => 33,
            Release::R118 => 129,
        }
    }

    pub fn variable_label_len(self) -> usize {
        match self {
            Release::R117 => 81,
            Release::R118 => 321,
        }
    }
}

/// File-level header: release, counts, dataset label/timestamp, and section map.
#[derive(Debug, Clone)]
pub struct Header {
    pub release: Release,
    pub nvars: u16,
    pub nobs: u64,
    pub dataset_label: String,
    pub timestamp: String,
    pub map: [i64; MAP_ENTRIES],
}

/// Reads `<stata_dta><header>...</header><map>...</map>`, leaving the stream
/// positioned right after `</map>`.
pub fn read_header<R: Read + Seek>(reader: &mut DtaReader<R>) -> Result<Header> {
    reader.expect_tag(tags::STATA_DTA_OPEN)?;
    reader.expect_tag(tags::HEADER_OPEN)?;

    reader.expect_tag(tags::RELEASE_OPEN)?;
    let release_str = reader.read_fixed_string(3)?;
    reader.expect_tag(tags::RELEASE_CLOSE)?;
    let release = match release_str.as_str() {
        "117" => Release::R117,
        "118" => Release::R118,
        other => return Err(DtaError::UnsupportedVersion(other.to_string())),
    };

    reader.expect_tag(tags::BYTEORDER_OPEN)?;
    let byteorder = reader.read_fixed_string(3)?;
    reader.expect_tag(tags::BYTEORDER_CLOSE)?;
    if byteorder != "LSF" {
        return Err(DtaError::UnsupportedEndian(byteorder));
    }

    reader.expect_tag(tags::K_OPEN)?;
    let nvars = reader.read_i16()? as u16;
    reader.expect_tag(tags::K_CLOSE)?;

    reader.expect_tag(tags::N_OPEN)?;
    let nobs: u64 = match release {
        Release::R117 => reader.read_i32()? as u64,
        Release::R118 => reader.read_i64()? as u64,
    };
    reader.expect_tag(tags::N_CLOSE)?;

    reader.expect_tag(tags::LABEL_OPEN)?;
    let label_len: usize = match release {
        Release::R117 => reader.read_i8()? as usize,
        Release::R118 => reader.read_i16()? as usize,
    };
    let dataset_label = reader.read_fixed_string(label_len)?;
    reader.expect_tag(tags::LABEL_CLOSE)?;

    reader.expect_tag(tags::TIMESTAMP_OPEN)?;
    let ts_len = reader.read_i8()? as usize;
    let timestamp = reader.read_fixed_string(ts_len)?;
    reader.expect_tag(tags::TIMESTAMP_CLOSE)?;

    reader.expect_tag(tags::HEADER_CLOSE)?;

    reader.expect_tag(tags::MAP_OPEN)?;
    let mut map = [0i64; MAP_ENTRIES];
    for slot in map.iter_mut() {
        *slot = reader.read_i64()?;
    }
    reader.expect_tag(tags::MAP_CLOSE)?;

    Ok(Header { release, nvars, nobs, dataset_label, timestamp, map })
}

/// Formats the current time as Stata's `dd Mon yyyy HH:MM` timestamp (spec §4.2).
pub fn format_timestamp(now: chrono::NaiveDateTime) -> String {
    now.format("%d %b %Y %H:%M").to_string()
}

/// Writes `<stata_dta><header>...</header><map>` with a zeroed map, returning the
/// byte offset where the map's 14 i64 entries begin (so the caller can seek back
/// and overwrite them once the body is known — spec §9 "Deferred offset map").
///
/// The writer always emits release 118, LSF byte order, an empty dataset label,
/// and the current timestamp (spec §4.2; dataset label/timestamp round-trip is an
/// explicit Non-goal per spec §1).
pub fn write_header_placeholder<W: Write + Seek>(
    writer: &mut DtaWriter<W>,
    nvars: u16,
    nobs: u64,
    timestamp: &str,
) -> Result<u64> {
    writer.write_tag(tags::STATA_DTA_OPEN)?;
    writer.write_tag(tags::HEADER_OPEN)?;

    writer.write_tag(tags::RELEASE_OPEN)?;
    writer.write_bytes(b"118")?;
    writer.write_tag(tags::RELEASE_CLOSE)?;

    writer.write_tag(tags::BYTEORDER_OPEN)?;
    writer.write_bytes(b"LSF")?;
    writer.write_tag(tags::BYTEORDER_CLOSE)?;

    writer.write_tag(tags::K_OPEN)?;
    writer.write_i16(nvars as i16)?;
    writer.write_tag(tags::K_CLOSE)?;

    writer.write_tag(tags::N_OPEN)?;
    writer.write_i64(nobs as i64)?;
    writer.write_tag(tags::N_CLOSE)?;

    writer.write_tag(tags::LABEL_OPEN)?;
    writer.write_i16(0)?;
    writer.write_tag(tags::LABEL_CLOSE)?;

    writer.write_tag(tags::TIMESTAMP_OPEN)?;
    writer.write_i8(timestamp.len() as i8)?;
    writer.write_bytes(timestamp.as_bytes())?;
    writer.write_tag(tags::TIMESTAMP_CLOSE)?;

    writer.write_tag(tags::HEADER_CLOSE)?;

    writer.write_tag(tags::MAP_OPEN)?;
    let map_offset = writer.tell()?;
    for _ in 0..MAP_ENTRIES {
        writer.write_i64(0)?;
    }
    writer.write_tag(tags::MAP_CLOSE)?;

    Ok(map_offset)
}

/// Seeks back to `map_offset` and overwrites the 14 placeholder zeros with the
/// final section offsets, then restores the stream position to `end_pos`.
pub fn fixup_map<W: Write + Seek>(
    writer: &mut DtaWriter<W>,
    map_offset: u64,
    map: &[i64; MAP_ENTRIES],
    end_pos: u64,
) -> Result<()> {
    writer.seek_to(map_offset)?;
    for v in map {
        writer.write_i64(*v)?;
    }
    writer.seek_to(end_pos)?;
    Ok(())
}
