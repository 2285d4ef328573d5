//! Read and write Stata `.dta` binary files, format releases 117 (Stata 13) and
//! 118 (Stata 14).
//!
//! This crate is a pure-Rust codec with no FFI, no Arrow/Parquet output, and no
//! CLI. It decodes a `.dta` file into a generic in-memory [`Table`] of typed,
//! possibly-missing, possibly-categorical columns, and encodes a [`Table`] back
//! into the on-disk format.
//!
//! # Quick Start
//!
//! ```no_run
//! use stata_dta::{read, write};
//!
//! # fn main() -> Result<(), stata_dta::DtaError> {
//! let table = read("survey.dta")?;
//! println!("{} rows, {} columns", table.row_count(), table.column_count());
//!
//! let excluded = write("survey_copy.dta", &table)?;
//! for col in &excluded {
//!     eprintln!("dropped column '{}': {}", col.name, col.reason);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Key Types
//!
//! - [`Table`] / [`Column`] / [`ColumnData`] — the in-memory data model
//! - [`Categorical`] — integer-coded categorical column backed by a shared level pool
//! - [`ReadConfig`] — chunked-read tuning (spec §5)
//! - [`ExcludedColumn`] — a write-side column this crate could not represent on disk
//! - [`DtaError`] — the crate's error type
//!
//! # Streaming reads
//!
//! Data bodies above [`chunked::ChunkConfig::size_threshold_bytes`] are read in
//! row-ranged slabs rather than all at once, bounding peak memory on large files.
//! [`read_metadata`] reads only the header and variable metadata, skipping the
//! data body entirely, for callers that just need schema information.

#![warn(missing_docs)]

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

pub mod chunked;
mod data;
pub mod error;
mod header;
mod io;
pub mod metadata;
mod strl;
mod tags;
pub mod table;
mod types;
pub mod value_labels;
pub mod write_prep;

mod date;

pub use chunked::ChunkConfig;
pub use error::{DtaError, Result};
pub use header::Release;
pub use metadata::VariableMeta;
pub use table::{Categorical, Column, ColumnData, Table};
pub use write_prep::ExcludedColumn;

use io::{DtaReader, DtaWriter};
use value_labels::ValueLabelSet;

/// Tunables for reading: chunked-read sizing (spec §5) and categorical label
/// rendering (spec §4.6, §6).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadConfig {
    /// Row-chunking thresholds for the data body.
    pub chunk: ChunkConfig,
    /// When set, a value-labeled categorical's category text is `"code:
    /// label"` instead of just `label`, so both the raw code and its
    /// dictionary text stay visible.
    pub keep_original: bool,
}

/// Schema-only view of a `.dta` file: everything but the data body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileMetadata {
    pub release: Release,
    pub row_count: u64,
    pub dataset_label: String,
    pub timestamp: String,
    pub variables: Vec<VariableMeta>,
}

impl FileMetadata {
    /// Renders this schema as a JSON document, for callers that want to
    /// inspect or log a file's shape without pulling in the full [`Table`] API.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reads a `.dta` file at `path` into a [`Table`], using default [`ReadConfig`].
pub fn read(path: impl AsRef<Path>) -> Result<Table> {
    read_with_config(path, ReadConfig::default())
}

/// Reads a `.dta` file at `path` with an explicit [`ReadConfig`].
pub fn read_with_config(path: impl AsRef<Path>, cfg: ReadConfig) -> Result<Table> {
    let file = File::open(path.as_ref())?;
    log::debug!("opened {:?} for reading", path.as_ref());
    read_from(file, cfg)
}

/// Reads only the header and variable metadata, skipping the data body
/// entirely (spec's supplemented "metadata-only read" feature).
pub fn read_metadata(path: impl AsRef<Path>) -> Result<FileMetadata> {
    let file = File::open(path.as_ref())?;
    let mut reader = DtaReader::new(file);
    let header = header::read_header(&mut reader)?;
    let variables = metadata::read_variable_metadata(&mut reader, header.release, header.nvars)?;
    Ok(FileMetadata {
        release: header.release,
        row_count: header.nobs,
        dataset_label: header.dataset_label,
        timestamp: header.timestamp,
        variables,
    })
}

/// Decodes a `.dta` byte stream from any `Read + Seek` source.
pub fn read_reader<R: Read + Seek>(reader: R, cfg: ReadConfig) -> Result<Table> {
    read_from(reader, cfg)
}

fn read_from<R: Read + Seek>(inner: R, cfg: ReadConfig) -> Result<Table> {
    let mut reader = DtaReader::new(inner);

    let header = header::read_header(&mut reader)?;
    log::debug!("release {}, {} vars, {} obs", header.release.as_u16(), header.nvars, header.nobs);

    let metas = metadata::read_variable_metadata(&mut reader, header.release, header.nvars)?;

    reader.seek_to(header.map[header::map_index::DATA] as u64)?;
    reader.expect_tag(tags::DATA_OPEN)?;
    let data_start = reader.tell()?;

    let row_len = data::row_byte_len(&metas);
    let data_end = data_start + row_len * header.nobs;
    reader.seek_to(data_end)?;
    reader.expect_tag(tags::DATA_CLOSE)?;

    let strl_heap = if tags::strls_section_present(&mut reader)? {
        let strls_end = header.map[header::map_index::VALUE_LABELS] as u64 - tags::STRLS_CLOSE.len() as u64;
        strl::read_strls(&mut reader, header.release, strls_end)?
    } else {
        HashMap::new()
    };

    let value_labels_end =
        header.map[header::map_index::STATA_DTA_CLOSE] as u64 - tags::VALUE_LABELS_CLOSE.len() as u64;
    let value_label_list = value_labels::read_value_labels(&mut reader, header.release, value_labels_end)?;
    let value_label_sets: HashMap<String, ValueLabelSet> = value_label_list.into_iter().collect();

    reader.expect_tag(tags::STATA_DTA_CLOSE)?;

    chunked::read_data_chunked(
        &mut reader,
        header.release,
        &metas,
        header.nobs,
        &strl_heap,
        &value_label_sets,
        data_start,
        &cfg.chunk,
        cfg.keep_original,
    )
}

/// Writes `table` to a `.dta` file at `path`, release 118. Returns the columns
/// that were excluded because no storage type could represent them (spec
/// §4.7); excluded columns are not an error.
pub fn write(path: impl AsRef<Path>, table: &Table) -> Result<Vec<ExcludedColumn>> {
    let file = File::create(path.as_ref())?;
    log::debug!("opened {:?} for writing", path.as_ref());
    write_to(file, table)
}

/// Encodes `table` to any `Write + Seek` destination.
pub fn write_writer<W: Write + Seek>(writer: W, table: &Table) -> Result<Vec<ExcludedColumn>> {
    write_to(writer, table)
}

fn write_to<W: Write + Seek>(inner: W, table: &Table) -> Result<Vec<ExcludedColumn>> {
    let prepared = write_prep::prepare_table(table);
    for excluded in &prepared.excluded {
        log::warn!("excluding column '{}': {}", excluded.name, excluded.reason);
    }

    let mut writer = DtaWriter::new(inner);
    let release = Release::R118;

    let timestamp = header::format_timestamp(chrono::Local::now().naive_local());
    let nvars = prepared.metas.len() as u16;
    let nobs = prepared.columns.first().map(|c| c.len()).unwrap_or(0) as u64;

    let map_offset = header::write_header_placeholder(&mut writer, nvars, nobs, &timestamp)?;
    let variable_types_offset = writer.tell()?;

    metadata::write_variable_metadata(&mut writer, release, &prepared.metas)?;

    let data_offset = writer.tell()?;
    writer.write_tag(tags::DATA_OPEN)?;

    let value_label_sets_vec = data::build_value_label_sets(&prepared.metas, &prepared.columns);
    let value_label_sets: HashMap<String, ValueLabelSet> = value_label_sets_vec.iter().cloned().collect();

    data::write_data_body(&mut writer, release, &prepared.metas, &prepared.columns, &value_label_sets)?;
    writer.write_tag(tags::DATA_CLOSE)?;

    let strls_offset = writer.tell()?;
    strl::write_empty_strls(&mut writer)?;

    let value_labels_offset = writer.tell()?;
    value_labels::write_value_labels(&mut writer, release, &value_label_sets_vec)?;

    let stata_dta_close_offset = writer.tell()?;
    writer.write_tag(tags::STATA_DTA_CLOSE)?;
    let eof = writer.tell()?;

    let mut map = [0i64; header::MAP_ENTRIES];
    map[header::map_index::STATA_DTA] = 0;
    map[header::map_index::MAP] = map_offset as i64 - tags::MAP_OPEN.len() as i64;
    map[header::map_index::VARIABLE_TYPES] = variable_types_offset as i64;
    map[header::map_index::DATA] = data_offset as i64;
    map[header::map_index::STRLS] = strls_offset as i64;
    map[header::map_index::VALUE_LABELS] = value_labels_offset as i64;
    map[header::map_index::STATA_DTA_CLOSE] = stata_dta_close_offset as i64;
    map[header::map_index::EOF] = eof as i64;
    header::fixup_map(&mut writer, map_offset, &map, eof)?;

    Ok(prepared.excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use table::ColumnData;

    #[test]
    fn round_trips_a_small_table() {
        let table = Table::new(vec![
            Column::new("id", ColumnData::I32(vec![Some(1), Some(2), None])),
            Column::new("name", ColumnData::Str(vec![Some("alice".to_string()), Some("bob".to_string()), None])),
        ]);

        let mut buf = Cursor::new(Vec::new());
        let excluded = write_writer(&mut buf, &table).unwrap();
        assert!(excluded.is_empty());

        buf.set_position(0);
        let back = read_reader(&mut buf, ReadConfig::default()).unwrap();

        assert_eq!(back.row_count(), 3);
        assert_eq!(back.column_count(), 2);
        match &back.column("id").unwrap().data {
            ColumnData::I32(v) => assert_eq!(v, &vec![Some(1), Some(2), None]),
            other => panic!("expected I32, got {other:?}"),
        }
        match &back.column("name").unwrap().data {
            ColumnData::Str(v) => {
                assert_eq!(v, &vec![Some("alice".to_string()), Some("bob".to_string()), None])
            }
            other => panic!("expected Str, got {other:?}"),
        }
    }

    #[test]
    fn round_trips_categorical_value_labels() {
        let cat = Categorical::new(vec![Some(0), Some(1), Some(0), None], vec!["No".to_string(), "Yes".to_string()]);
        let table = Table::new(vec![Column::new("flag", ColumnData::CategoricalStr(cat))]);

        let mut buf = Cursor::new(Vec::new());
        write_writer(&mut buf, &table).unwrap();
        buf.set_position(0);
        let back = read_reader(&mut buf, ReadConfig::default()).unwrap();

        match &back.column("flag").unwrap().data {
            ColumnData::CategoricalStr(cat) => {
                assert_eq!(cat.levels, vec!["No".to_string(), "Yes".to_string()]);
                assert_eq!(cat.codes, vec![Some(0), Some(1), Some(0), None]);
            }
            other => panic!("expected CategoricalStr, got {other:?}"),
        }
    }
}
