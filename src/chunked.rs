//! Chunked reader driver: splits the `<data>` section into row-ranged slabs so a
//! reader can bound peak memory on large files (spec §5 "Concurrency & Resource
//! Model").
//!
//! Below the size threshold the whole body is read in a single pass. Above it,
//! rows are read in `chunk_count` slabs (never smaller than `min_rows_per_chunk`
//! rows), each seeked to directly using the fixed per-row byte length. Either way
//! the same per-column buffers are filled and handed to [`crate::data::finish_table`]
//! exactly once, so the resulting [`crate::table::Table`] does not depend on how
//! many chunks were used (spec's chunk-equivalence testable property).

use std::collections::HashMap;
use std::io::{Read, Seek};

use crate::data::{decode_rows_into, finish_table, row_byte_len};
use crate::error::Result;
use crate::header::Release;
use crate::io::DtaReader;
use crate::metadata::VariableMeta;
use crate::strl::StrLKey;
use crate::table::Table;
use crate::value_labels::ValueLabelSet;

/// Tunables for chunked reading (spec §5).
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// Data bodies smaller than this are read in a single pass.
    pub size_threshold_bytes: u64,
    /// Target number of chunks to split a large data body into.
    pub chunk_count: usize,
    /// A chunk is never smaller than this many rows (avoids pathological
    /// many-tiny-chunks behavior on files with very few, very wide rows).
    pub min_rows_per_chunk: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { size_threshold_bytes: 100_000_000, chunk_count: 10, min_rows_per_chunk: 100_000 }
    }
}

/// Row `[start, end)` ranges a data body of `total_rows` rows is split into
/// under `cfg`.
pub fn row_ranges(total_rows: usize, cfg: &ChunkConfig) -> Vec<(usize, usize)> {
    if total_rows == 0 {
        return Vec::new();
    }
    let even_share = total_rows.div_ceil(cfg.chunk_count);
    let rows_per_chunk = even_share.max(cfg.min_rows_per_chunk);

    let mut ranges = Vec::new();
    let mut start = 0;
    while start < total_rows {
        let end = (start + rows_per_chunk).min(total_rows);
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Reads the `<data>` body starting at `data_start_offset`, chunked according to
/// `cfg` once the body exceeds `cfg.size_threshold_bytes`.
#[allow(clippy::too_many_arguments)]
pub fn read_data_chunked<R: Read + Seek>(
    reader: &mut DtaReader<R>,
    release: Release,
    metas: &[VariableMeta],
    nobs: u64,
    strl_heap: &HashMap<StrLKey, String>,
    value_label_sets: &HashMap<String, ValueLabelSet>,
    data_start_offset: u64,
    cfg: &ChunkConfig,
    keep_original: bool,
) -> Result<Table> {
    let k = metas.len();
    let mut raw_numeric: Vec<Vec<Option<i64>>> = vec![Vec::new(); k];
    let mut raw_float: Vec<Vec<Option<f64>>> = vec![Vec::new(); k];
    let mut raw_text: Vec<Vec<Option<String>>> = vec![Vec::new(); k];
    let mut raw_strl: Vec<Vec<Option<crate::strl::StrLKey>>> = vec![Vec::new(); k];

    let total_bytes = row_byte_len(metas) * nobs;
    reader.seek_to(data_start_offset)?;

    if total_bytes < cfg.size_threshold_bytes {
        decode_rows_into(
            reader,
            release,
            metas,
            nobs as usize,
            &mut raw_numeric,
            &mut raw_float,
            &mut raw_text,
            &mut raw_strl,
        )?;
    } else {
        let row_len = row_byte_len(metas);
        for (start, end) in row_ranges(nobs as usize, cfg) {
            reader.seek_to(data_start_offset + start as u64 * row_len)?;
            decode_rows_into(
                reader,
                release,
                metas,
                end - start,
                &mut raw_numeric,
                &mut raw_float,
                &mut raw_text,
                &mut raw_strl,
            )?;
        }
    }

    finish_table(metas, &raw_numeric, &raw_float, &raw_text, &raw_strl, strl_heap, value_label_sets, keep_original)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_all_rows_without_overlap() {
        let cfg = ChunkConfig { size_threshold_bytes: 0, chunk_count: 4, min_rows_per_chunk: 10 };
        let ranges = row_ranges(37, &cfg);
        let mut covered = 0;
        for (s, e) in &ranges {
            assert_eq!(*s, covered);
            covered = *e;
        }
        assert_eq!(covered, 37);
    }

    #[test]
    fn respects_minimum_chunk_size() {
        let cfg = ChunkConfig { size_threshold_bytes: 0, chunk_count: 100, min_rows_per_chunk: 1000 };
        let ranges = row_ranges(2500, &cfg);
        for (s, e) in &ranges[..ranges.len() - 1] {
            assert!(e - s >= 1000);
        }
    }

    #[test]
    fn empty_table_has_no_ranges() {
        let cfg = ChunkConfig::default();
        assert!(row_ranges(0, &cfg).is_empty());
    }
}
