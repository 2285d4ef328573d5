//! Data-section codec: row-major cell decode/encode, sentinel missing-value
//! handling, date/datetime interpretation, and the categorical construction
//! pass that turns value-labeled (or strL) columns into
//! [`crate::table::ColumnData::CategoricalStr`] (spec §4.6, §9).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Seek, Write};

use crate::date;
use crate::error::Result;
use crate::header::Release;
use crate::io::{DtaReader, DtaWriter};
use crate::metadata::VariableMeta;
use crate::strl::StrLKey;
use crate::table::{Categorical, Column, ColumnData, Table};
use crate::types::{classify_format, sentinel, FormatKind, StorageType};
use crate::value_labels::ValueLabelSet;

/// Reads the `<data>` section body: `nobs` rows of `nvars` cells each, row-major
/// (spec §4.6 "Data body layout"), then builds the final [`Table`] by applying
/// date/datetime interpretation and value-label/strL categorical construction.
pub fn read_data_body<R: Read + Seek>(
    reader: &mut DtaReader<R>,
    release: Release,
    metas: &[VariableMeta],
    nobs: u64,
    strl_heap: &HashMap<StrLKey, String>,
    value_label_sets: &HashMap<String, ValueLabelSet>,
    keep_original: bool,
) -> Result<Table> {
    let k = metas.len();
    let mut raw_numeric: Vec<Vec<Option<i64>>> = vec![Vec::new(); k];
    let mut raw_float: Vec<Vec<Option<f64>>> = vec![Vec::new(); k];
    let mut raw_text: Vec<Vec<Option<String>>> = vec![Vec::new(); k];
    let mut raw_strl: Vec<Vec<Option<StrLKey>>> = vec![Vec::new(); k];

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

    finish_table(metas, &raw_numeric, &raw_float, &raw_text, &raw_strl, strl_heap, value_label_sets, keep_original)
}

/// Decodes `row_count` consecutive rows from the current stream position,
/// appending each column's cells to the matching buffer. strL cells append the
/// raw `(v, o)` reference rather than resolved text, since the strL heap lives
/// after `<data>` in file order and isn't available yet during this pass — see
/// [`finish_table`] for the resolution step. Used both for a single-pass read
/// and for each slab of [`crate::chunked`]'s row-ranged reads — the same
/// buffers are shared and appended across calls so the eventual categorical
/// construction pass runs once, over the whole column, regardless of how many
/// chunks fed it (spec's chunk-equivalence property).
#[allow(clippy::too_many_arguments)]
pub(crate) fn decode_rows_into<R: Read + Seek>(
    reader: &mut DtaReader<R>,
    release: Release,
    metas: &[VariableMeta],
    row_count: usize,
    raw_numeric: &mut [Vec<Option<i64>>],
    raw_float: &mut [Vec<Option<f64>>],
    raw_text: &mut [Vec<Option<String>>],
    raw_strl: &mut [Vec<Option<StrLKey>>],
) -> Result<()> {
    for _ in 0..row_count {
        for (ci, meta) in metas.iter().enumerate() {
            match meta.storage_type {
                StorageType::Str(len) => {
                    let s = reader.read_fixed_string(len as usize)?;
                    raw_text[ci].push(if s.is_empty() { None } else { Some(s) });
                }
                StorageType::StrL => {
                    let (v, o) = read_strl_ref(reader, release)?;
                    raw_strl[ci].push(if v == 0 && o == 0 { None } else { Some((v, o)) });
                }
                StorageType::I8 => {
                    let v = reader.read_i8()?;
                    raw_numeric[ci].push(if v as i16 > sentinel::I8_THRESHOLD as i16 { None } else { Some(v as i64) });
                }
                StorageType::I16 => {
                    let v = reader.read_i16()?;
                    raw_numeric[ci].push(if v > sentinel::I16_THRESHOLD { None } else { Some(v as i64) });
                }
                StorageType::I32 => {
                    let v = reader.read_i32()?;
                    raw_numeric[ci].push(if v > sentinel::I32_THRESHOLD { None } else { Some(v as i64) });
                }
                StorageType::F32 => {
                    let v = reader.read_f32()?;
                    raw_float[ci].push(if v > sentinel::F32_THRESHOLD { None } else { Some(v as f64) });
                }
                StorageType::F64 => {
                    let v = reader.read_f64()?;
                    raw_float[ci].push(if v > sentinel::F64_THRESHOLD { None } else { Some(v) });
                }
            }
        }
    }
    Ok(())
}

/// Byte length of one data-body row under `metas` (spec §5 chunk sizing).
pub fn row_byte_len(metas: &[VariableMeta]) -> u64 {
    metas.iter().map(|m| m.storage_type.byte_len() as u64).sum()
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn finish_table(
    metas: &[VariableMeta],
    raw_numeric: &[Vec<Option<i64>>],
    raw_float: &[Vec<Option<f64>>],
    raw_text: &[Vec<Option<String>>],
    raw_strl: &[Vec<Option<StrLKey>>],
    strl_heap: &HashMap<StrLKey, String>,
    value_label_sets: &HashMap<String, ValueLabelSet>,
    keep_original: bool,
) -> Result<Table> {
    let mut columns = Vec::with_capacity(metas.len());
    for (ci, meta) in metas.iter().enumerate() {
        let resolved_strl;
        let text_for_column = if meta.storage_type == StorageType::StrL {
            resolved_strl =
                raw_strl[ci].iter().map(|k| k.and_then(|key| strl_heap.get(&key).cloned())).collect::<Vec<_>>();
            &resolved_strl
        } else {
            &raw_text[ci]
        };

        let data =
            build_column(meta, &raw_numeric[ci], &raw_float[ci], text_for_column, value_label_sets, keep_original)?;
        let mut col = Column::new(meta.name.clone(), data);
        if let Some(label) = &meta.variable_label {
            col = col.with_label(label.clone());
        }
        columns.push(col);
    }
    Ok(Table::new(columns))
}

fn read_strl_ref<R: Read + Seek>(reader: &mut DtaReader<R>, release: Release) -> Result<StrLKey> {
    match release {
        Release::R117 => {
            let v = reader.read_i32()? as u32;
            let o = reader.read_i32()? as u32;
            Ok((v, o))
        }
        Release::R118 => {
            let packed = reader.read_i64()? as u64;
            let v = (packed & 0xFFFF) as u32;
            let o = (packed >> 16) as u32;
            Ok((v, o))
        }
    }
}

fn write_strl_ref<W: Write + Seek>(writer: &mut DtaWriter<W>, release: Release, v: u32, o: u32) -> Result<()> {
    match release {
        Release::R117 => {
            writer.write_i32(v as i32)?;
            writer.write_i32(o as i32)?;
        }
        Release::R118 => {
            let packed: u64 = (v as u64 & 0xFFFF) | ((o as u64) << 16);
            writer.write_i64(packed as i64)?;
        }
    }
    Ok(())
}

/// Builds one column's final representation from its decoded raw cells, applying
/// (in priority order) value-label categorical construction, strL-unconditional
/// categorical construction, date/datetime format interpretation, or plain
/// numeric/text passthrough.
fn build_column(
    meta: &VariableMeta,
    raw_numeric: &[Option<i64>],
    raw_float: &[Option<f64>],
    raw_text: &[Option<String>],
    value_label_sets: &HashMap<String, ValueLabelSet>,
    keep_original: bool,
) -> Result<ColumnData> {
    if let Some(set_name) = &meta.value_label_name {
        if let Some(set) = value_label_sets.get(set_name) {
            let codes_as_i64: Vec<Option<i64>> = match meta.storage_type {
                StorageType::F32 | StorageType::F64 => {
                    raw_float.iter().map(|v| v.map(|f| f.round() as i64)).collect()
                }
                _ => raw_numeric.to_vec(),
            };
            return Ok(ColumnData::CategoricalStr(categorical_from_codes(&codes_as_i64, set, keep_original)));
        }
    }

    if meta.storage_type == StorageType::StrL {
        return Ok(ColumnData::CategoricalStr(categorical_from_strings(raw_text)));
    }

    let kind = classify_format(&meta.format);
    match meta.storage_type {
        StorageType::Str(_) => Ok(ColumnData::Str(raw_text.to_vec())),
        StorageType::StrL => unreachable!("handled above"),
        StorageType::I8 => Ok(ColumnData::I8(raw_numeric.iter().map(|v| v.map(|x| x as i8)).collect())),
        StorageType::I16 => match kind {
            FormatKind::Date => Ok(ColumnData::Date(numeric_to_dates(raw_numeric)?)),
            _ => Ok(ColumnData::I16(raw_numeric.iter().map(|v| v.map(|x| x as i16)).collect())),
        },
        StorageType::I32 => match kind {
            FormatKind::Date => Ok(ColumnData::Date(numeric_to_dates(raw_numeric)?)),
            FormatKind::DateTime => Ok(ColumnData::DateTime(numeric_to_datetimes(raw_numeric)?)),
            FormatKind::Other => Ok(ColumnData::I32(raw_numeric.iter().map(|v| v.map(|x| x as i32)).collect())),
        },
        StorageType::F32 => match kind {
            FormatKind::Date => Ok(ColumnData::Date(float_to_dates(raw_float)?)),
            FormatKind::DateTime => Ok(ColumnData::DateTime(float_to_datetimes(raw_float)?)),
            FormatKind::Other => Ok(ColumnData::F32(raw_float.iter().map(|v| v.map(|x| x as f32)).collect())),
        },
        StorageType::F64 => match kind {
            FormatKind::Date => Ok(ColumnData::Date(float_to_dates(raw_float)?)),
            FormatKind::DateTime => Ok(ColumnData::DateTime(float_to_datetimes(raw_float)?)),
            FormatKind::Other => Ok(ColumnData::F64(raw_float.to_vec())),
        },
    }
}

fn numeric_to_dates(raw: &[Option<i64>]) -> Result<Vec<Option<chrono::NaiveDate>>> {
    raw.iter().map(|v| v.map(|days| date::days_to_date(days)).transpose()).collect()
}

fn numeric_to_datetimes(raw: &[Option<i64>]) -> Result<Vec<Option<chrono::NaiveDateTime>>> {
    raw.iter().map(|v| v.map(|ms| date::ms_to_datetime(ms)).transpose()).collect()
}

fn float_to_dates(raw: &[Option<f64>]) -> Result<Vec<Option<chrono::NaiveDate>>> {
    raw.iter().map(|v| v.map(|days| date::days_to_date(days.round() as i64)).transpose()).collect()
}

fn float_to_datetimes(raw: &[Option<f64>]) -> Result<Vec<Option<chrono::NaiveDateTime>>> {
    raw.iter().map(|v| v.map(|ms| date::ms_to_datetime(ms.round() as i64)).transpose()).collect()
}

/// Builds a text categorical from a value-label set, extending it on the fly
/// with any unlabeled codes encountered in the data (kept, not dropped, and
/// displayed as `"(code)"`, spec §4.6). When `keep_original` is set, every
/// category text is prefixed with its code as `"code: label"` so both stay
/// visible.
fn categorical_from_codes(raw: &[Option<i64>], set: &ValueLabelSet, keep_original: bool) -> Categorical<String> {
    let mut entries: BTreeMap<i32, String> = set.entries.clone();
    for v in raw.iter().flatten() {
        let code = *v as i32;
        entries.entry(code).or_insert_with(|| format!("({code})"));
    }

    if keep_original {
        for (code, label) in entries.iter_mut() {
            *label = format!("{code}: {label}");
        }
    }

    let code_to_index: HashMap<i32, i32> =
        entries.keys().enumerate().map(|(i, &c)| (c, i as i32)).collect();
    let levels: Vec<String> = entries.into_values().collect();
    let codes = raw.iter().map(|v| v.map(|x| code_to_index[&(x as i32)])).collect();

    Categorical::new(codes, levels)
}

/// Builds a text categorical from distinct strL string values, ascending sorted
/// lexically (no integer dictionary exists for strL-derived categoricals).
fn categorical_from_strings(raw: &[Option<String>]) -> Categorical<String> {
    let distinct: BTreeSet<String> = raw.iter().flatten().cloned().collect();
    let levels: Vec<String> = distinct.into_iter().collect();
    let index: HashMap<&str, i32> = levels.iter().enumerate().map(|(i, s)| (s.as_str(), i as i32)).collect();
    let codes = raw.iter().map(|v| v.as_deref().map(|s| index[s])).collect();
    Categorical::new(codes, levels)
}

/// Writes the `<data>` section body for a finalized, write-ready table: one
/// [`VariableMeta`] per column (storage types already decided by
/// [`crate::write_prep`]), plus the value-label sets those columns reference.
pub fn write_data_body<W: Write + Seek>(
    writer: &mut DtaWriter<W>,
    release: Release,
    metas: &[VariableMeta],
    columns: &[ColumnData],
    value_label_sets: &HashMap<String, ValueLabelSet>,
) -> Result<()> {
    let nobs = columns.first().map(|c| c.len()).unwrap_or(0);

    for row in 0..nobs {
        for (meta, data) in metas.iter().zip(columns.iter()) {
            write_cell(writer, release, meta, data, row, value_label_sets)?;
        }
    }
    Ok(())
}

fn write_cell<W: Write + Seek>(
    writer: &mut DtaWriter<W>,
    release: Release,
    meta: &VariableMeta,
    data: &ColumnData,
    row: usize,
    value_label_sets: &HashMap<String, ValueLabelSet>,
) -> Result<()> {
    match (meta.storage_type, data) {
        (StorageType::Str(len), ColumnData::Str(v)) => {
            writer.write_fixed_string(v[row].as_deref().unwrap_or(""), len as usize)?;
        }
        (StorageType::StrL, _) => {
            // write_prep never hands strL-typed metadata to the data writer.
            write_strl_ref(writer, release, 0, 0)?;
        }
        (StorageType::I8, ColumnData::I8(v)) => {
            writer.write_i8(v[row].unwrap_or(sentinel::I8_MISSING))?;
        }
        (StorageType::I8, ColumnData::Bool(v)) => {
            writer.write_i8(v[row].map(|b| b as i8).unwrap_or(sentinel::I8_MISSING))?;
        }
        (StorageType::I16, ColumnData::I16(v)) => {
            writer.write_i16(v[row].unwrap_or(sentinel::I16_MISSING))?;
        }
        (StorageType::I32, ColumnData::I32(v)) => {
            writer.write_i32(v[row].unwrap_or(sentinel::I32_MISSING))?;
        }
        (StorageType::I32, ColumnData::Date(v)) => {
            let raw = v[row].map(date::date_to_days).map(|d| d as i32).unwrap_or(sentinel::I32_MISSING);
            writer.write_i32(raw)?;
        }
        (StorageType::I32, ColumnData::DateTime(v)) => {
            let raw = v[row].map(date::datetime_to_ms).map(|d| d as i32).unwrap_or(sentinel::I32_MISSING);
            writer.write_i32(raw)?;
        }
        (StorageType::F32, ColumnData::F32(v)) => {
            writer.write_f32(v[row].unwrap_or(sentinel::F32_MISSING))?;
        }
        (StorageType::F64, ColumnData::F64(v)) => {
            writer.write_f64(v[row].unwrap_or(sentinel::F64_MISSING))?;
        }
        (StorageType::I32, ColumnData::I64(v)) => {
            writer.write_i32(v[row].map(|x| x as i32).unwrap_or(sentinel::I32_MISSING))?;
        }
        (st, ColumnData::CategoricalStr(cat)) => {
            write_categorical_code(writer, st, cat, row)?;
        }
        (st, ColumnData::CategoricalI32(cat)) => {
            let raw = cat.codes[row].map(|idx| cat.levels[idx as usize]);
            write_numeric_code(writer, st, raw)?;
        }
        (st, other) => {
            return Err(crate::error::DtaError::Other(format!(
                "column '{}' storage type {:?} does not match data variant {:?}",
                meta.name,
                st,
                other.type_name()
            )));
        }
    }

    // Value-label set membership is informational only at the write_cell level;
    // the dictionary itself is emitted once via write_value_labels.
    let _ = value_label_sets;
    Ok(())
}

fn write_categorical_code<W: Write + Seek>(
    writer: &mut DtaWriter<W>,
    st: StorageType,
    cat: &Categorical<String>,
    row: usize,
) -> Result<()> {
    // Levels are written as 0-based sequential codes matching their pool index.
    let raw = cat.codes[row];
    write_numeric_code(writer, st, raw)
}

fn write_numeric_code<W: Write + Seek>(writer: &mut DtaWriter<W>, st: StorageType, raw: Option<i32>) -> Result<()> {
    match st {
        StorageType::I8 => writer.write_i8(raw.map(|v| v as i8).unwrap_or(sentinel::I8_MISSING)),
        StorageType::I16 => writer.write_i16(raw.map(|v| v as i16).unwrap_or(sentinel::I16_MISSING)),
        StorageType::I32 => writer.write_i32(raw.unwrap_or(sentinel::I32_MISSING)),
        StorageType::F32 => writer.write_f32(raw.map(|v| v as f32).unwrap_or(sentinel::F32_MISSING)),
        StorageType::F64 => writer.write_f64(raw.map(|v| v as f64).unwrap_or(sentinel::F64_MISSING)),
        other => Err(crate::error::DtaError::Other(format!("categorical column cannot use storage type {other:?}"))),
    }
}

/// Builds the value-label sets emitted for a write-ready table: one set per
/// `CategoricalStr` column, named `fmt{column-index}` (spec §4.4). Value codes
/// are the categorical pool's 0-based integer positions, sorted ascending
/// (spec §4.4, worked scenario S3). `CategoricalI32` columns never get a set
/// (spec §4.7 resolution: numeric categoricals write raw levels with no
/// dictionary).
pub fn build_value_label_sets(metas: &[VariableMeta], columns: &[ColumnData]) -> Vec<(String, ValueLabelSet)> {
    let mut sets = Vec::new();
    for (meta, data) in metas.iter().zip(columns.iter()) {
        if let ColumnData::CategoricalStr(cat) = data {
            if let Some(name) = &meta.value_label_name {
                let entries: BTreeMap<i32, String> =
                    cat.levels.iter().enumerate().map(|(i, l)| (i as i32, l.clone())).collect();
                sets.push((name.clone(), ValueLabelSet::new(entries)));
            }
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorical_from_codes_keeps_unlabeled_values() {
        let mut entries = BTreeMap::new();
        entries.insert(1, "Yes".to_string());
        entries.insert(2, "No".to_string());
        let set = ValueLabelSet::new(entries);

        let raw = vec![Some(1), Some(2), Some(9), None];
        let cat = categorical_from_codes(&raw, &set, false);

        assert_eq!(cat.levels, vec!["Yes".to_string(), "No".to_string(), "(9)".to_string()]);
        assert_eq!(cat.codes, vec![Some(0), Some(1), Some(2), None]);
    }

    #[test]
    fn categorical_from_codes_keep_original_shows_code_and_label() {
        let mut entries = BTreeMap::new();
        entries.insert(1, "Yes".to_string());
        entries.insert(2, "No".to_string());
        let set = ValueLabelSet::new(entries);

        let raw = vec![Some(1), Some(2), Some(9)];
        let cat = categorical_from_codes(&raw, &set, true);

        assert_eq!(cat.levels, vec!["1: Yes".to_string(), "2: No".to_string(), "9: (9)".to_string()]);
    }

    #[test]
    fn categorical_from_strings_sorts_lexically() {
        let raw = vec![Some("banana".to_string()), Some("apple".to_string()), None, Some("apple".to_string())];
        let cat = categorical_from_strings(&raw);
        assert_eq!(cat.levels, vec!["apple".to_string(), "banana".to_string()]);
        assert_eq!(cat.codes, vec![Some(1), Some(0), None, Some(0)]);
    }
}
