//! Write-side table preparation: per-column storage type decisions, display
//! format assignment, variable name legalization, and non-fatal column
//! exclusion (spec §4.7).
//!
//! Column exclusion is deliberately not an error (see [`crate::error`]): a
//! column this crate cannot represent on disk is dropped and reported here,
//! while every other column still writes.

use crate::metadata::{legalize_names, VariableMeta};
use crate::table::{Categorical, Column, ColumnData, Table};
use crate::types::{sentinel, StorageType};

/// A column dropped from the write because no storage type can represent it.
#[derive(Debug, Clone)]
pub struct ExcludedColumn {
    pub name: String,
    pub reason: String,
}

/// The write-ready form of a [`Table`]: finalized per-column metadata (with
/// legal, unique names and a chosen storage type/format), the columns that
/// survived, and a side-channel report of any that didn't (spec §4.7).
pub struct PreparedTable {
    pub metas: Vec<VariableMeta>,
    pub columns: Vec<ColumnData>,
    pub excluded: Vec<ExcludedColumn>,
}

/// Prepares a table for writing: decides each column's on-disk storage type,
/// assigns a value-label set name to categorical columns, legalizes variable
/// names, and excludes columns with no representable storage type.
pub fn prepare_table(table: &Table) -> PreparedTable {
    let legal_names = legalize_names(&table.column_names().iter().map(|s| s.to_string()).collect::<Vec<_>>());

    let mut metas = Vec::new();
    let mut columns = Vec::new();
    let mut excluded = Vec::new();

    for (idx, (col, name)) in table.columns().iter().zip(legal_names.into_iter()).enumerate() {
        match decide_storage(idx, col) {
            Ok((storage_type, format, value_label_name)) => {
                metas.push(VariableMeta {
                    name,
                    storage_type,
                    format,
                    value_label_name,
                    variable_label: col.label.clone(),
                });
                columns.push(col.data.clone());
            }
            Err(reason) => excluded.push(ExcludedColumn { name, reason }),
        }
    }

    PreparedTable { metas, columns, excluded }
}

type Decision = Result<(StorageType, String, Option<String>), String>;

fn decide_storage(idx: usize, col: &Column) -> Decision {
    match &col.data {
        ColumnData::Bool(_) => Ok((StorageType::I8, "%8.0g".to_string(), None)),
        ColumnData::I8(_) => Ok((StorageType::I8, "%8.0g".to_string(), None)),
        ColumnData::I16(_) => Ok((StorageType::I16, "%8.0g".to_string(), None)),
        ColumnData::I32(_) => Ok((StorageType::I32, "%8.0g".to_string(), None)),
        ColumnData::I64(v) => decide_i64(v),
        ColumnData::F32(_) => Ok((StorageType::F32, "%6.2f".to_string(), None)),
        ColumnData::F64(_) => Ok((StorageType::F64, "%11.1f".to_string(), None)),
        ColumnData::Str(v) => decide_text(&col.name, v),
        ColumnData::StrL(v) => decide_text(&col.name, v),
        ColumnData::Date(_) => Ok((StorageType::I32, "%tdNN-DD-CCYY".to_string(), None)),
        ColumnData::DateTime(_) => Ok((StorageType::F64, "%tc".to_string(), None)),
        ColumnData::CategoricalStr(cat) => Ok(decide_categorical_str(idx, cat)),
        ColumnData::CategoricalI32(cat) => Ok(decide_categorical_i32(cat)),
    }
}

const I64_LOWER_BOUND: i64 = -2_147_483_647;
const I64_UPPER_BOUND: i64 = 2_147_483_620;

fn decide_i64(v: &[Option<i64>]) -> Decision {
    let fits_i32 = v.iter().flatten().all(|&x| (I64_LOWER_BOUND..=I64_UPPER_BOUND).contains(&x));
    if fits_i32 {
        Ok((StorageType::I32, "%8.0g".to_string(), None))
    } else {
        Err(format!(
            "column excluded: i64 values outside [{I64_LOWER_BOUND}, {I64_UPPER_BOUND}]"
        ))
    }
}

fn decide_text(name: &str, v: &[Option<String>]) -> Decision {
    let max_len = v.iter().flatten().map(|s| s.len()).max().unwrap_or(0);
    if max_len as u16 > crate::types::MAX_STR_LEN {
        return Err(format!(
            "column '{name}' excluded: text length {max_len} exceeds the maximum fixed-string width ({})",
            crate::types::MAX_STR_LEN
        ));
    }
    let len = (max_len.max(1) as u16).min(crate::types::MAX_STR_LEN);
    Ok((StorageType::Str(len), format!("%-{len}s"), None))
}

fn decide_categorical_str(idx: usize, _cat: &Categorical<String>) -> (StorageType, String, Option<String>) {
    (StorageType::I32, "%8.0g".to_string(), Some(format!("fmt{idx}")))
}

fn decide_categorical_i32(cat: &Categorical<i32>) -> (StorageType, String, Option<String>) {
    let min = cat.levels.iter().copied().min().unwrap_or(0) as i64;
    let max = cat.levels.iter().copied().max().unwrap_or(0) as i64;
    let storage = if min > -(sentinel::I8_THRESHOLD as i64) && max < sentinel::I8_THRESHOLD as i64 {
        StorageType::I8
    } else if min > -(sentinel::I16_THRESHOLD as i64) && max < sentinel::I16_THRESHOLD as i64 {
        StorageType::I16
    } else if min > -(sentinel::I32_THRESHOLD as i64) && max < sentinel::I32_THRESHOLD as i64 {
        StorageType::I32
    } else {
        StorageType::F64
    };
    (storage, "%8.0g".to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_overlong_text() {
        let data = ColumnData::Str(vec![Some("x".repeat(3000))]);
        let table = Table::new(vec![Column::new("notes", data)]);
        let prepared = prepare_table(&table);
        assert!(prepared.metas.is_empty());
        assert_eq!(prepared.excluded.len(), 1);
        assert_eq!(prepared.excluded[0].name, "notes");
    }

    #[test]
    fn keeps_short_text() {
        let data = ColumnData::Str(vec![Some("hi".to_string()), None]);
        let table = Table::new(vec![Column::new("label", data)]);
        let prepared = prepare_table(&table);
        assert_eq!(prepared.excluded.len(), 0);
        assert_eq!(prepared.metas[0].storage_type, StorageType::Str(2));
    }

    #[test]
    fn categorical_gets_fmt_name() {
        let cat = Categorical::new(vec![Some(0), Some(1), None], vec!["Yes".to_string(), "No".to_string()]);
        let table = Table::new(vec![Column::new("flag", ColumnData::CategoricalStr(cat))]);
        let prepared = prepare_table(&table);
        assert_eq!(prepared.metas[0].value_label_name.as_deref(), Some("fmt0"));
        assert_eq!(prepared.metas[0].storage_type, StorageType::I32);
    }

    #[test]
    fn legalizes_and_dedupes_names() {
        let table = Table::new(vec![
            Column::new("1st", ColumnData::I8(vec![Some(1)])),
            Column::new("1st", ColumnData::I8(vec![Some(2)])),
        ]);
        let prepared = prepare_table(&table);
        assert_eq!(prepared.metas[0].name, "_1st");
        assert_eq!(prepared.metas[1].name, "_1st_1");
    }
}
