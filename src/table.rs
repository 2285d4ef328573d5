//! The in-memory table/column data model (spec §3 "Table").
//!
//! Spec §1 treats the general table abstraction as an external collaborator this
//! crate only describes the interface of. No crate in the dependency stack supplies
//! that exact shape, so this module defines a minimal `Table`/`Column` pair — just
//! named, equal-length, typed columns with per-cell missingness and an optional
//! categorical pool — with no query/indexing/analytics surface beyond what the codec
//! itself needs (spec §1 Non-goal: "any analysis or descriptive-statistics
//! functionality that merely consumes the decoded table").

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// An ordered, named, equal-length collection of columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Builds a table from a sequence of columns. Does not validate equal length;
    /// callers that build tables by hand are expected to uphold spec §3 invariant (i)
    /// themselves; the codec validates it on write (see [`crate::write_prep`]).
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// An empty table with no columns.
    pub fn empty() -> Self {
        Self { columns: Vec::new() }
    }

    /// The table's columns, in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Mutable access to the table's columns.
    pub fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.columns
    }

    /// Column names, in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows, taken from the first column (0 if the table has no columns).
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A single named column: a logical element type plus an optional variable label
/// (spec §3 "Column descriptor").
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub label: Option<String>,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self { name: name.into(), label: None, data }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// The closed set of logical column element types (spec §3 "Table").
#[derive(Debug, Clone)]
pub enum ColumnData {
    Bool(Vec<Option<bool>>),
    I8(Vec<Option<i8>>),
    I16(Vec<Option<i16>>),
    I32(Vec<Option<i32>>),
    I64(Vec<Option<i64>>),
    F32(Vec<Option<f32>>),
    F64(Vec<Option<f64>>),
    /// Bounded text (fixed-width on disk).
    Str(Vec<Option<String>>),
    /// Variable-length text (strL-backed on disk).
    StrL(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
    DateTime(Vec<Option<NaiveDateTime>>),
    CategoricalStr(Categorical<String>),
    CategoricalI32(Categorical<i32>),
}

impl ColumnData {
    /// Number of cells (rows) in this column.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::I8(v) => v.len(),
            ColumnData::I16(v) => v.len(),
            ColumnData::I32(v) => v.len(),
            ColumnData::I64(v) => v.len(),
            ColumnData::F32(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::Str(v) => v.len(),
            ColumnData::StrL(v) => v.len(),
            ColumnData::Date(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
            ColumnData::CategoricalStr(c) => c.codes.len(),
            ColumnData::CategoricalI32(c) => c.codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A short, human-readable name of this column's element type, used in
    /// write-side exclusion messages (spec §4.7, §6 "verbose").
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Bool(_) => "Bool",
            ColumnData::I8(_) => "i8",
            ColumnData::I16(_) => "i16",
            ColumnData::I32(_) => "i32",
            ColumnData::I64(_) => "i64",
            ColumnData::F32(_) => "f32",
            ColumnData::F64(_) => "f64",
            ColumnData::Str(_) => "text",
            ColumnData::StrL(_) => "strL text",
            ColumnData::Date(_) => "Date",
            ColumnData::DateTime(_) => "DateTime",
            ColumnData::CategoricalStr(_) => "categorical (text)",
            ColumnData::CategoricalI32(_) => "categorical (numeric)",
        }
    }
}

/// A categorical column: integer codes into a shared, ordered pool of levels
/// (spec §3 "Table", GLOSSARY "Categorical column").
///
/// Category order is the ascending sort of the integer codes present in the
/// originating value-label set, not first-occurrence order in the data (spec §9
/// "Categorical construction on read").
#[derive(Debug, Clone, Serialize)]
pub struct Categorical<T> {
    /// Index into `levels` for each row; `None` is missing.
    pub codes: Vec<Option<i32>>,
    /// The ordered pool of distinct category values.
    pub levels: Vec<T>,
}

impl<T> Categorical<T> {
    pub fn new(codes: Vec<Option<i32>>, levels: Vec<T>) -> Self {
        Self { codes, levels }
    }
}
