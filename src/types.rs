//! Stata storage type codes, per-type sentinel missing values, and the display
//! format classification that drives date/datetime interpretation (spec §3).

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{DtaError, Result};

/// Maximum length of a fixed-length string storage type (spec §3).
pub const MAX_STR_LEN: u16 = 2045;

/// The strL (long string reference) storage type code.
pub const STRL_CODE: u16 = 32768;
/// The 64-bit float storage type code.
pub const F64_CODE: u16 = 65526;
/// The 32-bit float storage type code.
pub const F32_CODE: u16 = 65527;
/// The 32-bit signed integer storage type code.
pub const I32_CODE: u16 = 65528;
/// The 16-bit signed integer storage type code.
pub const I16_CODE: u16 = 65529;
/// The 8-bit signed integer storage type code.
pub const I8_CODE: u16 = 65530;

/// A column's on-disk Stata storage type (spec §3 "Storage type code").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Fixed-length string of `len` bytes, `1..=2045`.
    Str(u16),
    /// strL (long string) reference, addressed by `(v, o)` in the data body.
    StrL,
    F64,
    F32,
    I32,
    I16,
    I8,
}

impl StorageType {
    /// Decodes a 16-bit storage type code, failing with [`DtaError::InvalidType`]
    /// for anything outside spec §3's recognized set.
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            1..=2045 => Ok(StorageType::Str(code)),
            STRL_CODE => Ok(StorageType::StrL),
            F64_CODE => Ok(StorageType::F64),
            F32_CODE => Ok(StorageType::F32),
            I32_CODE => Ok(StorageType::I32),
            I16_CODE => Ok(StorageType::I16),
            I8_CODE => Ok(StorageType::I8),
            other => Err(DtaError::InvalidType(other)),
        }
    }

    /// The 16-bit code this type is written as.
    pub fn code(&self) -> u16 {
        match self {
            StorageType::Str(n) => *n,
            StorageType::StrL => STRL_CODE,
            StorageType::F64 => F64_CODE,
            StorageType::F32 => F32_CODE,
            StorageType::I32 => I32_CODE,
            StorageType::I16 => I16_CODE,
            StorageType::I8 => I8_CODE,
        }
    }

    /// Bytes occupied by one cell of this type in the data body.
    pub fn byte_len(&self) -> usize {
        match self {
            StorageType::Str(n) => *n as usize,
            StorageType::StrL => 8,
            StorageType::F64 => 8,
            StorageType::F32 => 4,
            StorageType::I32 => 4,
            StorageType::I16 => 2,
            StorageType::I8 => 1,
        }
    }

    /// Whether this is one of the numeric (non-string, non-strL) storage types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            StorageType::F64 | StorageType::F32 | StorageType::I32 | StorageType::I16 | StorageType::I8
        )
    }
}

/// Canonical per-type missing sentinels, both the decode threshold and the
/// value the encoder writes (spec §3 "Missing sentinel", §4.6).
pub mod sentinel {
    pub const I8_THRESHOLD: i8 = 100;
    pub const I8_MISSING: i8 = 101;

    pub const I16_THRESHOLD: i16 = 32740;
    pub const I16_MISSING: i16 = 32741;

    pub const I32_THRESHOLD: i32 = 2_147_483_620;
    pub const I32_MISSING: i32 = 2_147_483_621;

    pub const F32_THRESHOLD: f32 = 1.701_411_7e38;
    pub const F32_MISSING: f32 = 1.702e38;

    pub const F64_THRESHOLD: f64 = 8.988_465_674_3e307;
    pub const F64_MISSING: f64 = 8.989e307;
}

/// Classification of a display format string, used to decide whether a numeric
/// column's raw cell values should be interpreted as a calendar date, a calendar
/// datetime, or left as a plain number (spec §3 "Display format").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Exactly `%d`, or any format starting with `%td` — day offset from 1960-01-01.
    Date,
    /// Any format starting with `%tc` or `%tC` — millisecond offset from
    /// 1960-01-01T00:00:00.
    DateTime,
    /// Any other format; the underlying numeric type is left as-is.
    Other,
}

lazy_static! {
    static ref RE_DATE_TD: Regex = Regex::new(r"^%td").unwrap();
    static ref RE_DATETIME_TC: Regex = Regex::new(r"^%t[cC]").unwrap();
}

/// Classifies a display format string per spec §3.
pub fn classify_format(fmt: &str) -> FormatKind {
    if fmt == "%d" || RE_DATE_TD.is_match(fmt) {
        FormatKind::Date
    } else if RE_DATETIME_TC.is_match(fmt) {
        FormatKind::DateTime
    } else {
        FormatKind::Other
    }
}
