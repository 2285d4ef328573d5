//! Error types for the `.dta` codec.
//!
//! [`DtaError`] is the single error type returned by every fallible operation in this
//! crate. It distinguishes the fatal read-side conditions from spec (`FormatError`,
//! `UnsupportedVersion`, `UnsupportedEndian`, `InvalidType`) from ordinary I/O and
//! conversion failures. Column exclusion on write is deliberately NOT an error variant:
//! it is non-fatal and reported through [`crate::write_prep::ExcludedColumn`] instead.

use thiserror::Error;

/// The main error type for the `stata-dta` crate.
#[derive(Debug, Error)]
pub enum DtaError {
    /// An expected literal marker (tag, magic signature) was not found at the
    /// current read position, or a section's declared length was inconsistent
    /// with its contents.
    #[error("malformed .dta file: {0}")]
    FormatError(String),

    /// The file declares a format release other than 117 or 118.
    #[error("unsupported .dta release: {0} (only 117 and 118 are supported)")]
    UnsupportedVersion(String),

    /// The file declares big-endian (`MSF`) byte order.
    #[error("unsupported byte order: {0} (only LSF/little-endian is supported)")]
    UnsupportedEndian(String),

    /// A storage type code outside the recognized set (spec §3).
    #[error("invalid storage type code: {0}")]
    InvalidType(u16),

    /// A variable index was referenced that does not exist.
    #[error("variable index {0} out of range (0..{1})")]
    VarIndexOutOfRange(usize, usize),

    /// A value-label set referenced by a column was not found in the dictionary.
    #[error("value label set '{0}' referenced by column '{1}' was not found")]
    MissingValueLabelSet(String, String),

    /// A strL `(v, o)` reference in the data body was not found in the strL heap.
    #[error("strL reference (v={0}, o={1}) not found in heap")]
    MissingStrL(i64, i64),

    /// Date or datetime arithmetic overflowed the representable range.
    #[error("date/datetime arithmetic overflow")]
    DateOverflow,

    /// Integer conversion failed (e.g. a length field did not fit its target width).
    #[error("integer conversion failed: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    /// I/O error from the underlying byte stream.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (used by metadata introspection helpers).
    #[error("{0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Catch-all error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// Convenience `Result` alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DtaError>;
