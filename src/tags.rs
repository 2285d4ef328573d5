//! Literal XML-style section markers that delimit every `.dta` section.
//!
//! A `.dta` file (release 117/118) is a flat sequence of ASCII open/close tags
//! wrapping binary payloads — `<stata_dta>`, `<header>`, `<map>`, `<variable_types>`,
//! and so on. This module centralizes the literal tag bytes and the one place the
//! scanner must peek rather than assert: the optional `<strls>` section between the
//! data body and the value-label dictionary.

use crate::error::Result;
use crate::io::DtaReader;
use std::io::{Read, Seek};

pub const STATA_DTA_OPEN: &[u8] = b"<stata_dta>";
pub const STATA_DTA_CLOSE: &[u8] = b"</stata_dta>";
pub const HEADER_OPEN: &[u8] = b"<header>";
pub const HEADER_CLOSE: &[u8] = b"</header>";
pub const RELEASE_OPEN: &[u8] = b"<release>";
pub const RELEASE_CLOSE: &[u8] = b"</release>";
pub const BYTEORDER_OPEN: &[u8] = b"<byteorder>";
pub const BYTEORDER_CLOSE: &[u8] = b"</byteorder>";
pub const K_OPEN: &[u8] = b"<K>";
pub const K_CLOSE: &[u8] = b"</K>";
pub const N_OPEN: &[u8] = b"<N>";
pub const N_CLOSE: &[u8] = b"</N>";
pub const LABEL_OPEN: &[u8] = b"<label>";
pub const LABEL_CLOSE: &[u8] = b"</label>";
pub const TIMESTAMP_OPEN: &[u8] = b"<timestamp>";
pub const TIMESTAMP_CLOSE: &[u8] = b"</timestamp>";
pub const MAP_OPEN: &[u8] = b"<map>";
pub const MAP_CLOSE: &[u8] = b"</map>";
pub const VARIABLE_TYPES_OPEN: &[u8] = b"<variable_types>";
pub const VARIABLE_TYPES_CLOSE: &[u8] = b"</variable_types>";
pub const VARNAMES_OPEN: &[u8] = b"<varnames>";
pub const VARNAMES_CLOSE: &[u8] = b"</varnames>";
pub const SORTLIST_OPEN: &[u8] = b"<sortlist>";
pub const SORTLIST_CLOSE: &[u8] = b"</sortlist>";
pub const FORMATS_OPEN: &[u8] = b"<formats>";
pub const FORMATS_CLOSE: &[u8] = b"</formats>";
pub const VALUE_LABEL_NAMES_OPEN: &[u8] = b"<value_label_names>";
pub const VALUE_LABEL_NAMES_CLOSE: &[u8] = b"</value_label_names>";
pub const VARIABLE_LABELS_OPEN: &[u8] = b"<variable_labels>";
pub const VARIABLE_LABELS_CLOSE: &[u8] = b"</variable_labels>";
pub const CHARACTERISTICS_OPEN: &[u8] = b"<characteristics>";
pub const CHARACTERISTICS_CLOSE: &[u8] = b"</characteristics>";
pub const DATA_OPEN: &[u8] = b"<data>";
pub const DATA_CLOSE: &[u8] = b"</data>";
pub const STRLS_OPEN: &[u8] = b"<strls>";
pub const STRLS_CLOSE: &[u8] = b"</strls>";
pub const VALUE_LABELS_OPEN: &[u8] = b"<value_labels>";
pub const VALUE_LABELS_CLOSE: &[u8] = b"</value_labels>";
pub const LBL_OPEN: &[u8] = b"<lbl>";
pub const LBL_CLOSE: &[u8] = b"</lbl>";

/// Peeks ahead to decide whether a `<strls>` section is present. Per spec §4.1,
/// this is the one place the scanner looks before it leaps: if the next bytes
/// spell `<strls` the section is present, otherwise it's absent and `<value_labels>`
/// follows directly.
pub fn strls_section_present<R: Read + Seek>(reader: &mut DtaReader<R>) -> Result<bool> {
    let peek = reader.peek_bytes(6)?;
    Ok(peek == b"<strls")
}
