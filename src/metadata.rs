//! Variable metadata codec: storage types, names, formats, value-label set
//! references, and variable labels (spec §4.3). The `<sortlist>` section is read
//! and discarded (no sort-order feature is exposed) and always written empty.
//! `<characteristics>` is skipped entirely on read (via the section map) and
//! always written empty on write (spec §4.3 "Characteristics").

use std::collections::HashSet;
use std::io::{Read, Seek, Write};

use serde::Serialize;

use crate::error::Result;
use crate::header::Release;
use crate::io::{DtaReader, DtaWriter};
use crate::tags;
use crate::types::StorageType;

/// Per-variable metadata as stored in the `.dta` header sections.
#[derive(Debug, Clone, Serialize)]
pub struct VariableMeta {
    pub name: String,
    pub storage_type: StorageType,
    pub format: String,
    pub value_label_name: Option<String>,
    pub variable_label: Option<String>,
}

/// Reads `<variable_types>` through `<variable_labels>`, leaving the stream
/// positioned right after `</variable_labels>`. The caller skips
/// `<characteristics>` by seeking to the `<data>` offset from the section map.
pub fn read_variable_metadata<R: Read + Seek>(
    reader: &mut DtaReader<R>,
    release: Release,
    nvars: u16,
) -> Result<Vec<VariableMeta>> {
    let n = nvars as usize;

    reader.expect_tag(tags::VARIABLE_TYPES_OPEN)?;
    let mut storage_types = Vec::with_capacity(n);
    for _ in 0..n {
        let code = reader.read_u16()?;
        storage_types.push(StorageType::from_code(code)?);
    }
    reader.expect_tag(tags::VARIABLE_TYPES_CLOSE)?;

    reader.expect_tag(tags::VARNAMES_OPEN)?;
    let mut names = Vec::with_capacity(n);
    for _ in 0..n {
        names.push(reader.read_fixed_string(release.variable_name_len())?);
    }
    reader.expect_tag(tags::VARNAMES_CLOSE)?;

    reader.expect_tag(tags::SORTLIST_OPEN)?;
    for _ in 0..=n {
        reader.read_i16()?;
    }
    reader.expect_tag(tags::SORTLIST_CLOSE)?;

    reader.expect_tag(tags::FORMATS_OPEN)?;
    let mut formats = Vec::with_capacity(n);
    for _ in 0..n {
        formats.push(reader.read_fixed_string(release.format_len())?);
    }
    reader.expect_tag(tags::FORMATS_CLOSE)?;

    reader.expect_tag(tags::VALUE_LABEL_NAMES_OPEN)?;
    let mut value_label_names = Vec::with_capacity(n);
    for _ in 0..n {
        let s = reader.read_fixed_string(release.value_label_name_len())?;
        value_label_names.push(if s.is_empty() { None } else { Some(s) });
    }
    reader.expect_tag(tags::VALUE_LABEL_NAMES_CLOSE)?;

    reader.expect_tag(tags::VARIABLE_LABELS_OPEN)?;
    let mut variable_labels = Vec::with_capacity(n);
    for _ in 0..n {
        let s = reader.read_fixed_string(release.variable_label_len())?;
        variable_labels.push(if s.is_empty() { None } else { Some(s) });
    }
    reader.expect_tag(tags::VARIABLE_LABELS_CLOSE)?;

    Ok((0..n)
        .map(|i| VariableMeta {
            name: names[i].clone(),
            storage_type: storage_types[i],
            format: formats[i].clone(),
            value_label_name: value_label_names[i].clone(),
            variable_label: variable_labels[i].clone(),
        })
        .collect())
}

/// Writes `<variable_types>` through `<characteristics></characteristics>` (the
/// latter always empty — spec §4.3, §1 Non-goal "round-tripping characteristics").
pub fn write_variable_metadata<W: Write + Seek>(
    writer: &mut DtaWriter<W>,
    release: Release,
    metas: &[VariableMeta],
) -> Result<()> {
    writer.write_tag(tags::VARIABLE_TYPES_OPEN)?;
    for m in metas {
        writer.write_u16(m.storage_type.code())?;
    }
    writer.write_tag(tags::VARIABLE_TYPES_CLOSE)?;

    writer.write_tag(tags::VARNAMES_OPEN)?;
    for m in metas {
        writer.write_fixed_string(&m.name, release.variable_name_len())?;
    }
    writer.write_tag(tags::VARNAMES_CLOSE)?;

    writer.write_tag(tags::SORTLIST_OPEN)?;
    for _ in 0..=metas.len() {
        writer.write_i16(0)?;
    }
    writer.write_tag(tags::SORTLIST_CLOSE)?;

    writer.write_tag(tags::FORMATS_OPEN)?;
    for m in metas {
        writer.write_fixed_string(&m.format, release.format_len())?;
    }
    writer.write_tag(tags::FORMATS_CLOSE)?;

    writer.write_tag(tags::VALUE_LABEL_NAMES_OPEN)?;
    for m in metas {
        let name = m.value_label_name.as_deref().unwrap_or("");
        writer.write_fixed_string(name, release.value_label_name_len())?;
    }
    writer.write_tag(tags::VALUE_LABEL_NAMES_CLOSE)?;

    writer.write_tag(tags::VARIABLE_LABELS_OPEN)?;
    for m in metas {
        let label = m.variable_label.as_deref().unwrap_or("");
        writer.write_fixed_string(label, release.variable_label_len())?;
    }
    writer.write_tag(tags::VARIABLE_LABELS_CLOSE)?;

    writer.write_tag(tags::CHARACTERISTICS_OPEN)?;
    writer.write_tag(tags::CHARACTERISTICS_CLOSE)?;

    Ok(())
}

/// Repairs column names into legal, unique Stata identifiers (spec §4.7
/// "Variable name legalization"): the first character must be a letter or
/// underscore, subsequent characters letters/digits/underscores; any other
/// character is replaced with `_`. Collisions after repair are resolved by
/// appending `_1`, `_2`, ... to the later occurrence.
pub fn legalize_names(names: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());

    for raw in names {
        let mut fixed: String = raw
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let ok = if i == 0 {
                    c.is_alphabetic() || c == '_'
                } else {
                    c.is_alphanumeric() || c == '_'
                };
                if ok { c } else { '_' }
            })
            .collect();

        if fixed.is_empty() {
            fixed = "_".to_string();
        }
        if fixed.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            fixed = format!("_{fixed}");
        }

        let mut candidate = fixed.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{fixed}_{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}
