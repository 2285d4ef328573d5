//! Value-label dictionary codec: the `<value_labels>` section and its per-set
//! `<lbl>` records (spec §4.4).
//!
//! A value-label set maps integer codes to display text. On read it becomes the
//! `levels`/`codes` pair behind a [`crate::table::Categorical<String>`] column
//! (spec §9 "Categorical construction on read": levels are ordered by ascending
//! code, not first-occurrence). On write, only [`crate::table::ColumnData::CategoricalStr`]
//! columns emit a set (spec §4.4); [`crate::table::ColumnData::CategoricalI32`]
//! columns write their numeric levels directly with no dictionary (spec §4.7).

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};

use crate::error::Result;
use crate::header::Release;
use crate::io::{DtaReader, DtaWriter};
use crate::tags;

/// One value-label set: an ordered (by code) integer-to-text dictionary.
#[derive(Debug, Clone, Default)]
pub struct ValueLabelSet {
    /// Code -> text, kept sorted by code.
    pub entries: BTreeMap<i32, String>,
}

impl ValueLabelSet {
    pub fn new(entries: BTreeMap<i32, String>) -> Self {
        Self { entries }
    }

    /// Ascending-by-code codes and levels, suitable for building a
    /// [`crate::table::Categorical`].
    pub fn codes_and_levels(&self) -> (Vec<i32>, Vec<String>) {
        self.entries.iter().map(|(&c, s)| (c, s.clone())).unzip()
    }
}

/// Reads the `<value_labels>` section: zero or more `<lbl>` records, each
/// introduced by an i32 byte length, a fixed-width set name, 3 padding bytes, an
/// i32 entry count `n`, `n` i32 code offsets, then `n` null-terminated text blobs
/// packed back-to-back (spec §4.4 "lbl record layout").
pub fn read_value_labels<R: Read + Seek>(
    reader: &mut DtaReader<R>,
    release: Release,
    end_offset: u64,
) -> Result<Vec<(String, ValueLabelSet)>> {
    reader.expect_tag(tags::VALUE_LABELS_OPEN)?;

    let mut sets = Vec::new();
    while reader.tell()? < end_offset {
        reader.expect_tag(tags::LBL_OPEN)?;
        let _record_len = reader.read_i32()?;
        let set_name = reader.read_fixed_string(release.value_label_name_len())?;
        reader.read_bytes(3)?; // padding

        let n_entries = reader.read_i32()? as usize;
        let _text_len = reader.read_i32()? as usize;

        let mut offsets = Vec::with_capacity(n_entries);
        for _ in 0..n_entries {
            offsets.push(reader.read_i32()? as usize);
        }
        let mut codes = Vec::with_capacity(n_entries);
        for _ in 0..n_entries {
            codes.push(reader.read_i32()?);
        }

        let text_blob = reader.read_bytes(_text_len)?;
        let mut entries = BTreeMap::new();
        for i in 0..n_entries {
            let start = offsets[i];
            let end = text_blob[start..]
                .iter()
                .position(|&b| b == 0)
                .map(|p| start + p)
                .unwrap_or(text_blob.len());
            let text = String::from_utf8_lossy(&text_blob[start..end]).into_owned();
            entries.insert(codes[i], text);
        }

        reader.expect_tag(tags::LBL_CLOSE)?;
        sets.push((set_name, ValueLabelSet::new(entries)));
    }

    reader.expect_tag(tags::VALUE_LABELS_CLOSE)?;
    Ok(sets)
}

/// Writes the `<value_labels>` section for the given named sets.
pub fn write_value_labels<W: Write + Seek>(
    writer: &mut DtaWriter<W>,
    release: Release,
    sets: &[(String, ValueLabelSet)],
) -> Result<()> {
    writer.write_tag(tags::VALUE_LABELS_OPEN)?;

    for (name, set) in sets {
        let (codes, levels) = set.codes_and_levels();
        let n_entries = codes.len();

        let mut offsets = Vec::with_capacity(n_entries);
        let mut text_blob = Vec::new();
        for level in &levels {
            offsets.push(text_blob.len() as i32);
            text_blob.extend_from_slice(level.as_bytes());
            text_blob.push(0);
        }
        let text_len = text_blob.len() as i32;

        // Body: n_entries(i32) + text_len(i32) + offsets + codes + text blob.
        let body_len = 4 + 4 + (n_entries as i32 * 4) + (n_entries as i32 * 4) + text_len;

        writer.write_tag(tags::LBL_OPEN)?;
        writer.write_i32(body_len)?;
        writer.write_fixed_string(name, release.value_label_name_len())?;
        writer.write_bytes(&[0u8; 3])?;
        writer.write_i32(n_entries as i32)?;
        writer.write_i32(text_len)?;
        for off in &offsets {
            writer.write_i32(*off)?;
        }
        for code in &codes {
            writer.write_i32(*code)?;
        }
        writer.write_bytes(&text_blob)?;
        writer.write_tag(tags::LBL_CLOSE)?;
    }

    writer.write_tag(tags::VALUE_LABELS_CLOSE)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip_single_set() {
        let mut entries = BTreeMap::new();
        entries.insert(1, "Male".to_string());
        entries.insert(2, "Female".to_string());
        let sets = vec![("sex".to_string(), ValueLabelSet::new(entries))];

        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = DtaWriter::new(&mut buf);
            write_value_labels(&mut w, Release::R118, &sets).unwrap();
        }
        let end = buf.get_ref().len() as u64;
        buf.set_position(0);
        let mut r = DtaReader::new(&mut buf);
        let back = read_value_labels(&mut r, Release::R118, end - tags::VALUE_LABELS_CLOSE.len() as u64).unwrap();

        assert_eq!(back.len(), 1);
        assert_eq!(back[0].0, "sex");
        let (codes, levels) = back[0].1.codes_and_levels();
        assert_eq!(codes, vec![1, 2]);
        assert_eq!(levels, vec!["Male".to_string(), "Female".to_string()]);
    }

    #[test]
    fn empty_section_round_trips() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut w = DtaWriter::new(&mut buf);
            write_value_labels(&mut w, Release::R118, &[]).unwrap();
        }
        let end = buf.get_ref().len() as u64;
        buf.set_position(0);
        let mut r = DtaReader::new(&mut buf);
        let back = read_value_labels(&mut r, Release::R118, end - tags::VALUE_LABELS_CLOSE.len() as u64).unwrap();
        assert!(back.is_empty());
    }
}
