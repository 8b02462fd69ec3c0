//! The retrieval algorithm (spec §4.E.2): resolves a character range to the
//! minimal set of intersecting blocks, reads only those bytes, decodes, and
//! slices to the exact requested range.

use crate::api::error::StoreError;
use crate::headers::managed::toc::Toc;
use crate::headers::managed::toc_entry::TocEntry;
use crate::implementation::block_codec;
use crate::implementation::data_file_set::DataFileSet;

/// Implements spec §4.E.2. Returns `Ok(None)` if `id` is absent or
/// tombstoned (the absence signal covers the whole call, never per-pair).
/// `Err` carries the four precondition failures (shape mismatch, illegal
/// values, out of range, empty snippet) plus I/O and short-block failures.
pub fn retrieve_parts(
    toc: &Toc,
    data_files: &DataFileSet,
    id: u32,
    starts: &[i64],
    ends: &[i64],
) -> Result<Option<Vec<String>>, StoreError> {
    if starts.len() != ends.len() {
        return Err(StoreError::ShapeMismatch {
            starts: starts.len(),
            ends: ends.len(),
        });
    }

    let entry = match toc.get(id) {
        Some(entry) if !entry.deleted => entry,
        _ => return Ok(None),
    };
    let entry_length_characters = entry
        .entry_length_characters
        .expect("live entry always carries a known character length");

    let mut results = Vec::with_capacity(starts.len());
    for (&raw_start, &raw_end) in starts.iter().zip(ends.iter()) {
        let (a, b) = resolve_range(raw_start, raw_end, entry_length_characters)?;
        results.push(read_range(entry, data_files, a, b)?);
    }
    Ok(Some(results))
}

/// Validates and normalizes one `(start, end)` pair against spec §4.E.2's
/// preconditions, expanding the `(-1, -1)` sentinel to the whole entry.
fn resolve_range(start: i64, end: i64, entry_length_characters: u32) -> Result<(u32, u32), StoreError> {
    if start == -1 && end == -1 {
        return Ok((0, entry_length_characters));
    }
    if start < 0 || end < 0 {
        return Err(StoreError::IllegalValues { start, end });
    }
    let len = entry_length_characters as i64;
    if start > len || end > len {
        return Err(StoreError::OutOfRange {
            start,
            end,
            len: entry_length_characters,
        });
    }
    if end <= start {
        return Err(StoreError::EmptySnippet { start, end });
    }
    Ok((start as u32, end as u32))
}

/// Reads and decodes exactly the blocks intersecting `[a, b)`, then slices
/// the decoded accumulator down to that exact character range.
fn read_range(entry: &TocEntry, data_files: &DataFileSet, a: u32, b: u32) -> Result<String, StoreError> {
    // The `(-1, -1)` sentinel on an empty entry resolves to `(0, 0)` before
    // the general `end <= start` check ever runs (that check only applies
    // to non-sentinel pairs), so an empty entry is a legitimate zero-length
    // range here, not a bug upstream. Handled before `first_block`/
    // `last_block` since `(b - 1) / block_size` underflows for `b == 0`.
    if a == b {
        return Ok(String::new());
    }

    let block_size = entry.block_size_characters;
    let n_blocks = entry.block_offset_bytes.len() as u32;
    let first_block = a / block_size;
    let last_block = (b - 1) / block_size;

    let mut accumulator = String::new();
    for j in first_block..=last_block {
        let read_start = entry.entry_offset_bytes + entry.block_offset_bytes[j as usize];
        let read_end = if j + 1 < n_blocks {
            entry.entry_offset_bytes + entry.block_offset_bytes[j as usize + 1]
        } else {
            entry.entry_offset_bytes + entry.entry_length_bytes
        };

        let bytes = data_files.read_range(entry.file_id, read_start, read_end - read_start)?;
        accumulator.push_str(&block_codec::decode(&bytes)?);
    }

    let first_char_in_accumulator = (a % block_size) as usize;
    let len = (b - a) as usize;
    Ok(char_slice(&accumulator, first_char_in_accumulator, len))
}

fn char_slice(s: &str, start: usize, len: usize) -> String {
    s.chars().skip(start).take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementation::ingestion::{self, EntryBuilder};
    use tempfile::tempdir;

    fn store_one(dir: &std::path::Path, s: &str, block_size: u32) -> (Toc, DataFileSet) {
        let mut data_files = DataFileSet::new(dir);
        let mut builder = EntryBuilder::new();
        let mut offset = 0u64;
        ingestion::store_part(&mut builder, block_size, s, |bytes| {
            data_files.append(1, bytes, offset)?;
            offset += bytes.len() as u64;
            Ok(())
        })
        .unwrap();
        ingestion::finalize(&mut builder, |bytes| {
            data_files.append(1, bytes, offset)?;
            offset += bytes.len() as u64;
            Ok(())
        })
        .unwrap();
        data_files.close().unwrap();

        let entry = TocEntry {
            id: 1,
            file_id: 1,
            entry_offset_bytes: 0,
            entry_length_bytes: builder.bytes_written,
            entry_length_characters: Some(builder.chars_written),
            block_size_characters: block_size,
            block_offset_bytes: builder.block_offsets,
            deleted: false,
        };
        let mut toc = Toc::new();
        toc.insert(entry);
        (toc, data_files)
    }

    #[test]
    fn whole_entry_sentinel_round_trips() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "hello", 4);
        let result = retrieve_parts(&toc, &data_files, 1, &[-1], &[-1]).unwrap().unwrap();
        assert_eq!(result, vec!["hello".to_string()]);
    }

    #[test]
    fn arbitrary_slice_matches_spec_scenario_one() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "hello", 4);
        let result = retrieve_parts(&toc, &data_files, 1, &[1, 3], &[4, 5]).unwrap().unwrap();
        assert_eq!(result, vec!["ell".to_string(), "o".to_string()]);
    }

    #[test]
    fn multibyte_slice_matches_spec_scenario_two() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "héllo", 4);
        let result = retrieve_parts(&toc, &data_files, 1, &[0], &[5]).unwrap().unwrap();
        assert_eq!(result, vec!["héllo".to_string()]);
    }

    #[test]
    fn sentinel_on_an_empty_entry_returns_empty_string_without_underflow() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "", 4);
        let result = retrieve_parts(&toc, &data_files, 1, &[-1], &[-1]).unwrap().unwrap();
        assert_eq!(result, vec![String::new()]);
    }

    #[test]
    fn absent_id_returns_none_for_whole_call() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "hello", 4);
        let result = retrieve_parts(&toc, &data_files, 99, &[-1], &[-1]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn tombstoned_id_returns_none() {
        let dir = tempdir().unwrap();
        let (mut toc, data_files) = store_one(dir.path(), "hello", 4);
        toc.get_mut(1).unwrap().deleted = true;
        let result = retrieve_parts(&toc, &data_files, 1, &[-1], &[-1]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "hello", 4);
        let err = retrieve_parts(&toc, &data_files, 1, &[0, 1], &[1]).unwrap_err();
        assert!(matches!(err, StoreError::ShapeMismatch { starts: 2, ends: 1 }));
    }

    #[test]
    fn negative_non_sentinel_values_are_illegal() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "hello", 4);
        let err = retrieve_parts(&toc, &data_files, 1, &[-2], &[3]).unwrap_err();
        assert!(matches!(err, StoreError::IllegalValues { start: -2, end: 3 }));
    }

    #[test]
    fn out_of_range_end_is_rejected() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "hello", 4);
        let err = retrieve_parts(&toc, &data_files, 1, &[0], &[6]).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { start: 0, end: 6, len: 5 }));
    }

    #[test]
    fn empty_snippet_is_rejected() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "hello", 4);
        let err = retrieve_parts(&toc, &data_files, 1, &[3], &[3]).unwrap_err();
        assert!(matches!(err, StoreError::EmptySnippet { start: 3, end: 3 }));
    }

    #[test]
    fn single_range_touches_only_intersecting_blocks() {
        let dir = tempdir().unwrap();
        let (toc, data_files) = store_one(dir.path(), "abcdefghij", 3);
        // Range [4, 6) lives entirely in block 1 ("def"); corrupting data
        // outside that block's byte span must not affect the result.
        let result = retrieve_parts(&toc, &data_files, 1, &[4], &[6]).unwrap().unwrap();
        assert_eq!(result, vec!["ef".to_string()]);
    }
}
