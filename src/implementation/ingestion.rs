//! The per-entry ingestion state machine (spec §4.E.1): consumes characters
//! from successive `store_part` calls, encoding and emitting one block to the
//! data file every time a `block_size_characters` boundary is crossed.
//!
//! Block boundaries are chosen by character count, not byte count, so a
//! character range can later be resolved to a byte range by a single integer
//! division (spec §4.E.1 rationale) instead of a byte scan.

use crate::api::error::StoreError;
use crate::implementation::block_codec;
use tracing::debug;

/// Per-entry counters threaded through `store_part`/`store` while an entry is
/// being built. Owned by the store, not by this module — spec §9 calls out
/// that these are properties of the store value, never process globals.
#[derive(Default)]
pub struct EntryBuilder {
    pub chars_written: u32,
    pub bytes_written: u32,
    /// Relative byte offsets of each block's first byte. Lazily seeded with
    /// the initial `0` on the first non-empty `store_part` (spec §9: an
    /// entry that never receives characters keeps this empty rather than
    /// forcing `[0]`).
    pub block_offsets: Vec<u32>,
    current_block_chars: String,
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending_chars(&self) -> bool {
        !self.current_block_chars.is_empty()
    }
}

/// Splits `s` after its `n`th character, or at the end if `s` has fewer than
/// `n` characters. Rust strings are UTF-8 byte buffers, not char arrays, so
/// character-indexed slicing has to walk `char_indices` rather than index
/// directly (spec §9: indexing is by Unicode scalar value).
fn split_at_char(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

fn encode_and_emit(
    builder: &mut EntryBuilder,
    append: &mut impl FnMut(&[u8]) -> Result<(), StoreError>,
) -> Result<(), StoreError> {
    debug_assert!(
        builder.has_pending_chars(),
        "encode_and_emit called with no pending characters"
    );
    if !builder.has_pending_chars() {
        return Err(StoreError::InternalInvariant);
    }
    let bytes = block_codec::encode(&builder.current_block_chars);
    debug!(
        chars = builder.current_block_chars.chars().count(),
        bytes = bytes.len(),
        "encoding block"
    );
    append(&bytes)?;
    builder.bytes_written += bytes.len() as u32;
    builder.current_block_chars.clear();
    Ok(())
}

/// Implements spec §4.E.1 `store_part`. `append` is called once per block
/// boundary crossed, with the exact encoded bytes to write next in the
/// current data file; the caller is responsible for knowing where those
/// bytes land (spec keeps file positioning a store-level concern).
pub fn store_part(
    builder: &mut EntryBuilder,
    block_size_characters: u32,
    s: &str,
    mut append: impl FnMut(&[u8]) -> Result<(), StoreError>,
) -> Result<(), StoreError> {
    if s.is_empty() {
        return Ok(());
    }
    if builder.block_offsets.is_empty() {
        builder.block_offsets.push(0);
    }

    let after = builder.chars_written + s.chars().count() as u32;
    let mut remaining = s;
    loop {
        let next_boundary = builder.block_offsets.len() as u32 * block_size_characters;
        if after <= next_boundary {
            break;
        }

        let take = next_boundary - builder.chars_written;
        if take > 0 {
            let (chunk, rest) = split_at_char(remaining, take as usize);
            builder.current_block_chars.push_str(chunk);
            builder.chars_written += take;
            remaining = rest;
        }

        if builder.has_pending_chars() {
            encode_and_emit(builder, &mut append)?;
            builder.block_offsets.push(builder.bytes_written);
        }
    }

    builder.current_block_chars.push_str(remaining);
    builder.chars_written += remaining.chars().count() as u32;
    Ok(())
}

/// Implements the tail of spec §4.E.1 `store`: if a partial block remains
/// once `store_part` has run, encode and emit it as a short final block
/// without recording a new entry in `block_offsets` (the final boundary is
/// `entry_length_bytes`, tracked separately by the caller).
pub fn finalize(
    builder: &mut EntryBuilder,
    append: impl FnMut(&[u8]) -> Result<(), StoreError>,
) -> Result<(), StoreError> {
    if builder.has_pending_chars() {
        let mut append = append;
        encode_and_emit(builder, &mut append)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(block_size: u32, parts: &[&str]) -> (EntryBuilder, Vec<Vec<u8>>) {
        let mut builder = EntryBuilder::new();
        let mut written = Vec::new();
        for part in parts {
            store_part(&mut builder, block_size, part, |bytes| {
                written.push(bytes.to_vec());
                Ok(())
            })
            .unwrap();
        }
        finalize(&mut builder, |bytes| {
            written.push(bytes.to_vec());
            Ok(())
        })
        .unwrap();
        (builder, written)
    }

    #[test]
    fn single_ascii_hello_matches_spec_scenario_one() {
        let (builder, written) = run(4, &["hello"]);
        assert_eq!(builder.chars_written, 5);
        assert_eq!(builder.bytes_written, 5);
        assert_eq!(builder.block_offsets, vec![0, 4]);
        assert_eq!(written, vec![b"hell".to_vec(), b"o".to_vec()]);
    }

    #[test]
    fn multibyte_matches_spec_scenario_two() {
        let (builder, written) = run(4, &["héllo"]);
        assert_eq!(builder.chars_written, 5);
        assert_eq!(builder.bytes_written, 6);
        assert_eq!(builder.block_offsets, vec![0, 5]);
        assert_eq!(written, vec!["héll".as_bytes().to_vec(), b"o".to_vec()]);
    }

    #[test]
    fn chunked_input_matches_spec_scenario_three() {
        let (builder, written) = run(3, &["ab", "cdef", ""]);
        assert_eq!(builder.chars_written, 6);
        assert_eq!(builder.bytes_written, 6);
        assert_eq!(builder.block_offsets, vec![0, 3]);
        assert_eq!(written, vec![b"abc".to_vec(), b"def".to_vec()]);
    }

    #[test]
    fn chunked_equivalence_with_single_call() {
        let (chunked, chunked_bytes) = run(4, &["ab", "cd", "ef", "gh", "i"]);
        let (single, single_bytes) = run(4, &["abcdefghi"]);
        assert_eq!(chunked.chars_written, single.chars_written);
        assert_eq!(chunked.bytes_written, single.bytes_written);
        assert_eq!(chunked.block_offsets, single.block_offsets);
        assert_eq!(chunked_bytes, single_bytes);
    }

    #[test]
    fn empty_input_never_forces_an_initial_zero_offset() {
        let (builder, written) = run(4, &[""]);
        assert!(builder.block_offsets.is_empty());
        assert_eq!(builder.bytes_written, 0);
        assert!(written.is_empty());
    }

    #[test]
    fn exact_multiple_of_block_size_yields_full_final_block_not_empty_tail() {
        let (builder, written) = run(3, &["abcdef"]);
        assert_eq!(builder.block_offsets, vec![0, 3]);
        assert_eq!(written, vec![b"abc".to_vec(), b"def".to_vec()]);
    }
}
