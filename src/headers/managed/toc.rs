//! In-memory catalog of all entries (spec §4.C): a map from id to
//! [`TocEntry`], loaded wholesale from `toc.dat` at open and rewritten
//! wholesale at close.

use crate::headers::managed::toc_entry::TocEntry;
use crate::utilities::little_endian::{LittleEndianReader, LittleEndianWriter};
use std::collections::HashMap;

#[derive(Default)]
pub struct Toc {
    entries: HashMap<u32, TocEntry>,
}

impl Toc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u32) -> Option<&TocEntry> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut TocEntry> {
        self.entries.get_mut(&id)
    }

    pub fn insert(&mut self, entry: TocEntry) {
        self.entries.insert(entry.id, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &TocEntry> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Largest `id` across all entries, including tombstoned ones (spec §3.2
    /// invariant 3: `next_id` must stay above it after recovery).
    pub fn max_id(&self) -> Option<u32> {
        self.entries.keys().copied().max()
    }

    /// Largest `file_id` across all entries (spec §3.3: used to reconstruct
    /// `current_file_id` on reopen).
    pub fn max_file_id(&self) -> Option<u32> {
        self.entries.values().map(|e| e.file_id).max()
    }

    /// `entry_offset_bytes + entry_length_bytes` for the entry in `file_id`
    /// that extends furthest, i.e. the current length of that data file
    /// (spec §3.3).
    pub fn file_length(&self, file_id: u32) -> u32 {
        self.entries
            .values()
            .filter(|e| e.file_id == file_id)
            .map(|e| e.entry_offset_bytes + e.entry_length_bytes)
            .max()
            .unwrap_or(0)
    }

    /// Distinct data file ids referenced by any entry (spec §4.E.4: `clear`
    /// deletes every data file referenced by the TOC).
    pub fn referenced_file_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.entries.values().map(|e| e.file_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Total serialized size of the TOC file: a 4-byte count followed by
    /// each entry's own serialized size (spec §4.C).
    pub fn serialized_size(&self) -> usize {
        4 + self
            .entries
            .values()
            .map(|e| e.serialized_size())
            .sum::<usize>()
    }

    /// Parses a complete `toc.dat` byte image (spec §4.C: a 32-bit count
    /// followed by that many serialized entries, in arbitrary order).
    pub fn parse(bytes: &[u8]) -> Option<Toc> {
        let mut reader = LittleEndianReader::new(bytes);
        let count = reader.read_u32()?;

        let mut toc = Toc::new();
        for _ in 0..count {
            let entry = TocEntry::read_from(&mut reader)?;
            toc.insert(entry);
        }
        Some(toc)
    }

    /// Serializes the whole TOC (count header plus every entry) to a single
    /// buffer. Used by [`crate::implementation::toc_file`] as the source of
    /// bytes copied into the growing memory map.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.serialized_size()];
        {
            let mut w = LittleEndianWriter::new(&mut buf);
            w.write_u32(self.entries.len() as u32);
        }
        let mut pos = 4;
        for entry in self.entries.values() {
            let size = entry.serialized_size();
            entry.write_to(&mut buf[pos..pos + size]);
            pos += size;
        }
        buf
    }
}
