//! Managed (ergonomic, owned) representation of a single stored entry (spec
//! §3.1), with (de)serialization to the on-disk layout of spec §4.B.

use crate::headers::raw::toc_entry_raw::TocEntryRaw;
use crate::utilities::little_endian::{LittleEndianReader, LittleEndianWriter};

/// One record per stored string.
///
/// `entry_length_characters` is `None` only for a tombstoned entry that was
/// read back from disk: the character length isn't recoverable once the
/// on-disk field has been overwritten with the deletion sentinel (spec
/// §4.B). A live entry, or an entry tombstoned in this session (as opposed
/// to read back tombstoned), always carries `Some`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub id: u32,
    pub file_id: u32,
    pub entry_offset_bytes: u32,
    pub entry_length_bytes: u32,
    pub entry_length_characters: Option<u32>,
    pub block_size_characters: u32,
    /// Byte offsets, relative to `entry_offset_bytes`, of the first byte of
    /// each block. Empty for a zero-length entry (spec §9 open question:
    /// the empty case is never forced to `[0]`).
    pub block_offset_bytes: Vec<u32>,
    pub deleted: bool,
}

impl TocEntry {
    /// Total serialized size on disk: the fixed 28-byte prefix plus 4 bytes
    /// per block offset (spec §4.B).
    pub fn serialized_size(&self) -> usize {
        TocEntryRaw::SIZE_BYTES + 4 * self.block_offset_bytes.len()
    }

    /// Writes this entry's on-disk representation into `out`, which must be
    /// exactly [`Self::serialized_size`] bytes.
    pub fn write_to(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.serialized_size());
        let char_length_or_deleted = if self.deleted {
            -1
        } else {
            self.entry_length_characters.unwrap_or(0) as i32
        };

        let mut w = LittleEndianWriter::new(out);
        w.write_u32(self.id);
        w.write_u32(self.file_id);
        w.write_u32(self.entry_offset_bytes);
        w.write_u32(self.entry_length_bytes);
        w.write_i32(char_length_or_deleted);
        w.write_u32(self.block_size_characters);
        w.write_u32(self.block_offset_bytes.len() as u32);
        for &offset in &self.block_offset_bytes {
            w.write_u32(offset);
        }
    }

    /// Reads one serialized entry starting at the current position of
    /// `reader`, advancing it past the entry. Returns `None` if the bytes
    /// remaining are too short to hold a complete entry.
    pub fn read_from(reader: &mut LittleEndianReader) -> Option<Self> {
        if reader.remaining() < TocEntryRaw::SIZE_BYTES {
            return None;
        }

        let id = reader.read_u32()?;
        let file_id = reader.read_u32()?;
        let entry_offset_bytes = reader.read_u32()?;
        let entry_length_bytes = reader.read_u32()?;
        let char_length_or_deleted = reader.read_i32()?;
        let block_size_characters = reader.read_u32()?;
        let n_blocks = reader.read_u32()?;

        let (deleted, entry_length_characters) = if char_length_or_deleted < 0 {
            (true, None)
        } else {
            (false, Some(char_length_or_deleted as u32))
        };

        if reader.remaining() < 4 * n_blocks as usize {
            return None;
        }
        let mut block_offset_bytes = Vec::with_capacity(n_blocks as usize);
        for _ in 0..n_blocks {
            block_offset_bytes.push(reader.read_u32()?);
        }

        Some(TocEntry {
            id,
            file_id,
            entry_offset_bytes,
            entry_length_bytes,
            entry_length_characters,
            block_size_characters,
            block_offset_bytes,
            deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TocEntry {
        TocEntry {
            id: 1,
            file_id: 1,
            entry_offset_bytes: 0,
            entry_length_bytes: 5,
            entry_length_characters: Some(5),
            block_size_characters: 4,
            block_offset_bytes: vec![0, 4],
            deleted: false,
        }
    }

    #[test]
    fn round_trips_live_entry() {
        let entry = sample();
        let mut buf = vec![0u8; entry.serialized_size()];
        entry.write_to(&mut buf);

        let mut reader = LittleEndianReader::new(&buf);
        let read_back = TocEntry::read_from(&mut reader).unwrap();
        assert_eq!(read_back, entry);
    }

    #[test]
    fn round_trips_deleted_entry() {
        let mut entry = sample();
        entry.deleted = true;
        entry.entry_length_characters = None;

        let mut buf = vec![0u8; entry.serialized_size()];
        entry.write_to(&mut buf);

        let mut reader = LittleEndianReader::new(&buf);
        let read_back = TocEntry::read_from(&mut reader).unwrap();
        assert!(read_back.deleted);
        assert_eq!(read_back.entry_length_characters, None);
    }

    #[test]
    fn round_trips_empty_entry_with_no_blocks() {
        let entry = TocEntry {
            id: 2,
            file_id: 1,
            entry_offset_bytes: 5,
            entry_length_bytes: 0,
            entry_length_characters: Some(0),
            block_size_characters: 4000,
            block_offset_bytes: vec![],
            deleted: false,
        };
        let mut buf = vec![0u8; entry.serialized_size()];
        entry.write_to(&mut buf);
        assert_eq!(buf.len(), TocEntryRaw::SIZE_BYTES);

        let mut reader = LittleEndianReader::new(&buf);
        let read_back = TocEntry::read_from(&mut reader).unwrap();
        assert_eq!(read_back, entry);
    }

    #[test]
    fn read_from_fails_on_truncated_buffer() {
        let entry = sample();
        let mut buf = vec![0u8; entry.serialized_size()];
        entry.write_to(&mut buf);
        buf.truncate(buf.len() - 1);

        let mut reader = LittleEndianReader::new(&buf);
        assert!(TocEntry::read_from(&mut reader).is_none());
    }
}
