//! Reading and writing fixed-width, little-endian integers to and from byte
//! slices. Used by [`crate::headers::raw`] to (de)serialize TOC entries and by
//! [`crate::implementation::toc_file`] to walk the TOC's on-disk layout.

/// Cursor over an immutable byte slice that reads fixed-width little-endian
/// integers, advancing its position as it goes.
pub struct LittleEndianReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> LittleEndianReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Reads a little-endian `u32`, advancing the cursor by 4 bytes.
    ///
    /// Returns `None` if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.bytes.get(self.pos..self.pos + 4)?;
        self.pos += 4;
        Some(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian `i32`, advancing the cursor by 4 bytes.
    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_u32().map(|v| v as i32)
    }
}

/// Cursor over a mutable byte slice that writes fixed-width little-endian
/// integers, advancing its position as it goes.
pub struct LittleEndianWriter<'a> {
    bytes: &'a mut [u8],
    pos: usize,
}

impl<'a> LittleEndianWriter<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Writes a little-endian `u32`, advancing the cursor by 4 bytes.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 4 bytes remain in the underlying slice; callers
    /// are expected to have sized the slice exactly via
    /// [`crate::headers::managed::toc_entry::TocEntry::serialized_size`].
    pub fn write_u32(&mut self, value: u32) {
        self.bytes[self.pos..self.pos + 4].copy_from_slice(&value.to_le_bytes());
        self.pos += 4;
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }
}
