//! Tuning knobs for a [`crate::api::store::Store`] (spec §6.3), in the
//! teacher's `PackingSettings` builder idiom.

/// Tuning defaults per spec §6.3. Changing a setting only affects entries
/// started after the change (spec §6.2): an entry already being built keeps
/// the block size it was started with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreSettings {
    /// Fixed character-block size used for newly started entries.
    pub block_size_characters: u32,
    /// Rollover threshold, in bytes, for a data file.
    pub data_file_size_hint: u64,
    /// Extra bytes reserved past the logical write position when growing the
    /// TOC's write mapping.
    pub write_map_reserve: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            block_size_characters: 4000,
            data_file_size_hint: 100_000_000,
            write_map_reserve: 1_000_000,
        }
    }
}

impl StoreSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block_size_characters(mut self, n: u32) -> Self {
        self.block_size_characters = n;
        self
    }

    pub fn with_data_file_size_hint(mut self, n: u64) -> Self {
        self.data_file_size_hint = n;
        self
    }

    pub fn with_write_map_reserve(mut self, n: u32) -> Self {
        self.write_map_reserve = n;
        self
    }
}
