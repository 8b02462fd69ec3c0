//! The public store handle (spec §6): the crate's entry point, analogous to
//! the teacher's `packer_builder` + `packing_settings` pair.

use crate::api::error::StoreError;
use crate::api::settings::StoreSettings;
use crate::headers::managed::toc::Toc;
use crate::headers::managed::toc_entry::TocEntry;
use crate::implementation::data_file_set::DataFileSet;
use crate::implementation::ingestion::{self, EntryBuilder};
use crate::implementation::retrieval;
use crate::implementation::toc_file;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

const TOC_FILE_NAME: &str = "toc.dat";
/// Prefix shared by every type-marker file this crate has ever written;
/// the suffix after it is the format version.
const MARKER_PREFIX: &str = "utf8.v";
/// The only version this build understands (spec §3.1, §6.1).
const MARKER_VERSION: &str = "1";

fn marker_file_name() -> String {
    format!("{MARKER_PREFIX}{MARKER_VERSION}")
}

/// Scans `dir` for a type-marker file. Returns its name if found, regardless
/// of whether it's a version this build understands.
fn find_marker(dir: &Path) -> io::Result<Option<String>> {
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if let Some(rest) = name.strip_prefix(MARKER_PREFIX) {
            // Must genuinely be `<prefix><version>`, not a TOC/data file that
            // happens to share the prefix as a substring.
            if rest.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Ok(Some(name));
            }
        }
    }
    Ok(None)
}

/// A persistent, append-only, random-access store mapping small integer ids
/// to arbitrary-length UTF-8 strings (spec §1, §3).
pub struct Store {
    dir: PathBuf,
    toc: Toc,
    data_files: DataFileSet,
    settings: StoreSettings,
    next_id: u32,
    current_file_id: u32,
    current_file_length: u32,
    toc_modified: bool,
    /// State for the entry currently being built via `store_part`/`store`,
    /// plus the file id, starting byte offset, and block size it was locked
    /// in with at creation (spec §6.2: tuning changes affect only entries
    /// started afterward).
    builder: Option<InProgressEntry>,
}

struct InProgressEntry {
    builder: EntryBuilder,
    file_id: u32,
    start_offset: u32,
    block_size_characters: u32,
}

impl Store {
    /// Opens a store directory. `create = true` truncates/clears the
    /// directory and starts a fresh store; `create = false` reconstructs
    /// bookkeeping from an existing `toc.dat` (spec §3.3).
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display(), create))]
    pub fn open(dir: impl AsRef<Path>, create: bool) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        if create {
            Self::create_fresh(dir)
        } else {
            Self::open_existing(dir)
        }
    }

    fn create_fresh(dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir)?;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        fs::File::create(dir.join(marker_file_name()))?;
        info!(?dir, "created fresh store");

        Ok(Store {
            data_files: DataFileSet::new(&dir),
            dir,
            toc: Toc::new(),
            settings: StoreSettings::default(),
            next_id: 1,
            current_file_id: 1,
            current_file_length: 0,
            toc_modified: false,
            builder: None,
        })
    }

    fn open_existing(dir: PathBuf) -> Result<Self, StoreError> {
        if !dir.exists() {
            return Err(StoreError::NotAStore(dir));
        }
        match find_marker(&dir)? {
            None => return Err(StoreError::NotAStore(dir)),
            Some(name) if name == marker_file_name() => {}
            Some(other) => return Err(StoreError::UnsupportedStoreVersion(other)),
        }

        let toc = toc_file::load(&dir.join(TOC_FILE_NAME))?;
        let current_file_id = toc.max_file_id().unwrap_or(1);
        let current_file_length = toc.file_length(current_file_id);
        let next_id = toc.max_id().map(|max| max + 1).unwrap_or(1);
        info!(?dir, entries = toc.len(), next_id, "opened existing store");

        Ok(Store {
            data_files: DataFileSet::new(&dir),
            dir,
            toc,
            settings: StoreSettings::default(),
            next_id,
            current_file_id,
            current_file_length,
            toc_modified: false,
            builder: None,
        })
    }

    /// Flushes the current data file and rewrites the TOC if it was
    /// modified, then releases the mapping (spec §3.3, §4.C).
    #[instrument(skip(self))]
    pub fn close(&mut self) -> Result<(), StoreError> {
        self.data_files.close()?;
        if self.toc_modified {
            toc_file::persist(&self.toc_path(), &self.toc, self.settings.write_map_reserve)?;
            self.toc_modified = false;
        }
        Ok(())
    }

    /// Closes the current stream, deletes every data file the TOC
    /// references, empties the TOC, and resets all counters (spec §4.E.4).
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.data_files.close()?;
        let file_ids = self.toc.referenced_file_ids();
        self.data_files.delete_files(&self.dir, &file_ids)?;
        self.toc.clear();
        self.current_file_id = 1;
        self.current_file_length = 0;
        self.next_id = 1;
        self.builder = None;
        self.toc_modified = true;
        Ok(())
    }

    fn toc_path(&self) -> PathBuf {
        self.dir.join(TOC_FILE_NAME)
    }

    /// Starts a new in-progress entry if one isn't already open, applying
    /// the rollover policy (spec §4.D) exactly once per entry: rollover is a
    /// between-entries decision, never a mid-entry one.
    ///
    /// Returns `()`, not the freshly built entry, so that callers look up
    /// `self.builder` and `self.data_files` as separate field projections
    /// afterward — borrowing both at once through a method that returns a
    /// reference derived from `&mut self` would tie up the whole struct and
    /// make the accompanying `&mut self.data_files` borrow fail to compile.
    fn ensure_entry(&mut self) {
        if self.builder.is_none() {
            if self.current_file_length as u64 > self.settings.data_file_size_hint {
                info!(
                    old_file_id = self.current_file_id,
                    new_file_id = self.current_file_id + 1,
                    "rolling over to a new data file"
                );
                self.current_file_id += 1;
                self.current_file_length = 0;
            }
            self.builder = Some(InProgressEntry {
                builder: EntryBuilder::new(),
                file_id: self.current_file_id,
                start_offset: self.current_file_length,
                block_size_characters: self.settings.block_size_characters,
            });
        }
    }

    /// Appends `s` to the entry currently being built, encoding and writing
    /// one block to the data file every time a block boundary is crossed
    /// (spec §4.E.1).
    pub fn store_part(&mut self, s: &str) -> Result<(), StoreError> {
        if s.is_empty() {
            return Ok(());
        }
        self.ensure_entry();
        let in_progress = self.builder.as_mut().unwrap();
        let file_id = in_progress.file_id;
        let block_size = in_progress.block_size_characters;
        let mut offset = (in_progress.start_offset + in_progress.builder.bytes_written) as u64;
        let data_files = &mut self.data_files;

        ingestion::store_part(&mut in_progress.builder, block_size, s, |bytes| {
            data_files.append(file_id, bytes, offset)?;
            offset += bytes.len() as u64;
            Ok(())
        })
    }

    /// Finishes the entry being built (after appending `s`), commits it to
    /// the TOC, and returns its new id (spec §4.E.1 `store`).
    pub fn store(&mut self, s: &str) -> Result<u32, StoreError> {
        self.store_part(s)?;
        self.ensure_entry();
        let in_progress = self.builder.as_mut().unwrap();
        let file_id = in_progress.file_id;
        let mut offset = (in_progress.start_offset + in_progress.builder.bytes_written) as u64;
        let data_files = &mut self.data_files;

        ingestion::finalize(&mut in_progress.builder, |bytes| {
            data_files.append(file_id, bytes, offset)?;
            offset += bytes.len() as u64;
            Ok(())
        })?;

        let in_progress = self.builder.take().unwrap();
        let id = self.next_id;
        let entry = TocEntry {
            id,
            file_id: in_progress.file_id,
            entry_offset_bytes: in_progress.start_offset,
            entry_length_bytes: in_progress.builder.bytes_written,
            entry_length_characters: Some(in_progress.builder.chars_written),
            block_size_characters: in_progress.block_size_characters,
            block_offset_bytes: in_progress.builder.block_offsets,
            deleted: false,
        };

        self.next_id += 1;
        self.current_file_id = entry.file_id;
        self.current_file_length = entry.entry_offset_bytes + entry.entry_length_bytes;
        self.toc.insert(entry);
        self.toc_modified = true;
        Ok(id)
    }

    /// `retrieve_parts(id, [-1], [-1])[0]` (spec §4.E.2).
    pub fn retrieve(&self, id: u32) -> Result<Option<String>, StoreError> {
        let parts = self.retrieve_parts(id, &[-1], &[-1])?;
        Ok(parts.map(|mut v| v.remove(0)))
    }

    /// Returns one substring per `(starts[i], ends[i])` pair, or `None` if
    /// `id` is absent or tombstoned (spec §4.E.2).
    pub fn retrieve_parts(&self, id: u32, starts: &[i64], ends: &[i64]) -> Result<Option<Vec<String>>, StoreError> {
        retrieval::retrieve_parts(&self.toc, &self.data_files, id, starts, ends)
    }

    /// Tombstones `id`. A no-op if `id` is absent (spec §4.E.3, §6.2).
    pub fn delete(&mut self, id: u32) {
        if let Some(entry) = self.toc.get_mut(id) {
            if entry.deleted {
                warn!(id, "deleting an entry that was already deleted");
            } else {
                entry.deleted = true;
                self.toc_modified = true;
            }
        }
    }

    /// Affects entries started after this call only (spec §6.2).
    pub fn set_block_size_characters(&mut self, n: u32) {
        self.settings.block_size_characters = n;
    }

    pub fn set_data_file_size_hint(&mut self, n: u64) {
        self.settings.data_file_size_hint = n;
    }

    pub fn set_write_map_reserve(&mut self, n: u32) {
        self.settings.write_map_reserve = n;
    }
}
