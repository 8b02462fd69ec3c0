//! The ordered sequence of append-only data files (spec §4.D): one stream is
//! held open across calls to avoid per-call open/close cost, writes append
//! to whichever file is currently active, and reads open a fresh handle
//! scoped to a single call (spec §5).

use crate::api::error::StoreError;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Builds the on-disk name for a data file (spec §6.1: `data%04d.dat`,
/// 1-indexed).
pub fn file_name(file_id: u32) -> String {
    format!("data{file_id:04}.dat")
}

pub struct DataFileSet {
    dir: PathBuf,
    open_file_id: Option<u32>,
    writer: Option<BufWriter<File>>,
}

impl DataFileSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            open_file_id: None,
            writer: None,
        }
    }

    fn path_for(&self, file_id: u32) -> PathBuf {
        self.dir.join(file_name(file_id))
    }

    /// Appends `bytes` to `file_id`'s stream, opening it if it isn't already
    /// the held-open file. `start_offset` is the logical length of the file
    /// the first time it's opened this session (0 for a brand new or just
    /// rolled-over file, the reconstructed `current_file_length` when
    /// resuming a file across a reopen). We always position writes
    /// explicitly at a tracked offset rather than relying on OS append-mode,
    /// so that trailing bytes an earlier crash left past the last committed
    /// entry (spec §5) are overwritten by the next entry instead of leaving
    /// a gap between the TOC's bookkeeping and the physical file.
    pub fn append(&mut self, file_id: u32, bytes: &[u8], start_offset: u64) -> io::Result<()> {
        self.ensure_open_for_write(file_id, start_offset)?;
        self.writer.as_mut().unwrap().write_all(bytes)
    }

    fn ensure_open_for_write(&mut self, file_id: u32, start_offset: u64) -> io::Result<()> {
        if self.open_file_id == Some(file_id) && self.writer.is_some() {
            return Ok(());
        }
        self.close()?;

        let path = self.path_for(file_id);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(start_offset == 0)
            .open(path)?;
        if start_offset != 0 {
            file.seek(SeekFrom::Start(start_offset))?;
        }
        self.writer = Some(BufWriter::new(file));
        self.open_file_id = Some(file_id);
        Ok(())
    }

    /// Flushes and releases the held-open stream, if any (spec §4.D, §5:
    /// rollover and `close` both release it).
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        self.open_file_id = None;
        Ok(())
    }

    /// Reads exactly `length` bytes at `start` from `file_id`, opening a
    /// fresh handle for the duration of the call (spec §4.E.2, §5). A short
    /// read is reported as [`StoreError::ShortBlock`], never silently
    /// truncated.
    pub fn read_range(&self, file_id: u32, start: u32, length: u32) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(file_id);
        let mut file = File::open(&path)?;
        file.seek(SeekFrom::Start(start as u64))?;

        let mut buf = vec![0u8; length as usize];
        let mut read_total = 0usize;
        loop {
            if read_total == buf.len() {
                break;
            }
            let n = file.read(&mut buf[read_total..])?;
            if n == 0 {
                break;
            }
            read_total += n;
        }

        if read_total != buf.len() {
            return Err(StoreError::ShortBlock {
                file_id,
                offset: start,
                expected: buf.len(),
                actual: read_total,
            });
        }
        Ok(buf)
    }

    /// Deletes every data file referenced by `file_ids` (spec §4.E.4:
    /// `clear` reclaims all data files the TOC knows about).
    pub fn delete_files(&mut self, dir: &Path, file_ids: &[u32]) -> io::Result<()> {
        self.close()?;
        for &file_id in file_ids {
            let path = dir.join(file_name(file_id));
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
