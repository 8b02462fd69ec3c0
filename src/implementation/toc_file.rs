//! Persistent TOC file (spec §4.C): a single memory-mapped region holding a
//! 32-bit entry count followed by the serialized entries. Reads map the
//! whole file read-only; writes grow the mapping on demand, exactly the
//! "unmap, remap with a larger length, restore the logical write position,
//! continue" discipline spec §9 calls out — the only safe way to grow a
//! live mapping.

use crate::headers::managed::toc::Toc;
use memmap2::{Mmap, MmapMut};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Loads the TOC from `path`. A missing or empty file is an empty, freshly
/// created store (spec §3.3: open on a store that was created but never
/// written to).
pub fn load(path: &Path) -> io::Result<Toc> {
    if !path.exists() {
        return Ok(Toc::new());
    }
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(Toc::new());
    }

    // Map-for-read: size = file length, read-only (spec §4.C).
    let mmap = unsafe { Mmap::map(&file)? };
    Toc::parse(&mmap)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "corrupt or truncated TOC file"))
}

/// Rewrites the TOC file wholesale (spec §4.C, §4.E: only done at `close`,
/// only when `toc_modified`).
pub fn persist(path: &Path, toc: &Toc, write_map_reserve: u32) -> io::Result<()> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    let mut cursor = GrowingMmapWriter::new(file, write_map_reserve.max(1) as u64)?;
    cursor.write_bytes(&(toc.len() as u32).to_le_bytes())?;
    for entry in toc.values() {
        let size = entry.serialized_size();
        let mut buf = vec![0u8; size];
        entry.write_to(&mut buf);
        cursor.write_bytes(&buf)?;
    }
    cursor.finish()
}

/// A write cursor over a memory-mapped file that grows the mapping (unmap,
/// extend the file, remap) whenever the next write doesn't fit in the
/// current reservation, then resumes at the same logical position.
struct GrowingMmapWriter {
    file: File,
    /// `None` only transiently, while the mapping is unmapped mid-grow.
    mmap: Option<MmapMut>,
    /// Logical write position, independent of the mapping's current size.
    pos: u64,
    reserve: u64,
}

impl GrowingMmapWriter {
    fn new(file: File, reserve: u64) -> io::Result<Self> {
        file.set_len(reserve)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            file,
            mmap: Some(mmap),
            pos: 0,
            reserve,
        })
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.ensure_capacity(bytes.len())?;
        let start = self.pos as usize;
        let mmap = self.mmap.as_mut().expect("mapping is live outside of grow");
        mmap[start..start + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len() as u64;
        Ok(())
    }

    fn ensure_capacity(&mut self, additional: usize) -> io::Result<()> {
        let current_len = self.mmap.as_ref().expect("mapping is live outside of grow").len() as u64;
        let needed = self.pos + additional as u64;
        if needed <= current_len {
            return Ok(());
        }

        let new_len = needed + self.reserve;
        tracing::debug!(old_reserve = current_len, new_reserve = new_len, "growing TOC write mapping");

        // Unmap before resizing the underlying file: a live mapping must not
        // be grown in place.
        self.mmap = None;
        self.file.set_len(new_len)?;
        self.mmap = Some(unsafe { MmapMut::map_mut(&self.file)? });
        Ok(())
    }

    /// Truncates the file to the exact number of bytes written, flushes,
    /// and releases the mapping.
    fn finish(mut self) -> io::Result<()> {
        if let Some(mmap) = self.mmap.as_mut() {
            mmap.flush()?;
        }
        self.mmap = None;
        self.file.set_len(self.pos)?;
        Ok(())
    }
}
