// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Memory-mapped file arena.
//!
//! The arena owns the mmap; scanners borrow byte slices tied to its
//! lifetime. Acquisition happens on open and release on drop, on every
//! path including worker-local errors.

use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use crate::core::{LogError, Result};

/// A memory-mapped log file.
pub struct MmapArena {
    /// The memory-mapped file (owned)
    mmap: memmap2::Mmap,
    /// File path for diagnostics
    path: String,
}

impl MmapArena {
    /// Open a file and map it read-only.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the file cannot be opened or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let file = File::open(path.as_ref())
            .map_err(|e| LogError::io(&path_str, format!("failed to open: {e}")))?;

        // The wrapper keeps this sound: the arena owns the map and hands
        // out borrows tied to its lifetime only. Zero-length files map to
        // an empty arena.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| LogError::io(&path_str, format!("failed to mmap: {e}")))?;

        Ok(Self {
            mmap,
            path: path_str,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a reference to the mapped bytes.
    pub fn data(&self) -> &[u8] {
        &self.mmap
    }

    /// Length of the mapped data.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Check if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Borrow a slice with bounds checking.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| LogError::truncated(offset, len, 0))?;
        if end > self.mmap.len() {
            let available = self.mmap.len().saturating_sub(offset);
            return Err(LogError::truncated(offset, len, available));
        }
        Ok(&self.mmap[offset..end])
    }
}

impl Deref for MmapArena {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.mmap
    }
}

impl std::fmt::Debug for MmapArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapArena")
            .field("path", &self.path)
            .field("len", &self.mmap.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_temp_file(name: &str, data: &[u8]) -> String {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "mavlog_test_arena_{}_{}.tmp",
            std::process::id(),
            name
        ));
        {
            let mut temp_file = File::create(&path).unwrap();
            temp_file.write_all(data).unwrap();
            temp_file.flush().unwrap();
        }
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_arena_open() {
        let path = create_temp_file("open", b"hello world");

        let arena = MmapArena::open(&path).unwrap();
        assert_eq!(arena.data(), b"hello world");
        assert_eq!(arena.len(), 11);
        assert!(!arena.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_arena_open_missing() {
        let result = MmapArena::open("/nonexistent/never/file.bin");
        assert!(matches!(result, Err(LogError::Io { .. })));
    }

    #[test]
    fn test_arena_open_empty() {
        let path = create_temp_file("empty", b"");

        let arena = MmapArena::open(&path).unwrap();
        assert!(arena.is_empty());
        assert_eq!(arena.len(), 0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_arena_slice() {
        let path = create_temp_file("slice", b"hello world");

        let arena = MmapArena::open(&path).unwrap();
        assert_eq!(arena.slice(0, 5).unwrap(), b"hello");
        assert_eq!(arena.slice(6, 5).unwrap(), b"world");
        assert!(arena.slice(0, 100).is_err());
        assert!(arena.slice(100, 1).is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_arena_deref() {
        let path = create_temp_file("deref", b"hello");

        let arena = MmapArena::open(&path).unwrap();
        assert_eq!(*arena.first().unwrap(), b'h');

        let _ = std::fs::remove_file(&path);
    }
}
