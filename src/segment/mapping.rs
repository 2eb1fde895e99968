//! Segment mapping implementation.

use crate::error::{GroveError, Result};
use fs2::FileExt;
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// A contiguous block of memory backing one engine.
///
/// A segment is either file-backed (created once, then re-mapped by any
/// number of later processes) or anonymous (private to this process, for
/// plain in-memory use and tests). The segment itself is inert storage;
/// formatting and interpretation belong to the engine that attaches to it.
///
/// The engine performs no internal synchronization, so processes sharing a
/// file-backed segment must serialize access themselves (a cross-process
/// mutex, or a single-writer discipline).
pub struct Segment {
    mmap: MmapMut,
    file: Option<File>,
    path: Option<PathBuf>,
}

impl Segment {
    /// Create a new file-backed segment of `bytes` bytes.
    ///
    /// The file is created (truncating any previous content), preallocated
    /// to its full size and mapped. Fresh pages read as zero.
    pub fn create(path: impl AsRef<Path>, bytes: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GroveError::SegmentCreate {
                path: path.clone(),
                cause: e.to_string(),
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| GroveError::SegmentCreate {
                path: path.clone(),
                cause: e.to_string(),
            })?;

        // Reserve the disk space up front so a later page-in cannot fail.
        file.allocate(bytes as u64)
            .map_err(|e| GroveError::SegmentCreate {
                path: path.clone(),
                cause: format!("failed to preallocate {} bytes: {}", bytes, e),
            })?;

        file.set_len(bytes as u64)
            .map_err(|e| GroveError::SegmentCreate {
                path: path.clone(),
                cause: e.to_string(),
            })?;

        let mmap = unsafe {
            MmapOptions::new()
                .len(bytes)
                .map_mut(&file)
                .map_err(|e| GroveError::SegmentMap {
                    path: path.clone(),
                    cause: e.to_string(),
                })?
        };

        tracing::info!(path = %path.display(), bytes, "created segment");

        Ok(Self {
            mmap,
            file: Some(file),
            path: Some(path),
        })
    }

    /// Map an existing segment file.
    ///
    /// The whole file is mapped; validation of the contents happens when an
    /// engine resumes inside it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| GroveError::SegmentCreate {
                path: path.clone(),
                cause: e.to_string(),
            })?;

        let bytes = file
            .metadata()
            .map_err(|e| GroveError::SegmentCreate {
                path: path.clone(),
                cause: e.to_string(),
            })?
            .len() as usize;

        let mmap = unsafe {
            MmapOptions::new()
                .len(bytes)
                .map_mut(&file)
                .map_err(|e| GroveError::SegmentMap {
                    path: path.clone(),
                    cause: e.to_string(),
                })?
        };

        tracing::info!(path = %path.display(), bytes, "opened segment");

        Ok(Self {
            mmap,
            file: Some(file),
            path: Some(path),
        })
    }

    /// Create an anonymous in-process segment of `bytes` bytes.
    pub fn anonymous(bytes: usize) -> Result<Self> {
        let mmap = MmapOptions::new()
            .len(bytes)
            .map_anon()
            .map_err(|e| GroveError::SegmentMap {
                path: PathBuf::from("<anonymous>"),
                cause: e.to_string(),
            })?;

        Ok(Self {
            mmap,
            file: None,
            path: None,
        })
    }

    /// Size of the mapping in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Whether the mapping is zero-sized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }

    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether this segment persists beyond the process.
    #[must_use]
    pub fn is_file_backed(&self) -> bool {
        self.file.is_some()
    }

    /// Flush dirty pages to the backing file, if any.
    pub fn flush(&self) -> Result<()> {
        if self.file.is_none() {
            return Ok(());
        }
        self.mmap.flush().map_err(|e| GroveError::SegmentMap {
            path: self
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from("<anonymous>")),
            cause: format!("flush failed: {}", e),
        })
    }

    /// Base address of the mapping.
    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut_ptr()
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("len", &self.mmap.len())
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.seg");

        let mut seg = Segment::create(&path, 4096).unwrap();
        assert_eq!(seg.len(), 4096);
        assert!(seg.is_file_backed());

        // Write through the mapping, flush, and read back via a re-map.
        unsafe { *seg.as_mut_ptr().add(100) = 0xAB };
        seg.flush().unwrap();
        drop(seg);

        let mut reopened = Segment::open(&path).unwrap();
        assert_eq!(reopened.len(), 4096);
        assert_eq!(unsafe { *reopened.as_mut_ptr().add(100) }, 0xAB);
    }

    #[test]
    fn fresh_pages_are_zero() {
        let dir = tempdir().unwrap();
        let mut seg = Segment::create(dir.path().join("zero.seg"), 1024).unwrap();
        for i in 0..1024 {
            assert_eq!(unsafe { *seg.as_mut_ptr().add(i) }, 0);
        }
    }

    #[test]
    fn anonymous_segment() {
        let mut seg = Segment::anonymous(2048).unwrap();
        assert_eq!(seg.len(), 2048);
        assert!(!seg.is_file_backed());
        assert!(seg.path().is_none());
        unsafe { *seg.as_mut_ptr() = 7 };
        assert_eq!(unsafe { *seg.as_mut_ptr() }, 7);
        // Flushing an anonymous segment is a no-op.
        seg.flush().unwrap();
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = Segment::open(dir.path().join("missing.seg")).unwrap_err();
        assert_eq!(err.code(), "E001");
    }
}
