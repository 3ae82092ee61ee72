//! The frame spool: where fetched snapshots become viewable files.
//!
//! The console has no image canvas of its own; the latest frame is written to
//! a spool directory where an external viewer (or the operator's `open`) can
//! display it.  Each frame file is a transient resource that must be released
//! when replaced — left alone, a 1 Hz loop writes thousands of orphaned files
//! per hour.
//!
//! Release is guaranteed by ownership rather than by manual pairing:
//! a [`FrameHandle`] deletes its file on `Drop`, and the [`FrameSurface`]
//! holds at most one handle.  Presenting a new frame moves the new handle
//! into the slot and drops the previous one; clearing the slot (or dropping
//! the surface) releases the last frame.  There is no code path on which a
//! presented frame's file outlives its replacement.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

use crate::application::capture::FrameSink;

/// Error type for frame spool operations.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Frame handle ──────────────────────────────────────────────────────────────

/// Scoped owner of one spooled frame file.
///
/// The file exists exactly as long as the handle does.
#[derive(Debug)]
pub struct FrameHandle {
    path: PathBuf,
}

impl FrameHandle {
    /// Writes `bytes` to `path` and takes ownership of the resulting file.
    fn write(path: PathBuf, bytes: &[u8]) -> Result<Self, FrameError> {
        std::fs::write(&path, bytes)
            .map_err(|source| FrameError::Io { path: path.clone(), source })?;
        Ok(Self { path })
    }

    /// Where the frame lives on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        // The file may already be gone if the spool directory was cleaned
        // externally; either way the handle's obligation ends here.
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("failed to release frame {}: {e}", self.path.display());
            }
        }
    }
}

// ── Frame surface ─────────────────────────────────────────────────────────────

/// The display surface: holds the single live frame of one capture loop.
///
/// Only one poll loop may present to a surface at a time; the session
/// guarantees this by stopping the old loop before starting a new one.
pub struct FrameSurface {
    spool_dir: PathBuf,
    seq: AtomicU64,
    slot: Mutex<Option<FrameHandle>>,
}

impl FrameSurface {
    /// Creates a surface spooling into `spool_dir` (created if missing).
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Io`] if the directory cannot be created.
    pub fn new(spool_dir: PathBuf) -> Result<Self, FrameError> {
        std::fs::create_dir_all(&spool_dir)
            .map_err(|source| FrameError::Io { path: spool_dir.clone(), source })?;
        Ok(Self {
            spool_dir,
            seq: AtomicU64::new(0),
            slot: Mutex::new(None),
        })
    }

    /// Creates a surface in a per-process temp directory.
    pub fn in_temp_dir() -> Result<Self, FrameError> {
        let dir = std::env::temp_dir().join(format!("windeck-frames-{}", std::process::id()));
        Self::new(dir)
    }

    /// The directory frames are spooled into.
    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }

    /// Writes a new frame and replaces the previous one.
    ///
    /// The prior frame's file is deleted as its handle drops out of the slot.
    /// Returns the path of the newly spooled frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Io`] if the new frame cannot be written; the
    /// previous frame stays in place in that case.
    pub fn present(&self, frame: &[u8]) -> Result<PathBuf, FrameError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let path = self.spool_dir.join(format!("frame-{seq:06}.img"));
        let handle = FrameHandle::write(path, frame)?;
        let presented = handle.path().to_path_buf();

        *self.lock_slot() = Some(handle);
        Ok(presented)
    }

    /// The currently displayed frame's path, if any.
    pub fn current(&self) -> Option<PathBuf> {
        self.lock_slot().as_ref().map(|h| h.path().to_path_buf())
    }

    /// Releases the displayed frame, if any.
    pub fn clear(&self) {
        *self.lock_slot() = None;
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<FrameHandle>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FrameSink for FrameSurface {
    fn present(&self, frame: Vec<u8>) {
        // Per the loop's failure policy a bad present is a skipped tick.
        if let Err(e) = FrameSurface::present(self, &frame) {
            debug!("frame present failed: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
