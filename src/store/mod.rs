//! On-disk store layout and lifecycle.
//!
//! ```text
//! <data-dir>/
//!   VERSION                    storage/CLI/platform record
//!   lock/mneme.lock            writer exclusion (while held)
//!   meta/                      reserved
//!   segments/NNN.idx           complete chunks
//!   segments/manifest.json     chunk manifest
//!   tombstones/<ts>_NNN.idx    retired chunks
//! ```

mod chunks;
mod lock;
mod manifest;
mod tombstones;
mod version;

pub use lock::{LockGuard, LockOwner, is_lock_stale};
pub use manifest::{ChunkInfo, ChunkStatus, Manifest};
pub use tombstones::{ClearStats, MoveStats};
pub use version::{STORAGE_VERSION, VersionRecord, platform_tag};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Environment override for the data directory; mainly for tests and
/// sandboxed setups.
pub const DATA_DIR_ENV: &str = "MNEME_DATA_DIR";

/// Resolves the platform data directory: `$MNEME_DATA_DIR` override, else
/// XDG data on Unix / `%LOCALAPPDATA%` on Windows, suffixed `mneme`.
pub fn default_data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    dirs::data_local_dir().map(|base| base.join("mneme"))
}

/// Resolves the configuration file path: `<config-dir>/mneme/mneme.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("mneme").join("mneme.toml"))
}

/// Handle on one data directory. Cheap to construct; all I/O is explicit.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    data_dir: PathBuf,
}

impl SegmentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn segments_dir(&self) -> PathBuf {
        self.data_dir.join("segments")
    }

    pub fn tombstones_dir(&self) -> PathBuf {
        self.data_dir.join("tombstones")
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.data_dir.join("meta")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.segments_dir().join("manifest.json")
    }

    pub fn chunk_path(&self, chunk_id: u32) -> PathBuf {
        self.segments_dir().join(ChunkInfo::filename_for(chunk_id))
    }

    /// Creates the directory tree. Idempotent.
    pub fn ensure_layout(&self) -> Result<(), StoreError> {
        for dir in [
            self.data_dir.clone(),
            self.segments_dir(),
            self.tombstones_dir(),
            self.meta_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })?;
        }
        Ok(())
    }

    /// Writes the VERSION record for this store.
    pub fn write_version(&self) -> Result<(), StoreError> {
        version::write_version(&self.data_dir)
    }

    /// Reads the VERSION record, if one exists.
    pub fn read_version(&self) -> Result<Option<VersionRecord>, StoreError> {
        version::read_version(&self.data_dir)
    }

    /// Acquires the single-writer lock for this store.
    pub fn acquire_lock(&self) -> Result<LockGuard, crate::error::LockError> {
        lock::acquire(&self.data_dir)
    }

    /// Owner metadata of the current lock holder, when a lock exists and
    /// its metadata is readable.
    pub fn lock_owner(&self) -> Option<LockOwner> {
        lock::read_owner(&self.data_dir.join("lock"))
    }
}

pub(crate) fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.into();
    move |source| StoreError::Io { path, source }
}
