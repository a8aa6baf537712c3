//! Tombstone-based segment retirement.
//!
//! Deleting an index is never a single destructive step: segments are first
//! relocated into `tombstones/` with a timestamp prefix, and only an
//! explicit clear reclaims the space.

use chrono::Utc;
use std::fs;

use super::{SegmentStore, io_error};
use crate::error::StoreError;

/// Outcome of relocating segments into the tombstone area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveStats {
    pub moved_count: u64,
    pub moved_bytes: u64,
}

/// Outcome of permanently clearing the tombstone area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearStats {
    pub deleted_count: u64,
    pub freed_bytes: u64,
}

impl SegmentStore {
    /// Moves every file in `segments/` into `tombstones/`, prefixing each
    /// name with the relocation timestamp (`YYYY-MM-DDTHH-MM-SS_`).
    pub fn move_segments_to_tombstones(&self) -> Result<MoveStats, StoreError> {
        let segments = self.segments_dir();
        let tombstones = self.tombstones_dir();
        fs::create_dir_all(&tombstones).map_err(io_error(&tombstones))?;

        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
        let mut stats = MoveStats::default();

        let entries = match fs::read_dir(&segments) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stats),
            Err(source) => {
                return Err(StoreError::Io {
                    path: segments,
                    source,
                });
            }
        };

        for entry in entries {
            let entry = entry.map_err(io_error(&segments))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let size = entry.metadata().map_err(io_error(&path))?.len();
            let name = entry.file_name();
            let target = tombstones.join(format!("{stamp}_{}", name.to_string_lossy()));
            fs::rename(&path, &target).map_err(io_error(&path))?;
            stats.moved_count += 1;
            stats.moved_bytes += size;
        }

        tracing::info!(
            moved = stats.moved_count,
            bytes = stats.moved_bytes,
            "segments moved to tombstones"
        );
        Ok(stats)
    }

    /// Permanently removes every tombstoned file.
    pub fn clear_tombstones(&self) -> Result<ClearStats, StoreError> {
        let tombstones = self.tombstones_dir();
        let mut stats = ClearStats::default();

        let entries = match fs::read_dir(&tombstones) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stats),
            Err(source) => {
                return Err(StoreError::Io {
                    path: tombstones,
                    source,
                });
            }
        };

        for entry in entries {
            let entry = entry.map_err(io_error(&tombstones))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let size = entry.metadata().map_err(io_error(&path))?.len();
            fs::remove_file(&path).map_err(io_error(&path))?;
            stats.deleted_count += 1;
            stats.freed_bytes += size;
        }
        Ok(stats)
    }

    /// Total size in bytes of the tombstone area.
    pub fn tombstones_size(&self) -> Result<u64, StoreError> {
        let tombstones = self.tombstones_dir();
        let entries = match fs::read_dir(&tombstones) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(StoreError::Io {
                    path: tombstones,
                    source,
                });
            }
        };

        let mut total = 0u64;
        for entry in entries {
            let entry = entry.map_err(io_error(&tombstones))?;
            if entry.path().is_file() {
                total += entry.metadata().map_err(io_error(entry.path())).map(|m| m.len())?;
            }
        }
        Ok(total)
    }
}
