//! Single-writer exclusion over the data directory.
//!
//! Acquisition is `create_dir` on `<data>/lock/` — atomic on every platform
//! we care about — with owner metadata written inside for diagnostics.
//! Readers never take the lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LockError;

const LOCK_DIR: &str = "lock";
const LOCK_FILE: &str = "mneme.lock";

/// Metadata recorded by the lock holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockOwner {
    pub process_id: u32,
    pub acquired_at: DateTime<Utc>,
    pub hostname: String,
}

impl LockOwner {
    fn current() -> Self {
        Self {
            process_id: std::process::id(),
            acquired_at: Utc::now(),
            hostname: hostname(),
        }
    }
}

/// Held write lock; releases (removes the lock directory) on drop.
#[derive(Debug)]
pub struct LockGuard {
    lock_dir: PathBuf,
}

impl LockGuard {
    /// Explicit release, for callers who want the failure.
    pub fn release(self) -> Result<(), LockError> {
        let lock_dir = self.lock_dir.clone();
        std::mem::forget(self);
        remove(&lock_dir)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = remove(&self.lock_dir) {
            tracing::warn!(error = %e, "failed to release index lock");
        }
    }
}

fn remove(lock_dir: &Path) -> Result<(), LockError> {
    fs::remove_dir_all(lock_dir).map_err(|source| LockError::Io {
        path: lock_dir.to_path_buf(),
        source,
    })
}

/// Acquires the writer lock for `data_dir`.
///
/// An existing lock directory fails acquisition with the recorded owner's
/// PID, host, and timestamp in the diagnostic.
pub(super) fn acquire(data_dir: &Path) -> Result<LockGuard, LockError> {
    fs::create_dir_all(data_dir).map_err(|source| LockError::Io {
        path: data_dir.to_path_buf(),
        source,
    })?;

    let lock_dir = data_dir.join(LOCK_DIR);
    match fs::create_dir(&lock_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(held_error(&lock_dir));
        }
        Err(source) => {
            return Err(LockError::Io {
                path: lock_dir,
                source,
            });
        }
    }

    let owner = LockOwner::current();
    let metadata_path = lock_dir.join(LOCK_FILE);
    let json = serde_json::to_string_pretty(&owner).expect("lock owner serializes");
    if let Err(source) = fs::write(&metadata_path, json) {
        // Don't leave an anonymous lock behind.
        let _ = fs::remove_dir_all(&lock_dir);
        return Err(LockError::Io {
            path: metadata_path,
            source,
        });
    }

    tracing::debug!(pid = owner.process_id, dir = %lock_dir.display(), "acquired index lock");
    Ok(LockGuard { lock_dir })
}

/// Reads the owner metadata of an existing lock, when readable.
pub(super) fn read_owner(lock_dir: &Path) -> Option<LockOwner> {
    let json = fs::read_to_string(lock_dir.join(LOCK_FILE)).ok()?;
    serde_json::from_str(&json).ok()
}

fn held_error(lock_dir: &Path) -> LockError {
    match read_owner(lock_dir) {
        Some(owner) => LockError::Held {
            process_id: owner.process_id,
            hostname: owner.hostname,
            acquired_at: owner.acquired_at.to_rfc3339(),
        },
        None => LockError::Held {
            process_id: 0,
            hostname: "unknown".to_string(),
            acquired_at: "unknown".to_string(),
        },
    }
}

/// Whether a recorded lock owner is no longer alive.
///
/// Unix probes with signal 0: a missing process means the lock is stale.
/// `EPERM` means the process exists but belongs to someone else, which is
/// not stale. Non-unix platforms report not-stale and leave cleanup to the
/// operator.
pub fn is_lock_stale(owner: &LockOwner) -> bool {
    #[cfg(unix)]
    {
        let result = unsafe { libc::kill(owner.process_id as libc::pid_t, 0) };
        if result == 0 {
            return false;
        }
        std::io::Error::last_os_error().raw_os_error() == Some(libc::ESRCH)
    }
    #[cfg(not(unix))]
    {
        let _ = owner;
        false
    }
}

fn hostname() -> String {
    #[cfg(unix)]
    {
        let mut buf = [0u8; 256];
        let result = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
        if result == 0 {
            let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            if let Ok(name) = std::str::from_utf8(&buf[..end])
                && !name.is_empty()
            {
                return name.to_string();
            }
        }
    }
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
