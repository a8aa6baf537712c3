//! VERSION record: which schema, binary, and platform wrote this store.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{StoreError, VersionError};

/// On-disk storage schema version. Bumped only on incompatible layout
/// changes.
pub const STORAGE_VERSION: &str = "1.0.0";

const VERSION_FILE: &str = "VERSION";

/// Parsed contents of the VERSION file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub storage_version: String,
    pub cli_version: String,
    pub platform: String,
}

impl VersionRecord {
    /// The record this binary writes.
    pub fn current() -> Self {
        Self {
            storage_version: STORAGE_VERSION.to_string(),
            cli_version: env!("CARGO_PKG_VERSION").to_string(),
            platform: platform_tag().to_string(),
        }
    }

    /// Parses the three-line `KEY: value` format, tolerating surrounding
    /// whitespace and unknown keys. `STORAGE_VERSION` is mandatory.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let mut storage_version = None;
        let mut cli_version = String::new();
        let mut platform = String::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "STORAGE_VERSION" => storage_version = Some(value),
                "MNEME_CLI_VERSION" => cli_version = value,
                "PLATFORM" => platform = value,
                _ => {}
            }
        }

        let storage_version = storage_version.ok_or_else(|| VersionError::Invalid {
            reason: "missing STORAGE_VERSION".to_string(),
        })?;
        Ok(Self {
            storage_version,
            cli_version,
            platform,
        })
    }

    /// Renders back into the on-disk format.
    pub fn render(&self) -> String {
        format!(
            "STORAGE_VERSION: {}\nMNEME_CLI_VERSION: {}\nPLATFORM: {}\n",
            self.storage_version, self.cli_version, self.platform
        )
    }

    /// Checks this stored record against the running binary.
    ///
    /// A storage-version mismatch is fatal; a platform mismatch is only a
    /// warning (stores move between machines via backup all the time).
    pub fn check_compatibility(&self) -> Result<(), VersionError> {
        if self.storage_version != STORAGE_VERSION {
            return Err(VersionError::StorageMismatch {
                stored: self.storage_version.clone(),
                current: STORAGE_VERSION.to_string(),
            });
        }
        if self.platform != platform_tag() {
            tracing::warn!(
                stored = %self.platform,
                current = platform_tag(),
                "index was written on a different platform"
            );
        }
        Ok(())
    }
}

/// Platform tag recorded into VERSION.
pub fn platform_tag() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        if is_wsl() { "windows_wsl" } else { "linux" }
    }
    #[cfg(target_os = "macos")]
    {
        "darwin"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        "unknown"
    }
}

#[cfg(target_os = "linux")]
fn is_wsl() -> bool {
    fs::read_to_string("/proc/version")
        .map(|v| v.to_lowercase().contains("microsoft"))
        .unwrap_or(false)
}

/// Writes the current VERSION record into `data_dir`.
pub(super) fn write_version(data_dir: &Path) -> Result<(), StoreError> {
    let path = data_dir.join(VERSION_FILE);
    fs::write(&path, VersionRecord::current().render())
        .map_err(|source| StoreError::Io { path, source })
}

/// Reads the VERSION record from `data_dir`, `None` when absent.
pub(super) fn read_version(data_dir: &Path) -> Result<Option<VersionRecord>, StoreError> {
    let path = data_dir.join(VERSION_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(StoreError::Io { path, source }),
    };
    VersionRecord::parse(&text).map(Some).map_err(|e| StoreError::Corrupt {
        what: "VERSION",
        path,
        reason: e.to_string(),
    })
}
