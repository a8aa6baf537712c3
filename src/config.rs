//! TOML configuration (`<config-dir>/mneme/mneme.toml`).
//!
//! Every section and key has a default, so a missing file or a sparse one
//! behaves identically to a fully spelled-out config. Unknown keys are
//! ignored for forward compatibility.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::crawl::CrawlOptions;
use crate::error::Result;
use crate::search::{FusionWeights, RankOptions};
use anyhow::Context;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub sources: SourcesConfig,
    pub watcher: WatcherConfig,
    pub search: SearchConfig,
    pub ranking: RankingConfig,
    pub logging: LoggingConfig,
}

/// `[index]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Documents per chunk.
    pub segment_size: usize,
    pub max_tokens_per_document: usize,
    pub reindex_on_modify: bool,
    pub skip_binary_files: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            segment_size: 500,
            max_tokens_per_document: 10_000,
            reindex_on_modify: true,
            skip_binary_files: true,
        }
    }
}

/// `[sources]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Roots to crawl.
    pub paths: Vec<PathBuf>,
    pub include_extensions: Vec<String>,
    pub exclude_extensions: Vec<String>,
    /// Directory names never entered.
    pub ignore: Vec<String>,
    pub filesystem: FilesystemSourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            include_extensions: Vec::new(),
            exclude_extensions: Vec::new(),
            ignore: [".git", "node_modules", ".vscode", ".idea", "vendor", ".cache"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            filesystem: FilesystemSourceConfig::default(),
        }
    }
}

/// `[sources.filesystem]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemSourceConfig {
    /// Explicit enable/disable; unset means "enabled when paths exist".
    pub enabled: Option<bool>,
}

impl SourcesConfig {
    /// Whether the filesystem ingestor participates: an explicit setting
    /// wins, otherwise having any configured path enables it.
    pub fn filesystem_enabled(&self) -> bool {
        self.filesystem.enabled.unwrap_or(!self.paths.is_empty())
    }
}

/// `[watcher]` — parsed for config-file compatibility; watching itself
/// lives outside the engine core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 500,
        }
    }
}

/// `[search]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub use_stopwords: bool,
    pub language: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            use_stopwords: true,
            language: "en".to_string(),
        }
    }
}

/// `[ranking]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub bm25_weight: f64,
    pub vsm_weight: f64,
    /// Reserved; no scorer consumes recency yet.
    pub recency_half_life_days: u32,
    /// Run the parallel exact+fuzzy two-pass ranker.
    pub two_pass: bool,
    /// Multiplier on fuzzy-pass scores, clamped to [0, 1].
    pub fuzzy_penalty: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            bm25_weight: 0.7,
            vsm_weight: 0.3,
            recency_half_life_days: 30,
            two_pass: false,
            fuzzy_penalty: 0.6,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl Config {
    /// Loads from a specific file; a missing file is the default config.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        toml::from_str(&text).with_context(|| format!("invalid config at {}", path.display()))
    }

    /// Loads from the platform config path, or defaults when unresolvable.
    pub fn load_default() -> Result<Self> {
        match crate::store::default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Crawl options derived from `[sources]` and `[index]`.
    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            include_extensions: self.sources.include_extensions.clone(),
            exclude_extensions: self.sources.exclude_extensions.clone(),
            skip_folders: self.sources.ignore.clone(),
            max_files_per_folder: 0,
            include_hidden: false,
            skip_binary_files: self.index.skip_binary_files,
        }
        .normalized()
    }

    /// Fusion weights from `[ranking]`, with non-positive values falling
    /// back to the defaults.
    pub fn fusion_weights(&self) -> FusionWeights {
        FusionWeights::from_config(self.ranking.bm25_weight, self.ranking.vsm_weight)
    }

    /// Ranking options; `limit` overrides `[search] default_limit`.
    pub fn rank_options(&self, limit: Option<usize>) -> RankOptions {
        RankOptions {
            limit: limit.unwrap_or(self.search.default_limit),
            weights: self.fusion_weights(),
            fuzzy_penalty: self.ranking.fuzzy_penalty.clamp(0.0, 1.0),
        }
    }
}
