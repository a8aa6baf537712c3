use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mneme", version)]
#[command(about = "Local full-text search over your source trees", long_about = None)]
pub struct Cli {
    /// Alternate config file (default: <config-dir>/mneme/mneme.toml).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the data directory, VERSION record, and a default config.
    Init,
    /// Crawl configured paths and rebuild the index (previous segments are
    /// tombstoned, not deleted).
    Index {
        /// Documents per chunk (default: [index] segment_size).
        #[arg(short, long)]
        batch_size: Option<usize>,
    },
    /// Query the index.
    Search {
        query: String,
        /// Maximum results (default: [search] default_limit).
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Show fused scores and per-line snippets.
        #[arg(long)]
        score: bool,
    },
    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Tombstone maintenance.
    Tombstones {
        #[command(subcommand)]
        command: TombstoneCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective merged configuration.
    Show,
}

#[derive(Subcommand)]
pub enum TombstoneCommands {
    /// Total size of the tombstone area.
    Size,
    /// Permanently delete tombstoned segments.
    Clear,
}
