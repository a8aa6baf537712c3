#![warn(unreachable_pub)]
#![warn(dead_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod crawl;
pub mod error;
pub mod index;
pub mod ingest;
pub mod search;
pub mod store;
pub mod tokenize;
pub mod tracing;

// Re-export common types
pub use config::Config;
pub use crawl::{CrawlOptions, crawl};
pub use error::{
    CrawlError, IngestError, LockError, MnemeError, Result, StoreError, VersionError,
};
pub use index::{BuildOptions, Document, Posting, Segment, build};
pub use ingest::{DocumentId, FilesystemIngestor, Ingestor, IngestorRegistry, SourceDocument};
pub use search::{RankOptions, RankedDoc, parse_query_input, rank, rank_two_pass};
pub use store::{ChunkInfo, ChunkStatus, Manifest, SegmentStore};
