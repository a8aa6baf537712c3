//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Every test gets its own temporary source tree and its own temporary
//! data directory, so index state never leaks between tests and the
//! platform data dir is never touched.

// Each integration-test binary compiles this module separately and uses a
// different subset of the helpers.
#![allow(dead_code)]

use mneme::crawl::CrawlOptions;
use mneme::index::{BuildOptions, build};
use mneme::ingest::{FilesystemIngestor, IngestorRegistry};
use mneme::store::{Manifest, SegmentStore};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// An isolated source tree plus an isolated index store.
pub struct IndexFixture {
    pub source: TempDir,
    pub data: TempDir,
    pub store: SegmentStore,
}

impl IndexFixture {
    /// Creates a fixture with the given `(relative path, content)` files.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let source = TempDir::new().expect("create source dir");
        for (path, content) in files {
            let full = source.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("create parent dirs");
            }
            fs::write(full, content).expect("write fixture file");
        }

        let data = TempDir::new().expect("create data dir");
        let store = SegmentStore::new(data.path());
        store.ensure_layout().expect("store layout");

        Self {
            source,
            data,
            store,
        }
    }

    /// A registry with one enabled filesystem ingestor over the source dir.
    pub fn registry(&self) -> IngestorRegistry {
        let mut registry = IngestorRegistry::new();
        registry.register(Box::new(FilesystemIngestor::new(
            vec![self.source.path().to_path_buf()],
            true,
        )));
        registry
    }

    /// Builds the whole index with the given batch size.
    pub fn build(&self, batch_size: usize) -> Manifest {
        build(
            &self.registry(),
            &CrawlOptions::default(),
            &BuildOptions {
                batch_size,
                suppress_logs: true,
                ..BuildOptions::default()
            },
            &self.store,
            None,
        )
        .expect("build succeeds")
        .expect("at least one document")
    }

    /// Absolute path of a fixture file as the index records it.
    pub fn doc_path(&self, relative: &str) -> String {
        self.source
            .path()
            .join(relative)
            .to_string_lossy()
            .into_owned()
    }
}

/// Convenience: owned token list from string literals.
pub fn tokens(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

/// Asserts a path ends with the expected relative suffix (paths in results
/// are absolute, tests only care about the file).
pub fn path_ends_with(path: &str, suffix: &str) -> bool {
    Path::new(path).ends_with(suffix)
}
