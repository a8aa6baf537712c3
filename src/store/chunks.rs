//! Chunk and manifest persistence, plus the query-time merge.

use std::fs;
use std::io::ErrorKind;

use super::{SegmentStore, io_error};
use crate::error::StoreError;
use crate::index::segment::{Segment, corrupt};
use crate::store::manifest::Manifest;

/// Legacy whole-index binary file, recognized read-only.
const LEGACY_BINARY: &str = "segment.idx";
/// Older JSON single-segment format, recognized read-only.
const LEGACY_JSON: &str = "segment.json";

impl SegmentStore {
    /// Writes one chunk to its `NNN.idx` file.
    pub fn write_chunk(&self, chunk_id: u32, segment: &Segment) -> Result<(), StoreError> {
        let path = self.chunk_path(chunk_id);
        let mut bytes = Vec::new();
        segment
            .write_to(&mut bytes)
            .map_err(|e| corrupt("chunk", &path, e))?;
        fs::write(&path, bytes).map_err(io_error(&path))?;
        tracing::debug!(path = %path.display(), docs = segment.total_docs, "wrote chunk");
        Ok(())
    }

    /// Reads one chunk file back into memory.
    pub fn read_chunk(&self, filename: &str) -> Result<Segment, StoreError> {
        let path = self.segments_dir().join(filename);
        let bytes = fs::read(&path).map_err(io_error(&path))?;
        Segment::from_bytes(&bytes).map_err(|e| corrupt("chunk", &path, e))
    }

    /// Persists the manifest as 2-space-indented JSON.
    pub fn write_manifest(&self, manifest: &Manifest) -> Result<(), StoreError> {
        let path = self.manifest_path();
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| corrupt("manifest", &path, e))?;
        fs::write(&path, json).map_err(io_error(&path))
    }

    /// Reads the manifest, or `None` when this store has never been built.
    pub fn read_manifest(&self) -> Result<Option<Manifest>, StoreError> {
        let path = self.manifest_path();
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| corrupt("manifest", &path, e))
    }

    /// Loads everything queryable into one merged segment.
    ///
    /// Load priority: `manifest.json` (merge of complete chunks, aggregates
    /// from the manifest) > legacy `segment.idx` > legacy `segment.json`.
    /// Chunks left `in_progress` or `failed` by a crash are ignored. An
    /// uninitialized or empty store is the dedicated no-segments error.
    pub fn load_all(&self) -> Result<Segment, StoreError> {
        if let Some(manifest) = self.read_manifest()? {
            let mut chunks = Vec::new();
            for info in manifest.complete_chunks() {
                chunks.push(self.read_chunk(&info.filename)?);
            }
            if chunks.is_empty() {
                return Err(StoreError::NoSegments);
            }
            return Ok(Segment::merge(
                chunks,
                manifest.total_docs,
                manifest.total_tokens,
                manifest.avg_doc_len,
            ));
        }

        let legacy_binary = self.segments_dir().join(LEGACY_BINARY);
        match fs::read(&legacy_binary) {
            Ok(bytes) => {
                tracing::warn!(path = %legacy_binary.display(), "loading legacy binary segment");
                return Segment::from_bytes(&bytes).map_err(|e| corrupt("chunk", &legacy_binary, e));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    path: legacy_binary,
                    source,
                });
            }
        }

        let legacy_json = self.segments_dir().join(LEGACY_JSON);
        match fs::read_to_string(&legacy_json) {
            Ok(json) => {
                tracing::warn!(path = %legacy_json.display(), "loading legacy JSON segment");
                serde_json::from_str(&json).map_err(|e| corrupt("chunk", &legacy_json, e))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NoSegments),
            Err(source) => Err(StoreError::Io {
                path: legacy_json,
                source,
            }),
        }
    }
}
