//! Batched index construction with a crash-recoverable manifest.
//!
//! Documents stream out of the ingestor registry in batches; every batch
//! becomes one immutable chunk file. The manifest is persisted after every
//! chunk transition, so an interrupted build leaves only `complete` chunks
//! visible to queries.

use ahash::AHashMap;
use chrono::Utc;

use crate::crawl::CrawlOptions;
use crate::error::Result;
use crate::index::segment::Segment;
use crate::ingest::{IngestorRegistry, SourceDocument};
use crate::store::{ChunkInfo, ChunkStatus, Manifest, SegmentStore};
use crate::tokenize;

/// Builder configuration.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Documents per chunk.
    pub batch_size: usize,
    /// Token cap per document (0 = uncapped); guards against generated
    /// megafiles dominating the index.
    pub max_tokens_per_document: usize,
    /// Silence informational build logs (progress callbacks still fire).
    pub suppress_logs: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_tokens_per_document: 10_000,
            suppress_logs: false,
        }
    }
}

/// Whether a progress event marks the start or end of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Started,
    Completed,
}

/// Progress event emitted at batch boundaries.
#[derive(Debug, Clone)]
pub struct BuildProgress {
    pub phase: BatchPhase,
    pub chunk_id: u32,
    /// Documents in the current batch.
    pub batch_docs: usize,
    /// Documents handled so far, current batch included once completed.
    pub docs_processed: usize,
    pub docs_total: usize,
}

/// Callback invoked at batch start and end. Must return promptly; the
/// pipeline does not buffer past one batch.
pub type ProgressCallback<'a> = &'a dyn Fn(&BuildProgress);

/// Builds the index: crawl, batch, tokenize, write chunks, maintain the
/// manifest.
///
/// Returns `None` when the crawl produced no documents. On a chunk write
/// failure the manifest — with the failed chunk recorded — is persisted
/// before the error propagates, so the on-disk state stays inspectable.
pub fn build(
    registry: &IngestorRegistry,
    crawl_opts: &CrawlOptions,
    opts: &BuildOptions,
    store: &SegmentStore,
    progress: Option<ProgressCallback<'_>>,
) -> Result<Option<Manifest>> {
    let ids = registry.crawl_all(crawl_opts)?;
    if ids.is_empty() {
        tracing::warn!("no documents found to index");
        return Ok(None);
    }

    store.ensure_layout()?;

    let batch_size = opts.batch_size.max(1);
    let docs_total = ids.len();
    if !opts.suppress_logs {
        tracing::info!(documents = docs_total, batch_size, "starting index build");
    }

    let mut manifest = Manifest::default();
    let mut chunk_id: u32 = 1;
    let mut next_doc_id: u32 = 1;
    let mut docs_processed = 0usize;
    // Running sum of per-document lengths across completed chunks; the
    // manifest's avg_doc_len comes from here, not from any single chunk.
    let mut doc_len_sum: u64 = 0;
    let mut doc_count: u64 = 0;

    for batch in ids.chunks(batch_size) {
        if let Some(callback) = progress {
            callback(&BuildProgress {
                phase: BatchPhase::Started,
                chunk_id,
                batch_docs: batch.len(),
                docs_processed,
                docs_total,
            });
        }

        let mut segment = Segment::default();
        for id in batch {
            let doc = match registry.read_document(id) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(document = %id, error = %e, "skipping unreadable document");
                    continue;
                }
            };

            let (frequencies, token_count) = tokenize_document(&doc, opts.max_tokens_per_document);
            if token_count == 0 {
                tracing::debug!(document = %id, "no tokens, skipping");
                continue;
            }

            segment.add_document(
                next_doc_id,
                doc.path.to_string_lossy().into_owned(),
                token_count,
                frequencies,
            );
            next_doc_id += 1;
        }
        docs_processed += batch.len();

        if segment.docs.is_empty() {
            continue;
        }
        segment.finalize();

        manifest.chunks.push(ChunkInfo {
            id: chunk_id,
            filename: ChunkInfo::filename_for(chunk_id),
            status: ChunkStatus::InProgress,
            doc_count: segment.total_docs,
            token_count: segment.total_tokens,
            created_at: Utc::now(),
        });

        if let Err(e) = store.write_chunk(chunk_id, &segment) {
            manifest.set_status(chunk_id, ChunkStatus::Failed);
            if let Err(persist_err) = store.write_manifest(&manifest) {
                tracing::warn!(error = %persist_err, "failed to persist manifest after chunk failure");
            }
            return Err(e.into());
        }

        manifest.set_status(chunk_id, ChunkStatus::Complete);
        doc_len_sum += segment
            .docs
            .iter()
            .map(|d| u64::from(d.token_count))
            .sum::<u64>();
        doc_count += u64::from(segment.total_docs);
        let avg_doc_len = if doc_count == 0 {
            0
        } else {
            (doc_len_sum / doc_count) as u32
        };
        manifest.recompute_totals(avg_doc_len);
        store.write_manifest(&manifest)?;

        if !opts.suppress_logs {
            tracing::info!(
                chunk = chunk_id,
                docs = segment.total_docs,
                terms = segment.total_tokens,
                "chunk complete"
            );
        }
        if let Some(callback) = progress {
            callback(&BuildProgress {
                phase: BatchPhase::Completed,
                chunk_id,
                batch_docs: batch.len(),
                docs_processed,
                docs_total,
            });
        }
        chunk_id += 1;
    }

    Ok(Some(manifest))
}

/// Tokenizes one document into a term-frequency map.
///
/// JSON files go through the structure-aware tokenizer on whole content;
/// everything else is tokenized line by line. The frequency map is local to
/// the document — it never leaks counts across documents.
fn tokenize_document(doc: &SourceDocument, max_tokens: usize) -> (AHashMap<String, u32>, u32) {
    let is_json = doc
        .path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let mut frequencies: AHashMap<String, u32> = AHashMap::new();
    let mut count: u32 = 0;

    let mut consume = |tokens: Vec<String>, frequencies: &mut AHashMap<String, u32>| {
        for token in tokens {
            if max_tokens > 0 && count as usize >= max_tokens {
                return false;
            }
            *frequencies.entry(token).or_insert(0) += 1;
            count += 1;
        }
        true
    };

    if is_json {
        consume(tokenize::tokenize_json(&doc.content()), &mut frequencies);
    } else {
        for line in &doc.lines {
            if !consume(tokenize::tokenize(line), &mut frequencies) {
                break;
            }
        }
    }

    (frequencies, count)
}
