//! Document sources behind a uniform ingestor interface.
//!
//! An [`Ingestor`] names a source, crawls it into lazy document IDs, and
//! reads individual documents on demand. The registry iterates enabled
//! ingestors in registration order; a source answering *not found* never
//! aborts the chain, any other error does. Only the filesystem ingestor
//! ships today, but the seam is where future sources (archives, remotes)
//! plug in.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::crawl::{self, CrawlOptions};
use crate::error::{CrawlError, IngestError};

/// Identity of a document within a source. Reading is deferred until the
/// builder asks for the contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId {
    /// Name of the ingestor that produced this ID.
    pub source: String,
    /// Source-specific locator; a filesystem path for the shipped ingestor.
    pub path: PathBuf,
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.path.display())
    }
}

/// A document read out of a source, split into lines for tokenization.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub path: PathBuf,
    pub lines: Vec<String>,
    /// Name of the ingestor that served the read.
    pub source: String,
}

impl SourceDocument {
    /// The document joined back into one buffer (JSON tokenization works on
    /// whole content, not lines).
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }
}

/// Capability set implemented by every document source.
pub trait Ingestor {
    /// Stable source name, recorded into document IDs.
    fn name(&self) -> &'static str;

    /// Disabled ingestors are skipped by the registry.
    fn is_enabled(&self) -> bool;

    /// Enumerate the documents this source currently offers.
    fn crawl(&self, opts: &CrawlOptions) -> Result<Vec<DocumentId>, CrawlError>;

    /// Read one document. Must return [`IngestError::NotFound`] (and nothing
    /// else) when the ID simply isn't this source's to serve.
    fn read(&self, id: &DocumentId) -> Result<SourceDocument, IngestError>;
}

/// The shipped source: documents are files under configured root paths.
pub struct FilesystemIngestor {
    roots: Vec<PathBuf>,
    enabled: bool,
}

impl FilesystemIngestor {
    pub fn new(roots: Vec<PathBuf>, enabled: bool) -> Self {
        Self { roots, enabled }
    }
}

impl Ingestor for FilesystemIngestor {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn crawl(&self, opts: &CrawlOptions) -> Result<Vec<DocumentId>, CrawlError> {
        let mut ids = Vec::new();
        for root in &self.roots {
            match crawl::crawl(root, opts) {
                Ok(paths) => ids.extend(paths.into_iter().map(|path| DocumentId {
                    source: self.name().to_string(),
                    path,
                })),
                // A vanished root shouldn't sink the whole crawl.
                Err(CrawlError::PathNotFound { path }) => {
                    tracing::warn!(path = %path.display(), "crawl root does not exist, skipping");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(ids)
    }

    fn read(&self, id: &DocumentId) -> Result<SourceDocument, IngestError> {
        if id.source != self.name() {
            return Err(IngestError::NotFound { id: id.to_string() });
        }

        let bytes = fs::read(&id.path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                IngestError::NotFound { id: id.to_string() }
            } else {
                IngestError::Read {
                    id: id.to_string(),
                    source,
                }
            }
        })?;

        let content = String::from_utf8_lossy(&bytes);
        Ok(SourceDocument {
            id: id.clone(),
            path: id.path.clone(),
            lines: content.lines().map(ToString::to_string).collect(),
            source: self.name().to_string(),
        })
    }
}

/// Ordered collection of ingestors.
#[derive(Default)]
pub struct IngestorRegistry {
    ingestors: Vec<Box<dyn Ingestor>>,
}

impl IngestorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ingestor: Box<dyn Ingestor>) {
        self.ingestors.push(ingestor);
    }

    /// Concatenated document IDs from every enabled ingestor, in
    /// registration order.
    pub fn crawl_all(&self, opts: &CrawlOptions) -> Result<Vec<DocumentId>, CrawlError> {
        let mut ids = Vec::new();
        for ingestor in self.enabled() {
            let mut found = ingestor.crawl(opts)?;
            tracing::debug!(
                source = ingestor.name(),
                documents = found.len(),
                "crawled source"
            );
            ids.append(&mut found);
        }
        Ok(ids)
    }

    /// Asks each enabled ingestor for the document, in registration order.
    /// *Not found* moves on to the next source; any other error aborts.
    pub fn read_document(&self, id: &DocumentId) -> Result<SourceDocument, IngestError> {
        for ingestor in self.enabled() {
            match ingestor.read(id) {
                Ok(doc) => return Ok(doc),
                Err(IngestError::NotFound { .. }) => continue,
                Err(other) => return Err(other),
            }
        }
        Err(IngestError::Exhausted { id: id.to_string() })
    }

    fn enabled(&self) -> impl Iterator<Item = &dyn Ingestor> {
        self.ingestors
            .iter()
            .map(Box::as_ref)
            .filter(|i| i.is_enabled())
    }
}
