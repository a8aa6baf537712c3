//! Filesystem crawling with extension, hidden-file, and binary filtering.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CrawlError;

/// Extensions that are binary by construction and never worth tokenizing.
/// Checked before the include list so an over-broad include cannot pull
/// archives into the index.
const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "svgz",
    // video / audio
    "mp4", "mkv", "avi", "mov", "webm", "mp3", "wav", "flac", "ogg", "m4a",
    // archives
    "zip", "tar", "gz", "bz2", "xz", "zst", "7z", "rar", "jar",
    // compiled objects and libraries
    "exe", "dll", "so", "dylib", "o", "a", "obj", "class", "pyc", "wasm", "bin",
    // databases
    "db", "sqlite", "sqlite3", "mdb",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // office documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // lockfiles (huge, machine-generated)
    "lock",
];

/// Crawl filtering and traversal options.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Only files with these extensions are kept (empty = keep all).
    pub include_extensions: Vec<String>,
    /// Files with these extensions are dropped.
    pub exclude_extensions: Vec<String>,
    /// Directory names that are never entered.
    pub skip_folders: Vec<String>,
    /// Directories holding more than this many files are skipped entirely
    /// (0 = no cap).
    pub max_files_per_folder: usize,
    /// Visit dotfiles and dot-directories.
    pub include_hidden: bool,
    /// Drop files whose extension is in the binary set.
    pub skip_binary_files: bool,
}

impl CrawlOptions {
    /// Normalizes the extension lists in place: leading dots stripped,
    /// lowercased.
    pub fn normalized(mut self) -> Self {
        let normalize =
            |list: &mut Vec<String>| {
                for ext in list.iter_mut() {
                    *ext = normalize_extension(ext);
                }
            };
        normalize(&mut self.include_extensions);
        normalize(&mut self.exclude_extensions);
        self
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

/// Whether an extension (already normalized) names a known binary format.
pub fn is_binary_extension(ext: &str) -> bool {
    BINARY_EXTENSIONS.contains(&ext)
}

/// Crawls `path`, returning the files that survive filtering.
///
/// A file argument is returned as-is when it passes the filters; a
/// directory is walked recursively under the per-directory policy. Missing
/// paths are a distinct error.
pub fn crawl(path: &Path, opts: &CrawlOptions) -> Result<Vec<PathBuf>, CrawlError> {
    let metadata = fs::metadata(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            CrawlError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CrawlError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let mut files = Vec::new();
    if metadata.is_file() {
        if keep_file(path, opts) {
            files.push(path.to_path_buf());
        }
    } else {
        crawl_directory(path, opts, &mut files)?;
    }
    Ok(files)
}

fn crawl_directory(
    dir: &Path,
    opts: &CrawlOptions,
    files: &mut Vec<PathBuf>,
) -> Result<(), CrawlError> {
    let entries = read_entries(dir)?;

    // Cap check runs before any filtering: a directory with thousands of
    // entries is almost always generated output, and descending into it
    // just to discard most files wastes the crawl budget.
    if opts.max_files_per_folder > 0 {
        let file_count = entries.iter().filter(|(_, is_dir)| !is_dir).count();
        if file_count > opts.max_files_per_folder {
            tracing::debug!(
                dir = %dir.display(),
                files = file_count,
                cap = opts.max_files_per_folder,
                "skipping directory over file cap"
            );
            return Ok(());
        }
    }

    for (path, is_dir) in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !opts.include_hidden && name.starts_with('.') {
            continue;
        }

        if is_dir {
            if opts.skip_folders.iter().any(|skip| skip == &name) {
                continue;
            }
            crawl_directory(&path, opts, files)?;
        } else if keep_file(&path, opts) {
            files.push(path);
        }
    }
    Ok(())
}

fn read_entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>, CrawlError> {
    let reader = fs::read_dir(dir).map_err(|source| CrawlError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|source| CrawlError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        entries.push((entry.path(), is_dir));
    }
    // Directory iteration order is platform-dependent; sort for stable
    // document ordering downstream.
    entries.sort();
    Ok(entries)
}

/// Extension filters in fixed order: exclude, then binary, then include.
fn keep_file(path: &Path, opts: &CrawlOptions) -> bool {
    let ext = path
        .extension()
        .map(|e| normalize_extension(&e.to_string_lossy()))
        .unwrap_or_default();

    if opts.exclude_extensions.iter().any(|e| e == &ext) {
        return false;
    }
    if opts.skip_binary_files && is_binary_extension(&ext) {
        return false;
    }
    if !opts.include_extensions.is_empty() && !opts.include_extensions.iter().any(|e| e == &ext) {
        return false;
    }
    true
}
