//! Command dispatch: thin shells around the engine core.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::{Cli, Commands, ConfigCommands, TombstoneCommands};
use crate::config::Config;
use crate::error::{MnemeError, Result};
use crate::index::{BatchPhase, BuildOptions, BuildProgress};
use crate::ingest::{FilesystemIngestor, IngestorRegistry};
use crate::search::{self, TrigramIndex};
use crate::store::{self, SegmentStore, is_lock_stale};
use crate::tokenize;

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# mneme configuration

[index]
# segment_size = 500
# max_tokens_per_document = 10000
# reindex_on_modify = true
# skip_binary_files = true

[sources]
# Directories to index.
paths = []
# include_extensions = ["rs", "go", "md"]
# exclude_extensions = []
# ignore = [".git", "node_modules", ".vscode", ".idea", "vendor", ".cache"]

[watcher]
# enabled = true
# debounce_ms = 500

[search]
# default_limit = 20
# use_stopwords = true
# language = "en"

[ranking]
# bm25_weight = 0.7
# vsm_weight = 0.3
# recency_half_life_days = 30
# two_pass = false
# fuzzy_penalty = 0.6

[logging]
# level = "info"
# json = true
"#;

/// Entry point called from `main` after CLI parsing.
pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    crate::tracing::init(&config.logging.level, config.logging.json);

    let store = SegmentStore::new(resolve_data_dir()?);

    match cli.command {
        Commands::Init => init(&store, cli.config.as_deref()),
        Commands::Index { batch_size } => index(&config, &store, batch_size),
        Commands::Search {
            query,
            limit,
            score,
        } => search(&config, &store, &query, limit, score).await,
        Commands::Config {
            command: ConfigCommands::Show,
        } => config_show(&config),
        Commands::Tombstones { command } => tombstones(&store, &command),
    }
}

fn resolve_data_dir() -> Result<PathBuf> {
    store::default_data_dir()
        .ok_or_else(|| MnemeError::internal("could not resolve a platform data directory").into())
}

fn init(store: &SegmentStore, config_override: Option<&Path>) -> Result<()> {
    store.ensure_layout().map_err(MnemeError::Store)?;

    // Never silently overwrite a store written by a different schema.
    match store.read_version().map_err(MnemeError::Store)? {
        Some(record) => record.check_compatibility().map_err(MnemeError::Version)?,
        None => store.write_version().map_err(MnemeError::Store)?,
    }

    let config_path = match config_override {
        Some(path) => Some(path.to_path_buf()),
        None => store::default_config_path(),
    };
    if let Some(path) = config_path
        && !path.exists()
    {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        println!("Wrote default config to {}", path.display());
    }

    println!("Initialized index store at {}", store.data_dir().display());
    Ok(())
}

fn index(config: &Config, store: &SegmentStore, batch_size: Option<usize>) -> Result<()> {
    store.ensure_layout().map_err(MnemeError::Store)?;
    match store.read_version().map_err(MnemeError::Store)? {
        Some(record) => record.check_compatibility().map_err(MnemeError::Version)?,
        None => store.write_version().map_err(MnemeError::Store)?,
    }

    let _lock = store.acquire_lock().map_err(|e| {
        if let Some(owner) = store.lock_owner()
            && is_lock_stale(&owner)
        {
            tracing::warn!(
                pid = owner.process_id,
                "lock holder is gone; remove the lock directory to recover"
            );
        }
        MnemeError::Lock(e)
    })?;

    // Re-indexing supersedes the whole index: retire the old segments
    // first, never delete them outright.
    let moved = store.move_segments_to_tombstones().map_err(MnemeError::Store)?;
    if moved.moved_count > 0 {
        tracing::info!(segments = moved.moved_count, "previous index tombstoned");
    }

    let mut registry = IngestorRegistry::new();
    registry.register(Box::new(FilesystemIngestor::new(
        config.sources.paths.clone(),
        config.sources.filesystem_enabled(),
    )));

    let opts = BuildOptions {
        batch_size: batch_size.unwrap_or(config.index.segment_size),
        max_tokens_per_document: config.index.max_tokens_per_document,
        suppress_logs: false,
    };

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} documents")
            .expect("progress template is valid"),
    );
    let progress = |p: &BuildProgress| {
        if bar.length() == Some(0) {
            bar.set_length(p.docs_total as u64);
        }
        if p.phase == BatchPhase::Completed {
            bar.set_position(p.docs_processed as u64);
        }
    };

    let manifest = crate::index::build(
        &registry,
        &config.crawl_options(),
        &opts,
        store,
        Some(&progress),
    )?;
    bar.finish_and_clear();

    match manifest {
        Some(manifest) => println!(
            "Indexed {} documents ({} terms) into {} chunks",
            manifest.total_docs,
            manifest.total_tokens,
            manifest.chunks.len()
        ),
        None => println!("Nothing to index. Add paths under [sources] in the config."),
    }
    Ok(())
}

async fn search(
    config: &Config,
    store: &SegmentStore,
    query: &str,
    limit: Option<usize>,
    show_scores: bool,
) -> Result<()> {
    let segment = Arc::new(store.load_all().map_err(MnemeError::Store)?);

    let (terms, mut tokens) = search::parse_query_input(query);
    if tokens.is_empty() {
        anyhow::bail!("query has no searchable terms");
    }

    // Auto-correct user terms when any token misses the vocabulary.
    if tokens.iter().any(|t| !segment.contains_term(t)) {
        let trigram = TrigramIndex::from_segment(&segment);
        let mut corrected: Vec<String> = Vec::new();
        let mut changed = false;
        for term in &terms {
            let correction = search::autocorrect_term(&segment, &trigram, term);
            changed |= correction.changed;
            corrected.extend(correction.terms);
        }
        if changed {
            println!("Searching instead for: {}", corrected.join(" "));
            tokens = Vec::new();
            for term in &corrected {
                for token in tokenize::tokenize_query(term) {
                    if !tokens.contains(&token) {
                        tokens.push(token);
                    }
                }
            }
        }
    }

    let opts = config.rank_options(limit);
    let results = if config.ranking.two_pass {
        search::rank_two_pass(Arc::clone(&segment), tokens.clone(), opts).await?
    } else {
        search::rank(&segment, &tokens, &opts)
    };

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for doc in &results {
        let snippets = match search::extract_snippets(Path::new(&doc.path), &tokens) {
            Ok(snippets) => snippets,
            Err(e) => {
                tracing::debug!(path = %doc.path, error = %e, "snippet extraction failed");
                Vec::new()
            }
        };

        if show_scores {
            println!("{}  (score {:.4})", doc.path, doc.score);
            for snippet in &snippets {
                println!("  {:>5}: {}", snippet.line_number, snippet.content);
            }
        } else {
            println!("{}", search::simple_format(&doc.path, &snippets));
        }
    }
    Ok(())
}

fn config_show(config: &Config) -> Result<()> {
    if let Some(path) = store::default_config_path() {
        println!("# {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn tombstones(store: &SegmentStore, command: &TombstoneCommands) -> Result<()> {
    match command {
        TombstoneCommands::Size => {
            let size = store.tombstones_size().map_err(MnemeError::Store)?;
            println!("{}", format_bytes(size));
        }
        TombstoneCommands::Clear => {
            let stats = store.clear_tombstones().map_err(MnemeError::Store)?;
            println!(
                "Deleted {} tombstoned segments, freed {}",
                stats.deleted_count,
                format_bytes(stats.freed_bytes)
            );
        }
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn format_bytes_scales_units() {
        check!(format_bytes(0) == "0 B");
        check!(format_bytes(512) == "512 B");
        check!(format_bytes(2048) == "2.0 KiB");
        check!(format_bytes(5 * 1024 * 1024) == "5.0 MiB");
    }

    #[test]
    fn default_config_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        check!(config.sources.paths.is_empty());
    }
}
