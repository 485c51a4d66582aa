//! Ingestion pipeline orchestration.
//!
//! Coordinates the offline flow: directory walk → format detection → text
//! extraction → chunking → embedding → batched upsert. Unsupported files are
//! skipped with a notice and extraction failures are logged and skipped;
//! embedding and upsert failures abort the run once retries are exhausted.
//!
//! Record ids are content-addressed ([`record_id`]), so running ingestion
//! again over unchanged documents overwrites records rather than
//! duplicating them.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

use crate::chunk::{chunk_text, record_id};
use crate::config::{ChunkingConfig, Config, Credentials};
use crate::embedding::Embedder;
use crate::extract::{extract_text, DocumentFormat};
use crate::index::VectorIndex;
use crate::models::{Chunk, IndexRecord, IngestReport, RecordMetadata};
use crate::services::Services;

/// A chunk waiting to be embedded, with the document path its id derives from.
#[derive(Debug, Clone)]
pub struct PendingChunk {
    pub doc_path: String,
    pub chunk: Chunk,
}

/// Walk `root`, extract every supported document, and chunk it.
///
/// With `follow_symlinks`, linked files are read and linked directories are
/// descended. Entries the walk cannot read (permission errors, link loops)
/// are logged and skipped.
///
/// Returns the chunks in walk order plus a report with file counts filled in
/// (`chunks_uploaded` and `batches` stay zero).
pub fn prepare_chunks(
    root: &Path,
    chunking: &ChunkingConfig,
    exclude_globs: &[String],
    follow_symlinks: bool,
) -> Result<(Vec<PendingChunk>, IngestReport)> {
    if !root.is_dir() {
        bail!("Document directory does not exist: {}", root.display());
    }
    let exclude_set = build_globset(exclude_globs)?;

    let mut report = IngestReport::default();
    let mut pending = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let at = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                tracing::warn!(path = %at, error = %e, "cannot read directory entry, skipping");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        report.files_seen += 1;
        let file_name = entry.file_name().to_string_lossy().to_string();

        let Some(format) = DocumentFormat::from_path(path) else {
            tracing::info!(file = %rel_str, "skipping {} (unsupported format)", file_name);
            report.files_skipped += 1;
            continue;
        };

        tracing::info!(file = %rel_str, "reading {}", file_name);
        let text = match extract_text(path, format) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %rel_str, error = %e, "error reading {}, skipping", file_name);
                report.files_failed += 1;
                continue;
            }
        };

        let chunks = chunk_text(&file_name, &text, chunking.chunk_size, chunking.overlap);
        tracing::debug!(file = %rel_str, chunks = chunks.len(), "chunked document");
        pending.extend(chunks.into_iter().map(|chunk| PendingChunk {
            doc_path: rel_str.clone(),
            chunk,
        }));
        report.files_ingested += 1;
    }

    Ok((pending, report))
}

/// Embeds chunks and writes them to the vector index in fixed-size batches.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chunking: ChunkingConfig,
    exclude_globs: Vec<String>,
    follow_symlinks: bool,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chunking: ChunkingConfig,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            chunking,
            exclude_globs: Vec::new(),
            follow_symlinks: true,
            batch_size: batch_size.max(1),
        }
    }

    pub fn with_exclude_globs(mut self, globs: Vec<String>) -> Self {
        self.exclude_globs = globs;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Ingest every supported document under `dir`.
    ///
    /// `report.chunks_uploaded` is the number of chunks written.
    pub async fn ingest(&self, dir: &Path) -> Result<IngestReport> {
        let (pending, mut report) = prepare_chunks(
            dir,
            &self.chunking,
            &self.exclude_globs,
            self.follow_symlinks,
        )?;
        tracing::info!(
            chunks = pending.len(),
            files = report.files_ingested,
            "created {} chunks from documents",
            pending.len()
        );

        let (uploaded, batches) = self.upload(&pending).await?;
        report.chunks_uploaded = uploaded;
        report.batches = batches;
        Ok(report)
    }

    /// Embed each chunk (one call per chunk) and upsert in batches.
    ///
    /// Returns `(chunks_uploaded, upsert_calls)`.
    pub async fn upload(&self, pending: &[PendingChunk]) -> Result<(usize, usize)> {
        let mut batch: Vec<IndexRecord> = Vec::with_capacity(self.batch_size);
        let mut uploaded = 0usize;
        let mut batches = 0usize;

        for item in pending {
            let values = self.embedder.embed(&item.chunk.text).await.with_context(|| {
                format!(
                    "Failed to embed chunk at offset {} of {}",
                    item.chunk.start_offset, item.doc_path
                )
            })?;

            batch.push(IndexRecord {
                id: record_id(&item.doc_path, &item.chunk),
                values,
                metadata: RecordMetadata {
                    text: item.chunk.text.clone(),
                    source: item.chunk.source.clone(),
                },
            });

            if batch.len() >= self.batch_size {
                uploaded += self.flush(&mut batch, batches + 1).await?;
                batches += 1;
            }
        }

        if !batch.is_empty() {
            uploaded += self.flush(&mut batch, batches + 1).await?;
            batches += 1;
        }

        Ok((uploaded, batches))
    }

    async fn flush(&self, batch: &mut Vec<IndexRecord>, number: usize) -> Result<usize> {
        let count = batch.len();
        self.index
            .upsert(batch.as_slice())
            .await
            .with_context(|| format!("Failed to upsert batch {}", number))?;
        tracing::info!(batch = number, records = count, "uploaded batch {}", number);
        batch.clear();
        Ok(count)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// `prep ingest`: run the ingestion pipeline and print a summary.
pub async fn run_ingest(
    config: &Config,
    dir: Option<PathBuf>,
    dry_run: bool,
    settle_secs: u64,
) -> Result<()> {
    let root = dir.unwrap_or_else(|| config.documents.root.clone());
    println!("Loading documents from {}", root.display());

    if dry_run {
        let (pending, report) = prepare_chunks(
            &root,
            &config.chunking,
            &config.documents.exclude_globs,
            config.documents.follow_symlinks,
        )?;
        println!("ingest (dry-run)");
        println!("  files found: {}", report.files_seen);
        println!("  files readable: {}", report.files_ingested);
        println!("  files skipped: {}", report.files_skipped);
        println!("  files failed: {}", report.files_failed);
        println!("  chunks: {}", pending.len());
        println!(
            "  upsert batches: {}",
            pending.len().div_ceil(config.index.upsert_batch_size)
        );
        return Ok(());
    }

    let credentials = Credentials::from_env()?;
    let services = Services::connect(config, &credentials).await?;

    let started = Utc::now();
    let ingestor = Ingestor::new(
        services.embedder.clone(),
        services.index.clone(),
        config.chunking.clone(),
        config.index.upsert_batch_size,
    )
    .with_exclude_globs(config.documents.exclude_globs.clone())
    .with_follow_symlinks(config.documents.follow_symlinks);
    let report = ingestor.ingest(&root).await?;
    let elapsed = Utc::now() - started;

    println!("ingest {}", root.display());
    println!("  files found: {}", report.files_seen);
    println!("  files ingested: {}", report.files_ingested);
    println!("  files skipped: {}", report.files_skipped);
    println!("  files failed: {}", report.files_failed);
    println!("  chunks uploaded: {}", report.chunks_uploaded);
    println!("  upsert batches: {}", report.batches);
    println!("  elapsed: {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);

    // Index stats are eventually consistent after an upsert.
    if settle_secs > 0 {
        tokio::time::sleep(Duration::from_secs(settle_secs)).await;
    }
    let stats = services.index.stats().await?;
    println!("  index vectors: {}", stats.total_vector_count);
    println!("ok");

    Ok(())
}
