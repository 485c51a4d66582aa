//! Core data models used throughout the assistant.
//!
//! These types represent the chunks, index records, retrieval matches, and
//! answers that flow through the ingestion and question-answering pipeline.

use serde::{Deserialize, Serialize};

/// A window of a document's text, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Source label (the document's file name).
    pub source: String,
    /// Character offset of the window within the document text.
    pub start_offset: usize,
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub text: String,
    pub source: String,
}

/// The persisted unit in the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// A chunk returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalMatch {
    pub id: String,
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// A generated answer and the contexts it was conditioned on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub contexts: Vec<RetrievalMatch>,
}

/// Summary counts reported by the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub dimension: Option<usize>,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files_seen: usize,
    pub files_ingested: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub chunks_uploaded: usize,
    pub batches: usize,
}
