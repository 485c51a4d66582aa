//! Deterministic stand-ins for the hosted services.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use interview_rag::completion::{ChatMessage, ChatModel};
use interview_rag::embedding::Embedder;
use interview_rag::index::{InMemoryIndex, VectorIndex};
use interview_rag::models::{IndexRecord, IndexStats, RetrievalMatch};

pub const DIMS: usize = 16;

/// Bag-of-words embedder: each lowercase word bumps one bucket.
pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash"
    }

    fn dims(&self) -> usize {
        DIMS
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; DIMS];
        v[0] = 0.5;
        for word in text.split_whitespace() {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            v[1 + bucket % (DIMS - 1)] += 1.0;
        }
        Ok(v)
    }
}

/// [`HashEmbedder`] that errors on call `fail_from` and every call after it.
pub struct FlakyEmbedder {
    pub fail_from: usize,
    pub calls: AtomicUsize,
}

impl FlakyEmbedder {
    pub fn new(fail_from: usize) -> Self {
        Self {
            fail_from,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    fn model_name(&self) -> &str {
        "flaky"
    }

    fn dims(&self) -> usize {
        DIMS
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.fail_from {
            anyhow::bail!("embedding service unavailable");
        }
        HashEmbedder.embed(text).await
    }
}

/// In-memory index that records the size of every upsert call.
///
/// With `fail_on_upsert = Some(n)`, the n-th upsert call errors without
/// writing anything.
#[derive(Default)]
pub struct RecordingIndex {
    pub inner: InMemoryIndex,
    pub upserts: Mutex<Vec<usize>>,
    pub fail_on_upsert: Option<usize>,
    pub attempts: AtomicUsize,
}

impl RecordingIndex {
    pub fn failing_on(upsert: usize) -> Self {
        Self {
            fail_on_upsert: Some(upsert),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Sizes of the upserts that succeeded, in call order.
    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<usize> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_upsert == Some(attempt) {
            anyhow::bail!("index service unavailable");
        }
        self.upserts.lock().unwrap().push(records.len());
        self.inner.upsert(records).await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievalMatch>> {
        self.inner.query(vector, top_k).await
    }

    async fn stats(&self) -> Result<IndexStats> {
        self.inner.stats().await
    }
}

/// Chat model that returns a fixed reply and keeps every prompt it saw.
#[derive(Default)]
pub struct StubChat {
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

#[async_trait]
impl ChatModel for StubChat {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        Ok("stub answer".to_string())
    }
}

pub fn shared_index() -> Arc<RecordingIndex> {
    Arc::new(RecordingIndex::default())
}
