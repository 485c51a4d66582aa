//! Query-time retrieval: embed the question, ask the index for neighbours.
//!
//! No re-ranking, source filtering, or score thresholding is applied; every
//! match the index returns is treated as relevant. The only post-processing
//! is enforcing the `top_k` bound and a non-increasing score order.

use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::{Config, Credentials};
use crate::embedding::Embedder;
use crate::index::VectorIndex;
use crate::models::RetrievalMatch;
use crate::services::Services;

/// Number of characters shown when previewing a match.
pub const PREVIEW_CHARS: usize = 300;

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    /// `embedder` must be the one used at ingestion time; scores from a
    /// different embedding space are meaningless.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Return at most `top_k` matches, best first.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalMatch>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;
        let mut matches = self
            .index
            .query(&vector, top_k)
            .await
            .context("Vector index query failed")?;

        // Stable sort keeps the index's order among equal scores.
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }
}

/// First [`PREVIEW_CHARS`] characters of `text` followed by `...`.
pub fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

/// `prep search`: print the matches for a query without generating an answer.
pub async fn run_search(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let credentials = Credentials::from_env()?;
    let services = Services::connect(config, &credentials).await?;
    let retriever = Retriever::new(services.embedder, services.index);

    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let matches = retriever.search(query, top_k).await?;

    if matches.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, m) in matches.iter().enumerate() {
        println!("{}. [{:.3}] {}", i + 1, m.score, m.source);
        println!("    id: {}", m.id);
        println!("    {}", preview(&m.text).replace('\n', " "));
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;
    use crate::models::{IndexRecord, RecordMetadata};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    /// Maps every text to a fixed vector and counts calls.
    struct FixedEmbedder {
        vector: Vec<f32>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn model_name(&self) -> &str {
            "fixed"
        }
        fn dims(&self) -> usize {
            self.vector.len()
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(self.vector.clone())
        }
    }

    fn record(id: &str, values: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            values,
            metadata: RecordMetadata {
                text: format!("text {}", id),
                source: format!("{}.md", id),
            },
        }
    }

    #[tokio::test]
    async fn search_returns_at_most_top_k_in_score_order() {
        let index = Arc::new(InMemoryIndex::new());
        index
            .upsert(&[
                record("a", vec![1.0, 0.0]),
                record("b", vec![0.8, 0.2]),
                record("c", vec![0.0, 1.0]),
                record("d", vec![0.5, 0.5]),
            ])
            .await
            .unwrap();
        let embedder = Arc::new(FixedEmbedder {
            vector: vec![1.0, 0.0],
            calls: AtomicUsize::new(0),
        });
        let retriever = Retriever::new(embedder.clone(), index);

        let matches = retriever.search("aws experience", 3).await.unwrap();
        assert_eq!(matches.len(), 3);
        assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(matches[0].source, "a.md");
        assert_eq!(embedder.calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_top_k_skips_remote_calls() {
        let embedder = Arc::new(FixedEmbedder {
            vector: vec![1.0],
            calls: AtomicUsize::new(0),
        });
        let retriever = Retriever::new(embedder.clone(), Arc::new(InMemoryIndex::new()));
        assert!(retriever.search("q", 0).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn preview_truncates_on_chars() {
        let long = "é".repeat(400);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short...");
    }
}
