//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait covers the three operations the assistant needs
//! from a vector store: batched upsert, top-K similarity query, and a stats
//! summary. Two implementations:
//!
//! - [`PineconeIndex`] talks to a hosted Pinecone index over its data-plane
//!   REST API. When no host is configured it asks the control plane for the
//!   host of the named index, and refuses to start if that index was created
//!   with a different dimension than the configured embedder produces.
//! - [`InMemoryIndex`] keeps records in a map and answers queries by
//!   brute-force cosine similarity. Useful for tests and offline runs.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`upsert`](VectorIndex::upsert) | Insert or overwrite records by id |
//! | [`query`](VectorIndex::query) | Nearest neighbours with stored metadata |
//! | [`stats`](VectorIndex::stats) | Total stored vector count |

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::config::IndexConfig;
use crate::embedding::cosine_similarity;
use crate::error::ApiError;
use crate::models::{IndexRecord, IndexStats, RetrievalMatch};
use crate::retry::{send_with_retry, RetryPolicy};

const SERVICE: &str = "Pinecone";
const API_VERSION: &str = "2024-07";

/// Abstract vector store.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite records. Returns the number of records written.
    async fn upsert(&self, records: &[IndexRecord]) -> Result<usize>;

    /// Return up to `top_k` matches ordered by descending similarity.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievalMatch>>;

    /// Report how many vectors the index holds.
    async fn stats(&self) -> Result<IndexStats>;
}

// ============ Pinecone ============

/// Client for one Pinecone index.
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    host: String,
    namespace: Option<String>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("api_key", &"<redacted>")
            .field("host", &self.host)
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    dimension: Option<usize>,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
    #[serde(default)]
    dimension: Option<usize>,
}

impl PineconeIndex {
    /// Connect to the configured index.
    ///
    /// Uses `index.host` when set; otherwise resolves the host by name via
    /// the control plane and checks its dimension against `expected_dims`.
    pub async fn connect(
        config: &IndexConfig,
        api_key: &str,
        retry: RetryPolicy,
        expected_dims: usize,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let host = match &config.host {
            Some(host) => host.clone(),
            None => {
                let url = format!(
                    "{}/indexes/{}",
                    config.control_url.trim_end_matches('/'),
                    config.name
                );
                let response = send_with_retry(SERVICE, &retry, || {
                    client
                        .get(&url)
                        .header("Api-Key", api_key)
                        .header("X-Pinecone-API-Version", API_VERSION)
                        .send()
                })
                .await?;
                let desc: IndexDescription = response
                    .json()
                    .await
                    .map_err(|e| ApiError::decode(SERVICE, e.to_string()))?;

                if let Some(dims) = desc.dimension {
                    if dims != expected_dims {
                        bail!(
                            "Index '{}' has dimension {}, but embedding.dims is {}",
                            config.name,
                            dims,
                            expected_dims
                        );
                    }
                }
                tracing::debug!(index = %config.name, host = %desc.host, "resolved index host");
                desc.host
            }
        };

        let namespace = config
            .namespace
            .clone()
            .filter(|ns| !ns.trim().is_empty());

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            host: normalize_host(&host),
            namespace,
            retry,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.host, path);
        let response = send_with_retry(SERVICE, &self.retry, || {
            self.client
                .post(&url)
                .header("Api-Key", &self.api_key)
                .header("X-Pinecone-API-Version", API_VERSION)
                .json(body)
                .send()
        })
        .await?;
        Ok(response)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let body = UpsertRequest {
            vectors: records,
            namespace: self.namespace.as_deref(),
        };
        let response = self.post("/vectors/upsert", &body).await?;
        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|e| ApiError::decode(SERVICE, e.to_string()))?;
        Ok(parsed.upserted_count.unwrap_or(records.len()))
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievalMatch>> {
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };
        let response = self.post("/query", &body).await?;
        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| ApiError::decode(SERVICE, e.to_string()))?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| {
                let meta = m.metadata.unwrap_or_default();
                let field = |key: &str| meta.get(key).and_then(|v| v.as_str()).map(str::to_string);
                RetrievalMatch {
                    text: field("text").unwrap_or_default(),
                    source: field("source").unwrap_or_else(|| "unknown".to_string()),
                    id: m.id,
                    score: m.score,
                }
            })
            .collect())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let response = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;
        let parsed: StatsResponse = response
            .json()
            .await
            .map_err(|e| ApiError::decode(SERVICE, e.to_string()))?;
        Ok(IndexStats {
            total_vector_count: parsed.total_vector_count,
            dimension: parsed.dimension,
        })
    }
}

// ============ In-memory ============

/// In-memory index with brute-force cosine search.
#[derive(Default)]
pub struct InMemoryIndex {
    records: RwLock<BTreeMap<String, IndexRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all stored records, ordered by id.
    pub fn records(&self) -> Result<Vec<IndexRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        Ok(records.values().cloned().collect())
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<usize> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievalMatch>> {
        let stored = self
            .records
            .read()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;

        let mut scored: Vec<RetrievalMatch> = stored
            .values()
            .map(|r| RetrievalMatch {
                id: r.id.clone(),
                text: r.metadata.text.clone(),
                source: r.metadata.source.clone(),
                score: cosine_similarity(vector, &r.values),
            })
            .collect();

        // Ties broken by id so repeated queries are stable.
        scored.sort_by(|a, b| match b.score.total_cmp(&a.score) {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let stored = self
            .records
            .read()
            .map_err(|_| anyhow!("in-memory index lock poisoned"))?;
        Ok(IndexStats {
            total_vector_count: stored.len() as u64,
            dimension: stored.values().next().map(|r| r.values.len()),
        })
    }
}
