//! Construction of the hosted-service clients.
//!
//! All remote collaborators are built once at startup from the loaded
//! [`Config`] and [`Credentials`] and handed to the pipeline components as
//! trait objects. Nothing is held in globals, so tests can swap in
//! [`InMemoryIndex`](crate::index::InMemoryIndex) or stub models.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::completion::{ChatModel, OpenAiChat};
use crate::config::{Config, Credentials};
use crate::embedding::{Embedder, OpenAiEmbedder};
use crate::index::{PineconeIndex, VectorIndex};
use crate::retry::RetryPolicy;

/// The three remote collaborators, shared for the life of the process.
#[derive(Clone)]
pub struct Services {
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub chat: Arc<dyn ChatModel>,
}

impl Services {
    /// Build the OpenAI and Pinecone clients.
    ///
    /// Connecting to the index may hit the Pinecone control plane to resolve
    /// the index host and confirm its dimension matches `embedding.dims`.
    pub async fn connect(config: &Config, credentials: &Credentials) -> Result<Self> {
        let retry = RetryPolicy::from_config(&config.retry);

        let embedder = OpenAiEmbedder::new(&config.embedding, &credentials.openai_api_key, retry)
            .context("Failed to build embedding client")?;
        let chat = OpenAiChat::new(&config.completion, &credentials.openai_api_key, retry)
            .context("Failed to build completion client")?;
        let index = PineconeIndex::connect(
            &config.index,
            &credentials.pinecone_api_key,
            retry,
            config.embedding.dims,
        )
        .await
        .with_context(|| format!("Failed to connect to index '{}'", config.index.name))?;

        tracing::debug!(
            embedding_model = embedder.model_name(),
            dims = embedder.dims(),
            chat_model = chat.model_name(),
            index_host = index.host(),
            "services ready"
        );

        Ok(Self {
            embedder: Arc::new(embedder),
            index: Arc::new(index),
            chat: Arc::new(chat),
        })
    }
}
