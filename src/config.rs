//! TOML configuration and credential loading.
//!
//! Every section carries defaults matching the hosted setup the assistant was
//! built against (`text-embedding-3-small` at 1024 dimensions, a Pinecone
//! index named `interview-rag`, `gpt-4o-mini` for answers), so an empty file
//! is a valid configuration. The embedding model and dimension live in a
//! single `[embedding]` section shared by ingestion and retrieval.
//!
//! API keys never live in the file. They are read from the process
//! environment by [`Credentials::from_env`].

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable holding the Pinecone API key.
pub const PINECONE_API_KEY_VAR: &str = "PINECONE_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    #[serde(default = "default_documents_root")]
    pub root: PathBuf,
    #[serde(default = "default_exclude_globs")]
    pub exclude_globs: Vec<String>,
    /// Read documents reached through symbolic links.
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: default_documents_root(),
            exclude_globs: default_exclude_globs(),
            follow_symlinks: default_follow_symlinks(),
        }
    }
}

fn default_documents_root() -> PathBuf {
    PathBuf::from("./data")
}
fn default_exclude_globs() -> Vec<String> {
    vec!["**/.git/**".to_string()]
}
fn default_follow_symlinks() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dims: default_dims(),
            base_url: default_openai_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1024
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_name")]
    pub name: String,
    /// Data-plane host. Resolved from the control plane by `name` when unset.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_control_url")]
    pub control_url: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: default_index_name(),
            host: None,
            control_url: default_control_url(),
            namespace: None,
            upsert_batch_size: default_upsert_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_index_name() -> String {
    "interview-rag".to_string()
}
fn default_control_url() -> String {
    "https://api.pinecone.io".to_string()
}
fn default_upsert_batch_size() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Whose documents are indexed; woven into the prompts.
    #[serde(default = "default_persona")]
    pub persona: String,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            base_url: default_openai_base_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            persona: default_persona(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    500
}
fn default_persona() -> String {
    "Shri".to_string()
}
fn default_completion_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_example_questions")]
    pub example_questions: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            example_questions: default_example_questions(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}
fn default_example_questions() -> Vec<String> {
    [
        "Tell me about the MicroStrategy internship",
        "What distributed systems projects have you worked on?",
        "Explain your deep learning experience",
        "What's your experience with AWS?",
        "Tell me about your RAG system projects",
        "What machine learning frameworks do you know?",
    ]
    .iter()
    .map(|q| q.to_string())
    .collect()
}

/// API keys for the two hosted services.
#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub pinecone_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field("pinecone_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read both keys from the environment. A missing or blank key is fatal.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| -> Result<String> {
            match lookup(name) {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => bail!("{} environment variable not set", name),
            }
        };
        Ok(Self {
            openai_api_key: read(OPENAI_API_KEY_VAR)?,
            pinecone_api_key: read(PINECONE_API_KEY_VAR)?,
        })
    }
}

/// Read and validate a configuration file.
///
/// A missing file is an error; an empty file yields all defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.chunk_size == 0 {
        bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.overlap >= config.chunking.chunk_size {
        bail!(
            "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.overlap,
            config.chunking.chunk_size
        );
    }

    // Validate embedding
    if config.embedding.dims == 0 {
        bail!("embedding.dims must be > 0");
    }
    if config.embedding.model.trim().is_empty() {
        bail!("embedding.model must not be empty");
    }

    // Validate index
    if config.index.upsert_batch_size == 0 {
        bail!("index.upsert_batch_size must be > 0");
    }
    if config.index.host.is_none() && config.index.name.trim().is_empty() {
        bail!("index.name must be set when index.host is not");
    }

    // Validate completion
    if !(0.0..=2.0).contains(&config.completion.temperature) {
        bail!("completion.temperature must be in [0.0, 2.0]");
    }
    if config.completion.max_tokens == 0 {
        bail!("completion.max_tokens must be > 0");
    }

    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }

    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        bail!("retry.base_delay_ms must not exceed retry.max_delay_ms");
    }

    Ok(())
}
