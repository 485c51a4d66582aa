//! # Interview RAG
//!
//! A retrieval-augmented assistant for interview preparation over a personal
//! corpus of resume and project documents.
//!
//! Documents are read from a local directory, split into overlapping
//! character windows, embedded with a hosted embedding model, and stored in
//! a hosted vector index. Questions are answered by embedding the question,
//! fetching the nearest chunks, and asking a chat model to answer from them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐
//! │  Documents  │──▶│ Extract +    │──▶│  Pinecone  │
//! │ pdf/md/txt  │   │ Chunk+Embed  │   │   index    │
//! └─────────────┘   └──────────────┘   └─────┬──────┘
//!                                            │ query
//!                    ┌───────────────────────┤
//!                    ▼                       ▼
//!               ┌──────────┐           ┌──────────┐
//!               │ CLI ask/ │           │ Web UI + │
//!               │  demo    │           │ /api/ask │
//!               └──────────┘           └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=... PINECONE_API_KEY=...
//! prep ingest --dir ./data        # chunk, embed, upsert
//! prep ask "What distributed systems experience do you have?"
//! prep demo                       # three fixed questions
//! prep serve                      # browser UI on 127.0.0.1:8501
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and credentials |
//! | [`models`] | Core data types |
//! | [`extract`] | Per-format text extraction |
//! | [`chunk`] | Character-window chunking and record ids |
//! | [`error`] | Typed errors for hosted API calls |
//! | [`retry`] | Backoff policy for hosted API calls |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Vector index abstraction (Pinecone, in-memory) |
//! | [`completion`] | Chat completion abstraction |
//! | [`services`] | Construction of the hosted clients |
//! | [`ingest`] | Ingestion pipeline |
//! | [`retrieve`] | Query-time retrieval |
//! | [`answer`] | Prompt building, answering, demo harness |
//! | [`stats`] | Index statistics |
//! | [`server`] | Browser UI and JSON API |

pub mod answer;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod models;
pub mod retrieve;
pub mod retry;
pub mod server;
pub mod services;
pub mod stats;
