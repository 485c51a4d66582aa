//! # Interview prep CLI (`prep`)
//!
//! ## Usage
//!
//! ```bash
//! prep --config ./config/prep.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `prep ingest` | Chunk, embed, and upsert every supported document |
//! | `prep search "<q>"` | Show the nearest chunks for a query |
//! | `prep ask "<q>"` | Answer one question from the indexed documents |
//! | `prep demo` | Answer the three fixed demo questions |
//! | `prep stats` | Print index vector count and dimension |
//! | `prep serve` | Start the browser UI and JSON API |
//!
//! `OPENAI_API_KEY` and `PINECONE_API_KEY` must be set for every command
//! except `ingest --dry-run`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use interview_rag::{answer, config, ingest, retrieve, server, stats};

/// Interview prep assistant over your resume and project documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/prep.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "prep",
    about = "Retrieval-augmented interview prep over your own documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/prep.toml`.
    #[arg(long, global = true, default_value = "./config/prep.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest documents into the vector index.
    ///
    /// Walks the document directory, extracts text from PDF, text, markdown,
    /// Python, JavaScript and JSON files, chunks it, embeds each chunk and
    /// upserts the records in batches. Other files are skipped.
    Ingest {
        /// Document directory. Overrides `[documents].root`.
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Extract and chunk only; print counts without calling any service.
        #[arg(long)]
        dry_run: bool,

        /// Seconds to wait before reading index stats after the upload.
        #[arg(long, default_value_t = 2)]
        settle_secs: u64,
    },

    /// Show the chunks nearest to a query.
    Search {
        /// Query text.
        query: String,

        /// Number of matches. Overrides `[retrieval].top_k`.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Answer a question from the indexed documents.
    Ask {
        /// Question text.
        question: String,

        /// Number of context chunks. Overrides `[retrieval].top_k`.
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the source chunks after the answer.
        #[arg(long)]
        show_sources: bool,
    },

    /// Answer the fixed demo questions in order.
    Demo,

    /// Print index statistics.
    Stats,

    /// Start the browser UI and JSON API on `[server].bind`.
    Serve,
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("interview_rag=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest {
            dir,
            dry_run,
            settle_secs,
        } => {
            ingest::run_ingest(&cfg, dir, dry_run, settle_secs).await?;
        }
        Commands::Search { query, top_k } => {
            retrieve::run_search(&cfg, &query, top_k).await?;
        }
        Commands::Ask {
            question,
            top_k,
            show_sources,
        } => {
            answer::run_ask(&cfg, &question, top_k, show_sources).await?;
        }
        Commands::Demo => {
            answer::run_demo(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
