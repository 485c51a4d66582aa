//! Index statistics.
//!
//! Used by `prep stats` to confirm ingestion landed: prints the total vector
//! count and the index dimension as reported by the vector store.

use anyhow::{Context, Result};

use crate::config::{Config, Credentials};
use crate::models::IndexStats;
use crate::services::Services;

/// Run the stats command: query the index and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let services = Services::connect(config, &credentials).await?;
    let stats = services
        .index
        .stats()
        .await
        .context("Failed to read index stats")?;

    println!("{}", format_stats(&config.index.name, &stats));
    Ok(())
}

fn format_stats(name: &str, stats: &IndexStats) -> String {
    let dimension = stats
        .dimension
        .map(|d| d.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "Index Stats\n===========\n\n  Index:       {}\n  Vectors:     {}\n  Dimension:   {}",
        name, stats.total_vector_count, dimension
    )
}
