use anyhow::Result;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct CountsConfig {
    /// Optional override for the catalog database URL.
    pub database_url: Option<String>,
}

/// Print row counts for every catalog table as JSON.
pub async fn run(cfg: CountsConfig) -> Result<()> {
    let store = super::open_store(cfg.database_url).await?;
    let counts = store.counts().await?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    info!(movies = counts.movies, "counts done");
    Ok(())
}
