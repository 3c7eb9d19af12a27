use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tracing::{info, warn};

use crate::ingest::{reload_from_csv, ReloadOptions};
use crate::normalization::{FallbackIds, TaxonomyPolicy};
use crate::util::env as env_util;

#[derive(Debug, Clone, Default)]
pub struct ReloadConfig {
    pub database_url: Option<String>,
    /// Export to load; defaults to `CATALOG_CSV`.
    pub csv: Option<PathBuf>,
    /// Abort on the first malformed taxonomy cell.
    pub strict: bool,
    pub fallback_ids: Option<FallbackIds>,
    /// Print every parse warning instead of a count.
    pub show_warnings: bool,
}

pub async fn run(cfg: ReloadConfig) -> Result<()> {
    let csv = cfg
        .csv
        .clone()
        .or_else(|| env_util::env_opt("CATALOG_CSV").map(PathBuf::from))
        .ok_or_else(|| anyhow!("no export given; pass --csv or set CATALOG_CSV"))?;

    let mut options = ReloadOptions::from_env();
    if cfg.strict {
        options.taxonomy = TaxonomyPolicy::Strict;
    }
    if let Some(fallback_ids) = cfg.fallback_ids {
        options.fallback_ids = fallback_ids;
    }

    let store = super::open_store(cfg.database_url).await?;
    let report = reload_from_csv(&store, &csv, &options)
        .await
        .with_context(|| format!("reload from {} failed", csv.display()))?;

    for w in &report.warnings {
        warn!(
            movie_id = w.movie_id,
            line = w.line,
            field = w.field,
            message = %w.message,
            "taxonomy cell ingested as empty"
        );
    }

    let out = if cfg.show_warnings {
        json!({ "rows": report.rows, "counts": report.counts, "warnings": report.warnings })
    } else {
        json!({ "rows": report.rows, "counts": report.counts, "warnings": report.warnings.len() })
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    info!(csv = %csv.display(), "reload done");
    Ok(())
}
