//! Batch reload: export file → normalizer → catalog store.

pub mod csv_rows;

use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::catalog::{CatalogCounts, CatalogStore, EntityKind};
use crate::error::CatalogError;
use crate::normalization::{
    normalize, FallbackIds, NormalizerState, ParseWarning, SourceRecord, TaxonomyPolicy,
};
use crate::util::env::{env_flag, env_opt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadOptions {
    pub taxonomy: TaxonomyPolicy,
    pub fallback_ids: FallbackIds,
}

impl ReloadOptions {
    /// `TAXONOMY_STRICT=1` rejects malformed cells; `FALLBACK_IDS=name` selects stable ids.
    pub fn from_env() -> Self {
        let taxonomy = if env_flag("TAXONOMY_STRICT", false) {
            TaxonomyPolicy::Strict
        } else {
            TaxonomyPolicy::Lenient
        };
        let fallback_ids = match env_opt("FALLBACK_IDS").map(|raw| raw.parse::<FallbackIds>()) {
            Some(Ok(strategy)) => strategy,
            Some(Err(e)) => {
                warn!(error = %e, "ignoring FALLBACK_IDS");
                FallbackIds::default()
            }
            None => FallbackIds::default(),
        };
        Self {
            taxonomy,
            fallback_ids,
        }
    }
}

/// Outcome of one reload.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadReport {
    pub rows: usize,
    pub counts: CatalogCounts,
    pub warnings: Vec<ParseWarning>,
}

/// Replace the catalog with the contents of a CSV export.
#[instrument(skip(store, options))]
pub async fn reload_from_csv(
    store: &CatalogStore,
    path: &Path,
    options: &ReloadOptions,
) -> Result<ReloadReport, CatalogError> {
    let records = csv_rows::read_source_file(path)?;
    info!(rows = records.len(), "read catalog export");
    reload_records(store, records, options).await
}

/// Normalize `records` with a fresh run state and write them to the store.
pub async fn reload_records(
    store: &CatalogStore,
    records: Vec<SourceRecord>,
    options: &ReloadOptions,
) -> Result<ReloadReport, CatalogError> {
    let rows = records.len();
    let (catalog, state) = normalize(
        records,
        NormalizerState::new(options.fallback_ids),
        options.taxonomy,
    )?;
    let counts = store.reload(&catalog).await?;

    if !catalog.warnings.is_empty() {
        warn!(
            dropped_cells = catalog.warnings.len(),
            "reload completed with malformed taxonomy cells ingested as empty"
        );
    }
    info!(
        rows,
        genres = state.len(EntityKind::Genre),
        keywords = state.len(EntityKind::Keyword),
        companies = state.len(EntityKind::Company),
        "reload complete"
    );

    Ok(ReloadReport {
        rows,
        counts,
        warnings: catalog.warnings,
    })
}
