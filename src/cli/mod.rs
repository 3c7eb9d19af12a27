//! Subcommand bodies for the `reelrank` binary. Each takes a plain config
//! struct so the binary stays a thin clap shim.

pub mod counts;
pub mod reload;
pub mod search;

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::CatalogStore;
use crate::util::env as env_util;

/// Open the catalog at `database_url`, falling back to the environment.
pub async fn open_store(database_url: Option<String>) -> Result<CatalogStore> {
    env_util::init_env();
    let url = database_url.unwrap_or_else(env_util::db_url);
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 5u32);
    info!(url = %url, max_connections, "opening catalog");
    CatalogStore::connect(&url, max_connections)
        .await
        .with_context(|| format!("failed to open catalog at {url}"))
}
