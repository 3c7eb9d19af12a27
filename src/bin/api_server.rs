// Standalone HTTP API binary; same as `reelrank serve`.

use anyhow::Result;
use reelrank::api::ApiServer;
use reelrank::cli::open_store;
use reelrank::recommend::{RecommendConfig, Recommender};
use reelrank::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    env_util::init_env();
    reelrank::tracing::init_tracing(None)?;

    tracing::info!("Initializing reelrank API server");

    let server = ApiServer::from_env()?;
    let store = open_store(None).await?;
    tracing::info!("Database connected successfully");

    server
        .run(Recommender::new(store, RecommendConfig::from_env()))
        .await?;

    Ok(())
}
