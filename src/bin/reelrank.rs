use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reelrank::api::ApiServer;
use reelrank::cli::{counts, open_store, reload, search};
use reelrank::normalization::FallbackIds;
use reelrank::recommend::{RecommendConfig, Recommender};
use reelrank::util::env;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "reelrank", version, about = "Movie catalog loader and recommender")]
struct Cli {
    /// Optional override for the database URL
    #[arg(long, global = true)]
    db_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Replace the catalog with the contents of a CSV export
    Reload {
        /// Path to the export (defaults to CATALOG_CSV)
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Fail on malformed genre/keyword/company cells instead of skipping them
        #[arg(long, default_value_t = false)]
        strict: bool,
        /// Id strategy for entities whose source id is missing or taken: sequential | name
        #[arg(long)]
        fallback_ids: Option<FallbackIds>,
        /// Print every parse warning
        #[arg(long, default_value_t = false)]
        show_warnings: bool,
    },
    /// Resolve a query to an anchor movie and print its recommendations
    Search {
        query: String,
        /// Override RECOMMEND_TOP_K
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List titles by popularity
    Titles {
        #[arg(long, default_value_t = 1000)]
        limit: i64,
    },
    /// Print row counts for every catalog table
    Counts,
    /// Run the HTTP API
    Serve,
}

#[actix_web::main]
async fn main() -> Result<()> {
    env::init_env();
    reelrank::tracing::init_tracing(None)?;
    env::bootstrap_cli("reelrank");

    let cli = Cli::parse();
    let db_url = cli.db_url;

    match cli.command {
        Commands::Reload {
            csv,
            strict,
            fallback_ids,
            show_warnings,
        } => {
            reload::run(reload::ReloadConfig {
                database_url: db_url,
                csv,
                strict,
                fallback_ids,
                show_warnings,
            })
            .await?;
        }
        Commands::Search { query, top_k, json } => {
            search::run(search::SearchConfig {
                database_url: db_url,
                query,
                top_k,
                json,
            })
            .await?;
        }
        Commands::Titles { limit } => {
            search::run_titles(search::TitlesConfig {
                database_url: db_url,
                limit,
            })
            .await?;
        }
        Commands::Counts => {
            counts::run(counts::CountsConfig {
                database_url: db_url,
            })
            .await?;
        }
        Commands::Serve => {
            let server = ApiServer::from_env()?;
            let store = open_store(db_url).await?;
            info!("catalog opened; starting server");
            server
                .run(Recommender::new(store, RecommendConfig::from_env()))
                .await?;
        }
    }

    Ok(())
}
