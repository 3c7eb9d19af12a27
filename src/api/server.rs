// API server implementation using actix-web

use std::time::Instant;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

use crate::api::{middleware, routes};
use crate::recommend::Recommender;
use crate::util::env::{env_opt, init_env};

/// Shared by every worker.
pub struct AppState {
    pub recommender: Recommender,
    pub started: Instant,
}

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        init_env();

        let host = env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_opt("API_PORT")
            .unwrap_or_else(|| "5000".to_string())
            .trim()
            .parse()
            .context("Invalid API_PORT")?;
        let allowed_origins =
            env_opt("ALLOWED_ORIGINS").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            host,
            port,
            allowed_origins,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, recommender: Recommender) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            origins = %self.allowed_origins,
            "Starting reelrank API server"
        );

        let state = web::Data::new(AppState {
            recommender,
            started: Instant::now(),
        });
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
