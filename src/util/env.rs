//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Fallback database when no URL is configured.
pub const DEFAULT_DB_URL: &str = "sqlite://reelrank.db";

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_err() {
            // Fallback to the crate root so `cargo run` from elsewhere still finds it.
            let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
            let _ = dotenv::from_filename(candidate);
        }
    });
}

/// Common bootstrap for CLI binaries: load env and log where the catalog lives.
pub fn bootstrap_cli(bin_name: &str) {
    init_env();
    let source = if env_opt("CATALOG_DB_URL").is_some() {
        "CATALOG_DB_URL"
    } else if env_opt("DATABASE_URL").is_some() {
        "DATABASE_URL"
    } else {
        "default"
    };
    info!(target = "bootstrap", bin = bin_name, db_url_source = source, "environment loaded");
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> bool {
    let v = raw.trim().to_ascii_lowercase();
    matches!(v.as_str(), "1" | "true" | "on" | "yes")
}

/// Catalog database URL: `CATALOG_DB_URL`, then `DATABASE_URL`, then [`DEFAULT_DB_URL`].
pub fn db_url() -> String {
    init_env();
    for k in ["CATALOG_DB_URL", "DATABASE_URL"] {
        if let Some(v) = env_opt(k) {
            return v;
        }
    }
    DEFAULT_DB_URL.to_string()
}
