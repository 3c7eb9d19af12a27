use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Filter used by the binaries when `RUST_LOG` is unset. sqlx logs every
/// statement at info, which drowns a reload.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Install the global fmt subscriber shared by every binary.
///
/// `RUST_LOG` wins over `default_filter`. Source locations are only printed in
/// debug builds.
pub fn init_tracing(default_filter: Option<&str>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_FILTER)));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(cfg!(debug_assertions))
        .with_line_number(cfg!(debug_assertions))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}
