//! Log subscriber configuration.

use recordops_core::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber, filtered by `RUST_LOG`.
pub fn configure_tracing(json_logs: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,recordops=debug".into()),
    );

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.map_err(|e| Error::internal(format!("Failed to install log subscriber: {}", e)))
}
