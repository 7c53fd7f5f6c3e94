use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const ENV_LOG: &str = "BOARDSYNC_LOG";
pub const DEFAULT_FILTER: &str = "boardsync=info";

/// Pick the filter directive: `BOARDSYNC_LOG`, then `RUST_LOG`, then the
/// configured filter, then [`DEFAULT_FILTER`].
pub fn filter_directive(configured: Option<&str>, env: &dyn Fn(&str) -> Option<String>) -> String {
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    non_empty(ENV_LOG)
        .or_else(|| non_empty("RUST_LOG"))
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Initialize logging to stderr. Stdout stays free for command output.
pub fn init(configured: Option<&str>, json: bool) -> Result<()> {
    let directive = filter_directive(configured, &|key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter: {directive}"))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.context("Failed to initialize logging")
}
