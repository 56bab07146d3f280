//! Global tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Takes precedence over `RUST_LOG` when set.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Installs the global subscriber. Call once, first thing in `main`.
pub fn init() {
    let level = std::env::var(LOG_LEVEL_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(filter(level.as_deref()))
        .with_target(true)
        .init();
}

/// `LOG_LEVEL` if it parses, else `RUST_LOG`, else `info`.
pub fn filter(level: Option<&str>) -> EnvFilter {
    level
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .and_then(|l| EnvFilter::try_new(l.to_ascii_lowercase()).ok())
        .unwrap_or_else(|| {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy()
        })
}
