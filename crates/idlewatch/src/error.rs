//! Unified error type for idlewatch.

use idlewatch_compute::ComputeError;
use idlewatch_monitor::MonitorError;
use idlewatch_rcon::RconError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` variants let `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum IdlewatchError {
    /// Talking to the game server failed.
    #[error(transparent)]
    Rcon(#[from] RconError),

    /// Talking to the cloud provider failed.
    #[error(transparent)]
    Compute(#[from] ComputeError),

    /// The monitor could not be built.
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// A setting is present but unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A probe degraded and there is no useful fallback to show.
    #[error("{what} unavailable: {reason}")]
    Unavailable { what: &'static str, reason: String },

    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
