//! Error types for the monitor layer.

use crate::ShutdownStep;

/// Boxed collaborator error, as carried by [`ShutdownError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building a monitor.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The configuration can't be used.
    #[error("invalid monitor config: {0}")]
    InvalidConfig(String),
}

/// A step of the automatic shutdown failed. Later steps did not run.
#[derive(Debug, thiserror::Error)]
#[error("shutdown failed at step {step}: {source}")]
pub struct ShutdownError {
    pub step: ShutdownStep,
    #[source]
    pub source: BoxError,
}
