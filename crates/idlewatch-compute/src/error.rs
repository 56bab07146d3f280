//! Error types for the instance lifecycle client.

/// Errors that can occur while talking to the Compute Engine API.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// The HTTP request itself failed (DNS, connect, timeout, body).
    #[error("compute API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("compute API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// A long-running operation finished with errors. The provider's
    /// messages are joined into one string.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// The operation was still pending after the configured number of polls.
    #[error("operation {operation} still pending after {attempts} polls")]
    OperationTimeout { operation: String, attempts: u32 },

    /// No access token could be obtained.
    #[error("could not obtain access token: {0}")]
    Credentials(String),

    /// A start or stop request failed. Wraps the underlying cause with
    /// the action and instance name for the operator.
    #[error("failed to {action} instance {instance}: {source}")]
    Lifecycle {
        action: &'static str,
        instance: String,
        #[source]
        source: Box<ComputeError>,
    },
}
