use std::time::Duration;

use idlewatch_protocol::ProtocolError;

/// Errors that can occur while talking to the game server over RCON.
#[derive(Debug, thiserror::Error)]
pub enum RconError {
    /// The TCP connection could not be established.
    #[error("could not connect to RCON at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Connecting or waiting for a reply took longer than allowed.
    #[error("RCON {stage} timed out after {}s", .after.as_secs_f64())]
    Timeout {
        stage: &'static str,
        after: Duration,
    },

    /// The server rejected the password.
    #[error("RCON authentication failed")]
    AuthFailed,

    /// The server closed the connection before answering.
    #[error("RCON connection closed by server")]
    ConnectionClosed,

    /// Reading or writing the socket failed.
    #[error("RCON I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
