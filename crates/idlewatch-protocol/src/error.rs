//! Error types for the protocol layer.
//!
//! Each crate in idlewatch defines its own error enum. A `ProtocolError`
//! always means a malformed RCON frame, never a network or provider
//! failure.

/// Errors that can occur while encoding or decoding RCON packets.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The command body is longer than the server accepts in one packet.
    #[error("body too long: {len} bytes (max {max})")]
    BodyTooLong {
        /// Length of the rejected body in bytes.
        len: usize,
        /// Largest body the codec will encode.
        max: usize,
    },

    /// The command body contains a NUL byte, which would end the
    /// body early on the server side.
    #[error("body contains a NUL byte")]
    EmbeddedNul,

    /// The length prefix announces a frame outside the allowed range.
    #[error("invalid frame length {0}")]
    InvalidLength(i32),

    /// The frame is structurally broken (too short, missing terminators).
    #[error("malformed packet: {0}")]
    Malformed(String),
}
