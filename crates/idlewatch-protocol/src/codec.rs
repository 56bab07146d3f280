//! RCON packet codec.
//!
//! An RCON packet on the wire is:
//!
//! ```text
//! ┌────────────┬────────────┬────────────┬──────────────┬──────┬──────┐
//! │ length i32 │ id i32     │ type i32   │ body (ASCII) │ 0x00 │ 0x00 │
//! └────────────┴────────────┴────────────┴──────────────┴──────┴──────┘
//! ```
//!
//! All integers are little-endian. `length` counts every byte after
//! itself, so the smallest legal value is 10 (id + type + two NULs).
//!
//! The codec only converts between [`Packet`] values and bytes. Reading
//! the length prefix off a socket is the connection's job; it hands the
//! prefix to [`RconCodec::frame_len`] and the rest to
//! [`RconCodec::decode`].

use crate::ProtocolError;

/// Packet type as carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// `3`: login request carrying the password.
    Auth,
    /// `2`: a command to run. Servers reuse `2` for the auth reply.
    ExecCommand,
    /// `0`: a command's output.
    ResponseValue,
    /// Any other value, kept as-is.
    Other(i32),
}

impl PacketKind {
    /// The raw `type` field value.
    pub fn to_i32(self) -> i32 {
        match self {
            Self::Auth => 3,
            Self::ExecCommand => 2,
            Self::ResponseValue => 0,
            Self::Other(v) => v,
        }
    }

    /// Interprets a raw `type` field value.
    pub fn from_i32(v: i32) -> Self {
        match v {
            3 => Self::Auth,
            2 => Self::ExecCommand,
            0 => Self::ResponseValue,
            other => Self::Other(other),
        }
    }
}

/// One RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Request id chosen by the client and echoed by the server.
    /// The server answers a failed login with `-1`.
    pub id: i32,
    /// Packet type.
    pub kind: PacketKind,
    /// Command text or command output.
    pub body: String,
}

impl Packet {
    /// A login packet.
    pub fn auth(id: i32, password: &str) -> Self {
        Self {
            id,
            kind: PacketKind::Auth,
            body: password.to_string(),
        }
    }

    /// A command packet.
    pub fn command(id: i32, command: &str) -> Self {
        Self {
            id,
            kind: PacketKind::ExecCommand,
            body: command.to_string(),
        }
    }
}

/// Encodes and decodes RCON packets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RconCodec;

impl RconCodec {
    /// Largest body a client may send in one packet.
    pub const MAX_OUTGOING_BODY: usize = 1446;

    /// Largest body a server sends in one packet.
    pub const MAX_INCOMING_BODY: usize = 4096;

    /// id + type + two NUL terminators.
    const HEADER_AND_TRAILER: usize = 10;

    /// Serializes a packet, including its length prefix.
    ///
    /// # Errors
    /// - [`ProtocolError::BodyTooLong`] if the body exceeds
    ///   [`Self::MAX_OUTGOING_BODY`].
    /// - [`ProtocolError::EmbeddedNul`] if the body contains `\0`.
    pub fn encode(&self, packet: &Packet) -> Result<Vec<u8>, ProtocolError> {
        let body = packet.body.as_bytes();
        if body.len() > Self::MAX_OUTGOING_BODY {
            return Err(ProtocolError::BodyTooLong {
                len: body.len(),
                max: Self::MAX_OUTGOING_BODY,
            });
        }
        if body.contains(&0) {
            return Err(ProtocolError::EmbeddedNul);
        }

        let length = (Self::HEADER_AND_TRAILER + body.len()) as i32;
        let mut buf = Vec::with_capacity(4 + length as usize);
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&packet.id.to_le_bytes());
        buf.extend_from_slice(&packet.kind.to_i32().to_le_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(&[0, 0]);
        Ok(buf)
    }

    /// Validates a length prefix and returns how many bytes follow it.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidLength`] if the frame would be shorter
    /// than an empty packet or longer than the largest server reply.
    pub fn frame_len(&self, prefix: [u8; 4]) -> Result<usize, ProtocolError> {
        let length = i32::from_le_bytes(prefix);
        let min = Self::HEADER_AND_TRAILER as i32;
        let max = (Self::HEADER_AND_TRAILER + Self::MAX_INCOMING_BODY) as i32;
        if !(min..=max).contains(&length) {
            return Err(ProtocolError::InvalidLength(length));
        }
        Ok(length as usize)
    }

    /// Decodes a frame (everything after the length prefix).
    ///
    /// Bodies that are not valid UTF-8 are decoded lossily; servers
    /// occasionally emit legacy color codes in other encodings.
    ///
    /// # Errors
    /// [`ProtocolError::Malformed`] if the frame is too short or does not
    /// end in the two NUL terminators.
    pub fn decode(&self, frame: &[u8]) -> Result<Packet, ProtocolError> {
        if frame.len() < Self::HEADER_AND_TRAILER {
            return Err(ProtocolError::Malformed(format!(
                "frame is {} bytes, need at least {}",
                frame.len(),
                Self::HEADER_AND_TRAILER
            )));
        }
        let (head, rest) = frame.split_at(8);
        let id = i32::from_le_bytes([head[0], head[1], head[2], head[3]]);
        let kind = i32::from_le_bytes([head[4], head[5], head[6], head[7]]);

        let Some(body) = rest.strip_suffix(&[0, 0]) else {
            return Err(ProtocolError::Malformed(
                "missing NUL terminators".into(),
            ));
        };

        Ok(Packet {
            id,
            kind: PacketKind::from_i32(kind),
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }
}
