//! Shared vocabulary for idlewatch.
//!
//! This crate defines what the other layers say to each other:
//!
//! - **Readings** ([`RosterSnapshot`], [`InstanceState`], [`InstanceStatus`]):
//!   the values produced by one poll of the game server or the cloud host.
//! - **[`Reading`]**: wraps a value from a fail-safe boundary so callers can
//!   tell a genuine answer from a degraded fallback.
//! - **Codec** ([`RconCodec`], [`Packet`]): the RCON packet wire format.
//! - **Errors** ([`ProtocolError`]): what can go wrong while framing packets.
//!
//! # Architecture
//!
//! ```text
//! RCON client ──┐
//!               ├─→ Protocol (readings, packets) ←─ Idle monitor
//! Compute client┘
//! ```
//!
//! The protocol crate knows nothing about sockets or HTTP. It only knows
//! the shapes of the data and how an RCON packet looks on the wire.

mod codec;
mod error;
mod types;

pub use codec::{Packet, PacketKind, RconCodec};
pub use error::ProtocolError;
pub use types::{
    InstanceState, InstanceStatus, PlayerList, Reading, RosterSnapshot,
};
