//! RCON client for the game server.
//!
//! Provides [`RconClient`], which queries the player roster and sends
//! save/stop/broadcast commands, and [`RconConnection`], the single
//! authenticated TCP session each of those calls runs on.
//!
//! # Failure policy
//!
//! | call | on failure |
//! |---|---|
//! | [`RconClient::query_roster`] | degraded offline snapshot |
//! | [`RconClient::broadcast`] | degraded, logged |
//! | [`RconClient::save_state`] | `Err` |
//! | [`RconClient::stop`] | `Err` |

mod client;
mod connection;
mod error;
mod roster;

pub use client::{RconClient, RconConfig};
pub use connection::RconConnection;
pub use error::RconError;
pub use roster::parse_roster;
