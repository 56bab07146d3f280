//! Compute Engine lifecycle client for the game server's VM.
//!
//! [`ComputeClient`] starts and stops one instance through the REST API,
//! waiting on the long-running operation each call returns, and reports
//! the instance's state, uptime and external address.
//!
//! Start and stop fail loudly with [`ComputeError`]. The two probes used
//! by the idle monitor, [`ComputeClient::is_running`] and
//! [`ComputeClient::external_ip`], never fail; they return a degraded
//! [`Reading`](idlewatch_protocol::Reading) instead.

mod client;
mod credentials;
mod error;
mod models;

pub use client::{ComputeClient, ComputeConfig, DEFAULT_API_BASE};
pub use credentials::{Credentials, METADATA_TOKEN_URL};
pub use error::ComputeError;
