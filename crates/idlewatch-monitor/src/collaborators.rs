//! The two remote systems the monitor drives.
//!
//! [`GameServer`] and [`InstanceControl`] are implemented by the RCON and
//! Compute clients for production, and by in-memory fakes in tests.
//! Probes return a [`Reading`] and never fail; commands return `Result`.

use std::future::Future;
use std::sync::Arc;

use idlewatch_compute::{ComputeClient, ComputeError};
use idlewatch_protocol::{InstanceState, Reading, RosterSnapshot};
use idlewatch_rcon::{RconClient, RconError};

/// The game server, reached over its admin protocol.
pub trait GameServer: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Who is online. Degrades to an offline snapshot.
    fn query_roster(&self) -> impl Future<Output = Reading<RosterSnapshot>> + Send;

    /// Flush the world to disk.
    fn save_state(&self) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Stop the server process. Implementations save first.
    fn stop(&self) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Best-effort message to everyone online.
    fn broadcast(&self, message: &str) -> impl Future<Output = Reading<()>> + Send;
}

/// The cloud instance the game server runs on.
pub trait InstanceControl: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn start(&self) -> impl Future<Output = Result<String, Self::Error>> + Send;

    fn stop(&self) -> impl Future<Output = Result<String, Self::Error>> + Send;

    fn status(&self) -> impl Future<Output = Result<InstanceState, Self::Error>> + Send;

    /// Degrades to `false`.
    fn is_running(&self) -> impl Future<Output = Reading<bool>> + Send;

    /// Degrades to `None`.
    fn external_ip(&self) -> impl Future<Output = Reading<Option<String>>> + Send;
}

// ---------------------------------------------------------------------------
// Production clients
// ---------------------------------------------------------------------------

impl GameServer for RconClient {
    type Error = RconError;

    async fn query_roster(&self) -> Reading<RosterSnapshot> {
        RconClient::query_roster(self).await
    }

    async fn save_state(&self) -> Result<String, RconError> {
        RconClient::save_state(self).await
    }

    async fn stop(&self) -> Result<String, RconError> {
        RconClient::stop(self).await
    }

    async fn broadcast(&self, message: &str) -> Reading<()> {
        RconClient::broadcast(self, message).await
    }
}

impl InstanceControl for ComputeClient {
    type Error = ComputeError;

    async fn start(&self) -> Result<String, ComputeError> {
        ComputeClient::start(self).await
    }

    async fn stop(&self) -> Result<String, ComputeError> {
        ComputeClient::stop(self).await
    }

    async fn status(&self) -> Result<InstanceState, ComputeError> {
        ComputeClient::status(self).await
    }

    async fn is_running(&self) -> Reading<bool> {
        ComputeClient::is_running(self).await
    }

    async fn external_ip(&self) -> Reading<Option<String>> {
        ComputeClient::external_ip(self).await
    }
}

// ---------------------------------------------------------------------------
// Shared handles
// ---------------------------------------------------------------------------

impl<T: GameServer> GameServer for Arc<T> {
    type Error = T::Error;

    fn query_roster(&self) -> impl Future<Output = Reading<RosterSnapshot>> + Send {
        (**self).query_roster()
    }

    fn save_state(&self) -> impl Future<Output = Result<String, T::Error>> + Send {
        (**self).save_state()
    }

    fn stop(&self) -> impl Future<Output = Result<String, T::Error>> + Send {
        (**self).stop()
    }

    fn broadcast(&self, message: &str) -> impl Future<Output = Reading<()>> + Send {
        (**self).broadcast(message)
    }
}

impl<T: InstanceControl> InstanceControl for Arc<T> {
    type Error = T::Error;

    fn start(&self) -> impl Future<Output = Result<String, T::Error>> + Send {
        (**self).start()
    }

    fn stop(&self) -> impl Future<Output = Result<String, T::Error>> + Send {
        (**self).stop()
    }

    fn status(&self) -> impl Future<Output = Result<InstanceState, T::Error>> + Send {
        (**self).status()
    }

    fn is_running(&self) -> impl Future<Output = Reading<bool>> + Send {
        (**self).is_running()
    }

    fn external_ip(&self) -> impl Future<Output = Reading<Option<String>>> + Send {
        (**self).external_ip()
    }
}
