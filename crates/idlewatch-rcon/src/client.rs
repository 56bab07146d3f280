//! The game server client.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use idlewatch_protocol::{Reading, RosterSnapshot};

use crate::{RconConnection, RconError, parse_roster};

/// Connection settings for the game server's RCON port.
#[derive(Debug, Clone)]
pub struct RconConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// Applies to connect+login and to each reply.
    pub timeout: Duration,
}

impl RconConfig {
    /// Default timeout for connecting and for each reply.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a config with the default timeout.
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// `host:port`, as passed to the socket.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Queries and controls the game server.
///
/// Every call opens its own connection, runs one command, and closes it.
/// There is no pooling; a failed connect is the normal failure mode and
/// each method documents how it reports one.
pub struct RconClient {
    config: RconConfig,
    /// When this process first saw the server answer. Only feeds the
    /// uptime estimate in [`RosterSnapshot`].
    first_seen: Mutex<Option<Instant>>,
}

impl RconClient {
    pub fn new(config: RconConfig) -> Self {
        Self {
            config,
            first_seen: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RconConfig {
        &self.config
    }

    /// Lists the players online.
    ///
    /// Never fails: any connection or command error yields a degraded
    /// [`RosterSnapshot::offline`].
    pub async fn query_roster(&self) -> Reading<RosterSnapshot> {
        match self.execute("list").await {
            Ok(reply) => {
                let list = parse_roster(&reply);
                let uptime = self.mark_seen();
                tracing::debug!(
                    players = list.count,
                    names = ?list.players,
                    "roster queried"
                );
                Reading::Live(RosterSnapshot::online(list, Some(uptime)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "roster query failed, treating server as offline");
                self.forget_seen();
                Reading::degraded(RosterSnapshot::offline(), e)
            }
        }
    }

    /// Flushes the world to disk.
    ///
    /// Fails loudly. Callers must not go on to anything destructive if
    /// this returns an error.
    pub async fn save_state(&self) -> Result<String, RconError> {
        tracing::info!("saving world");
        let reply = self.execute("save-all").await.inspect_err(|e| {
            tracing::error!(error = %e, "world save failed");
        })?;
        tracing::info!(reply = %reply.trim(), "world saved");
        Ok(reply.trim().to_string())
    }

    /// Saves, then stops the server process.
    ///
    /// Always saves first, whatever the caller already did.
    pub async fn stop(&self) -> Result<String, RconError> {
        self.save_state().await?;

        tracing::info!("stopping game server");
        let reply = match self.execute("stop").await {
            Ok(reply) => reply,
            // The server may hang up instead of answering once it is going down.
            Err(RconError::ConnectionClosed) => {
                tracing::debug!("server closed the connection on stop");
                String::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "game server stop failed");
                return Err(e);
            }
        };
        self.forget_seen();
        tracing::info!("game server stopped");
        Ok(reply.trim().to_string())
    }

    /// Announces a message to everyone on the server.
    ///
    /// Best effort: a failure is logged and reported as a degraded
    /// reading, never as an error.
    pub async fn broadcast(&self, message: &str) -> Reading<()> {
        match self.execute(&format!("say {message}")).await {
            Ok(_) => Reading::Live(()),
            Err(e) => {
                tracing::warn!(error = %e, "broadcast failed");
                Reading::degraded((), e)
            }
        }
    }

    async fn execute(&self, command: &str) -> Result<String, RconError> {
        let mut conn = RconConnection::connect(&self.config).await?;
        let result = conn.exec(command).await;
        if let Err(e) = conn.close().await {
            tracing::trace!(error = %e, "RCON close failed");
        }
        result
    }

    fn mark_seen(&self) -> u64 {
        let mut first_seen = self
            .first_seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        first_seen.get_or_insert_with(Instant::now).elapsed().as_secs()
    }

    fn forget_seen(&self) {
        *self
            .first_seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
