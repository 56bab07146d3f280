//! The automatic shutdown sequence.
//!
//! ```text
//! FinalWarning → GracePeriod → SaveWorld → StopServer → SettlePeriod → StopInstance
//! ```
//!
//! Each step is awaited before the next starts. The first failing step
//! aborts the rest; the warning broadcast is best effort and never fails.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GameServer, InstanceControl, MonitorConfig, ShutdownError};

/// One step of the shutdown sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownStep {
    FinalWarning,
    GracePeriod,
    SaveWorld,
    StopServer,
    SettlePeriod,
    StopInstance,
}

impl ShutdownStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinalWarning => "final_warning",
            Self::GracePeriod => "grace_period",
            Self::SaveWorld => "save_world",
            Self::StopServer => "stop_server",
            Self::SettlePeriod => "settle_period",
            Self::StopInstance => "stop_instance",
        }
    }
}

impl fmt::Display for ShutdownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn failed<E>(step: ShutdownStep) -> impl FnOnce(E) -> ShutdownError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| ShutdownError {
        step,
        source: Box::new(e),
    }
}

/// Runs every step against the given collaborators.
pub(crate) async fn run_sequence<S, I>(
    config: &MonitorConfig,
    server: &S,
    instance: &I,
) -> Result<(), ShutdownError>
where
    S: GameServer,
    I: InstanceControl,
{
    tracing::info!(step = %ShutdownStep::FinalWarning, "shutdown step");
    server.broadcast(&config.final_warning).await;

    tracing::debug!(step = %ShutdownStep::GracePeriod, secs = config.grace_period.as_secs(), "shutdown step");
    tokio::time::sleep(config.grace_period).await;

    tracing::info!(step = %ShutdownStep::SaveWorld, "shutdown step");
    server
        .save_state()
        .await
        .map_err(failed(ShutdownStep::SaveWorld))?;

    tracing::info!(step = %ShutdownStep::StopServer, "shutdown step");
    server
        .stop()
        .await
        .map_err(failed(ShutdownStep::StopServer))?;

    tracing::debug!(step = %ShutdownStep::SettlePeriod, secs = config.settle_period.as_secs(), "shutdown step");
    tokio::time::sleep(config.settle_period).await;

    tracing::info!(step = %ShutdownStep::StopInstance, "shutdown step");
    instance
        .stop()
        .await
        .map_err(failed(ShutdownStep::StopInstance))?;

    Ok(())
}
