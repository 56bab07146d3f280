//! Operator commands: start, stop and inspect the server by hand.

use idlewatch_monitor::{
    Clock, GameServer, IdleMonitor, InstanceControl, MonitorStatus, PassOutcome, SystemClock,
};
use idlewatch_protocol::{InstanceState, InstanceStatus, Reading, RosterSnapshot};
use serde::Serialize;

use crate::IdlewatchError;

/// The instance half of [`ServerStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceReport {
    /// `ERROR` when the state could not be read.
    pub status: InstanceStatus,
    pub uptime_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstanceReport {
    fn from_result<E: std::fmt::Display>(result: Result<InstanceState, E>) -> Self {
        match result {
            Ok(state) => Self {
                status: state.status,
                uptime_seconds: state.uptime_seconds,
                error: None,
            },
            Err(e) => Self {
                status: InstanceStatus::Other("ERROR".into()),
                uptime_seconds: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Everything an operator wants to see at once. Each part is read
/// independently; one failing never hides the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub instance: InstanceReport,
    pub server: RosterSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_error: Option<String>,
    pub monitoring: MonitorStatus,
    pub external_ip: Option<String>,
}

/// Hand-driven control of the game server and its instance.
///
/// Wraps an [`IdleMonitor`] so manual actions keep the monitor's view of
/// activity in step: starting the instance counts as activity.
pub struct ServerControl<S, I, C = SystemClock> {
    monitor: IdleMonitor<S, I, C>,
}

impl<S, I, C> ServerControl<S, I, C>
where
    S: GameServer,
    I: InstanceControl,
    C: Clock,
    IdlewatchError: From<S::Error> + From<I::Error>,
{
    pub fn new(monitor: IdleMonitor<S, I, C>) -> Self {
        Self { monitor }
    }

    pub fn monitor(&self) -> &IdleMonitor<S, I, C> {
        &self.monitor
    }

    /// Starts the instance and resets the idle clock.
    ///
    /// If an automatic shutdown halted monitoring, monitoring resumes.
    pub async fn start_instance(&self) -> Result<String, IdlewatchError> {
        let before = self.monitor.status();
        let halted_by_shutdown = !before.running && before.shutdown_in_progress;

        let message = self.monitor.instance().start().await?;
        self.monitor.reset_activity();
        if halted_by_shutdown {
            tracing::info!("resuming monitoring after manual start");
            self.monitor.start();
        }
        Ok(message)
    }

    /// Saves the world, then stops the instance.
    ///
    /// Nothing is stopped if the save fails.
    pub async fn stop_instance(&self) -> Result<String, IdlewatchError> {
        self.monitor.server().save_state().await?;
        Ok(self.monitor.instance().stop().await?)
    }

    pub async fn instance_status(&self) -> Result<InstanceState, IdlewatchError> {
        Ok(self.monitor.instance().status().await?)
    }

    pub async fn server_info(&self) -> Reading<RosterSnapshot> {
        self.monitor.server().query_roster().await
    }

    pub async fn external_ip(&self) -> Reading<Option<String>> {
        self.monitor.instance().external_ip().await
    }

    pub fn monitoring_status(&self) -> MonitorStatus {
        self.monitor.status()
    }

    /// Reads instance, server and address concurrently.
    pub async fn server_status(&self) -> ServerStatus {
        let (instance, roster, ip) = tokio::join!(
            self.monitor.instance().status(),
            self.monitor.server().query_roster(),
            self.monitor.instance().external_ip(),
        );

        let server_error = roster.reason().map(str::to_string);
        ServerStatus {
            instance: InstanceReport::from_result(instance),
            server: roster.into_value(),
            server_error,
            monitoring: self.monitor.status(),
            external_ip: ip.into_value(),
        }
    }

    /// One monitoring pass, for external schedulers.
    pub async fn run_monitoring_pass(&self) -> PassOutcome {
        self.monitor.run_pass().await
    }
}
