//! Monitor configuration.

use std::time::Duration;

use idlewatch_tick::{TickConfig, TickPolicy};
use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// Placeholder in [`MonitorConfig::warning_template`] replaced by the
/// remaining minutes.
pub const MINUTES_PLACEHOLDER: &str = "{minutes}";

/// Settings for one [`IdleMonitor`](crate::IdleMonitor). Fixed for the
/// monitor's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// How long the server may sit empty before it is shut down.
    pub idle_timeout: Duration,

    /// Time between monitoring passes. Zero disables the internal timer;
    /// passes then only run when something calls `run_pass`.
    pub check_interval: Duration,

    /// Players are warned on every pass once the remaining idle time
    /// drops to this or below.
    pub warning_window: Duration,

    /// Pause after the final warning so players can read it.
    pub grace_period: Duration,

    /// Pause between stopping the server and stopping the instance.
    pub settle_period: Duration,

    /// Broadcast once the shutdown sequence starts.
    pub final_warning: String,

    /// Broadcast during the warning window. Must contain `{minutes}`.
    pub warning_template: String,

    /// Run checks missed while a slow pass was in flight back to back,
    /// instead of dropping them.
    #[serde(default)]
    pub catch_up_missed_checks: bool,

    /// Random extra delay (up to this much) before the first check, so
    /// monitors started together do not poll in lockstep.
    #[serde(default)]
    pub first_check_jitter: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(15 * 60),
            check_interval: Duration::from_secs(60),
            warning_window: Duration::from_secs(5 * 60),
            grace_period: Duration::from_secs(5),
            settle_period: Duration::from_secs(10),
            final_warning: "§c[Auto shutdown] Nobody has been online for a while. \
                            Stopping the server now..."
                .into(),
            warning_template: "§e[Auto shutdown] No players online. \
                               The server will stop in {minutes} minute(s)."
                .into(),
            catch_up_missed_checks: false,
            first_check_jitter: Duration::ZERO,
        }
    }
}

impl MonitorConfig {
    /// Default settings with the given idle timeout and check interval.
    pub fn new(idle_timeout: Duration, check_interval: Duration) -> Self {
        Self {
            idle_timeout,
            check_interval,
            ..Default::default()
        }
    }

    /// Checks the config is usable.
    ///
    /// # Errors
    /// [`MonitorError::InvalidConfig`] if the idle timeout is zero or the
    /// warning template has no `{minutes}` placeholder.
    pub fn validated(self) -> Result<Self, MonitorError> {
        if self.idle_timeout.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "idle timeout must be greater than zero".into(),
            ));
        }
        if !self.warning_template.contains(MINUTES_PLACEHOLDER) {
            return Err(MonitorError::InvalidConfig(format!(
                "warning template must contain {MINUTES_PLACEHOLDER}"
            )));
        }
        Ok(self)
    }

    /// Timer settings for the periodic task.
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            period: self.check_interval,
            policy: if self.catch_up_missed_checks {
                TickPolicy::Delay
            } else {
                TickPolicy::Skip
            },
            initial_jitter: self.first_check_jitter,
        }
        .validated()
    }

    /// The warning text for the given number of remaining minutes.
    pub fn warning_message(&self, minutes: u64) -> String {
        self.warning_template
            .replace(MINUTES_PLACEHOLDER, &minutes.to_string())
    }
}
