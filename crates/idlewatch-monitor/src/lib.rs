//! Idle detection and automatic shutdown for idlewatch.
//!
//! An [`IdleMonitor`] polls the cloud instance and the game server on a
//! fixed interval. While players are online it keeps refreshing its
//! activity clock; once the server has been empty for `idle_timeout` it
//! warns, saves, stops the server and stops the instance.
//!
//! # Key types
//!
//! - [`IdleMonitor`]: the monitor handle
//! - [`GameServer`] / [`InstanceControl`]: the remote systems it drives
//! - [`Clock`]: where "now" comes from ([`SystemClock`], [`ManualClock`])
//! - [`MonitorConfig`]: timeouts, intervals and broadcast texts
//! - [`PassOutcome`]: what one monitoring pass decided
//!
//! # Failure handling
//!
//! The monitor is the error boundary of the periodic path. A failed probe
//! skips the pass, a failed broadcast is logged, and a failed shutdown
//! step clears the shutdown flag so a later pass can retry. Nothing
//! escapes [`IdleMonitor::run_pass`].

mod clock;
mod collaborators;
mod config;
mod error;
mod monitor;
mod shutdown;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{GameServer, InstanceControl};
pub use config::{MINUTES_PLACEHOLDER, MonitorConfig};
pub use error::{BoxError, MonitorError, ShutdownError};
pub use monitor::{IdleMonitor, MonitorStatus, PassOutcome};
pub use shutdown::ShutdownStep;
