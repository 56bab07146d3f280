//! # idlewatch
//!
//! Shuts down an idle game server and the cloud instance it runs on.
//!
//! idlewatch polls the instance (Compute Engine) and the game server
//! (RCON). Once nobody has been online for the idle timeout it warns any
//! stragglers, saves the world, stops the server and stops the instance.
//!
//! ## Architecture
//!
//! ```text
//! idlewatch (CLI, settings, ServerControl)
//!     └─→ idlewatch-monitor (IdleMonitor, shutdown sequence)
//!             ├─→ idlewatch-rcon    ─→ idlewatch-protocol
//!             ├─→ idlewatch-compute ─→ idlewatch-protocol
//!             └─→ idlewatch-tick
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idlewatch::prelude::*;
//!
//! # async fn demo(settings: Settings) -> Result<(), IdlewatchError> {
//! let control = idlewatch::app::build(&settings)?;
//! control.monitor().start();
//! println!("{:?}", control.server_status().await);
//! # Ok(())
//! # }
//! ```

pub mod app;
mod cli;
mod control;
mod error;
pub mod logging;
mod settings;

pub use cli::{Cli, Command};
pub use control::{InstanceReport, ServerControl, ServerStatus};
pub use error::IdlewatchError;
pub use settings::Settings;

/// Re-exports of the types most callers need.
pub mod prelude {
    pub use crate::{IdlewatchError, ServerControl, ServerStatus, Settings};
    pub use idlewatch_compute::{ComputeClient, ComputeConfig, Credentials};
    pub use idlewatch_monitor::{
        GameServer, IdleMonitor, InstanceControl, MonitorConfig, MonitorStatus, PassOutcome,
    };
    pub use idlewatch_protocol::{InstanceState, InstanceStatus, Reading, RosterSnapshot};
    pub use idlewatch_rcon::{RconClient, RconConfig};
}
