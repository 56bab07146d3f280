//! Readings shared between the remote clients and the idle monitor.
//!
//! Every value in this module is produced fresh by one poll and handed
//! upward. None of them is persisted, and none of them is mutated after
//! it is returned.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reading: fail-safe results
// ---------------------------------------------------------------------------

/// The result of a call made across a fail-safe boundary.
///
/// Some remote calls must never fail from the caller's point of view:
/// a poll that cannot reach the game server should read as "offline",
/// not crash the monitor loop. Instead of hiding that fallthrough in
/// control flow, those calls return a `Reading`:
///
/// - `Live(value)`: the remote system answered and `value` is real.
/// - `Degraded { fallback, reason }`: the call failed; `fallback` is
///   the safe value to act on and `reason` says what went wrong.
///
/// Calls that must fail loudly (save, stop, start) return `Result`
/// instead, so the two policies are visible in every signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading<T> {
    /// A genuine value from the remote system.
    Live(T),
    /// A fallback value substituted after a failure.
    Degraded {
        /// The safe value to act on.
        fallback: T,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl<T> Reading<T> {
    /// Builds a degraded reading from a fallback and any displayable error.
    pub fn degraded(fallback: T, reason: impl fmt::Display) -> Self {
        Self::Degraded {
            fallback,
            reason: reason.to_string(),
        }
    }

    /// The value to act on, live or fallback.
    pub fn value(&self) -> &T {
        match self {
            Self::Live(value) => value,
            Self::Degraded { fallback, .. } => fallback,
        }
    }

    /// Consumes the reading and returns the value to act on.
    pub fn into_value(self) -> T {
        match self {
            Self::Live(value) => value,
            Self::Degraded { fallback, .. } => fallback,
        }
    }

    /// Returns `true` if the value is a fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The failure description, if the reading is degraded.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Live(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Applies `f` to the contained value, keeping the live/degraded tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Self::Live(value) => Reading::Live(f(value)),
            Self::Degraded { fallback, reason } => Reading::Degraded {
                fallback: f(fallback),
                reason,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Game server roster
// ---------------------------------------------------------------------------

/// Players parsed out of one `list` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerList {
    /// The player count the server reported.
    pub count: u32,
    /// The server's player cap, when the reply carried one.
    pub max_players: Option<u32>,
    /// Player names in server order. Duplicates are kept.
    pub players: Vec<String>,
}

/// The result of one roster query against the game server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    /// Whether the server answered the query.
    pub online: bool,
    /// Number of players the server reported online.
    pub player_count: u32,
    /// The server's player cap, when known.
    pub max_players: Option<u32>,
    /// Player names in the order the server listed them.
    pub players: Vec<String>,
    /// Seconds since this process first saw the server answer.
    pub uptime_seconds: Option<u64>,
}

impl RosterSnapshot {
    /// The fail-safe snapshot: server unreachable, nobody online.
    pub fn offline() -> Self {
        Self {
            online: false,
            player_count: 0,
            max_players: None,
            players: Vec::new(),
            uptime_seconds: None,
        }
    }

    /// An online snapshot built from a parsed player list.
    pub fn online(list: PlayerList, uptime_seconds: Option<u64>) -> Self {
        Self {
            online: true,
            player_count: list.count,
            max_players: list.max_players,
            players: list.players,
            uptime_seconds,
        }
    }

    /// Returns `true` if at least one player is online.
    pub fn has_players(&self) -> bool {
        self.player_count > 0
    }
}

// ---------------------------------------------------------------------------
// Cloud instance state
// ---------------------------------------------------------------------------

/// Power/run state of the cloud instance, as reported by the provider.
///
/// Serialized as the provider's own upper-case strings (`"RUNNING"`,
/// `"TERMINATED"`, ...). States this enum does not name are kept
/// verbatim in [`InstanceStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    Provisioning,
    Staging,
    Running,
    Stopping,
    Stopped,
    Suspending,
    Suspended,
    Repairing,
    Terminated,
    Unknown,
    Other(String),
}

impl InstanceStatus {
    /// The provider's string for this state.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Staging => "STAGING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Suspending => "SUSPENDING",
            Self::Suspended => "SUSPENDED",
            Self::Repairing => "REPAIRING",
            Self::Terminated => "TERMINATED",
            Self::Unknown => "UNKNOWN",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` only for `RUNNING`.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl From<&str> for InstanceStatus {
    fn from(s: &str) -> Self {
        match s {
            "PROVISIONING" => Self::Provisioning,
            "STAGING" => Self::Staging,
            "RUNNING" => Self::Running,
            "STOPPING" => Self::Stopping,
            "STOPPED" => Self::Stopped,
            "SUSPENDING" => Self::Suspending,
            "SUSPENDED" => Self::Suspended,
            "REPAIRING" => Self::Repairing,
            "TERMINATED" => Self::Terminated,
            "" | "UNKNOWN" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for InstanceStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<InstanceStatus> for String {
    fn from(status: InstanceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of one lifecycle query against the cloud provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Current provider state.
    pub status: InstanceStatus,
    /// Best-effort uptime in seconds. `None` unless the instance is running.
    pub uptime_seconds: Option<u64>,
}
