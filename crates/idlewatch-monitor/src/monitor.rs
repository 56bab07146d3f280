//! The idle monitor: periodic supervision and the shutdown decision.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use idlewatch_tick::TickScheduler;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::shutdown::{self, ShutdownStep};
use crate::{Clock, GameServer, InstanceControl, MonitorConfig, MonitorError, SystemClock};

/// A snapshot of the monitor's state. Returned by [`IdleMonitor::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub running: bool,
    pub last_activity: DateTime<Utc>,
    /// Whole minutes since `last_activity`, rounded down.
    pub idle_minutes: u64,
    pub shutdown_in_progress: bool,
}

/// What one monitoring pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassOutcome {
    /// The instance is not running (or its state could not be read).
    InstanceNotRunning,
    /// The game server did not answer.
    ServerOffline,
    /// Players are online; the activity clock was refreshed.
    PlayersOnline { count: u32 },
    /// Nobody online, but the timeout is still far off.
    Idle {
        idle_minutes: u64,
        remaining_minutes: u64,
    },
    /// Nobody online and the timeout is close; players were warned.
    Warned { remaining_minutes: u64 },
    /// The shutdown sequence ran to completion.
    ShutdownCompleted,
    /// The shutdown sequence stopped at `step`.
    ShutdownFailed { step: ShutdownStep, reason: String },
    /// A shutdown was already under way; nothing was done.
    ShutdownAlreadyInProgress,
}

struct ActivityState {
    running: bool,
    last_activity: DateTime<Utc>,
}

struct Shared<S, I, C> {
    config: MonitorConfig,
    server: S,
    instance: I,
    clock: C,
    state: Mutex<ActivityState>,
    shutdown_in_progress: AtomicBool,
    /// Serializes passes from the timer and from external callers.
    pass_gate: tokio::sync::Mutex<()>,
    /// Dropping or firing the sender ends the periodic task after its
    /// current pass.
    schedule: Mutex<Option<oneshot::Sender<()>>>,
}

/// Watches the game server and shuts everything down once it has been
/// empty for too long.
///
/// This is a cheap handle: clones share one monitor. Each started monitor
/// owns a single periodic task that calls [`run_pass`](Self::run_pass)
/// every `check_interval`; the same entry point is open to external
/// schedulers.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ start() ──→ run_pass() ... ──→ stop()
///              │              │
///              │              ▼ idle ≥ timeout
///              │        shutdown sequence ──→ success: schedule halted,
///              │                              flag stays set
///              ▼
///       reset_activity() clears the flag
/// ```
pub struct IdleMonitor<S, I, C = SystemClock> {
    shared: Arc<Shared<S, I, C>>,
}

impl<S, I, C> Clone for IdleMonitor<S, I, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, I> IdleMonitor<S, I, SystemClock>
where
    S: GameServer,
    I: InstanceControl,
{
    /// Creates a stopped monitor on the system clock.
    ///
    /// # Errors
    /// [`MonitorError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: MonitorConfig, server: S, instance: I) -> Result<Self, MonitorError> {
        Self::with_clock(config, server, instance, SystemClock)
    }
}

impl<S, I, C> IdleMonitor<S, I, C>
where
    S: GameServer,
    I: InstanceControl,
    C: Clock,
{
    /// Creates a stopped monitor on the given clock.
    pub fn with_clock(
        config: MonitorConfig,
        server: S,
        instance: I,
        clock: C,
    ) -> Result<Self, MonitorError> {
        let config = config.validated()?;
        let last_activity = clock.now();
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                server,
                instance,
                clock,
                state: Mutex::new(ActivityState {
                    running: false,
                    last_activity,
                }),
                shutdown_in_progress: AtomicBool::new(false),
                pass_gate: tokio::sync::Mutex::new(()),
                schedule: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    pub fn server(&self) -> &S {
        &self.shared.server
    }

    pub fn instance(&self) -> &I {
        &self.shared.instance
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Starts periodic monitoring and resets the activity clock.
    ///
    /// Does nothing (besides a warning) if already running. Must be called
    /// from within a Tokio runtime.
    pub fn start(&self) {
        // Lock order: schedule, then state.
        let mut schedule = self.lock_schedule();
        {
            let mut state = self.lock_state();
            if state.running {
                tracing::warn!("monitoring is already running");
                return;
            }
            state.running = true;
            state.last_activity = self.shared.clock.now();
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(run_schedule(self.clone(), stop_rx));
        *schedule = Some(stop_tx);

        tracing::info!(
            idle_timeout_minutes = self.shared.config.idle_timeout.as_secs() / 60,
            check_interval_secs = self.shared.config.check_interval.as_secs(),
            "monitoring started"
        );
    }

    /// Stops periodic monitoring.
    ///
    /// A pass already in flight (including a shutdown sequence) runs to
    /// completion. Activity and the shutdown flag are left alone.
    pub fn stop(&self) {
        let mut schedule = self.lock_schedule();
        {
            let mut state = self.lock_state();
            if !state.running {
                tracing::warn!("monitoring is not running");
                return;
            }
            state.running = false;
        }
        if let Some(stop_tx) = schedule.take() {
            let _ = stop_tx.send(());
        }
        tracing::info!("monitoring stopped");
    }

    /// Whether the periodic schedule is active.
    pub fn is_monitoring(&self) -> bool {
        self.lock_state().running
    }

    /// Reads the current state. Makes no remote calls.
    pub fn status(&self) -> MonitorStatus {
        let (running, last_activity) = {
            let state = self.lock_state();
            (state.running, state.last_activity)
        };
        let idle_minutes = (self.shared.clock.now() - last_activity)
            .num_minutes()
            .max(0) as u64;
        MonitorStatus {
            running,
            last_activity,
            idle_minutes,
            shutdown_in_progress: self.shared.shutdown_in_progress.load(Ordering::Acquire),
        }
    }

    /// Marks "someone just intervened": resets the activity clock and
    /// clears the shutdown flag.
    pub fn reset_activity(&self) {
        self.lock_state().last_activity = self.shared.clock.now();
        self.shared
            .shutdown_in_progress
            .store(false, Ordering::Release);
        tracing::info!("player activity reset");
    }

    /// Clears the shutdown flag without touching the activity clock.
    pub fn reset_shutdown_progress(&self) {
        self.shared
            .shutdown_in_progress
            .store(false, Ordering::Release);
        tracing::info!("shutdown progress reset");
    }

    // -----------------------------------------------------------------------
    // Monitoring pass
    // -----------------------------------------------------------------------

    /// Runs one monitoring pass.
    ///
    /// Safe to call at any time, whether or not the timer is running.
    /// Passes never overlap; a call made during another pass waits for it.
    /// Collaborator failures are absorbed into the outcome.
    pub async fn run_pass(&self) -> PassOutcome {
        let _gate = self.shared.pass_gate.lock().await;
        let outcome = self.evaluate().await;
        tracing::debug!(?outcome, "monitoring pass finished");
        outcome
    }

    async fn evaluate(&self) -> PassOutcome {
        let shared = &self.shared;

        let running = shared.instance.is_running().await;
        if !*running.value() {
            tracing::debug!(
                degraded = running.is_degraded(),
                "instance not running, skipping pass"
            );
            return PassOutcome::InstanceNotRunning;
        }

        let roster = shared.server.query_roster().await.into_value();
        if !roster.online {
            tracing::debug!("game server offline, skipping pass");
            return PassOutcome::ServerOffline;
        }

        let now = shared.clock.now();
        if roster.has_players() {
            self.record_activity(now);
            tracing::info!(
                players = roster.player_count,
                names = ?roster.players,
                "players online"
            );
            return PassOutcome::PlayersOnline {
                count: roster.player_count,
            };
        }

        let last_activity = self.lock_state().last_activity;
        let idle = (now - last_activity).to_std().unwrap_or(Duration::ZERO);
        let timeout = shared.config.idle_timeout;
        let idle_minutes = idle.as_secs() / 60;

        if idle >= timeout {
            tracing::info!(
                idle_minutes,
                timeout_minutes = timeout.as_secs() / 60,
                "idle timeout reached"
            );
            return self.shutdown().await;
        }

        let remaining = timeout - idle;
        let remaining_minutes = ceil_minutes(remaining);
        tracing::info!(idle_minutes, remaining_minutes, "no players online");

        if remaining <= shared.config.warning_window {
            let message = shared.config.warning_message(remaining_minutes);
            shared.server.broadcast(&message).await;
            return PassOutcome::Warned { remaining_minutes };
        }

        PassOutcome::Idle {
            idle_minutes,
            remaining_minutes,
        }
    }

    async fn shutdown(&self) -> PassOutcome {
        let shared = &self.shared;
        if shared
            .shutdown_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("shutdown already in progress");
            return PassOutcome::ShutdownAlreadyInProgress;
        }

        tracing::info!("starting automatic shutdown");
        match shutdown::run_sequence(&shared.config, &shared.server, &shared.instance).await {
            Ok(()) => {
                tracing::info!("automatic shutdown completed");
                self.halt_schedule();
                PassOutcome::ShutdownCompleted
            }
            Err(e) => {
                tracing::error!(step = %e.step, error = %e.source, "automatic shutdown failed");
                shared.shutdown_in_progress.store(false, Ordering::Release);
                PassOutcome::ShutdownFailed {
                    step: e.step,
                    reason: e.source.to_string(),
                }
            }
        }
    }

    /// Ends periodic monitoring after a completed shutdown. The flag stays set.
    fn halt_schedule(&self) {
        let mut schedule = self.lock_schedule();
        self.lock_state().running = false;
        schedule.take();
    }

    /// Moves the activity clock forward, never back.
    fn record_activity(&self, now: DateTime<Utc>) {
        let mut state = self.lock_state();
        if now > state.last_activity {
            state.last_activity = now;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ActivityState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_schedule(&self) -> MutexGuard<'_, Option<oneshot::Sender<()>>> {
        self.shared
            .schedule
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Rounds up to whole minutes.
fn ceil_minutes(d: Duration) -> u64 {
    (d.as_millis() as u64).div_ceil(60_000)
}

async fn run_schedule<S, I, C>(monitor: IdleMonitor<S, I, C>, mut stop_rx: oneshot::Receiver<()>)
where
    S: GameServer,
    I: InstanceControl,
    C: Clock,
{
    let mut ticker = TickScheduler::new(monitor.shared.config.tick_config());

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = ticker.wait_for_tick() => {
                let outcome = monitor.run_pass().await;
                ticker.record_tick_end();
                if outcome == PassOutcome::ShutdownCompleted {
                    break;
                }
            }
        }
    }

    let metrics = ticker.metrics();
    tracing::debug!(
        passes = metrics.total_ticks,
        overruns = metrics.total_overruns,
        skipped = metrics.total_skipped,
        max_pass_ms = metrics.max_tick_time.as_millis() as u64,
        "monitoring schedule ended"
    );
}
