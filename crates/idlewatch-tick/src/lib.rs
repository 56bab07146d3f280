//! Fixed-period tick scheduler for the monitoring loop.
//!
//! Fires once per `period` and tracks how long each tick body took, so a
//! slow pass (one that includes a shutdown sequence, say) is visible in
//! the logs and never produces a burst of back-to-back passes.
//!
//! # Event-driven mode
//!
//! When `period` is zero, [`TickScheduler::wait_for_tick`] pends forever.
//! Deployments where an external scheduler pushes passes use this mode.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut stop_rx => break,
//!         _ = scheduler.wait_for_tick() => {
//!             monitor.run_pass().await;
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! All timing uses Tokio's clock, so tests can drive it with
//! `tokio::time::pause()`.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick fires late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Drop the missed ticks and schedule the next one a full period from
    /// now.
    #[default]
    Skip,
    /// Keep the original cadence. Missed ticks fire immediately, one after
    /// another, until the schedule catches up.
    Delay,
}

/// Full configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Zero = event-driven (tick never fires).
    pub period: Duration,
    pub policy: TickPolicy,
    /// Random delay (0..max) added to the first tick only.
    pub initial_jitter: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::ZERO,
            policy: TickPolicy::default(),
            initial_jitter: Duration::ZERO,
        }
    }
}

impl TickConfig {
    /// Shortest period accepted. Anything in `(0, MIN_PERIOD)` is raised.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// A config with the given period and defaults for everything else.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Fixes out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if !self.period.is_zero() && self.period < Self::MIN_PERIOD {
            warn!(period = ?self.period, "tick period below minimum, raising");
            self.period = Self::MIN_PERIOD;
        }
        self
    }

    /// `None` in event-driven mode.
    pub fn tick_period(&self) -> Option<Duration> {
        (!self.period.is_zero()).then_some(self.period)
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Starts at 1.
    pub tick: u64,
    /// `true` if this tick woke more than a tenth of a period late.
    pub overrun: bool,
    /// Whole periods dropped under [`TickPolicy::Skip`].
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime counters. Tick times are the body durations reported via
/// [`TickScheduler::record_tick_end`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    pub last_tick_time: Duration,
    pub max_tick_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Drives one periodic loop.
pub struct TickScheduler {
    config: TickConfig,
    period: Option<Duration>,
    tick_count: u64,
    next_tick: Option<Instant>,
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a scheduler. The first tick fires one period (plus jitter)
    /// from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let period = config.tick_period();

        let next_tick = period.map(|p| {
            let jitter = if config.initial_jitter.is_zero() {
                Duration::ZERO
            } else {
                let max = config.initial_jitter.as_micros() as u64;
                Duration::from_micros(rand::rng().random_range(0..max.max(1)))
            };
            Instant::now() + p + jitter
        });

        match period {
            None => debug!("tick scheduler created in event-driven mode"),
            Some(p) => debug!(period_secs = p.as_secs_f64(), policy = ?config.policy, "tick scheduler created"),
        }

        Self {
            config,
            period,
            tick_count: 0,
            next_tick,
            tick_start: None,
            metrics: TickMetrics::default(),
        }
    }

    /// A scheduler with the given period and default settings.
    pub fn with_period(period: Duration) -> Self {
        Self::new(TickConfig::with_period(period))
    }

    /// Waits until the next tick is due.
    ///
    /// In event-driven mode this future never resolves; `tokio::select!`
    /// keeps servicing its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (Some(next), Some(period)) = (self.next_tick, self.period) else {
            return std::future::pending().await;
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;
        self.tick_start = Some(now);

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > period / 10;
        let mut ticks_skipped = 0u64;

        self.next_tick = Some(match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_secs = late_by.as_secs_f64(),
                            "tick fired late, skipping ahead"
                        );
                    }
                }
                now + period
            }
            TickPolicy::Delay => {
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_secs = late_by.as_secs_f64(),
                        "tick fired late, keeping schedule"
                    );
                }
                next + period
            }
        });

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Records that the current tick's body has finished.
    ///
    /// Warns when the body took longer than one period. A no-op if no
    /// tick is in progress.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();

        if let Some(period) = self.period {
            if elapsed > period {
                warn!(
                    tick = self.tick_count,
                    elapsed_secs = elapsed.as_secs_f64(),
                    period_secs = period.as_secs_f64(),
                    "tick body overran its period"
                );
            }
        }

        self.metrics.last_tick_time = elapsed;
        if elapsed > self.metrics.max_tick_time {
            self.metrics.max_tick_time = elapsed;
        }
    }

    pub fn is_event_driven(&self) -> bool {
        self.period.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// `None` in event-driven mode.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}
