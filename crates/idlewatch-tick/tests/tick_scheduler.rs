//! Integration tests for the tick scheduler.
//!
//! Runs on a paused Tokio clock, so sleeps resolve as soon as the runtime
//! is idle and tick bodies can "take" minutes without real waiting.

use std::time::Duration;

use idlewatch_tick::{TickConfig, TickPolicy, TickScheduler};

// =========================================================================
// Helpers
// =========================================================================

const MINUTE: Duration = Duration::from_secs(60);

fn every_minute() -> TickConfig {
    TickConfig::with_period(MINUTE)
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_event_driven() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.period, Duration::ZERO);
    assert_eq!(cfg.tick_period(), None);
    assert_eq!(cfg.policy, TickPolicy::Skip);
}

#[test]
fn test_validated_raises_tiny_period() {
    let cfg = TickConfig::with_period(Duration::from_nanos(10)).validated();
    assert_eq!(cfg.period, TickConfig::MIN_PERIOD);
}

#[test]
fn test_validated_keeps_zero_period() {
    let cfg = TickConfig::default().validated();
    assert_eq!(cfg.tick_period(), None);
}

// =========================================================================
// Scheduler creation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_initial_state() {
    let s = TickScheduler::new(every_minute());
    assert_eq!(s.tick_count(), 0);
    assert!(!s.is_event_driven());
    assert_eq!(s.period(), Some(MINUTE));
    assert_eq!(s.metrics().total_ticks, 0);
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_tick_fires_after_one_period() {
    let start = tokio::time::Instant::now();
    let mut s = TickScheduler::new(every_minute());

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert!(!info.overrun);
    assert_eq!(start.elapsed(), MINUTE);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_increment_monotonically() {
    let mut s = TickScheduler::new(every_minute());
    for expected in 1..=4 {
        assert_eq!(s.wait_for_tick().await.tick, expected);
    }
    assert_eq!(s.tick_count(), 4);
    assert_eq!(s.metrics().total_ticks, 4);
}

#[tokio::test(start_paused = true)]
async fn test_initial_jitter_delays_only_first_tick() {
    let start = tokio::time::Instant::now();
    let mut s = TickScheduler::new(TickConfig {
        initial_jitter: Duration::from_secs(5),
        ..every_minute()
    });

    s.wait_for_tick().await;
    let first = start.elapsed();
    assert!(first >= MINUTE && first < MINUTE + Duration::from_secs(5));

    s.wait_for_tick().await;
    assert_eq!(start.elapsed(), first + MINUTE);
}

#[tokio::test(start_paused = true)]
async fn test_event_driven_never_fires() {
    let mut s = TickScheduler::new(TickConfig::default());
    assert!(s.is_event_driven());

    let result = tokio::time::timeout(Duration::from_secs(3600), s.wait_for_tick()).await;
    assert!(result.is_err(), "event-driven scheduler should pend forever");
}

// =========================================================================
// Overrun handling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_skip_policy_drops_missed_ticks() {
    let mut s = TickScheduler::new(every_minute());
    s.wait_for_tick().await;

    // Body runs for 2.5 periods.
    tokio::time::sleep(Duration::from_secs(150)).await;
    s.record_tick_end();

    let before = tokio::time::Instant::now();
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 1);
    assert_eq!(before.elapsed(), Duration::ZERO);

    // Rescheduled a full period from the late tick, not back-to-back.
    let before = tokio::time::Instant::now();
    let info = s.wait_for_tick().await;
    assert!(!info.overrun);
    assert_eq!(before.elapsed(), MINUTE);
    assert_eq!(s.metrics().total_skipped, 1);
    assert_eq!(s.metrics().total_overruns, 1);
}

#[tokio::test(start_paused = true)]
async fn test_delay_policy_keeps_original_cadence() {
    let start = tokio::time::Instant::now();
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::Delay,
        ..every_minute()
    });
    s.wait_for_tick().await;

    tokio::time::sleep(Duration::from_secs(150)).await;
    s.record_tick_end();

    // Ticks 2 and 3 were due at 2:00 and 3:00; both fire immediately.
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 0);
    s.wait_for_tick().await;
    assert_eq!(start.elapsed(), Duration::from_secs(210));

    // Back on the original grid.
    s.wait_for_tick().await;
    assert_eq!(start.elapsed(), Duration::from_secs(240));
}

// =========================================================================
// Metrics
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_without_wait_is_noop() {
    let mut s = TickScheduler::new(every_minute());
    s.record_tick_end();
    assert_eq!(s.metrics().last_tick_time, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_track_last_and_max_body_time() {
    let mut s = TickScheduler::new(every_minute());

    s.wait_for_tick().await;
    tokio::time::sleep(Duration::from_secs(15)).await;
    s.record_tick_end();

    s.wait_for_tick().await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    s.record_tick_end();

    let m = s.metrics();
    assert_eq!(m.last_tick_time, Duration::from_secs(3));
    assert_eq!(m.max_tick_time, Duration::from_secs(15));
}

// =========================================================================
// select! loop pattern
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_stops_on_signal() {
    let mut s = TickScheduler::new(every_minute());
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(190)).await;
        stop_tx.send(()).ok();
    });

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            info = s.wait_for_tick() => {
                ticks += 1;
                assert_eq!(info.tick, ticks);
                s.record_tick_end();
            }
        }
    }

    assert_eq!(ticks, 3);
}
