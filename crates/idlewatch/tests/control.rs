//! Integration tests for the operator control facade.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use idlewatch::{IdlewatchError, ServerControl};
use idlewatch_compute::ComputeError;
use idlewatch_monitor::{
    GameServer, IdleMonitor, InstanceControl, ManualClock, MonitorConfig, PassOutcome,
};
use idlewatch_protocol::{InstanceState, InstanceStatus, PlayerList, Reading, RosterSnapshot};
use idlewatch_rcon::RconError;

// =========================================================================
// Fakes
// =========================================================================

#[derive(Clone, Default)]
struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    fn push(&self, call: &'static str) {
        self.0.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

struct FakeServer {
    log: CallLog,
    online: bool,
    players: Vec<String>,
    fail_save: bool,
}

impl GameServer for FakeServer {
    type Error = RconError;

    async fn query_roster(&self) -> Reading<RosterSnapshot> {
        self.log.push("list");
        if !self.online {
            return Reading::degraded(RosterSnapshot::offline(), "connection refused");
        }
        Reading::Live(RosterSnapshot::online(
            PlayerList {
                count: self.players.len() as u32,
                max_players: Some(10),
                players: self.players.clone(),
            },
            Some(120),
        ))
    }

    async fn save_state(&self) -> Result<String, RconError> {
        self.log.push("save");
        if self.fail_save {
            return Err(RconError::ConnectionClosed);
        }
        Ok("Saved the game".into())
    }

    async fn stop(&self) -> Result<String, RconError> {
        self.log.push("stop_server");
        Ok(String::new())
    }

    async fn broadcast(&self, _message: &str) -> Reading<()> {
        self.log.push("say");
        Reading::Live(())
    }
}

struct FakeInstance {
    log: CallLog,
    status_error: bool,
}

impl InstanceControl for FakeInstance {
    type Error = ComputeError;

    async fn start(&self) -> Result<String, ComputeError> {
        self.log.push("start_instance");
        Ok("instance mc started".into())
    }

    async fn stop(&self) -> Result<String, ComputeError> {
        self.log.push("stop_instance");
        Ok("instance mc stopped".into())
    }

    async fn status(&self) -> Result<InstanceState, ComputeError> {
        self.log.push("status");
        if self.status_error {
            return Err(ComputeError::Api {
                status: 403,
                message: "permission denied".into(),
            });
        }
        Ok(InstanceState {
            status: InstanceStatus::Running,
            uptime_seconds: Some(3600),
        })
    }

    async fn is_running(&self) -> Reading<bool> {
        self.log.push("is_running");
        Reading::Live(true)
    }

    async fn external_ip(&self) -> Reading<Option<String>> {
        self.log.push("external_ip");
        if self.status_error {
            return Reading::degraded(None, "permission denied");
        }
        Reading::Live(Some("34.1.2.3".into()))
    }
}

struct Harness {
    log: CallLog,
    clock: ManualClock,
    control: ServerControl<FakeServer, FakeInstance, ManualClock>,
}

#[derive(Clone, Copy)]
struct Setup {
    online: bool,
    empty: bool,
    fail_save: bool,
    status_error: bool,
}

const HEALTHY: Setup = Setup {
    online: true,
    empty: false,
    fail_save: false,
    status_error: false,
};

fn harness(setup: Setup) -> Harness {
    let log = CallLog::default();
    let clock = ManualClock::default();
    let players = if setup.empty {
        Vec::new()
    } else {
        vec!["alice".to_string()]
    };
    let monitor = IdleMonitor::with_clock(
        MonitorConfig::new(Duration::from_secs(15 * 60), Duration::ZERO),
        FakeServer {
            log: log.clone(),
            online: setup.online,
            players,
            fail_save: setup.fail_save,
        },
        FakeInstance {
            log: log.clone(),
            status_error: setup.status_error,
        },
        clock.clone(),
    )
    .expect("valid config");
    Harness {
        log,
        clock,
        control: ServerControl::new(monitor),
    }
}

fn healthy() -> Harness {
    harness(HEALTHY)
}

// =========================================================================
// start_instance() / stop_instance()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_instance_resets_activity() {
    let h = healthy();
    h.clock.advance(Duration::from_secs(20 * 60));

    let msg = h.control.start_instance().await.unwrap();
    assert_eq!(msg, "instance mc started");
    assert_eq!(h.control.monitoring_status().idle_minutes, 0);
    // Not halted by a shutdown, so monitoring is not started.
    assert!(!h.control.monitoring_status().running);
}

#[tokio::test(start_paused = true)]
async fn test_start_instance_resumes_monitoring_after_auto_shutdown() {
    let h = harness(Setup {
        empty: true,
        ..HEALTHY
    });
    let monitor = h.control.monitor();

    monitor.start();
    h.clock.advance(Duration::from_secs(16 * 60));
    assert_eq!(monitor.run_pass().await, PassOutcome::ShutdownCompleted);

    let halted = monitor.status();
    assert!(!halted.running);
    assert!(halted.shutdown_in_progress);

    h.control.start_instance().await.unwrap();
    let resumed = monitor.status();
    assert!(resumed.running);
    assert_eq!(resumed.idle_minutes, 0);
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_start_instance_leaves_manually_stopped_monitoring_alone() {
    let h = healthy();
    let monitor = h.control.monitor();

    monitor.start();
    monitor.stop();
    h.control.start_instance().await.unwrap();
    assert!(!monitor.status().running);
}

#[tokio::test(start_paused = true)]
async fn test_stop_instance_saves_first() {
    let h = healthy();

    let msg = h.control.stop_instance().await.unwrap();
    assert_eq!(msg, "instance mc stopped");
    assert_eq!(h.log.calls(), vec!["save", "stop_instance"]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_instance_aborts_when_save_fails() {
    let h = harness(Setup {
        fail_save: true,
        ..HEALTHY
    });

    let err = h.control.stop_instance().await.unwrap_err();
    assert!(matches!(err, IdlewatchError::Rcon(RconError::ConnectionClosed)));
    assert_eq!(h.log.calls(), vec!["save"]);
}

// =========================================================================
// Status reads
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_instance_status_propagates_errors() {
    let h = harness(Setup {
        status_error: true,
        ..HEALTHY
    });

    let err = h.control.instance_status().await.unwrap_err();
    assert!(matches!(err, IdlewatchError::Compute(_)));
    assert!(err.to_string().contains("permission denied"));
}

#[tokio::test(start_paused = true)]
async fn test_server_info_degrades_when_offline() {
    let h = harness(Setup {
        online: false,
        ..HEALTHY
    });

    let reading = h.control.server_info().await;
    assert!(reading.is_degraded());
    assert!(!reading.into_value().online);
}

#[tokio::test(start_paused = true)]
async fn test_server_status_aggregates_all_parts() {
    let h = healthy();

    let status = h.control.server_status().await;
    assert_eq!(status.instance.status, InstanceStatus::Running);
    assert_eq!(status.instance.uptime_seconds, Some(3600));
    assert_eq!(status.instance.error, None);
    assert_eq!(status.server.players, vec!["alice"]);
    assert_eq!(status.server_error, None);
    assert_eq!(status.external_ip.as_deref(), Some("34.1.2.3"));
    assert!(!status.monitoring.running);
}

#[tokio::test(start_paused = true)]
async fn test_server_status_reports_each_failure_in_place() {
    let h = harness(Setup {
        online: false,
        status_error: true,
        ..HEALTHY
    });

    let status = h.control.server_status().await;
    assert_eq!(status.instance.status.as_str(), "ERROR");
    assert!(status.instance.error.unwrap().contains("permission denied"));
    assert!(!status.server.online);
    assert_eq!(status.server_error.as_deref(), Some("connection refused"));
    assert_eq!(status.external_ip, None);
}

#[tokio::test(start_paused = true)]
async fn test_server_status_json_shape() {
    let h = healthy();

    let json = serde_json::to_value(h.control.server_status().await).unwrap();
    assert_eq!(json["instance"]["status"], "RUNNING");
    assert_eq!(json["server"]["player_count"], 1);
    assert_eq!(json["external_ip"], "34.1.2.3");
    assert!(json.get("server_error").is_none());
}

// =========================================================================
// run_monitoring_pass()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_run_monitoring_pass_delegates_to_monitor() {
    let h = healthy();

    assert_eq!(
        h.control.run_monitoring_pass().await,
        PassOutcome::PlayersOnline { count: 1 }
    );
    assert_eq!(h.log.calls(), vec!["is_running", "list"]);
}

#[tokio::test(start_paused = true)]
async fn test_fresh_monitor_pass_only_reports_idle() {
    let h = harness(Setup {
        empty: true,
        ..HEALTHY
    });

    assert_eq!(
        h.control.run_monitoring_pass().await,
        PassOutcome::Idle {
            idle_minutes: 0,
            remaining_minutes: 15,
        }
    );
    assert_eq!(h.log.calls(), vec!["is_running", "list"]);
    assert!(!h.control.monitoring_status().shutdown_in_progress);
}
