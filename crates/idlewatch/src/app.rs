//! Wires the production clients together and runs one CLI command.

use idlewatch_compute::ComputeClient;
use idlewatch_monitor::IdleMonitor;
use idlewatch_protocol::Reading;
use idlewatch_rcon::RconClient;
use serde::Serialize;

use crate::{Cli, Command, IdlewatchError, ServerControl, Settings};

/// The control facade over the real RCON and Compute clients.
pub type Control = ServerControl<RconClient, ComputeClient>;

/// Validates `settings` and builds the production stack. Nothing connects
/// until a command runs.
pub fn build(settings: &Settings) -> Result<Control, IdlewatchError> {
    settings.validate()?;
    let server = RconClient::new(settings.rcon_config());
    let instance = ComputeClient::new(settings.compute_config())?;
    let monitor = IdleMonitor::new(settings.monitor_config(), server, instance)?;
    Ok(ServerControl::new(monitor))
}

/// Runs the command the CLI asked for.
pub async fn run(cli: Cli) -> Result<(), IdlewatchError> {
    let control = build(&cli.settings)?;
    tracing::debug!(command = ?cli.command, "running command");

    match cli.command {
        Command::Watch => watch(&control).await,
        Command::Check => print_json(&control.run_monitoring_pass().await),
        Command::Up => {
            println!("{}", control.start_instance().await?);
            Ok(())
        }
        Command::Down => {
            println!("{}", control.stop_instance().await?);
            Ok(())
        }
        Command::Status => print_json(&control.server_status().await),
        Command::Ip => match control.external_ip().await {
            Reading::Live(Some(ip)) => {
                println!("{ip}");
                Ok(())
            }
            Reading::Live(None) => Err(IdlewatchError::Unavailable {
                what: "external IP",
                reason: "instance has no external address".into(),
            }),
            Reading::Degraded { reason, .. } => Err(IdlewatchError::Unavailable {
                what: "external IP",
                reason,
            }),
        },
    }
}

async fn watch(control: &Control) -> Result<(), IdlewatchError> {
    let monitor = control.monitor();
    monitor.start();
    tracing::info!("watching; press Ctrl-C to exit");

    tokio::signal::ctrl_c().await?;

    tracing::info!("interrupt received, shutting down");
    if monitor.is_monitoring() {
        monitor.stop();
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), IdlewatchError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
