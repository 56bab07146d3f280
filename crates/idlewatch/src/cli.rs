//! Command-line interface.

use clap::{Parser, Subcommand};

use crate::Settings;

#[derive(Debug, Parser)]
#[command(name = "idlewatch", about, long_about = None, version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Monitor the server and shut it down when idle. Runs until Ctrl-C
    Watch,
    /// Run one monitoring pass and print its outcome.
    ///
    /// The idle clock starts fresh in every process, so a one-off check
    /// reports instance and player state but never warns or shuts the
    /// server down. Idle shutdown needs the long-running `watch`.
    Check,
    /// Start the instance
    Up,
    /// Save the world, then stop the instance
    Down,
    /// Print instance, server and monitoring status as JSON
    Status,
    /// Print the instance's external IP address
    Ip,
}
