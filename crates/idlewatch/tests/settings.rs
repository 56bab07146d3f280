//! Command-line parsing and settings validation.

use std::time::Duration;

use clap::{CommandFactory, Parser};
use idlewatch::{Cli, Command, IdlewatchError, Settings};
use idlewatch_compute::{Credentials, DEFAULT_API_BASE};

const REQUIRED: &[&str] = &[
    "idlewatch",
    "--minecraft-host",
    "mc.example.com",
    "--minecraft-rcon-port",
    "25575",
    "--minecraft-rcon-password",
    "hunter2",
    "--gcp-project-id",
    "my-project",
    "--gcp-zone",
    "asia-northeast1-b",
    "--gcp-instance-name",
    "minecraft",
];

fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(REQUIRED.iter().chain(extra).copied())
}

fn settings(extra: &[&str]) -> Settings {
    let mut args = extra.to_vec();
    args.push("status");
    parse(&args).expect("valid arguments").settings
}

// =========================================================================
// Parsing
// =========================================================================

#[test]
fn test_parse_defaults() {
    let cli = parse(&["watch"]).unwrap();
    assert_eq!(cli.command, Command::Watch);

    let s = cli.settings;
    assert_eq!(s.minecraft_host, "mc.example.com");
    assert_eq!(s.minecraft_rcon_port, 25575);
    assert_eq!(s.rcon_timeout_seconds, 5);
    assert_eq!(s.idle_timeout_minutes, 15);
    assert_eq!(s.check_interval_seconds, 60);
    assert_eq!(s.compute_api_base, DEFAULT_API_BASE);
    assert_eq!(s.gcp_access_token, None);
    assert!(s.validate().is_ok());
}

#[test]
fn test_parse_each_subcommand() {
    for (name, expected) in [
        ("watch", Command::Watch),
        ("check", Command::Check),
        ("up", Command::Up),
        ("down", Command::Down),
        ("status", Command::Status),
        ("ip", Command::Ip),
    ] {
        assert_eq!(parse(&[name]).unwrap().command, expected);
    }
}

#[test]
fn test_check_help_explains_fresh_idle_clock() {
    let cli = Cli::command();
    let check = cli.find_subcommand("check").expect("check subcommand");
    let help = check.get_long_about().expect("long help").to_string();
    assert!(help.contains("never warns or shuts the"));
    assert!(help.contains("`watch`"));
}

#[test]
fn test_parse_requires_subcommand() {
    assert!(parse(&[]).is_err());
}

#[test]
fn test_parse_rejects_bad_port() {
    let err = Cli::try_parse_from([
        "idlewatch",
        "--minecraft-host",
        "mc",
        "--minecraft-rcon-port",
        "99999",
        "--minecraft-rcon-password",
        "pw",
        "--gcp-project-id",
        "p",
        "--gcp-zone",
        "z",
        "--gcp-instance-name",
        "i",
        "status",
    ]);
    assert!(err.is_err());
}

// =========================================================================
// Validation
// =========================================================================

#[test]
fn test_validate_rejects_blank_host() {
    let mut s = settings(&[]);
    s.minecraft_host = "  ".into();
    let err = s.validate().unwrap_err();
    assert!(matches!(err, IdlewatchError::Config(_)));
    assert!(err.to_string().contains("MINECRAFT_HOST"));
}

#[test]
fn test_validate_rejects_zero_values() {
    let s = settings(&["--idle-timeout-minutes", "0"]);
    assert!(s.validate().unwrap_err().to_string().contains("IDLE_TIMEOUT_MINUTES"));

    let s = settings(&["--check-interval-seconds", "0"]);
    assert!(s.validate().unwrap_err().to_string().contains("CHECK_INTERVAL_SECONDS"));

    let s = settings(&["--rcon-timeout-seconds", "0"]);
    assert!(s.validate().unwrap_err().to_string().contains("RCON_TIMEOUT_SECONDS"));

    let huge = u64::MAX.to_string();
    let s = settings(&["--idle-timeout-minutes", huge.as_str()]);
    assert!(s.validate().unwrap_err().to_string().contains("too large"));

    let mut s = settings(&[]);
    s.minecraft_rcon_port = 0;
    assert!(s.validate().unwrap_err().to_string().contains("MINECRAFT_RCON_PORT"));
}

// =========================================================================
// Derived configs
// =========================================================================

#[test]
fn test_rcon_config() {
    let config = settings(&["--rcon-timeout-seconds", "3"]).rcon_config();
    assert_eq!(config.host, "mc.example.com");
    assert_eq!(config.port, 25575);
    assert_eq!(config.timeout, Duration::from_secs(3));
}

#[test]
fn test_compute_config_uses_metadata_server_by_default() {
    let config = settings(&[]).compute_config();
    assert_eq!(config.project, "my-project");
    assert_eq!(config.zone, "asia-northeast1-b");
    assert_eq!(config.instance, "minecraft");
    assert!(matches!(config.credentials, Credentials::MetadataServer { .. }));
}

#[test]
fn test_compute_config_static_token_and_api_base() {
    let config = settings(&[
        "--gcp-access-token",
        "ya29.token",
        "--compute-api-base",
        "http://localhost:8080/",
    ])
    .compute_config();
    assert_eq!(config.api_base, "http://localhost:8080");
    assert!(matches!(config.credentials, Credentials::Static(ref t) if t == "ya29.token"));
}

#[test]
fn test_monitor_config() {
    let config = settings(&[
        "--idle-timeout-minutes",
        "30",
        "--check-interval-seconds",
        "10",
    ])
    .monitor_config();
    assert_eq!(config.idle_timeout, Duration::from_secs(30 * 60));
    assert_eq!(config.check_interval, Duration::from_secs(10));
}

#[test]
fn test_monitor_config_never_overflows() {
    let mut s = settings(&[]);
    s.idle_timeout_minutes = u64::MAX;
    assert_eq!(s.monitor_config().idle_timeout, Duration::from_secs(u64::MAX));
}

#[tokio::test]
async fn test_build_rejects_invalid_settings() {
    let s = settings(&["--idle-timeout-minutes", "0"]);
    assert!(matches!(
        idlewatch::app::build(&s),
        Err(IdlewatchError::Config(_))
    ));
}

#[tokio::test]
async fn test_build_with_static_token() {
    let s = settings(&["--gcp-access-token", "ya29.token"]);
    let control = idlewatch::app::build(&s).unwrap();
    assert!(!control.monitoring_status().running);
}
