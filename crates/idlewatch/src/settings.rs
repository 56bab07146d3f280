//! Runtime settings, read from flags or environment variables.

use std::time::Duration;

use clap::Args;
use idlewatch_compute::{ComputeConfig, Credentials, DEFAULT_API_BASE};
use idlewatch_monitor::MonitorConfig;
use idlewatch_rcon::RconConfig;

use crate::IdlewatchError;

/// Everything idlewatch needs to reach the game server and its instance.
///
/// Every field can be given as a flag or through the environment variable
/// named next to it. Missing required values stop the process before
/// anything connects.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    #[arg(long, env = "MINECRAFT_HOST", help = "Game server host name or address")]
    pub minecraft_host: String,

    #[arg(long, env = "MINECRAFT_RCON_PORT", help = "Game server RCON port")]
    pub minecraft_rcon_port: u16,

    #[arg(
        long,
        env = "MINECRAFT_RCON_PASSWORD",
        hide_env_values = true,
        help = "RCON password"
    )]
    pub minecraft_rcon_password: String,

    #[arg(
        long,
        env = "RCON_TIMEOUT_SECONDS",
        default_value_t = 5,
        help = "Timeout for connecting to RCON and for each reply"
    )]
    pub rcon_timeout_seconds: u64,

    #[arg(long, env = "GCP_PROJECT_ID", help = "Project that owns the instance")]
    pub gcp_project_id: String,

    #[arg(long, env = "GCP_ZONE", help = "Zone of the instance, e.g. asia-northeast1-b")]
    pub gcp_zone: String,

    #[arg(long, env = "GCP_INSTANCE_NAME", help = "Name of the game server's instance")]
    pub gcp_instance_name: String,

    #[arg(
        long,
        env = "GCP_ACCESS_TOKEN",
        hide_env_values = true,
        help = "Fixed OAuth access token. Without it, tokens come from the metadata server"
    )]
    pub gcp_access_token: Option<String>,

    #[arg(
        long,
        env = "COMPUTE_API_BASE",
        default_value = DEFAULT_API_BASE,
        help = "Compute Engine REST endpoint"
    )]
    pub compute_api_base: String,

    #[arg(
        long,
        env = "IDLE_TIMEOUT_MINUTES",
        default_value_t = 15,
        help = "Minutes with nobody online before shutting down"
    )]
    pub idle_timeout_minutes: u64,

    #[arg(
        long,
        env = "CHECK_INTERVAL_SECONDS",
        default_value_t = 60,
        help = "Seconds between monitoring passes"
    )]
    pub check_interval_seconds: u64,
}

impl Settings {
    /// Rejects values clap accepts but idlewatch can't use.
    pub fn validate(&self) -> Result<(), IdlewatchError> {
        let required = [
            ("MINECRAFT_HOST", &self.minecraft_host),
            ("MINECRAFT_RCON_PASSWORD", &self.minecraft_rcon_password),
            ("GCP_PROJECT_ID", &self.gcp_project_id),
            ("GCP_ZONE", &self.gcp_zone),
            ("GCP_INSTANCE_NAME", &self.gcp_instance_name),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(IdlewatchError::Config(format!("{name} must not be empty")));
        }
        if self.minecraft_rcon_port == 0 {
            return Err(IdlewatchError::Config("MINECRAFT_RCON_PORT must not be 0".into()));
        }
        if self.rcon_timeout_seconds == 0 {
            return Err(IdlewatchError::Config("RCON_TIMEOUT_SECONDS must be at least 1".into()));
        }
        if self.idle_timeout_minutes == 0 {
            return Err(IdlewatchError::Config("IDLE_TIMEOUT_MINUTES must be at least 1".into()));
        }
        if self.idle_timeout_minutes.checked_mul(60).is_none() {
            return Err(IdlewatchError::Config("IDLE_TIMEOUT_MINUTES is too large".into()));
        }
        if self.check_interval_seconds == 0 {
            return Err(IdlewatchError::Config(
                "CHECK_INTERVAL_SECONDS must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn rcon_config(&self) -> RconConfig {
        let mut config = RconConfig::new(
            &self.minecraft_host,
            self.minecraft_rcon_port,
            &self.minecraft_rcon_password,
        );
        config.timeout = Duration::from_secs(self.rcon_timeout_seconds);
        config
    }

    pub fn compute_config(&self) -> ComputeConfig {
        let mut config =
            ComputeConfig::new(&self.gcp_project_id, &self.gcp_zone, &self.gcp_instance_name);
        config.api_base = self.compute_api_base.trim_end_matches('/').to_string();
        if let Some(token) = &self.gcp_access_token {
            config.credentials = Credentials::Static(token.clone());
        }
        config
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::new(
            Duration::from_secs(self.idle_timeout_minutes.saturating_mul(60)),
            Duration::from_secs(self.check_interval_seconds),
        )
    }
}
