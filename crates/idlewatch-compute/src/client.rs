//! The instance lifecycle client.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use idlewatch_protocol::{InstanceState, InstanceStatus, Reading};
use reqwest::header::CONTENT_LENGTH;
use serde::de::DeserializeOwned;

use crate::credentials::TokenSource;
use crate::models::{ApiErrorBody, Instance, Operation, OperationState};
use crate::{ComputeError, Credentials};

/// Default REST endpoint for Compute Engine v1.
pub const DEFAULT_API_BASE: &str = "https://compute.googleapis.com/compute/v1";

/// Which instance to manage and how to reach the API.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    pub project: String,
    pub zone: String,
    pub instance: String,
    /// Base URL without a trailing slash. Overridden in tests.
    pub api_base: String,
    pub credentials: Credentials,
    /// Delay between operation polls.
    pub poll_interval: Duration,
    /// `None` polls until the operation finishes.
    pub max_poll_attempts: Option<u32>,
    pub request_timeout: Duration,
}

impl ComputeConfig {
    pub fn new(
        project: impl Into<String>,
        zone: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            zone: zone.into(),
            instance: instance.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            credentials: Credentials::default(),
            poll_interval: Duration::from_secs(2),
            max_poll_attempts: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Starts, stops and inspects one Compute Engine instance.
///
/// `start` and `stop` block until the provider's long-running operation
/// finishes. The client also remembers when it last started the instance
/// so uptime reflects this boot rather than the instance's creation.
pub struct ComputeClient {
    config: ComputeConfig,
    http: reqwest::Client,
    tokens: TokenSource,
    local_start_time: Mutex<Option<DateTime<Utc>>>,
}

impl ComputeClient {
    /// Builds the client and its HTTP connection pool.
    ///
    /// # Errors
    /// Returns [`ComputeError::Http`] if the TLS backend cannot be set up.
    pub fn new(config: ComputeConfig) -> Result<Self, ComputeError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let tokens = TokenSource::new(config.credentials.clone());
        Ok(Self {
            config,
            http,
            tokens,
            local_start_time: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Starts the instance and waits for the operation to finish.
    pub async fn start(&self) -> Result<String, ComputeError> {
        tracing::info!(instance = %self.config.instance, "starting instance");
        self.lifecycle("start").await?;
        *self.start_time() = Some(Utc::now());
        tracing::info!(instance = %self.config.instance, "instance started");
        Ok(format!("instance {} started", self.config.instance))
    }

    /// Stops the instance and waits for the operation to finish.
    pub async fn stop(&self) -> Result<String, ComputeError> {
        tracing::info!(instance = %self.config.instance, "stopping instance");
        self.lifecycle("stop").await?;
        *self.start_time() = None;
        tracing::info!(instance = %self.config.instance, "instance stopped");
        Ok(format!("instance {} stopped", self.config.instance))
    }

    async fn lifecycle(&self, action: &'static str) -> Result<(), ComputeError> {
        let run = async {
            let url = format!("{}/{action}", self.instance_url());
            // The API front end answers 411 to a bodiless POST without a length.
            let request = self.http.post(url).header(CONTENT_LENGTH, 0);
            let op: Operation = self.send(request).await?;
            match op.name {
                Some(name) => self.wait_for_operation(&name).await,
                None => Ok(()),
            }
        };
        run.await.map_err(|source| {
            tracing::error!(action, error = %source, "instance lifecycle request failed");
            ComputeError::Lifecycle {
                action,
                instance: self.config.instance.clone(),
                source: Box::new(source),
            }
        })
    }

    /// Polls a zonal operation until it is `DONE`.
    ///
    /// # Errors
    /// - [`ComputeError::OperationFailed`] if it finished with errors
    /// - [`ComputeError::OperationTimeout`] if `max_poll_attempts` ran out
    pub async fn wait_for_operation(&self, name: &str) -> Result<(), ComputeError> {
        let url = format!(
            "{}/projects/{}/zones/{}/operations/{name}",
            self.config.api_base, self.config.project, self.config.zone
        );
        let mut attempts: u32 = 0;
        loop {
            let op: Operation = self.send(self.http.get(&url)).await?;
            attempts += 1;
            if op.state() == OperationState::Done {
                tracing::debug!(operation = name, attempts, "operation finished");
                return op.into_result();
            }
            if self.config.max_poll_attempts.is_some_and(|max| attempts >= max) {
                return Err(ComputeError::OperationTimeout {
                    operation: name.to_string(),
                    attempts,
                });
            }
            tracing::trace!(operation = name, status = ?op.status, "operation pending");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Fetches the provider state and a best-effort uptime.
    pub async fn status(&self) -> Result<InstanceState, ComputeError> {
        let instance = self.fetch_instance().await?;
        let status = InstanceStatus::from(instance.status.as_deref().unwrap_or("UNKNOWN"));

        let uptime_seconds = if status.is_running() {
            let since = (*self.start_time()).or_else(|| instance.created_at());
            since.map(|t| (Utc::now() - t).num_seconds().max(0) as u64)
        } else {
            // Stopped outside this process.
            *self.start_time() = None;
            None
        };

        Ok(InstanceState {
            status,
            uptime_seconds,
        })
    }

    /// Whether the instance reports `RUNNING`. Degrades to `false`.
    pub async fn is_running(&self) -> Reading<bool> {
        match self.status().await {
            Ok(state) => Reading::Live(state.status.is_running()),
            Err(e) => {
                tracing::warn!(error = %e, "instance status check failed");
                Reading::degraded(false, e)
            }
        }
    }

    /// The instance's external NAT address, if it has one.
    pub async fn external_ip(&self) -> Reading<Option<String>> {
        match self.fetch_instance().await {
            Ok(instance) => Reading::Live(instance.external_ip()),
            Err(e) => {
                tracing::warn!(error = %e, "external IP lookup failed");
                Reading::degraded(None, e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // HTTP plumbing
    // -----------------------------------------------------------------------

    fn instance_url(&self) -> String {
        format!(
            "{}/projects/{}/zones/{}/instances/{}",
            self.config.api_base, self.config.project, self.config.zone, self.config.instance
        )
    }

    async fn fetch_instance(&self) -> Result<Instance, ComputeError> {
        self.send(self.http.get(self.instance_url())).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ComputeError> {
        let token = self.tokens.token(&self.http).await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(ComputeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }

    fn start_time(&self) -> std::sync::MutexGuard<'_, Option<DateTime<Utc>>> {
        self.local_start_time
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
