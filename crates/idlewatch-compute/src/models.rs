//! Compute Engine REST payloads.
//!
//! Only the fields idlewatch reads are modelled; everything else in the
//! provider's JSON is ignored by serde.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::ComputeError;

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// A zonal long-running operation, as returned by `start`, `stop`, and
/// `zoneOperations.get`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Operation {
    pub name: Option<String>,
    pub status: Option<String>,
    pub error: Option<OperationErrors>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct OperationErrors {
    #[serde(default)]
    pub errors: Vec<OperationErrorItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OperationErrorItem {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Whether an operation is still running.
///
/// The provider reports `PENDING`, `RUNNING` and `DONE`. Only `DONE` is
/// terminal; everything else counts as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationState {
    Pending,
    Done,
}

impl Operation {
    pub fn state(&self) -> OperationState {
        match self.status.as_deref() {
            Some("DONE") => OperationState::Done,
            _ => OperationState::Pending,
        }
    }

    /// Converts a finished operation into success or a joined error.
    pub fn into_result(self) -> Result<(), ComputeError> {
        match self.error {
            None => Ok(()),
            Some(errors) => {
                let joined = errors
                    .errors
                    .iter()
                    .map(|e| {
                        e.message
                            .clone()
                            .or_else(|| e.code.clone())
                            .unwrap_or_else(|| "unknown error".into())
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                if joined.is_empty() {
                    return Err(ComputeError::OperationFailed(
                        "operation reported an error without details".into(),
                    ));
                }
                Err(ComputeError::OperationFailed(joined))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Instance {
    pub status: Option<String>,
    pub creation_timestamp: Option<String>,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NetworkInterface {
    #[serde(default)]
    pub access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccessConfig {
    #[serde(rename = "natIP")]
    pub nat_ip: Option<String>,
}

impl Instance {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.creation_timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    pub fn external_ip(&self) -> Option<String> {
        self.network_interfaces
            .first()?
            .access_configs
            .first()?
            .nat_ip
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Errors and tokens
// ---------------------------------------------------------------------------

/// The provider's JSON error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}

/// The metadata server's token response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}
