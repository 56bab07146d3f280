//! Where the client's OAuth access token comes from.
//!
//! On a GCE VM (or any host that exposes the metadata server) the default
//! service account hands out short-lived tokens. Anywhere else a token can
//! be supplied directly, e.g. from `gcloud auth print-access-token`.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::ComputeError;
use crate::models::TokenResponse;

/// The metadata server's token endpoint for the default service account.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh this long before the provider-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// How the client authenticates its API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A fixed bearer token. Never refreshed.
    Static(String),
    /// Fetch tokens from a metadata server and cache them until shortly
    /// before they expire.
    MetadataServer { url: String },
}

impl Default for Credentials {
    fn default() -> Self {
        Self::MetadataServer {
            url: METADATA_TOKEN_URL.to_string(),
        }
    }
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Hands out a valid bearer token, fetching a new one when needed.
pub(crate) struct TokenSource {
    credentials: Credentials,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            cached: Mutex::new(None),
        }
    }

    pub async fn token(&self, http: &reqwest::Client) -> Result<String, ComputeError> {
        let url = match &self.credentials {
            Credentials::Static(token) => return Ok(token.clone()),
            Credentials::MetadataServer { url } => url,
        };

        // Held across the fetch so concurrent callers wait for one refresh.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        let token = fetch(http, url).await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::debug!(expires_in = token.expires_in, "fetched access token");
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

async fn fetch(http: &reqwest::Client, url: &str) -> Result<TokenResponse, ComputeError> {
    let response = http
        .get(url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| ComputeError::Credentials(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ComputeError::Credentials(format!(
            "metadata server returned {}",
            response.status()
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| ComputeError::Credentials(e.to_string()))
}
