//! OAuth access tokens for Google APIs.
//!
//! Either a static token supplied by the caller (e.g. from
//! `gcloud auth print-access-token`) or one minted by the GCE / Cloud Run
//! metadata server for the attached service account.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::GcpError;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh a cached metadata token this long before it expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

/// A metadata token and the instant it stops being valid.
pub struct CachedToken {
    token: String,
    expires_at: Instant,
}

pub enum TokenProvider {
    Static(String),
    Metadata {
        client: Client,
        url: String,
        cache: Mutex<Option<CachedToken>>,
    },
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenProvider::Static(_) => f.write_str("TokenProvider::Static([redacted])"),
            TokenProvider::Metadata { url, .. } => f
                .debug_struct("TokenProvider::Metadata")
                .field("url", url)
                .finish_non_exhaustive(),
        }
    }
}

impl TokenProvider {
    /// Uses `token` verbatim when present, the metadata server otherwise.
    #[must_use]
    pub fn from_static_or_metadata(token: Option<String>) -> Self {
        match token {
            Some(token) => Self::Static(token),
            None => Self::metadata(METADATA_TOKEN_URL),
        }
    }

    /// Metadata-server provider pointed at `url` (overridable for tests).
    #[must_use]
    pub fn metadata(url: &str) -> Self {
        Self::Metadata {
            client: metadata_client(),
            url: url.to_owned(),
            cache: Mutex::new(None),
        }
    }

    /// Returns a valid access token, refreshing a metadata token near expiry.
    ///
    /// # Errors
    ///
    /// Returns [`GcpError::Auth`] if the metadata server is unreachable or
    /// answers with anything but a token.
    pub async fn access_token(&self) -> Result<String, GcpError> {
        match self {
            TokenProvider::Static(token) => Ok(token.clone()),
            TokenProvider::Metadata { client, url, cache } => {
                let mut cached = cache.lock().await;
                if let Some(c) = cached.as_ref() {
                    if c.expires_at > Instant::now() + EXPIRY_MARGIN {
                        return Ok(c.token.clone());
                    }
                }

                let fresh = fetch_metadata_token(client, url).await?;
                let token = fresh.access_token.clone();
                *cached = Some(CachedToken {
                    token: fresh.access_token,
                    expires_at: expiry_after(Instant::now(), fresh.expires_in),
                });
                tracing::debug!(expires_in = fresh.expires_in, "refreshed metadata access token");
                Ok(token)
            }
        }
    }
}

fn metadata_client() -> Client {
    Client::builder()
        .timeout(METADATA_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "metadata client builder failed; using defaults");
            Client::new()
        })
}

/// `now + expires_in`, or `now` (already stale) if that overflows.
fn expiry_after(now: Instant, expires_in: u64) -> Instant {
    now.checked_add(Duration::from_secs(expires_in)).unwrap_or(now)
}

async fn fetch_metadata_token(client: &Client, url: &str) -> Result<MetadataToken, GcpError> {
    let response = client
        .get(url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| GcpError::Auth(format!("metadata server unreachable: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GcpError::Auth(format!(
            "metadata server answered {}",
            status.as_u16()
        )));
    }

    response
        .json::<MetadataToken>()
        .await
        .map_err(|e| GcpError::Auth(format!("malformed metadata token: {e}")))
}
