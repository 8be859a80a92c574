//! Authenticated, retried HTTP plumbing shared by the BigQuery and Storage clients.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;

use crate::auth::TokenProvider;
use crate::error::GcpError;
use crate::retry::retry_with_backoff;

/// Transport and retry knobs for Google API clients.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "tweetsink/0.1 (timeline-ingest)".to_string(),
            max_retries: 3,
            backoff_base_ms: 1_000,
        }
    }
}

/// Google's JSON error envelope: `{"error": {"code": 404, "message": "..."}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub(crate) struct Transport {
    client: Client,
    auth: Arc<TokenProvider>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl Transport {
    pub(crate) fn new(
        auth: Arc<TokenProvider>,
        settings: &TransportSettings,
    ) -> Result<Self, GcpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            auth,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Sends the request produced by `build` with a bearer token, retrying
    /// transient failures, and returns the raw body of a 2xx response.
    pub(crate) async fn execute<F>(&self, context: &str, build: F) -> Result<Vec<u8>, GcpError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let client = &self.client;
        let auth = self.auth.as_ref();
        let build = &build;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, move || async move {
            let token = auth.access_token().await?;
            let response = build(client).bearer_auth(token).send().await?;
            read_checked(response, context).await
        })
        .await
    }

    /// Like [`Transport::execute`] but parses the body as `T`.
    pub(crate) async fn execute_json<T, F>(&self, context: &str, build: F) -> Result<T, GcpError>
    where
        T: for<'de> Deserialize<'de>,
        F: Fn(&Client) -> RequestBuilder,
    {
        let body = self.execute(context, build).await?;
        serde_json::from_slice(&body).map_err(|e| GcpError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Parses a base URL and guarantees exactly one trailing slash.
pub(crate) fn normalise_base_url(raw: &str) -> Result<Url, GcpError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|_| GcpError::InvalidBaseUrl(raw.to_owned()))
}

async fn read_checked(response: Response, context: &str) -> Result<Vec<u8>, GcpError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(GcpError::RateLimited {
            context: context.to_owned(),
        });
    }
    if status.is_server_error() {
        return Err(GcpError::Server {
            status: status.as_u16(),
            context: context.to_owned(),
        });
    }

    let body = response.bytes().await?.to_vec();
    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        return Err(GcpError::Api {
            status: status.as_u16(),
            context: context.to_owned(),
            message,
        });
    }

    Ok(body)
}
