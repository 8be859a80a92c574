//! HTTP client for the Twitter REST v1.1 API.
//!
//! Wraps `reqwest` with app-only bearer authentication, typed error mapping,
//! and retry on transient failures. Use [`TwitterClient::connect`] in
//! production or [`TwitterClient::connect_with_base_url`] to point at a mock
//! server in tests.

mod auth;
mod timeline;

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};

use crate::error::TwitterError;
use crate::retry::retry_with_backoff;
use crate::types::{ErrorBody, ListMembersPage};

/// `since_id` used for accounts that were never fetched: every post id is
/// strictly greater than it, so the full available timeline is returned.
pub const MIN_SINCE_ID: &str = "1";

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/";
const LIST_PAGE_SIZE: &str = "5000";
/// Guard against list cursors that never reach `"0"`.
const MAX_LIST_PAGES: usize = 50;

/// How the client authenticates.
#[derive(Clone)]
pub enum Credentials {
    /// A pre-issued app-only bearer token.
    Bearer(String),
    /// Consumer key/secret exchanged for a bearer token at connect time.
    Consumer { key: String, secret: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer([redacted])"),
            Credentials::Consumer { key, .. } => f
                .debug_struct("Consumer")
                .field("key", key)
                .field("secret", &"[redacted]")
                .finish(),
        }
    }
}

/// Transport and retry knobs shared by every request.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "tweetsink/0.1 (timeline-ingest)".to_string(),
            max_retries: 3,
            backoff_base_ms: 1_000,
        }
    }
}

/// Client for the Twitter REST v1.1 API, authenticated with an app-only
/// bearer token.
pub struct TwitterClient {
    client: Client,
    base_url: Url,
    bearer_token: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl TwitterClient {
    /// Connects to the production API, exchanging consumer credentials for a
    /// bearer token when needed.
    ///
    /// # Errors
    ///
    /// Returns [`TwitterError::Auth`] if the token exchange is rejected, or
    /// [`TwitterError::Http`] if the HTTP client cannot be built.
    pub async fn connect(
        credentials: Credentials,
        settings: &ClientSettings,
    ) -> Result<Self, TwitterError> {
        Self::connect_with_base_url(credentials, settings, DEFAULT_BASE_URL).await
    }

    /// Connects to a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`TwitterClient::connect`], plus
    /// [`TwitterError::InvalidBaseUrl`] if `base_url` does not parse.
    pub async fn connect_with_base_url(
        credentials: Credentials,
        settings: &ClientSettings,
        base_url: &str,
    ) -> Result<Self, TwitterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of replacing.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| TwitterError::InvalidBaseUrl(base_url.to_owned()))?;

        let bearer_token = match credentials {
            Credentials::Bearer(token) => token,
            Credentials::Consumer { key, secret } => {
                auth::exchange_bearer_token(
                    &client,
                    &base_url,
                    &key,
                    &secret,
                    settings.max_retries,
                    settings.backoff_base_ms,
                )
                .await?
            }
        };

        Ok(Self {
            client,
            base_url,
            bearer_token,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// Returns the screen names of every member of a list, following
    /// `next_cursor_str` until the API reports the last page.
    ///
    /// # Errors
    ///
    /// - [`TwitterError::Api`] if the list does not exist or is private.
    /// - [`TwitterError::RateLimited`] / [`TwitterError::Server`] after retries.
    /// - [`TwitterError::Deserialize`] if a page does not match the expected shape.
    pub async fn list_members(
        &self,
        owner_screen_name: &str,
        slug: &str,
    ) -> Result<Vec<String>, TwitterError> {
        let context = format!("lists/members({owner_screen_name}/{slug})");
        let mut members = Vec::new();
        let mut cursor = "-1".to_string();

        for _ in 0..MAX_LIST_PAGES {
            let url = self.endpoint(
                "1.1/lists/members.json",
                &[
                    ("owner_screen_name", owner_screen_name),
                    ("slug", slug),
                    ("count", LIST_PAGE_SIZE),
                    ("cursor", &cursor),
                    ("skip_status", "true"),
                    ("include_entities", "false"),
                ],
            );
            let body = self.get_json(&url, &context).await?;
            let page: ListMembersPage =
                serde_json::from_value(body).map_err(|e| TwitterError::Deserialize {
                    context: context.clone(),
                    source: e,
                })?;

            members.extend(page.users.into_iter().map(|u| u.screen_name));

            if page.next_cursor_str == "0" {
                return Ok(members);
            }
            cursor = page.next_cursor_str;
        }

        tracing::warn!(
            list = %context,
            pages = MAX_LIST_PAGES,
            "list membership cursor did not terminate; returning members collected so far"
        );
        Ok(members)
    }

    /// Builds a request URL under the base URL with percent-encoded query parameters.
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self
            .base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends an authenticated GET with retry and parses the body as JSON.
    async fn get_json(&self, url: &Url, context: &str) -> Result<serde_json::Value, TwitterError> {
        let client = &self.client;
        let token = self.bearer_token.as_str();
        retry_with_backoff(self.max_retries, self.backoff_base_ms, move || async move {
            let response = client.get(url.clone()).bearer_auth(token).send().await?;
            let body = read_checked(response, context).await?;
            serde_json::from_str(&body).map_err(|e| TwitterError::Deserialize {
                context: context.to_owned(),
                source: e,
            })
        })
        .await
    }
}

/// Maps non-2xx statuses to typed errors and returns the body text otherwise.
async fn read_checked(response: Response, context: &str) -> Result<String, TwitterError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset_epoch = response
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(TwitterError::RateLimited {
            context: context.to_owned(),
            reset_epoch,
        });
    }

    if status.is_server_error() {
        return Err(TwitterError::Server {
            status: status.as_u16(),
            context: context.to_owned(),
        });
    }

    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());
        return Err(TwitterError::Api {
            status: status.as_u16(),
            context: context.to_owned(),
            message,
        });
    }

    Ok(body)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
