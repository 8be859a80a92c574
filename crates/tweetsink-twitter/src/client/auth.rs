//! App-only bearer token exchange (`POST oauth2/token`).

use reqwest::{Client, Url};

use crate::error::TwitterError;
use crate::retry::retry_with_backoff;
use crate::types::TokenResponse;

use super::read_checked;

pub(super) async fn exchange_bearer_token(
    client: &Client,
    base_url: &Url,
    consumer_key: &str,
    consumer_secret: &str,
    max_retries: u32,
    backoff_base_ms: u64,
) -> Result<String, TwitterError> {
    let url = base_url
        .join("oauth2/token")
        .map_err(|_| TwitterError::InvalidBaseUrl(base_url.to_string()))?;
    let url = &url;

    let body = retry_with_backoff(max_retries, backoff_base_ms, move || async move {
        let response = client
            .post(url.clone())
            .basic_auth(consumer_key, Some(consumer_secret))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .body("grant_type=client_credentials")
            .send()
            .await?;
        read_checked(response, "oauth2/token").await
    })
    .await
    .map_err(|err| match err {
        TwitterError::Api { message, .. } => TwitterError::Auth(message),
        other => other,
    })?;

    let token: TokenResponse =
        serde_json::from_str(&body).map_err(|e| TwitterError::Deserialize {
            context: "oauth2/token".to_owned(),
            source: e,
        })?;

    if !token.token_type.eq_ignore_ascii_case("bearer") {
        return Err(TwitterError::Auth(format!(
            "unexpected token type '{}'",
            token.token_type
        )));
    }

    tracing::debug!("exchanged consumer credentials for app-only bearer token");
    Ok(token.access_token)
}
