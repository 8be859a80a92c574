use thiserror::Error;

/// Errors returned by the Twitter API client.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the request with a documented error
    /// (suspended or deleted account, protected timeline, bad list, ...).
    #[error("Twitter API error {status} for {context}: {message}")]
    Api {
        status: u16,
        context: String,
        message: String,
    },

    /// HTTP 429; the per-window request cap is exhausted.
    #[error("rate limited on {context} (window resets at {reset_epoch:?})")]
    RateLimited {
        context: String,
        reset_epoch: Option<u64>,
    },

    /// Any 5xx status.
    #[error("Twitter server error {status} for {context}")]
    Server { status: u16, context: String },

    /// Bearer token exchange failed or no usable credentials were supplied.
    #[error("Twitter authentication failed: {0}")]
    Auth(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
