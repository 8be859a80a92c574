use thiserror::Error;
use tweetsink_core::ConfigError;
use tweetsink_gcp::GcpError;
use tweetsink_twitter::TwitterError;

/// A post that violates the platform's structural contract.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("post is not a JSON object")]
    NotAnObject,

    #[error("post {} is missing required field '{field}'", .id.as_deref().unwrap_or("<unknown>"))]
    MissingField {
        id: Option<String>,
        field: &'static str,
    },

    #[error("post {id} has unparsable created_at '{raw}'")]
    InvalidTimestamp { id: String, raw: String },

    #[error("post {id} is malformed: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("trigger payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("trigger payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("trigger payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatal run errors. Per-account fetch failures and per-page insert failures
/// never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read job config from {location}: {source}")]
    ConfigStore {
        location: String,
        #[source]
        source: GcpError,
    },

    #[error("failed to connect to Twitter: {0}")]
    Connect(#[source] TwitterError),

    #[error("failed to list members of {list}: {source}")]
    ListMembers {
        list: String,
        #[source]
        source: TwitterError,
    },

    #[error("failed to query active accounts: {0}")]
    Roster(#[source] GcpError),

    #[error("failed to query latest ids: {0}")]
    Watermark(#[source] GcpError),

    #[error(transparent)]
    Map(#[from] MapError),
}
