use thiserror::Error;

/// Per-row rejection reported by `tabledata.insertAll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowInsertError {
    /// Index of the rejected row within the submitted request.
    pub index: usize,
    pub reason: Option<String>,
    pub message: String,
}

/// Errors returned by the Google Cloud clients.
#[derive(Debug, Error)]
pub enum GcpError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-retriable 4xx answer from a Google API.
    #[error("Google API error {status} for {context}: {message}")]
    Api {
        status: u16,
        context: String,
        message: String,
    },

    #[error("rate limited on {context}")]
    RateLimited { context: String },

    #[error("Google server error {status} for {context}")]
    Server { status: u16, context: String },

    /// No usable access token could be obtained.
    #[error("GCP authentication failed: {0}")]
    Auth(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The query job did not finish within the polling budget.
    #[error("query job {job_id} did not complete after {polls} polls")]
    QueryIncomplete { job_id: String, polls: usize },

    /// Some rows of an insert were rejected; the rest were accepted.
    #[error("partial failure: {failed_rows} of the submitted rows were rejected")]
    PartialFailure {
        failed_rows: usize,
        errors: Vec<RowInsertError>,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
