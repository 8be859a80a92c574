use chrono::NaiveDate;

use crate::job_config::ConfigSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Where the JSON job config document lives (`gs://` object or local path).
    pub config_source: ConfigSource,
    /// Posts dated on or before this day are never inserted.
    pub start_date: NaiveDate,
    /// Rolling window in days; posts older than `today - retention_days` are dropped.
    pub retention_days: u32,
    /// Rows per `insertAll` call. Always greater than zero.
    pub page_size: usize,
    pub fetch_max_concurrent: usize,
    pub timeline_pages_per_account: u32,
    pub query_max_results: u32,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Cron expression (with seconds) used by the `schedule` command.
    pub schedule: String,
    /// Static GCP access token; when absent the metadata server is used.
    pub gcp_access_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("config_source", &self.config_source)
            .field("start_date", &self.start_date)
            .field("retention_days", &self.retention_days)
            .field("page_size", &self.page_size)
            .field("fetch_max_concurrent", &self.fetch_max_concurrent)
            .field(
                "timeline_pages_per_account",
                &self.timeline_pages_per_account,
            )
            .field("query_max_results", &self.query_max_results)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("schedule", &self.schedule)
            .field(
                "gcp_access_token",
                &self.gcp_access_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
