//! Run settings derived from the environment config and the job config document.

use std::num::NonZeroUsize;

use chrono::NaiveDate;
use tweetsink_core::{AppConfig, ConfigError, JobConfig, TwitterSection};
use tweetsink_gcp::{TableRef, TransportSettings};
use tweetsink_twitter::{ClientSettings, Credentials};

/// Everything [`crate::run_pipeline`] needs besides its two services.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub list_owner: String,
    pub list_slug: String,
    /// Backtick-quoted roster table, ready to splice into SQL.
    pub accounts_table: String,
    /// Backtick-quoted latest-ids view, ready to splice into SQL.
    pub latest_ids_view: String,
    pub insert_table: TableRef,
    pub start_date: NaiveDate,
    pub retention_days: u32,
    pub page_size: NonZeroUsize,
    pub fetch_max_concurrent: usize,
    pub query_max_results: u32,
}

impl PipelineSettings {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if the page size is zero.
    pub fn from_config(app: &AppConfig, job: &JobConfig) -> Result<Self, ConfigError> {
        let page_size =
            NonZeroUsize::new(app.page_size).ok_or_else(|| ConfigError::InvalidEnvVar {
                var: "TWEETSINK_PAGE_SIZE".to_string(),
                reason: "must be greater than zero".to_string(),
            })?;
        let bq = &job.big_query;

        Ok(Self {
            list_owner: job.twitter.list_owner.clone(),
            list_slug: job.twitter.list_slug.clone(),
            accounts_table: bq.qualified(&bq.accounts_table),
            latest_ids_view: bq.qualified(&bq.latest_ids_view),
            insert_table: TableRef {
                project_id: bq.project_id.clone(),
                dataset_id: bq.dataset_id.clone(),
                table_id: bq.insert_table.clone(),
            },
            start_date: app.start_date,
            retention_days: app.retention_days,
            page_size,
            fetch_max_concurrent: app.fetch_max_concurrent.max(1),
            query_max_results: app.query_max_results,
        })
    }
}

/// A preset bearer token wins over consumer key/secret.
///
/// # Errors
///
/// Returns [`ConfigError::Incomplete`] when neither a bearer token nor both
/// consumer credentials are present.
pub fn twitter_credentials(section: &TwitterSection) -> Result<Credentials, ConfigError> {
    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.trim().is_empty()).map(str::to_owned);

    if let Some(token) = present(&section.bearer_token) {
        return Ok(Credentials::Bearer(token));
    }
    match (present(&section.consumer_key), present(&section.consumer_secret)) {
        (Some(key), Some(secret)) => Ok(Credentials::Consumer { key, secret }),
        _ => Err(ConfigError::Incomplete(
            "twitter needs bearerToken or both consumerKey and consumerSecret".to_string(),
        )),
    }
}

#[must_use]
pub fn twitter_client_settings(app: &AppConfig) -> ClientSettings {
    ClientSettings {
        timeout_secs: app.request_timeout_secs,
        user_agent: app.user_agent.clone(),
        max_retries: app.max_retries,
        backoff_base_ms: app.retry_backoff_base_ms,
    }
}

#[must_use]
pub fn gcp_transport_settings(app: &AppConfig) -> TransportSettings {
    TransportSettings {
        timeout_secs: app.request_timeout_secs,
        user_agent: app.user_agent.clone(),
        max_retries: app.max_retries,
        backoff_base_ms: app.retry_backoff_base_ms,
    }
}
