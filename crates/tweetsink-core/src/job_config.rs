//! The JSON job config document held in the config store.
//!
//! ```json
//! {
//!   "twitter":  { "consumerKey": "...", "consumerSecret": "...",
//!                 "listOwner": "someone", "listSlug": "tracked" },
//!   "bigQuery": { "projectId": "...", "datasetId": "...", "insertTable": "...",
//!                 "accountsTable": "...", "latestIdsView": "..." }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ConfigError;

/// Location of the job config document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A Cloud Storage object, written as `gs://bucket/object`.
    Gcs { bucket: String, object: String },
    /// A JSON file on local disk.
    File(PathBuf),
}

impl ConfigSource {
    /// Parses a `gs://bucket/object` URI or falls back to a filesystem path.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the value is empty or a `gs://`
    /// URI lacks a bucket or object name.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("config source is empty".to_string());
        }

        let Some(rest) = raw.strip_prefix("gs://") else {
            return Ok(Self::File(PathBuf::from(raw)));
        };

        match rest.split_once('/') {
            Some((bucket, object)) if !bucket.is_empty() && !object.is_empty() => Ok(Self::Gcs {
                bucket: bucket.to_string(),
                object: object.to_string(),
            }),
            _ => Err(format!("'{raw}' must look like gs://bucket/object")),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Gcs { bucket, object } => write!(f, "gs://{bucket}/{object}"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub twitter: TwitterSection,
    #[serde(rename = "bigQuery")]
    pub big_query: BigQuerySection,
}

impl JobConfig {
    /// Parses a config document from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Document`] if the bytes are not a valid document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Reads and parses a config document from local disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Document`] if its contents do not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_slice(&bytes)
    }
}

/// Twitter credentials and the list whose members are tracked.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterSection {
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(default)]
    pub consumer_secret: Option<String>,
    /// Pre-issued app-only token; skips the `oauth2/token` exchange.
    #[serde(default)]
    pub bearer_token: Option<String>,
    pub list_owner: String,
    pub list_slug: String,
}

impl std::fmt::Debug for TwitterSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterSection")
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("list_owner", &self.list_owner)
            .field("list_slug", &self.list_slug)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigQuerySection {
    pub project_id: String,
    pub dataset_id: String,
    pub insert_table: String,
    /// Stored roster of tracked accounts; must expose `screen_name` and `active`.
    pub accounts_table: String,
    /// One row per account with its highest stored post id (`screen_name`, `max_id`).
    pub latest_ids_view: String,
}

impl BigQuerySection {
    /// Fully-qualified, backtick-quoted reference to a table or view in the dataset.
    #[must_use]
    pub fn qualified(&self, name: &str) -> String {
        format!("`{}.{}.{}`", self.project_id, self.dataset_id, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> &'static str {
        r#"{
            "twitter": {
                "consumerKey": "ck",
                "consumerSecret": "cs",
                "listOwner": "newsroom",
                "listSlug": "reporters"
            },
            "bigQuery": {
                "projectId": "analytics-prod",
                "datasetId": "twitter",
                "insertTable": "tweets",
                "accountsTable": "accounts",
                "latestIdsView": "latest_ids"
            }
        }"#
    }

    #[test]
    fn parses_document_with_camel_case_keys() {
        let cfg = JobConfig::from_slice(sample_document().as_bytes()).unwrap();
        assert_eq!(cfg.twitter.consumer_key.as_deref(), Some("ck"));
        assert!(cfg.twitter.bearer_token.is_none());
        assert_eq!(cfg.twitter.list_slug, "reporters");
        assert_eq!(cfg.big_query.dataset_id, "twitter");
        assert_eq!(cfg.big_query.latest_ids_view, "latest_ids");
    }

    #[test]
    fn missing_big_query_section_is_an_error() {
        let result = JobConfig::from_slice(br#"{"twitter": {"listOwner": "a", "listSlug": "b"}}"#);
        assert!(matches!(result, Err(ConfigError::Document(_))));
    }

    #[test]
    fn qualified_names_are_backtick_quoted() {
        let cfg = JobConfig::from_slice(sample_document().as_bytes()).unwrap();
        assert_eq!(
            cfg.big_query.qualified("latest_ids"),
            "`analytics-prod.twitter.latest_ids`"
        );
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = JobConfig::from_slice(sample_document().as_bytes()).unwrap();
        let printed = format!("{:?}", cfg.twitter);
        assert!(!printed.contains("\"cs\""));
        assert!(printed.contains("[redacted]"));
    }

    #[test]
    fn config_source_parses_gcs_uri() {
        assert_eq!(
            ConfigSource::parse("gs://bucket/nested/config.json").unwrap(),
            ConfigSource::Gcs {
                bucket: "bucket".to_string(),
                object: "nested/config.json".to_string(),
            }
        );
    }

    #[test]
    fn config_source_rejects_empty() {
        assert!(ConfigSource::parse("  ").is_err());
    }

    #[test]
    fn from_file_reports_missing_path() {
        let result = JobConfig::from_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
