//! Shared configuration for the tweetsink workspace.
//!
//! Two layers: [`AppConfig`] is read from the process environment (optionally
//! seeded from `.env`), and [`JobConfig`] is the JSON document fetched from
//! the config store that carries API credentials and BigQuery identifiers.

pub mod app_config;
pub mod config;
pub mod job_config;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use job_config::{BigQuerySection, ConfigSource, JobConfig, TwitterSection};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config document: {0}")]
    Document(#[from] serde_json::Error),

    /// The document parsed but lacks a value the run needs.
    #[error("incomplete config document: {0}")]
    Incomplete(String),
}
