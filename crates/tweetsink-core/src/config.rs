use chrono::NaiveDate;

use crate::app_config::{AppConfig, Environment};
use crate::job_config::ConfigSource;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("TWEETSINK_ENV", "development"))?;
    let log_level = or_default("TWEETSINK_LOG_LEVEL", "info");

    let config_source = ConfigSource::parse(&require("TWEETSINK_CONFIG_SOURCE")?)
        .map_err(|reason| invalid("TWEETSINK_CONFIG_SOURCE", reason))?;

    let start_date_raw = or_default("TWEETSINK_START_DATE", "2020-01-01");
    let start_date = NaiveDate::parse_from_str(&start_date_raw, "%Y-%m-%d")
        .map_err(|e| invalid("TWEETSINK_START_DATE", e.to_string()))?;

    let retention_days = parse_u32("TWEETSINK_RETENTION_DAYS", "180")?;

    let page_size = parse_usize("TWEETSINK_PAGE_SIZE", "500")?;
    if page_size == 0 {
        return Err(invalid(
            "TWEETSINK_PAGE_SIZE",
            "page size must be greater than zero".to_string(),
        ));
    }

    let fetch_max_concurrent = parse_usize("TWEETSINK_FETCH_MAX_CONCURRENT", "8")?;
    let timeline_pages_per_account = parse_u32("TWEETSINK_TIMELINE_PAGES_PER_ACCOUNT", "1")?;
    let query_max_results = parse_u32("TWEETSINK_QUERY_MAX_RESULTS", "10000")?;
    if query_max_results == 0 {
        return Err(invalid(
            "TWEETSINK_QUERY_MAX_RESULTS",
            "query max results must be greater than zero".to_string(),
        ));
    }
    let request_timeout_secs = parse_u64("TWEETSINK_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("TWEETSINK_USER_AGENT", "tweetsink/0.1 (timeline-ingest)");
    let max_retries = parse_u32("TWEETSINK_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("TWEETSINK_RETRY_BACKOFF_BASE_MS", "1000")?;
    let schedule = or_default("TWEETSINK_SCHEDULE", "0 0 * * * *");
    let gcp_access_token = lookup("GOOGLE_OAUTH_ACCESS_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());

    Ok(AppConfig {
        env,
        log_level,
        config_source,
        start_date,
        retention_days,
        page_size,
        fetch_max_concurrent,
        timeline_pages_per_account,
        query_max_results,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        schedule,
        gcp_access_token,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TWEETSINK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
