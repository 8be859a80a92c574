//! Per-account watermarks: the highest post id already stored.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use tweetsink_gcp::QueryRow;
use tweetsink_twitter::MIN_SINCE_ID;

use crate::error::PipelineError;
use crate::services::Warehouse;
use crate::settings::PipelineSettings;

/// Where the next fetch for an account starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub screen_name: String,
    /// Highest stored post id, or `None` if the account was never fetched.
    pub max_id: Option<String>,
}

impl Cursor {
    /// The exclusive lower bound for the next fetch.
    #[must_use]
    pub fn since_id(&self) -> &str {
        self.max_id.as_deref().unwrap_or(MIN_SINCE_ID)
    }
}

/// Reads the latest-ids view into `screen_name -> max_id`.
///
/// Rows with a null or missing `max_id` are left out, so those accounts
/// resolve to a full fetch.
///
/// # Errors
///
/// Returns [`PipelineError::Watermark`] if the query fails.
pub async fn latest_ids<W: Warehouse>(
    warehouse: &W,
    settings: &PipelineSettings,
) -> Result<HashMap<String, String>, PipelineError> {
    let sql = format!(
        "SELECT screen_name, max_id FROM {}",
        settings.latest_ids_view
    );
    let rows = warehouse
        .query(&sql, settings.query_max_results)
        .await
        .map_err(PipelineError::Watermark)?;

    let lookup: HashMap<String, String> = rows
        .iter()
        .filter_map(|row| Some((cell_string(row, "screen_name")?, cell_string(row, "max_id")?)))
        .collect();
    tracing::debug!(accounts = lookup.len(), "loaded latest ids");
    Ok(lookup)
}

#[must_use]
pub fn make_cursor(screen_name: &str, lookup: &HashMap<String, String>) -> Cursor {
    Cursor {
        screen_name: screen_name.to_owned(),
        max_id: lookup.get(screen_name).cloned(),
    }
}

/// One cursor per account, in account order.
#[must_use]
pub fn resolve_cursors(accounts: &BTreeSet<String>, lookup: &HashMap<String, String>) -> Vec<Cursor> {
    accounts
        .iter()
        .map(|name| make_cursor(name, lookup))
        .collect()
}

/// Query cells arrive as strings (`INT64` included) but tolerate raw numbers.
pub(crate) fn cell_string(row: &QueryRow, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
