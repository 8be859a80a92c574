//! The tracked account set: list members plus the stored active roster.

use std::collections::BTreeSet;

use crate::error::PipelineError;
use crate::services::{PostSource, Warehouse};
use crate::settings::PipelineSettings;
use crate::watermark::cell_string;

/// Union of both sources, deduplicated by exact screen name.
#[must_use]
pub fn merge_accounts(list_members: Vec<String>, roster: Vec<String>) -> BTreeSet<String> {
    list_members.into_iter().chain(roster).collect()
}

/// Screen names flagged `active` in the stored accounts table.
///
/// # Errors
///
/// Returns [`PipelineError::Roster`] if the query fails.
pub async fn active_roster<W: Warehouse>(
    warehouse: &W,
    settings: &PipelineSettings,
) -> Result<Vec<String>, PipelineError> {
    let sql = format!(
        "SELECT screen_name FROM {} WHERE active = TRUE",
        settings.accounts_table
    );
    let rows = warehouse
        .query(&sql, settings.query_max_results)
        .await
        .map_err(PipelineError::Roster)?;
    Ok(rows
        .iter()
        .filter_map(|row| cell_string(row, "screen_name"))
        .collect())
}

/// Queries list membership and the roster concurrently and merges them.
///
/// # Errors
///
/// Either query failing fails the whole resolution.
pub async fn resolve_accounts<S, W>(
    source: &S,
    warehouse: &W,
    settings: &PipelineSettings,
) -> Result<BTreeSet<String>, PipelineError>
where
    S: PostSource,
    W: Warehouse,
{
    let members = async {
        source
            .list_members(&settings.list_owner, &settings.list_slug)
            .await
            .map_err(|source| PipelineError::ListMembers {
                list: format!("{}/{}", settings.list_owner, settings.list_slug),
                source,
            })
    };
    let (members, roster) = tokio::try_join!(members, active_roster(warehouse, settings))?;

    let (from_list, from_roster) = (members.len(), roster.len());
    let accounts = merge_accounts(members, roster);
    tracing::info!(
        from_list,
        from_roster,
        accounts = accounts.len(),
        "resolved tracked accounts"
    );
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn union_deduplicates_exact_matches() {
        let merged = merge_accounts(names(&["alice", "bob"]), names(&["bob", "carol", "alice"]));
        assert_eq!(merged.len(), 3);
        assert!(merged.contains("carol"));
    }

    #[test]
    fn identifiers_are_case_sensitive() {
        let merged = merge_accounts(names(&["Alice"]), names(&["alice"]));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn empty_sources_give_empty_set() {
        assert!(merge_accounts(Vec::new(), Vec::new()).is_empty());
    }
}
