//! Concurrent page inserts with per-page outcome reporting.

use futures::future::join_all;
use tweetsink_gcp::{GcpError, InsertOptions, InsertRow, RowInsertError, TableRef};

use crate::batch::Page;
use crate::row::AnalyticalRow;
use crate::services::Warehouse;

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    NothingToInsert,
}

impl RunStatus {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            RunStatus::Completed => "Process completed",
            RunStatus::NothingToInsert => "Nothing to insert",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug)]
pub enum PageOutcome {
    Inserted {
        index: usize,
        rows: usize,
    },
    /// The listed rows were rejected; the rest of the page landed.
    PartialFailure {
        index: usize,
        rows: usize,
        errors: Vec<RowInsertError>,
    },
    /// Nothing from the page landed.
    Failed {
        index: usize,
        rows: usize,
        error: GcpError,
    },
}

#[derive(Debug)]
pub struct InsertReport {
    pub status: RunStatus,
    pub outcomes: Vec<PageOutcome>,
}

impl InsertReport {
    #[must_use]
    pub fn partially_failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PageOutcome::PartialFailure { .. }))
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PageOutcome::Failed { .. }))
            .count()
    }
}

/// Submits every page as its own `insertAll` call, all at once.
///
/// Rows go out raw with their post id as `insertId` and `skipInvalidRows`
/// set. Page failures are logged, never retried here, and never fail the
/// run: once every page settles the status is [`RunStatus::Completed`].
pub async fn insert_pages<W: Warehouse>(
    warehouse: &W,
    table: &TableRef,
    pages: Vec<Page<AnalyticalRow>>,
) -> InsertReport {
    if pages.is_empty() {
        tracing::info!(%table, "no eligible rows; nothing to insert");
        return InsertReport {
            status: RunStatus::NothingToInsert,
            outcomes: Vec::new(),
        };
    }

    let options = InsertOptions {
        skip_invalid_rows: true,
        ignore_unknown_values: false,
    };
    let calls = pages.into_iter().map(move |page| async move {
        let index = page.index;
        let rows: Vec<InsertRow<AnalyticalRow>> = page
            .items
            .into_iter()
            .map(|row| InsertRow {
                insert_id: Some(row.id_str.clone()),
                json: row,
            })
            .collect();
        let count = rows.len();

        match warehouse.insert(table, &rows, options).await {
            Ok(()) => {
                tracing::debug!(page = index, rows = count, "page inserted");
                PageOutcome::Inserted { index, rows: count }
            }
            Err(GcpError::PartialFailure {
                failed_rows,
                errors,
            }) => {
                tracing::warn!(
                    page = index,
                    rows = count,
                    failed_rows,
                    first_error = errors.first().map(|e| e.message.as_str()),
                    "page partially inserted"
                );
                PageOutcome::PartialFailure {
                    index,
                    rows: count,
                    errors,
                }
            }
            Err(error) => {
                tracing::error!(page = index, rows = count, error = %error, "page insert failed");
                PageOutcome::Failed {
                    index,
                    rows: count,
                    error,
                }
            }
        }
    });

    let outcomes = join_all(calls).await;
    let report = InsertReport {
        status: RunStatus::Completed,
        outcomes,
    };
    tracing::info!(
        %table,
        pages = report.outcomes.len(),
        partially_failed = report.partially_failed(),
        failed = report.failed(),
        "insert complete"
    );
    report
}
