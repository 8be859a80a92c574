//! End-to-end run: accounts → cursors → posts → rows → eligible rows →
//! pages → inserts.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::accounts::resolve_accounts;
use crate::batch::paginate;
use crate::error::PipelineError;
use crate::fetch::fetch_posts;
use crate::insert::{insert_pages, RunStatus};
use crate::retention::RetentionWindow;
use crate::row::{map_post, AnalyticalRow};
use crate::services::{PostSource, Warehouse};
use crate::settings::PipelineSettings;
use crate::trigger::TriggerPayload;
use crate::watermark::{latest_ids, resolve_cursors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub accounts: usize,
    pub posts_fetched: usize,
    pub rows_mapped: usize,
    pub rows_eligible: usize,
    pub pages: usize,
    pub pages_partially_failed: usize,
    pub pages_failed: usize,
}

impl RunSummary {
    /// The terminal message reported to the caller.
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.status.message()
    }
}

/// Runs one ingest pass. `today` anchors the retention window.
///
/// # Errors
///
/// Fails on account resolution, the watermark query, or a post that breaks
/// the platform contract. Per-account fetch failures and per-page insert
/// failures are logged and reflected in the summary instead.
pub async fn run_pipeline<S, W>(
    source: &S,
    warehouse: &W,
    settings: &PipelineSettings,
    trigger: &TriggerPayload,
    today: NaiveDate,
) -> Result<RunSummary, PipelineError>
where
    S: PostSource,
    W: Warehouse,
{
    let run_id = Uuid::new_v4();
    match trigger.value() {
        Some(payload) => tracing::info!(%run_id, %payload, "run triggered with payload"),
        None => tracing::info!(%run_id, "run triggered"),
    }

    let accounts = resolve_accounts(source, warehouse, settings).await?;
    let lookup = latest_ids(warehouse, settings).await?;
    let cursors = resolve_cursors(&accounts, &lookup);

    let posts = fetch_posts(source, cursors, settings.fetch_max_concurrent).await;
    let posts_fetched = posts.len();

    let rows = posts
        .iter()
        .map(map_post)
        .collect::<Result<Vec<AnalyticalRow>, _>>()?;
    let rows_mapped = rows.len();

    let window = RetentionWindow::ending_on(today, settings.start_date, settings.retention_days);
    let eligible: Vec<AnalyticalRow> = rows.into_iter().filter(|r| window.keeps(r)).collect();
    let rows_eligible = eligible.len();
    tracing::info!(
        %run_id,
        rows_mapped,
        rows_eligible,
        start_date = %window.start_date,
        since_date = %window.since_date,
        "applied retention window"
    );

    let pages = paginate(eligible, settings.page_size);
    let page_count = pages.len();
    let report = insert_pages(warehouse, &settings.insert_table, pages).await;

    let summary = RunSummary {
        run_id,
        status: report.status,
        accounts: accounts.len(),
        posts_fetched,
        rows_mapped,
        rows_eligible,
        pages: page_count,
        pages_partially_failed: report.partially_failed(),
        pages_failed: report.failed(),
    };
    tracing::info!(
        %run_id,
        status = %summary.status,
        accounts = summary.accounts,
        posts_fetched,
        pages = page_count,
        "run finished"
    );
    Ok(summary)
}
