//! Incremental timeline ingest.
//!
//! Resolves the tracked accounts, reads each account's watermark, fetches
//! newer posts with bounded concurrency, flattens them into analytical rows,
//! applies the retention window, and streams the rows into BigQuery in pages.

pub mod accounts;
pub mod batch;
pub mod config_store;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod insert;
pub mod nested;
pub mod retention;
pub mod row;
pub mod services;
pub mod settings;
pub mod trigger;
pub mod watermark;

pub use accounts::{merge_accounts, resolve_accounts};
pub use batch::{paginate, Page};
pub use config_store::load_job_config;
pub use driver::{run_pipeline, RunSummary};
pub use error::{MapError, PipelineError, TriggerError};
pub use fetch::fetch_posts;
pub use insert::{insert_pages, InsertReport, PageOutcome, RunStatus};
pub use nested::Nested;
pub use retention::RetentionWindow;
pub use row::{map_post, AnalyticalRow, RawPost};
pub use services::{PostSource, TwitterSource, Warehouse};
pub use settings::PipelineSettings;
pub use trigger::TriggerPayload;
pub use watermark::{latest_ids, make_cursor, resolve_cursors, Cursor};
