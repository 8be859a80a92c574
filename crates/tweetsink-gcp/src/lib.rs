//! Google Cloud clients used by the ingest job.
//!
//! - [`BigQueryClient`]: standard-SQL queries (`jobs.query`) and streaming
//!   inserts (`tabledata.insertAll`).
//! - [`StorageClient`]: single-object downloads, used as the config store.
//! - [`TokenProvider`]: OAuth access tokens from the environment or the
//!   metadata server.

pub mod auth;
pub mod bigquery;
pub mod error;
pub mod storage;
pub mod types;

mod retry;
mod transport;

pub use auth::TokenProvider;
pub use bigquery::BigQueryClient;
pub use error::{GcpError, RowInsertError};
pub use storage::StorageClient;
pub use transport::TransportSettings;
pub use types::{InsertAllResponse, InsertOptions, InsertRow, QueryRow, TableRef};
