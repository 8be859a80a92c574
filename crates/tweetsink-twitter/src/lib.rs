//! Client for the Twitter REST v1.1 endpoints the ingest job needs.
//!
//! App-only (bearer) authentication, list membership, and user timelines
//! walked backward from the newest post down to a `since_id` watermark.

pub mod client;
pub mod error;
pub mod types;

mod retry;

pub use client::{ClientSettings, Credentials, TwitterClient, MIN_SINCE_ID};
pub use error::TwitterError;
