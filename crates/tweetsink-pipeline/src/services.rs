//! The two external services a run talks to, as traits so the pipeline can be
//! driven by in-memory fakes.

use std::future::Future;

use serde_json::Value;
use tweetsink_gcp::{BigQueryClient, GcpError, InsertOptions, InsertRow, QueryRow, TableRef};
use tweetsink_twitter::{TwitterClient, TwitterError};

use crate::nested::Nested;
use crate::row::{AnalyticalRow, RawPost};

/// Where posts and list memberships come from.
pub trait PostSource: Sync {
    /// Screen names of every member of `owner/slug`.
    fn list_members(
        &self,
        owner: &str,
        slug: &str,
    ) -> impl Future<Output = Result<Vec<String>, TwitterError>> + Send;

    /// Posts by `screen_name` strictly newer than `since_id`, as returned by
    /// the platform (possibly several pages deep).
    fn timeline_since(
        &self,
        screen_name: &str,
        since_id: &str,
    ) -> impl Future<Output = Result<Nested<RawPost>, TwitterError>> + Send;
}

/// Analytical store: queried for accounts and watermarks, appended with rows.
pub trait Warehouse: Sync {
    fn query(
        &self,
        sql: &str,
        max_results: u32,
    ) -> impl Future<Output = Result<Vec<QueryRow>, GcpError>> + Send;

    /// One bulk streaming insert. A rejected subset is reported as
    /// [`GcpError::PartialFailure`].
    fn insert(
        &self,
        table: &TableRef,
        rows: &[InsertRow<AnalyticalRow>],
        options: InsertOptions,
    ) -> impl Future<Output = Result<(), GcpError>> + Send;
}

/// [`TwitterClient`] paging each timeline up to a fixed page count.
pub struct TwitterSource {
    client: TwitterClient,
    pages_per_account: u32,
}

impl TwitterSource {
    #[must_use]
    pub fn new(client: TwitterClient, pages_per_account: u32) -> Self {
        Self {
            client,
            pages_per_account,
        }
    }
}

impl PostSource for TwitterSource {
    async fn list_members(&self, owner: &str, slug: &str) -> Result<Vec<String>, TwitterError> {
        self.client.list_members(owner, slug).await
    }

    async fn timeline_since(
        &self,
        screen_name: &str,
        since_id: &str,
    ) -> Result<Nested<RawPost>, TwitterError> {
        let pages = self
            .client
            .timeline_since(screen_name, since_id, self.pages_per_account)
            .await?;
        Ok(Nested::from(Value::from(pages)))
    }
}

impl Warehouse for BigQueryClient {
    async fn query(&self, sql: &str, max_results: u32) -> Result<Vec<QueryRow>, GcpError> {
        BigQueryClient::query(self, sql, max_results).await
    }

    async fn insert(
        &self,
        table: &TableRef,
        rows: &[InsertRow<AnalyticalRow>],
        options: InsertOptions,
    ) -> Result<(), GcpError> {
        self.insert_all(table, rows, options).await.map(|_| ())
    }
}
