//! BigQuery REST v2 client: `jobs.query` and `tabledata.insertAll`.

use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;

use crate::auth::TokenProvider;
use crate::error::{GcpError, RowInsertError};
use crate::transport::{normalise_base_url, Transport, TransportSettings};
use crate::types::{
    row_to_map, InsertAllRequest, InsertAllResponse, InsertOptions, InsertRow, QueryRequest,
    QueryResponse, QueryRow, TableRef,
};

const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2/";

/// How long each `jobs.query` / `getQueryResults` call may block server-side.
const QUERY_TIMEOUT_MS: u64 = 10_000;
/// Polls of `getQueryResults` before giving up on an unfinished job.
const MAX_QUERY_POLLS: usize = 30;

pub struct BigQueryClient {
    transport: Transport,
    base_url: Url,
    project_id: String,
}

impl BigQueryClient {
    /// Creates a client that runs query jobs under `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GcpError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        project_id: &str,
        auth: Arc<TokenProvider>,
        settings: &TransportSettings,
    ) -> Result<Self, GcpError> {
        Self::with_base_url(project_id, auth, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GcpError::InvalidBaseUrl`] if `base_url` does not parse, or
    /// [`GcpError::Http`] if the HTTP client cannot be constructed.
    pub fn with_base_url(
        project_id: &str,
        auth: Arc<TokenProvider>,
        settings: &TransportSettings,
        base_url: &str,
    ) -> Result<Self, GcpError> {
        Ok(Self {
            transport: Transport::new(auth, settings)?,
            base_url: normalise_base_url(base_url)?,
            project_id: project_id.to_owned(),
        })
    }

    /// Runs a standard-SQL query and returns at most `max_results` rows,
    /// each keyed by column name.
    ///
    /// Polls `getQueryResults` while the job is still running and follows
    /// `pageToken` until `max_results` rows are collected.
    ///
    /// # Errors
    ///
    /// - [`GcpError::Api`] for invalid SQL or missing tables.
    /// - [`GcpError::QueryIncomplete`] if the job outlives the polling budget.
    /// - transport errors after retries.
    pub async fn query(&self, sql: &str, max_results: u32) -> Result<Vec<QueryRow>, GcpError> {
        let url = self.url(&format!("projects/{}/queries", self.project_id))?;
        let request = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            max_results,
            timeout_ms: QUERY_TIMEOUT_MS,
        };

        let mut response: QueryResponse = self
            .transport
            .execute_json("jobs.query", |client| client.post(url.clone()).json(&request))
            .await?;

        let mut polls = 0usize;
        while !response.job_complete {
            polls += 1;
            let job = response.job_reference.clone().ok_or_else(|| GcpError::Api {
                status: 200,
                context: "jobs.query".to_owned(),
                message: "incomplete job without a jobReference".to_owned(),
            })?;
            if polls > MAX_QUERY_POLLS {
                return Err(GcpError::QueryIncomplete {
                    job_id: job.job_id,
                    polls: MAX_QUERY_POLLS,
                });
            }
            tracing::debug!(job_id = %job.job_id, polls, "query job still running");
            response = self
                .query_results(&job.job_id, job.location.as_deref(), max_results, None)
                .await?;
        }

        let Some(schema) = response.schema.clone() else {
            return Ok(Vec::new());
        };
        let limit = max_results as usize;
        let job = response.job_reference.clone();

        let mut rows: Vec<QueryRow> = Vec::new();
        loop {
            rows.extend(response.rows.drain(..).map(|r| row_to_map(&schema, r)));
            if rows.len() >= limit {
                if rows.len() > limit || response.page_token.is_some() {
                    tracing::warn!(
                        max_results,
                        "query returned more rows than max_results; extra rows dropped"
                    );
                }
                rows.truncate(limit);
                break;
            }
            let (Some(token), Some(job)) = (response.page_token.take(), job.as_ref()) else {
                break;
            };
            response = self
                .query_results(&job.job_id, job.location.as_deref(), max_results, Some(&token))
                .await?;
        }

        Ok(rows)
    }

    async fn query_results(
        &self,
        job_id: &str,
        location: Option<&str>,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<QueryResponse, GcpError> {
        let mut url = self.url(&format!("projects/{}/queries/{job_id}", self.project_id))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("maxResults", &max_results.to_string());
            pairs.append_pair("timeoutMs", &QUERY_TIMEOUT_MS.to_string());
            if let Some(location) = location {
                pairs.append_pair("location", location);
            }
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }

        self.transport
            .execute_json("jobs.getQueryResults", |client| client.get(url.clone()))
            .await
    }

    /// Streams `rows` into `table` with one `insertAll` call.
    ///
    /// Rows are sent exactly as given: the client never invents `insertId`s.
    ///
    /// # Errors
    ///
    /// - [`GcpError::PartialFailure`] when the response lists `insertErrors`;
    ///   the rows not listed were accepted. Never retried.
    /// - [`GcpError::Api`] when the whole request is rejected (unknown table, ...).
    /// - transport errors after retries.
    pub async fn insert_all<T>(
        &self,
        table: &TableRef,
        rows: &[InsertRow<T>],
        options: InsertOptions,
    ) -> Result<InsertAllResponse, GcpError>
    where
        T: Serialize,
    {
        let url = self.url(&format!(
            "projects/{}/datasets/{}/tables/{}/insertAll",
            table.project_id, table.dataset_id, table.table_id
        ))?;
        let body = serde_json::to_vec(&InsertAllRequest {
            kind: "bigquery#tableDataInsertAllRequest",
            skip_invalid_rows: options.skip_invalid_rows,
            ignore_unknown_values: options.ignore_unknown_values,
            rows,
        })
        .map_err(|e| GcpError::Deserialize {
            context: format!("insertAll({table}) request body"),
            source: e,
        })?;

        let context = format!("insertAll({table})");
        let response: InsertAllResponse = self
            .transport
            .execute_json(&context, |client| {
                client
                    .post(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body.clone())
            })
            .await?;

        if response.insert_errors.is_empty() {
            return Ok(response);
        }

        let errors: Vec<RowInsertError> = response
            .insert_errors
            .into_iter()
            .map(|entry| {
                let first = entry.errors.into_iter().next();
                RowInsertError {
                    index: entry.index,
                    reason: first.as_ref().and_then(|e| e.reason.clone()),
                    message: first
                        .and_then(|e| e.message)
                        .unwrap_or_else(|| "row rejected".to_owned()),
                }
            })
            .collect();

        Err(GcpError::PartialFailure {
            failed_rows: errors.len(),
            errors,
        })
    }

    fn url(&self, path: &str) -> Result<Url, GcpError> {
        self.base_url
            .join(path)
            .map_err(|_| GcpError::InvalidBaseUrl(format!("{}{path}", self.base_url)))
    }
}
