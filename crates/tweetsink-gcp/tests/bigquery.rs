//! Integration tests for `BigQueryClient` and `TokenProvider` using wiremock.

use std::sync::Arc;

use serde_json::json;
use tweetsink_gcp::{
    BigQueryClient, GcpError, InsertOptions, InsertRow, TableRef, TokenProvider, TransportSettings,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(max_retries: u32) -> TransportSettings {
    TransportSettings {
        timeout_secs: 5,
        user_agent: "tweetsink-test/0.1".to_owned(),
        max_retries,
        backoff_base_ms: 0,
    }
}

fn client(server: &MockServer, max_retries: u32) -> BigQueryClient {
    let auth = Arc::new(TokenProvider::Static("ya29.test".to_owned()));
    BigQueryClient::with_base_url("proj", auth, &settings(max_retries), &server.uri())
        .expect("client construction should not fail")
}

fn table() -> TableRef {
    TableRef {
        project_id: "proj".to_owned(),
        dataset_id: "social".to_owned(),
        table_id: "tweets".to_owned(),
    }
}

fn latest_ids_response(job_complete: bool) -> serde_json::Value {
    json!({
        "kind": "bigquery#queryResponse",
        "jobComplete": job_complete,
        "jobReference": {"projectId": "proj", "jobId": "job_1", "location": "US"},
        "schema": {"fields": [
            {"name": "screen_name", "type": "STRING"},
            {"name": "max_id", "type": "STRING"}
        ]},
        "rows": [
            {"f": [{"v": "alice"}, {"v": "1200"}]},
            {"f": [{"v": "bob"}, {"v": null}]}
        ]
    })
}

#[tokio::test]
async fn query_returns_rows_keyed_by_column() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/proj/queries"))
        .and(header("authorization", "Bearer ya29.test"))
        .and(body_partial_json(json!({"useLegacySql": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(latest_ids_response(true)))
        .expect(1)
        .mount(&server)
        .await;

    let rows = client(&server, 0)
        .query("SELECT screen_name, max_id FROM t", 100)
        .await
        .expect("query should succeed");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["screen_name"], "alice");
    assert_eq!(rows[0]["max_id"], "1200");
    assert!(rows[1]["max_id"].is_null());
}

#[tokio::test]
async fn query_polls_until_job_completes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/proj/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobComplete": false,
            "jobReference": {"projectId": "proj", "jobId": "job_1", "location": "US"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/proj/queries/job_1"))
        .and(query_param("location", "US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(latest_ids_response(true)))
        .expect(1)
        .mount(&server)
        .await;

    let rows = client(&server, 0).query("SELECT 1", 100).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn query_follows_page_tokens_up_to_max_results() {
    let server = MockServer::start().await;

    let mut first = latest_ids_response(true);
    first["pageToken"] = json!("page-2");
    Mock::given(method("POST"))
        .and(path("/projects/proj/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/proj/queries/job_1"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobComplete": true,
            "jobReference": {"projectId": "proj", "jobId": "job_1"},
            "schema": {"fields": [{"name": "screen_name"}, {"name": "max_id"}]},
            "rows": [
                {"f": [{"v": "carol"}, {"v": "7"}]},
                {"f": [{"v": "dave"}, {"v": "8"}]}
            ],
            "pageToken": "page-3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/proj/queries/job_1"))
        .and(query_param("pageToken", "page-3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let rows = client(&server, 0).query("SELECT 1", 3).await.unwrap();
    let names: Vec<_> = rows.iter().map(|r| r["screen_name"].clone()).collect();
    assert_eq!(names, vec![json!("alice"), json!("bob"), json!("carol")]);
}

#[tokio::test]
async fn query_with_invalid_sql_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/proj/queries"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Syntax error: Unexpected identifier"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3).query("SELEC 1", 10).await.unwrap_err();
    match err {
        GcpError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 400);
            assert!(message.contains("Syntax error"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn insert_all_sends_raw_rows_without_insert_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/proj/datasets/social/tables/tweets/insertAll"))
        .and(body_partial_json(json!({
            "kind": "bigquery#tableDataInsertAllRequest",
            "skipInvalidRows": true,
            "rows": [{"json": {"id_str": "1"}}, {"json": {"id_str": "2"}}]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"kind": "bigquery#tableDataInsertAllResponse"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rows = vec![
        InsertRow::raw(json!({"id_str": "1"})),
        InsertRow::raw(json!({"id_str": "2"})),
    ];
    let options = InsertOptions {
        skip_invalid_rows: true,
        ignore_unknown_values: false,
    };
    let response = client(&server, 0)
        .insert_all(&table(), &rows, options)
        .await
        .expect("insert should succeed");
    assert_eq!(
        response.kind.as_deref(),
        Some("bigquery#tableDataInsertAllResponse")
    );

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["rows"][0].get("insertId").is_none());
}

#[tokio::test]
async fn insert_errors_surface_as_partial_failure_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/proj/datasets/social/tables/tweets/insertAll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "bigquery#tableDataInsertAllResponse",
            "insertErrors": [
                {"index": 1, "errors": [{"reason": "invalid", "message": "no such field: bogus"}]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = vec![
        InsertRow::raw(json!({"id_str": "1"})),
        InsertRow::raw(json!({"id_str": "2", "bogus": true})),
    ];
    let err = client(&server, 3)
        .insert_all(&table(), &rows, InsertOptions::default())
        .await
        .unwrap_err();

    match err {
        GcpError::PartialFailure {
            failed_rows,
            errors,
        } => {
            assert_eq!(failed_rows, 1);
            assert_eq!(errors[0].index, 1);
            assert_eq!(errors[0].reason.as_deref(), Some("invalid"));
            assert!(errors[0].message.contains("bogus"));
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/proj/datasets/social/tables/tweets/insertAll"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/proj/datasets/social/tables/tweets/insertAll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let rows = vec![InsertRow::raw(json!({"id_str": "1"}))];
    client(&server, 2)
        .insert_all(&table(), &rows, InsertOptions::default())
        .await
        .expect("second attempt should succeed");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn metadata_token_is_fetched_once_and_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/token"))
        .and(header("metadata-flavor", "Google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.meta",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = TokenProvider::metadata(&format!("{}/token", server.uri()));
    assert_eq!(provider.access_token().await.unwrap(), "ya29.meta");
    assert_eq!(provider.access_token().await.unwrap(), "ya29.meta");
}

#[tokio::test]
async fn metadata_server_refusal_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let provider = TokenProvider::metadata(&format!("{}/token", server.uri()));
    let err = provider.access_token().await.unwrap_err();
    assert!(matches!(err, GcpError::Auth(_)), "got {err:?}");
}
