//! Integration tests for `StorageClient` using wiremock.

use std::sync::Arc;

use tweetsink_gcp::{GcpError, StorageClient, TokenProvider, TransportSettings};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> StorageClient {
    let auth = Arc::new(TokenProvider::Static("ya29.test".to_owned()));
    let settings = TransportSettings {
        timeout_secs: 5,
        max_retries: 0,
        backoff_base_ms: 0,
        ..TransportSettings::default()
    };
    StorageClient::with_base_url(auth, &settings, &format!("{}/storage/v1", server.uri()))
        .expect("client construction should not fail")
}

#[tokio::test]
async fn download_encodes_object_name_as_one_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/cfg-bucket/o/jobs%2Ftweets.json"))
        .and(query_param("alt", "media"))
        .and(header("authorization", "Bearer ya29.test"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"twitter":{}}"#))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = client(&server)
        .download("cfg-bucket", "jobs/tweets.json")
        .await
        .expect("download should succeed");
    assert_eq!(bytes, br#"{"twitter":{}}"#);
}

#[tokio::test]
async fn missing_object_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/cfg-bucket/o/missing.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "No such object: cfg-bucket/missing.json"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .download("cfg-bucket", "missing.json")
        .await
        .unwrap_err();
    match err {
        GcpError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 404);
            assert!(message.contains("No such object"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
