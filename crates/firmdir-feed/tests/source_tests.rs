//! Feed source integration tests.
//!
//! Exercises the file-backed and HTTP-backed feed sources end to end, without
//! any external dependency: the HTTP source runs against a local mock server.

use std::io::Write;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use firmdir_feed::{FeedClient, FeedError, FeedSource};

const FEED_BODY: &str = r#"{
    "offices": [
        {
            "firmNumber": "F001",
            "firmName": "Acme Brokers",
            "firmType": "broker",
            "officeAccountNumber": "O001",
            "officeAddressLine1": "1 High Street",
            "officeAddressCity": "Leeds",
            "officeAddressPostcode": "LS1 1AA"
        },
        {
            "firmNumber": "F002",
            "firmName": "Acme Network",
            "firmType": "principal"
        }
    ]
}"#;

#[tokio::test]
async fn fetches_snapshot_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FEED_BODY.as_bytes()).unwrap();

    let client = FeedClient::new(FeedSource::File(file.path().to_path_buf()));
    let snapshot = client.fetch_snapshot().await.unwrap();

    assert_eq!(snapshot.firm_count(), 2);
    assert_eq!(snapshot.firms()[0].code, "F001");
    assert_eq!(snapshot.firms()[0].offices.len(), 1);
    assert!(snapshot.firms()[1].offices.is_empty());
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let client = FeedClient::new(FeedSource::File("/nonexistent/pda.json".into()));
    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, FeedError::Io(_)));
}

#[tokio::test]
async fn fetches_snapshot_from_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pda"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_BODY))
        .mount(&server)
        .await;

    let url = format!("{}/pda", server.uri()).parse().unwrap();
    let client = FeedClient::new(FeedSource::Http(url));
    let snapshot = client.fetch_snapshot().await.unwrap();

    assert_eq!(snapshot.firm_count(), 2);
    assert!(snapshot.contains_firm("F002"));
}

#[tokio::test]
async fn server_error_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pda"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/pda", server.uri()).parse().unwrap();
    let client = FeedClient::new(FeedSource::Http(url));
    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, FeedError::Http(_)));
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pda"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let url = format!("{}/pda", server.uri()).parse().unwrap();
    let client = FeedClient::new(FeedSource::Http(url));
    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, FeedError::Parse(_)));
}

#[tokio::test]
async fn invalid_document_is_a_validation_error() {
    let body = r#"{
        "offices": [
            { "firmNumber": "F001", "firmName": "A", "firmType": "broker", "parentFirmNumber": "F001" }
        ]
    }"#;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pda"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let url = format!("{}/pda", server.uri()).parse().unwrap();
    let client = FeedClient::new(FeedSource::Http(url));
    let err = client.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, FeedError::Validation(_)));
}
