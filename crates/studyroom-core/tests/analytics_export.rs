//! Remote statistics export against a mocked HTTP store.

use mockito::Matcher;
use serde_json::json;
use studyroom_core::{ExportError, HttpStatsStore, StatsRecord};

#[tokio::test]
async fn export_merges_user_then_default_aggregate() {
    let mut server = mockito::Server::new_async().await;

    let user = server
        .mock("PATCH", "/statistics/alice")
        .match_body(Matcher::Json(json!({ "totalTimeStudied": "01:00:00" })))
        .with_status(200)
        .create_async()
        .await;
    let fetch_default = server
        .mock("GET", "/statistics/default")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"totalTimeStudied":"00:30:00"}"#)
        .create_async()
        .await;
    let default = server
        .mock("PATCH", "/statistics/default")
        .match_body(Matcher::Json(json!({ "totalTimeStudied": "00:40:00" })))
        .with_status(200)
        .create_async()
        .await;

    let store = HttpStatsStore::new(server.url());
    let aggregate = store
        .export_completion("alice", &StatsRecord::from_secs(3600), 600)
        .await
        .unwrap();

    assert_eq!(aggregate.total_time_studied, "00:40:00");
    user.assert_async().await;
    fetch_default.assert_async().await;
    default.assert_async().await;
}

#[tokio::test]
async fn missing_default_record_starts_from_zero() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("PATCH", "/statistics/bob")
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("GET", "/statistics/default")
        .with_status(404)
        .create_async()
        .await;
    let default = server
        .mock("PATCH", "/statistics/default")
        .match_body(Matcher::Json(json!({ "totalTimeStudied": "00:05:00" })))
        .with_status(200)
        .create_async()
        .await;

    // Trailing slash on the endpoint is tolerated.
    let store = HttpStatsStore::new(format!("{}/", server.url()));
    let aggregate = store
        .export_completion("bob", &StatsRecord::from_secs(300), 300)
        .await
        .unwrap();

    assert_eq!(aggregate.secs(), 300);
    default.assert_async().await;
}

#[tokio::test]
async fn rejected_merge_is_reported() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("PATCH", "/statistics/carol")
        .with_status(403)
        .with_body("forbidden")
        .create_async()
        .await;
    let never = server
        .mock("PATCH", "/statistics/default")
        .expect(0)
        .create_async()
        .await;

    let store = HttpStatsStore::new(server.url());
    let err = store
        .export_completion("carol", &StatsRecord::from_secs(60), 60)
        .await
        .unwrap_err();

    match err {
        ExportError::Rejected { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "forbidden");
        }
        other => panic!("unexpected error: {other}"),
    }
    never.assert_async().await;
}

#[tokio::test]
async fn fetch_reads_existing_document() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/statistics/dave")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"totalTimeStudied":"02:15:00","other":"kept"}"#)
        .create_async()
        .await;

    let store = HttpStatsStore::new(server.url());
    let record = store.fetch("dave").await.unwrap().unwrap();
    assert_eq!(record.secs(), 2 * 3600 + 15 * 60);
}
