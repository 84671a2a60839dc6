//! End-to-end tests for the batch ingestion endpoint.
//!
//! POST /events/batch → validation → session reconstructor, exercised over
//! the real router.

use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::json;

use integration_tests::{fixtures, setup::TestContext};

#[tokio::test]
async fn ingest_batch_reports_received_processed_and_totals() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::batch_json(vec![
        fixtures::event_json("sess-a", 0, "session.start", json!({})),
        fixtures::event_json("sess-a", 1, "action.click", json!({ "target": "button.buy" })),
        fixtures::event_json("sess-b", 0, "session.start", json!({})),
    ]);

    let response = server
        .post("/events/batch")
        .content_type("application/json")
        .bytes(payload.to_string().into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["received"], 3);
    assert_eq!(body["processed"], 3);
    assert_eq!(body["stats"]["sessions"], 2);
    assert_eq!(body["stats"]["events"], 3);
}

#[tokio::test]
async fn duplicated_batch_delivery_does_not_double_count() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::batch_json(vec![
        fixtures::event_json("sess-dup", 0, "session.start", json!({})),
        fixtures::event_json("sess-dup", 1, "session.end", json!({})),
    ])
    .to_string();

    let first = server
        .post("/events/batch")
        .content_type("application/json")
        .bytes(payload.clone().into())
        .await;
    first.assert_status_ok();

    // Client retry of an already-acknowledged batch.
    let retry = server
        .post("/events/batch")
        .content_type("application/json")
        .bytes(payload.into())
        .await;
    retry.assert_status_ok();

    let body: serde_json::Value = retry.json();
    assert_eq!(body["received"], 2);
    assert_eq!(body["processed"], 0);
    assert_eq!(body["stats"]["events"], 2);
    assert_eq!(ctx.state.reconstructor.session("sess-dup").unwrap().events.len(), 2);
}

#[tokio::test]
async fn invalid_events_are_dropped_without_rejecting_the_batch() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    // Parses fine but fails schema validation: 48h stale timestamp.
    let mut stale = fixtures::event_json("sess-v", 1, "action.click", json!({}));
    stale["timestamp"] = json!(Utc::now() - Duration::hours(48));

    let payload = fixtures::batch_json(vec![
        fixtures::event_json("sess-v", 0, "session.start", json!({})),
        stale,
    ]);

    let response = server
        .post("/events/batch")
        .content_type("application/json")
        .bytes(payload.to_string().into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["received"], 2);
    assert_eq!(body["processed"], 1);
    assert_eq!(ctx.state.reconstructor.session("sess-v").unwrap().events.len(), 1);
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/events/batch")
        .content_type("application/json")
        .bytes("{\"not\": \"a batch\"}".into())
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn out_of_order_batches_reconstruct_ordered_timeline() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let late = fixtures::batch_json(vec![
        fixtures::event_json("sess-o", 2, "action.click", json!({})),
        fixtures::event_json("sess-o", 3, "session.end", json!({})),
    ]);
    let early = fixtures::batch_json(vec![
        fixtures::event_json("sess-o", 0, "session.start", json!({})),
        fixtures::event_json("sess-o", 1, "view.transition", json!({ "to": "/docs" })),
    ]);

    for payload in [late, early] {
        server
            .post("/events/batch")
            .content_type("application/json")
            .bytes(payload.to_string().into())
            .await
            .assert_status_ok();
    }

    let session = ctx.state.reconstructor.session("sess-o").unwrap();
    let seqs: Vec<u64> = session.events.iter().map(|e| e.sequence_number).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
    assert_eq!(session.navigation_path(), vec!["/docs"]);
}

#[tokio::test]
async fn stats_endpoint_reports_totals() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::batch_json(vec![fixtures::event_json(
        "sess-s",
        0,
        "session.start",
        json!({}),
    )]);
    server
        .post("/events/batch")
        .content_type("application/json")
        .bytes(payload.to_string().into())
        .await
        .assert_status_ok();

    let response = server.get("/events/stats").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["sessions"], 1);
    assert_eq!(body["events"], 1);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let health = server.get("/health").await;
    health.assert_status_ok();
    let body: serde_json::Value = health.json();
    assert_eq!(body["status"], "ok");

    server.get("/health/ready").await.assert_status_ok();
    server.get("/health/live").await.assert_status_ok();
}
