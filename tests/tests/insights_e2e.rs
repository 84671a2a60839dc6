//! End-to-end tests for the insights endpoints.

use axum_test::TestServer;
use serde_json::json;

use integration_tests::{fixtures, setup::TestContext};

#[tokio::test]
async fn slow_load_session_yields_single_degradation_pattern() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::batch_json(fixtures::slow_load_session_events("sess-slow"));
    server
        .post("/events/batch")
        .content_type("application/json")
        .bytes(payload.to_string().into())
        .await
        .assert_status_ok();

    let response = server.get("/insights/sess-slow").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    let patterns = body["friction_patterns"].as_array().unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0]["pattern_type"], "performance_degradation");
    assert!(patterns[0]["severity"].as_f64().unwrap() > 0.0);
    assert_eq!(patterns[0]["instance_count"], 1);
    assert_eq!(
        patterns[0]["evidence"][0],
        "Slow page load detected: 5000ms"
    );

    // Degraded-but-valid: no inference collaborator, hypotheses empty.
    assert!(body["intent_hypotheses"].as_array().unwrap().is_empty());
    assert_eq!(body["metrics"]["event_count"], 4);
    assert_eq!(body["metrics"]["page_views"], 1);
    assert_eq!(body["metrics"]["has_ended"], true);
    assert!(!body["recommendations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rapid_click_burst_yields_affordance_confusion() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let events = (0..5)
        .map(|seq| {
            fixtures::event_json(
                "sess-clicks",
                seq,
                "friction.rapid_click",
                json!({ "clickCount": 4, "target": "button.checkout", "windowMs": 2000.0 }),
            )
        })
        .collect();

    server
        .post("/events/batch")
        .content_type("application/json")
        .bytes(fixtures::batch_json(events).to_string().into())
        .await
        .assert_status_ok();

    let response = server.get("/insights/sess-clicks").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    let patterns = body["friction_patterns"].as_array().unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0]["pattern_type"], "affordance_confusion");
    assert_eq!(patterns[0]["instance_count"], 5);
    assert!(patterns[0]["evidence"][0]
        .as_str()
        .unwrap()
        .contains("button.checkout"));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    server.get("/insights/sess-missing").await.assert_status_not_found();
}

#[tokio::test]
async fn repeated_reads_return_identical_insights() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = fixtures::batch_json(fixtures::slow_load_session_events("sess-det"));
    server
        .post("/events/batch")
        .content_type("application/json")
        .bytes(payload.to_string().into())
        .await
        .assert_status_ok();

    let first: serde_json::Value = server.get("/insights/sess-det").await.json();
    let second: serde_json::Value = server.get("/insights/sess-det").await.json();
    assert_eq!(first, second);
}

#[tokio::test]
async fn insight_listing_summarizes_sessions() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    for session_id in ["sess-1", "sess-2"] {
        let payload = fixtures::batch_json(fixtures::slow_load_session_events(session_id));
        server
            .post("/events/batch")
            .content_type("application/json")
            .bytes(payload.to_string().into())
            .await
            .assert_status_ok();
    }

    let response = server.get("/insights").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["total_sessions"], 2);
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s["friction_patterns"] == 1));
}
