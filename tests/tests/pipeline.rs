//! Client-to-server pipeline tests: tracker → transport → reconstructor.

use serde_json::json;
use std::sync::Arc;

use capture::{CaptureConfig, ClientEnvironment, MemoryStore, Tracker};
use insight::{FrictionClassifier, SessionReconstructor};
use integration_tests::mocks::{IngestTransport, MockTransport};
use telemetry_core::EventKind;

fn capture_config() -> CaptureConfig {
    CaptureConfig {
        max_batch_size: 50,
        flush_interval_ms: 3_600_000,
        max_retries: 3,
        retry_delay_ms: 1,
        ..CaptureConfig::default()
    }
}

#[tokio::test]
async fn requeued_events_reach_the_server_exactly_once_in_order() {
    let reconstructor = Arc::new(SessionReconstructor::new());
    // First flush exhausts 1 + 3 attempts and fails; second one delivers.
    let transport = Arc::new(IngestTransport::with_failures(reconstructor.clone(), 4));
    let tracker = Tracker::new(
        capture_config(),
        ClientEnvironment::default(),
        None,
        transport,
    );

    tracker.track(EventKind::SessionStart, json!({}));
    tracker.track(EventKind::ViewTransition, json!({ "to": "/docs" }));
    tracker.track(EventKind::ActionClick, json!({ "target": "a.nav" }));
    assert!(!tracker.flush().await);

    tracker.track(EventKind::SessionEnd, json!({}));
    assert!(tracker.flush().await);
    tracker.shutdown().await;

    let session_ids = reconstructor.session_ids();
    assert_eq!(session_ids.len(), 1);
    let session = reconstructor.session(&session_ids[0]).unwrap();

    // Every event exactly once, in original relative order.
    let seqs: Vec<u64> = session.events.iter().map(|e| e.sequence_number).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
    assert!(session.has_ended());
}

#[tokio::test]
async fn dedup_tolerates_at_least_once_delivery() {
    let reconstructor = Arc::new(SessionReconstructor::new());
    let mock = Arc::new(MockTransport::new());
    let tracker = Tracker::new(
        capture_config(),
        ClientEnvironment::default(),
        None,
        mock.clone(),
    );

    tracker.track(EventKind::SessionStart, json!({}));
    tracker.track(EventKind::ActionClick, json!({}));
    assert!(tracker.flush().await);
    tracker.shutdown().await;

    // Simulate the transport layer delivering the same batch twice.
    let batches = mock.captured_batches();
    assert_eq!(batches.len(), 1);
    reconstructor.ingest(&batches[0]);
    reconstructor.ingest(&batches[0]);

    let distinct: std::collections::HashSet<_> =
        batches[0].events.iter().map(|e| e.event_id).collect();
    assert_eq!(reconstructor.event_count(), distinct.len());
}

#[tokio::test]
async fn full_pipeline_produces_friction_insights() {
    let reconstructor = Arc::new(SessionReconstructor::new());
    let transport = Arc::new(IngestTransport::new(reconstructor.clone()));
    let tracker = Tracker::new(
        capture_config(),
        ClientEnvironment::default(),
        Some(Arc::new(MemoryStore::new())),
        transport,
    );

    tracker.track(EventKind::SessionStart, json!({}));
    tracker.track(
        EventKind::PerformanceLoad,
        json!({ "loadTime": 7000.0, "url": "https://example.com/slow" }),
    );
    tracker.track(
        EventKind::FrictionFormAbandonment,
        json!({ "fieldsCompleted": 1, "totalFields": 4 }),
    );
    tracker.track(EventKind::SessionEnd, json!({}));
    assert!(tracker.flush().await);
    tracker.shutdown().await;

    let session_ids = reconstructor.session_ids();
    let session = reconstructor.session(&session_ids[0]).unwrap();
    let patterns = FrictionClassifier::default().classify(&session);

    let types: Vec<&str> = patterns.iter().map(|p| p.pattern_type.as_str()).collect();
    assert_eq!(
        types,
        vec!["performance_degradation", "cognitive_overload"]
    );
}

#[tokio::test]
async fn buffer_survives_client_restart() {
    let reconstructor = Arc::new(SessionReconstructor::new());
    let store = Arc::new(MemoryStore::new());

    // First "page load": backend unreachable the whole time.
    {
        let transport = Arc::new(IngestTransport::with_failures(reconstructor.clone(), u32::MAX));
        let tracker = Tracker::new(
            CaptureConfig {
                max_retries: 0,
                ..capture_config()
            },
            ClientEnvironment::default(),
            Some(store.clone()),
            transport,
        );
        tracker.track(EventKind::SessionStart, json!({}));
        tracker.track(EventKind::ActionClick, json!({}));
        assert!(!tracker.flush().await);
        tracker.shutdown().await;
    }

    assert_eq!(reconstructor.event_count(), 0);

    // Second "page load": same store, backend back up.
    let transport = Arc::new(IngestTransport::new(reconstructor.clone()));
    let tracker = Tracker::new(
        capture_config(),
        ClientEnvironment::default(),
        Some(store),
        transport,
    );
    assert!(tracker.flush().await);
    tracker.shutdown().await;

    assert_eq!(reconstructor.event_count(), 2);
}
