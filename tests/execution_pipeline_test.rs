//! End-to-end tests for the execution-update pipeline: control surface →
//! runner → store + hub → observer sessions.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use crewdeck::{
    create_execution_router, observer::ObserverView, AppState, EventHub, ExecutionEvent,
    ExecutionRunner, ExecutionStore, SimulationScript,
};

fn app_with_interval(interval: Duration) -> (Router, AppState) {
    let store = ExecutionStore::new();
    let hub = EventHub::new();
    let runner = ExecutionRunner::new(
        store.clone(),
        hub.clone(),
        SimulationScript::with_interval(interval),
    );
    let state = AppState::new(store, runner, hub);
    (create_execution_router(state.clone()), state)
}

async fn start_execution(app: &Router) -> Uuid {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/executions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let record: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(record["status"], "running");
    record["id"].as_str().unwrap().parse().unwrap()
}

async fn collect_until_terminal(
    rx: &mut tokio::sync::broadcast::Receiver<ExecutionEvent>,
) -> Vec<ExecutionEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event before timeout")
            .expect("channel open");
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            return events;
        }
    }
}

#[tokio::test]
async fn full_script_run_completes_with_final_metrics() {
    let (app, state) = app_with_interval(Duration::from_millis(5));
    let mut rx = state.hub.subscribe();

    let id = start_execution(&app).await;
    let events = collect_until_terminal(&mut rx).await;

    // 17 updates then exactly one completion, nothing after it.
    assert_eq!(events.len(), 18);
    assert!(matches!(
        events.last().unwrap(),
        ExecutionEvent::ExecutionCompleted { .. }
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());

    // Progress is non-decreasing and hits 100 only on the final update.
    let mut last_progress = 0u8;
    let updates: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExecutionEvent::ExecutionUpdate { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert_eq!(updates.len(), 17);
    for (i, progress) in updates.iter().enumerate() {
        assert!(*progress >= last_progress);
        if i + 1 < updates.len() {
            assert!(*progress < 100);
        }
        last_progress = *progress;
    }
    assert_eq!(last_progress, 100);

    let record = state.store.get(id).await.unwrap();
    assert_eq!(record.status, crewdeck::ExecutionStatus::Completed);
    assert!(record.completed_at.is_some());
    assert_eq!(record.metrics.duration, 16 * 8);
}

#[tokio::test]
async fn stop_before_first_tick_yields_no_updates() {
    let (app, state) = app_with_interval(Duration::from_secs(60));
    let mut rx = state.hub.subscribe();

    let id = start_execution(&app).await;
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/executions/{id}/stop"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let events = collect_until_terminal(&mut rx).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        ExecutionEvent::ExecutionStopped { .. }
    ));

    let record = state.store.get(id).await.unwrap();
    assert_eq!(record.status, crewdeck::ExecutionStatus::Failed);
}

#[tokio::test]
async fn two_observers_see_identical_event_sequences() {
    let (app, state) = app_with_interval(Duration::from_millis(5));
    let mut first = state.hub.subscribe();
    let mut second = state.hub.subscribe();

    start_execution(&app).await;

    let seen_by_first = collect_until_terminal(&mut first).await;
    let seen_by_second = collect_until_terminal(&mut second).await;
    assert_eq!(seen_by_first, seen_by_second);
}

#[tokio::test]
async fn observer_view_tracks_the_stream() {
    let (app, state) = app_with_interval(Duration::from_millis(5));
    let mut rx = state.hub.subscribe();

    let id = start_execution(&app).await;
    let mut view = ObserverView::new(10);
    view.begin(id);

    let events = collect_until_terminal(&mut rx).await;
    let last_update_metrics = events
        .iter()
        .rev()
        .find_map(|e| match e {
            ExecutionEvent::ExecutionUpdate { metrics, .. } => Some(*metrics),
            _ => None,
        })
        .unwrap();
    for event in &events {
        view.apply(event);
    }

    // Bounded cap held even though 18 events arrived.
    assert_eq!(view.len(), 10);
    // Snapshot matches the most recent update, untouched by the
    // completion event.
    assert_eq!(view.metrics, last_update_metrics);
    assert!(!view.executing);
    assert!(view.current_execution.is_none());
}
