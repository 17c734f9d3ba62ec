use axum::{body::to_bytes, http::Request, Router};
use hrsplice_rs::pipeline::MergeSummary;
use hrsplice_rs::types::activity::MergeStats;
use hrsplice_rs::{config::Config, routes, state::AppState};
use serde_json::Value;
use tower::ServiceExt;

fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::merge::router())
        .with_state(state)
}

async fn health_json(app: Router) -> Value {
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .method("GET")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("health json")
}

#[tokio::test]
async fn health_reports_status_and_version() {
    let json = health_json(app(AppState::new(Config::from_env()))).await;

    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["cached_merges"], 0);
}

#[tokio::test]
async fn health_counts_cached_merges() {
    let state = AppState::new(Config::from_env());
    let summary = MergeSummary {
        laps: Vec::new(),
        stats: MergeStats::default(),
        total_distance_meters: 0.0,
    };
    state.insert("first".to_string(), Vec::new(), summary.clone());
    state.insert("second".to_string(), Vec::new(), summary);

    let json = health_json(app(state)).await;

    assert_eq!(json["cached_merges"], 2);
}
