// tests/api_http.rs
//
// HTTP-level tests for the management Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /launches (family, blocked, countdown)
// - GET /rockets
// - GET + PUT /preferences (persisted through the file store)
// - GET /metrics

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tokio::sync::watch;
use tower::ServiceExt as _; // for `oneshot`

use launch_alert::api::{create_router, AppState};
use launch_alert::catalog::RocketCatalog;
use launch_alert::metrics::Metrics;
use launch_alert::prefs::{FilePreferenceStore, PreferenceStore};
use launch_alert::{CanonicalLaunch, LaunchRecord, LaunchTime};

const BODY_LIMIT: usize = 1024 * 1024;

fn launches() -> Vec<CanonicalLaunch> {
    vec![
        CanonicalLaunch::from(
            &LaunchRecord::bare("t", LaunchTime::At(4_000_000_000))
                .rocket("Falcon 9 Block 5")
                .provider("SpaceX")
                .mission("Crew-14"),
        ),
        CanonicalLaunch::from(
            &LaunchRecord::bare("t", LaunchTime::At(4_000_086_400))
                .rocket("Electron")
                .provider("Rocket Lab"),
        ),
    ]
}

fn test_router(prefs: Arc<dyn PreferenceStore>, metrics: Option<Metrics>) -> Router {
    let (_tx, rx) = watch::channel(launches());
    let catalog = RocketCatalog::from_csv_str(include_str!("../data/rockets.csv")).unwrap();
    create_router(AppState {
        launches: rx,
        prefs,
        catalog: Arc::new(catalog),
        metrics,
    })
}

async fn get_json(app: Router, uri: &str) -> Json {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(Arc::new(FilePreferenceStore::new(dir.path().join("p.json"))), None);

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap().trim(), "OK");
}

#[tokio::test]
async fn preferences_put_then_launches_reflect_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("preferences.json");
    let prefs: Arc<dyn PreferenceStore> = Arc::new(FilePreferenceStore::new(&path));
    let app = test_router(prefs.clone(), None);

    let before = get_json(app.clone(), "/launches").await;
    assert_eq!(before[0]["family"], "Falcon 9");
    assert_eq!(before[0]["blocked"], false);
    assert_eq!(before[0]["rocket"], "Falcon 9 Block 5");
    assert!(before[0]["countdown"].as_str().unwrap().starts_with("T-"));

    let req = Request::builder()
        .method("PUT")
        .uri("/preferences")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "blocked_rockets": ["Falcon 9"] }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let after = get_json(app.clone(), "/launches").await;
    assert_eq!(after[0]["blocked"], true);
    assert_eq!(after[1]["blocked"], false);

    let stored = get_json(app, "/preferences").await;
    assert_eq!(stored["blocked_rockets"], json!(["Falcon 9"]));
    assert!(path.exists(), "preferences written to disk");
    assert!(prefs.blocked_families().unwrap().contains("Falcon 9"));
}

#[tokio::test]
async fn rockets_tree_marks_blocked_families() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilePreferenceStore::new(dir.path().join("p.json"));
    store
        .set_blocked_families(&["Electron".to_string()].into())
        .unwrap();
    let app = test_router(Arc::new(store), None);

    let tree = get_json(app, "/rockets").await;
    assert_eq!(tree["USA"]["Rocket Lab"]["Electron"], false);
    assert_eq!(tree["USA"]["SpaceX"]["Starship"], true);
    assert!(tree["USA"]["SpaceX"].get("Falcon 1").is_none(), "retired hidden");
}

#[tokio::test]
async fn metrics_route_renders_exposition() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(
        Arc::new(FilePreferenceStore::new(dir.path().join("p.json"))),
        Some(Metrics::detached()),
    );
    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
