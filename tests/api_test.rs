mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{touch, CountingScanner, FlakyRepository};
use reelsync::api::{create_router, ApiState, SeriesDetail};
use reelsync::catalog::CatalogService;
use reelsync::diagnostics::Diagnostics;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper to create test API state over a temporary library
fn create_test_state(root: &Path) -> (ApiState, Arc<FlakyRepository>) {
    let diagnostics = Diagnostics::default();
    let scanner = Arc::new(CountingScanner::new(root, diagnostics.clone()));
    let repo = Arc::new(FlakyRepository::new(diagnostics.clone()));
    let catalog = CatalogService::new(scanner, repo.clone(), Duration::from_secs(60), diagnostics);
    (
        ApiState {
            catalog: Arc::new(catalog),
        },
        repo,
    )
}

fn library() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(&dir.path().join("Dark/Season 1/Dark S01E01.mkv"));
    touch(&dir.path().join("Dark/Season 1/Dark S01E02.mp4"));
    touch(&dir.path().join("Fargo/Season 1/Fargo S01E01.avi"));
    dir
}

async fn send(state: &ApiState, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let (state, _) = create_test_state(dir.path());

    let (status, body) = send(&state, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_list_series() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());

    let (status, body) = send(&state, get("/series")).await;
    assert_eq!(status, StatusCode::OK);

    let series = body.as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["name"], "Dark");
    assert_eq!(series[0]["seasons"]["1"]["name"], "Dark - Season 1");
    assert_eq!(series[0]["seasons"]["1"]["episodes"]["2"]["name"], "Dark S01E02");
    assert!(series[0]["id"].is_string());
    assert!(!body.to_string().contains("handle"));
}

#[tokio::test]
async fn test_refresh_series() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());
    send(&state, get("/series")).await;

    touch(&dir.path().join("Westworld/Season 1/Westworld S01E01.mkv"));
    let (status, body) = send(&state, get("/series/refresh")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_store_failure_returns_error_envelope() {
    let dir = library();
    let (state, repo) = create_test_state(dir.path());
    repo.set_fail_fetch(true);

    let (status, body) = send(&state, get("/series/refresh")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], 500);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to refresh series folders: "));
}

#[tokio::test]
async fn test_series_detail() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());

    let (_, all) = send(&state, get("/series")).await;
    let id = all[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&state, get(&format!("/series/{}", id))).await;
    assert_eq!(status, StatusCode::OK);

    let detail: SeriesDetail = serde_json::from_value(body).unwrap();
    assert_eq!(detail.series_id, id);
    assert_eq!(detail.series.name, "Dark");
    assert_eq!(detail.episodes_to_convert.len(), 1);
    assert_eq!(detail.episodes_to_convert[0].series_name, "Dark");
    assert_eq!(detail.episodes_to_convert[0].original_format, ".mkv");
}

#[tokio::test]
async fn test_unknown_series_is_not_found() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());

    let (status, body) = send(&state, get("/series/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], 404);
}

#[tokio::test]
async fn test_list_conversion_candidates() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());

    let (status, body) = send(&state, get("/series/convert")).await;
    assert_eq!(status, StatusCode::OK);

    let candidates = body.as_array().unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0]["seriesName"], "Dark");
    assert_eq!(candidates[0]["targetFormat"], ".mp4");
    assert_eq!(candidates[1]["seriesName"], "Fargo");
    assert_eq!(candidates[1]["originalFormat"], ".avi");
}

#[tokio::test]
async fn test_convert_all() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());

    let (status, body) = send(&state, post_json("/series/convert", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["converted"], 2);
    assert_eq!(body["messages"][0], "Converted 2 files.");
}

#[tokio::test]
async fn test_convert_empty_selection() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());

    let (status, body) = send(
        &state,
        post_json("/series/convert", serde_json::json!({"filePaths": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["converted"], 0);
    assert_eq!(body["messages"][0], "No files to convert.");
}

#[tokio::test]
async fn test_convert_selected_path() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());

    let (_, candidates) = send(&state, get("/series/convert")).await;
    let path = candidates[1]["filePath"].clone();

    let (status, body) = send(
        &state,
        post_json("/series/convert", serde_json::json!({"filePaths": [path]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["converted"], 1);
    assert_eq!(body["messages"][0], "Converted 1 files.");
}

#[tokio::test]
async fn test_convert_without_json_body_returns_error_envelope() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());

    let request = Request::builder()
        .method("POST")
        .uri("/series/convert")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], 500);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to convert files: "));
}

#[tokio::test]
async fn test_convert_with_malformed_json_returns_error_envelope() {
    let dir = library();
    let (state, _) = create_test_state(dir.path());

    let request = Request::builder()
        .method("POST")
        .uri("/series/convert")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let (status, body) = send(&state, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to convert files: "));
}
