//! API integration tests for tile retrieval and error handling.
//!
//! Tests verify:
//! - Tile retrieval with content type and cache headers
//! - Error cases (missing tile, malformed row, unreadable tile)
//! - Pyramid completeness reporting
//! - Viewer page and health check

use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use raster_tiler::pyramid::{PyramidLayout, TileCoord};
use raster_tiler::server::{AppState, ViewerOptions};
use raster_tiler::{create_router, RouterConfig};

use super::test_utils::{is_valid_png, solid_tile_png, MockTileStore};

fn small_layout() -> PyramidLayout {
    // 600x300 at Z=1: z0 is 300x150 (2x1 tiles), z1 is 600x300 (3x2 tiles)
    PyramidLayout::new(600, 300, 256, 1)
}

fn router_for(store: MockTileStore, layout: PyramidLayout) -> Router {
    create_router(AppState::new(store, layout), RouterConfig::new())
}

async fn get(router: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, bytes::Bytes) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_retrieval_success() {
    let store = MockTileStore::new().with_tile(TileCoord::new(0, 0, 0), solid_tile_png(256, 150));
    let router = router_for(store, small_layout());

    let (status, headers, body) = get(router, "/tiles/0/0/0.png").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "image/png");
    assert_eq!(headers.get("cache-control").unwrap(), "public, max-age=3600");
    assert!(is_valid_png(&body), "Response should be a valid PNG");
}

#[tokio::test]
async fn test_tile_without_extension() {
    let store = MockTileStore::new().with_tile(TileCoord::new(1, 2, 1), solid_tile_png(88, 44));
    let router = router_for(store, small_layout());

    let (status, _, body) = get(router, "/tiles/1/2/1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(is_valid_png(&body));
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let store = MockTileStore::new().with_tile(TileCoord::new(0, 0, 0), solid_tile_png(4, 4));
    let router = create_router(
        AppState::new(store, small_layout()),
        RouterConfig::new().with_cache_max_age(60).with_tracing(false),
    );

    let (status, headers, _) = get(router, "/tiles/0/0/0.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("cache-control").unwrap(), "public, max-age=60");
}

#[tokio::test]
async fn test_missing_root_tile_is_not_found() {
    let store = MockTileStore::new();
    let reads = store.read_count_handle();
    let router = router_for(store, small_layout());

    let (status, json) = get_json(router, "/tiles/0/0/0.png").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
    assert!(json["message"].as_str().unwrap().contains("0/0/0"));
    assert_eq!(reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_tile_outside_layout_is_not_found() {
    let store = MockTileStore::new().with_layout(&small_layout(), &[]);
    let router = router_for(store, small_layout());

    let (status, _) = get_json(router.clone(), "/tiles/0/5/0.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(router, "/tiles/7/0/0.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_row_is_bad_request() {
    let router = router_for(MockTileStore::new(), small_layout());

    let (status, json) = get_json(router.clone(), "/tiles/0/0/abc.png").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_path");

    let (status, json) = get_json(router, "/tiles/0/0/0.jpg").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_path");
}

#[tokio::test]
async fn test_non_numeric_zoom_is_rejected() {
    let router = router_for(MockTileStore::new(), small_layout());

    let request = Request::builder()
        .uri("/tiles/top/0/0.png")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_unreadable_tile_is_server_error() {
    let coord = TileCoord::new(1, 0, 0);
    let store = MockTileStore::new()
        .with_tile(coord, solid_tile_png(4, 4))
        .with_broken_tile(coord);
    let router = router_for(store, small_layout());

    let (status, json) = get_json(router, "/tiles/1/0/0.png").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "io_error");
}

// =============================================================================
// Pyramid Metadata
// =============================================================================

#[tokio::test]
async fn test_pyramid_complete() {
    let layout = small_layout();
    let router = router_for(MockTileStore::new().with_layout(&layout, &[]), layout);

    let (status, json) = get_json(router, "/pyramid").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], 600);
    assert_eq!(json["height"], 300);
    assert_eq!(json["max_zoom"], 1);
    assert_eq!(json["tile_url_template"], "/tiles/{z}/{x}/{y}.png");
    assert_eq!(json["complete"], true);
    assert_eq!(json["bounds"]["south"], -150.0);
    assert_eq!(json["bounds"]["east"], 300.0);

    let levels = json["levels"].as_array().unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0]["tiles_x"], 2);
    assert_eq!(levels[0]["tiles_y"], 1);
    assert_eq!(levels[1]["expected_tiles"], 6);
    assert_eq!(levels[1]["present_tiles"], 6);
}

#[tokio::test]
async fn test_pyramid_reports_missing_level() {
    let layout = small_layout();
    // z=0 lost entirely, as after a failed level
    let missing = [TileCoord::new(0, 0, 0), TileCoord::new(0, 1, 0)];
    let router = router_for(MockTileStore::new().with_layout(&layout, &missing), layout);

    let (status, json) = get_json(router, "/pyramid").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["complete"], false);
    assert_eq!(json["levels"][0]["present_tiles"], 0);
    assert_eq!(json["levels"][0]["complete"], false);
    assert_eq!(json["levels"][1]["complete"], true);
}

#[tokio::test]
async fn test_pyramid_reference_map_geometry() {
    let layout = PyramidLayout::new(31354, 24066, 256, 4);
    let router = router_for(MockTileStore::new(), layout);

    let (_, json) = get_json(router, "/pyramid").await;

    assert_eq!(json["levels"][0]["width"], 1959);
    assert_eq!(json["levels"][0]["height"], 1504);
    assert_eq!(json["levels"][0]["tiles_x"], 8);
    assert_eq!(json["levels"][0]["tiles_y"], 6);
    assert_eq!(json["levels"][4]["tiles_x"], 123);
    assert_eq!(json["levels"][4]["tiles_y"], 95);
    assert_eq!(json["bounds"]["south"], -1504.125);
    assert_eq!(json["bounds"]["east"], 1959.625);
}

// =============================================================================
// Viewer and Health
// =============================================================================

#[tokio::test]
async fn test_viewer_page() {
    let store = MockTileStore::new();
    let state = AppState::new(store, PyramidLayout::new(31354, 24066, 256, 4))
        .with_viewer(ViewerOptions::default().with_title("Campus <Map>"));
    let router = create_router(state, RouterConfig::new());

    let (status, headers, body) = get(router, "/").await;
    let html = String::from_utf8(body.to_vec()).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(html.contains("<title>Campus &lt;Map&gt;</title>"));
    assert!(html.contains("L.CRS.Simple"));
    assert!(html.contains("const imageBounds = [[-1504.125, 0], [0, 1959.625]];"));
    assert!(html.contains("tile.openstreetmap.org"));
    assert!(html.contains("center: [48.8566, 2.3522]"));
}

#[tokio::test]
async fn test_health_check() {
    let router = router_for(MockTileStore::new(), small_layout());

    let (status, json) = get_json(router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_headers_present() {
    let router = router_for(MockTileStore::new(), small_layout());

    let request = Request::builder()
        .uri("/health")
        .header("origin", "https://example.com")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_unknown_route() {
    let router = router_for(MockTileStore::new(), small_layout());

    let (status, _, _) = get(router, "/map").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
