//! End-to-end tests: generate a pyramid on disk, then read it back.
//!
//! Tests verify:
//! - The tile tree layout and edge-tile sizes on disk
//! - Serving generated tiles through the filesystem store
//! - Re-running generation over an existing tree
//! - Converting a TIFF and tiling the converted PNG
//! - Partial failure leaves the other levels intact

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use raster_tiler::pyramid::{
    read_manifest, GeneratorOptions, LevelOutcome, PngTileEncoder, PyramidLayout, TileCoord,
    TileGenerator, MANIFEST_FILE_NAME,
};
use raster_tiler::server::{AppState, FsTileStore};
use raster_tiler::{convert, create_router, GenerateError, RouterConfig};

use super::test_utils::{is_valid_png, list_files, write_png_source, write_tiff_source};

fn options(max_zoom: u8) -> GeneratorOptions {
    GeneratorOptions {
        max_zoom,
        ..GeneratorOptions::default()
    }
}

// =============================================================================
// Tile Tree
// =============================================================================

#[test]
fn test_generate_writes_expected_tree() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png_source(dir.path(), 600, 300);
    let tiles = dir.path().join("tiles");

    let report = TileGenerator::new(options(1))
        .generate(&source, &tiles)
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.tiles_written(), 2 + 6);

    let files = list_files(&tiles);
    let pngs: Vec<_> = files
        .iter()
        .filter(|p| p.extension().is_some_and(|e| e == "png"))
        .collect();
    assert_eq!(pngs.len(), 8);
    assert!(files.iter().any(|p| p.as_os_str() == MANIFEST_FILE_NAME));

    let encoder = PngTileEncoder::default();
    let read = |z, x, y| std::fs::read(TileCoord::new(z, x, y).path_under(&tiles)).unwrap();

    // z=0 is 300x150: one full-width tile and a 44px edge column
    assert_eq!(encoder.dimensions(&read(0, 0, 0)).unwrap(), (256, 150));
    assert_eq!(encoder.dimensions(&read(0, 1, 0)).unwrap(), (44, 150));

    // z=1 is the source itself: 600x300
    assert_eq!(encoder.dimensions(&read(1, 0, 0)).unwrap(), (256, 256));
    assert_eq!(encoder.dimensions(&read(1, 2, 0)).unwrap(), (88, 256));
    assert_eq!(encoder.dimensions(&read(1, 2, 1)).unwrap(), (88, 44));
}

#[test]
fn test_full_resolution_tile_matches_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png_source(dir.path(), 600, 300);
    let tiles = dir.path().join("tiles");

    TileGenerator::new(options(1))
        .generate(&source, &tiles)
        .unwrap();

    let original = image::open(&source).unwrap().to_rgb8();
    let tile = image::open(TileCoord::new(1, 1, 1).path_under(&tiles))
        .unwrap()
        .to_rgb8();

    for (x, y, pixel) in tile.enumerate_pixels() {
        assert_eq!(pixel, original.get_pixel(256 + x, 256 + y));
    }
}

// =============================================================================
// Generate then Serve
// =============================================================================

#[tokio::test]
async fn test_generate_then_serve() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png_source(dir.path(), 600, 300);
    let tiles = dir.path().join("tiles");

    let generator = TileGenerator::new(options(1));
    let (source_path, tile_path) = (source.clone(), tiles.clone());
    let report = tokio::task::spawn_blocking(move || generator.generate(&source_path, &tile_path))
        .await
        .unwrap()
        .unwrap();

    let manifest = read_manifest(&tiles).unwrap().unwrap();
    assert_eq!(manifest, report);

    let state = AppState::new(FsTileStore::new(&tiles), manifest.layout);
    let router = create_router(state, RouterConfig::new());

    let request = Request::builder()
        .uri("/tiles/0/0/0.png")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_png(&body));

    let request = Request::builder()
        .uri("/tiles/1/3/0.png")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::builder()
        .uri("/pyramid")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["complete"], true);
    assert_eq!(json["levels"][0]["present_tiles"], 2);
    assert_eq!(json["levels"][1]["present_tiles"], 6);
}

#[tokio::test]
async fn test_serving_empty_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(
        FsTileStore::new(dir.path().join("tiles")),
        PyramidLayout::new(31354, 24066, 256, 4),
    );
    let router = create_router(state, RouterConfig::new());

    let request = Request::builder()
        .uri("/tiles/0/0/0.png")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Re-runs
// =============================================================================

#[test]
fn test_rerun_overwrites_with_same_tree() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png_source(dir.path(), 513, 257);
    let tiles = dir.path().join("tiles");
    let generator = TileGenerator::new(options(2));

    let first = generator.generate(&source, &tiles).unwrap();
    let first_files = list_files(&tiles);
    let first_tile = std::fs::read(TileCoord::new(2, 2, 1).path_under(&tiles)).unwrap();

    let second = generator.generate(&source, &tiles).unwrap();
    let second_files = list_files(&tiles);
    let second_tile = std::fs::read(TileCoord::new(2, 2, 1).path_under(&tiles)).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_files, second_files);

    let encoder = PngTileEncoder::default();
    assert_eq!(
        encoder.dimensions(&first_tile).unwrap(),
        encoder.dimensions(&second_tile).unwrap()
    );
    assert_eq!(encoder.dimensions(&second_tile).unwrap(), (1, 1));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_missing_source_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let tiles = dir.path().join("tiles");

    let result = TileGenerator::new(options(1)).generate(&dir.path().join("Map.png"), &tiles);

    assert!(matches!(result, Err(GenerateError::SourceNotFound(_))));
    assert!(!tiles.exists());
}

#[test]
fn test_failed_level_does_not_stop_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_png_source(dir.path(), 600, 300);
    let tiles = dir.path().join("tiles");
    std::fs::create_dir_all(&tiles).unwrap();
    // A plain file where the z=0 directory should go
    std::fs::write(tiles.join("0"), b"not a directory").unwrap();

    let report = TileGenerator::new(options(1))
        .generate(&source, &tiles)
        .unwrap();

    assert!(!report.is_complete());
    assert!(matches!(
        report.levels[0].outcome,
        LevelOutcome::Failed { tiles_written: 0, .. }
    ));
    assert_eq!(
        report.levels[1].outcome,
        LevelOutcome::Complete { tiles: 6 }
    );
    assert!(TileCoord::new(1, 2, 1).path_under(&tiles).is_file());

    let manifest = read_manifest(&tiles).unwrap().unwrap();
    assert_eq!(manifest.failed_levels().count(), 1);
}

// =============================================================================
// Convert then Generate
// =============================================================================

#[test]
fn test_convert_then_generate() {
    let dir = tempfile::tempdir().unwrap();
    let tiff = write_tiff_source(dir.path(), 300, 200);
    let png = dir.path().join("public").join("Map.png");
    let tiles = dir.path().join("public").join("tiles");

    let conversion = convert(&tiff, &png).unwrap();
    assert_eq!((conversion.width, conversion.height), (300, 200));

    let report = TileGenerator::new(options(1)).generate(&png, &tiles).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.layout, PyramidLayout::new(300, 200, 256, 1));
    // z=0 is 150x100, one tile; z=1 is 300x200, 2x1 tiles
    assert_eq!(report.tiles_written(), 3);
}
