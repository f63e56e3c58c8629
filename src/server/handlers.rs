//! HTTP request handlers for the tile viewer.
//!
//! # Endpoints
//!
//! - `GET /` - Leaflet viewer page
//! - `GET /tiles/{z}/{x}/{y}.png` - Serve a tile from the tile tree
//! - `GET /pyramid` - Pyramid geometry and per-level completeness
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::TileServeError;
use crate::pyramid::{LevelLayout, PlanarBounds, PyramidLayout, TileCoord, TILE_EXTENSION};

use super::store::TileStore;
use super::viewer::{generate_viewer_html, ViewerOptions, TILE_URL_TEMPLATE};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to all handlers via Axum's State extractor.
pub struct AppState<S: TileStore> {
    /// Where tiles are read from
    pub store: Arc<S>,

    /// Geometry of the pyramid being served
    pub layout: PyramidLayout,

    /// Settings baked into the viewer page
    pub viewer: Arc<ViewerOptions>,

    /// Cache-Control max-age for tiles, in seconds
    pub cache_max_age: u32,
}

impl<S: TileStore> AppState<S> {
    /// Create a state with default viewer options and a 1 hour tile max-age.
    pub fn new(store: S, layout: PyramidLayout) -> Self {
        Self {
            store: Arc::new(store),
            layout,
            viewer: Arc::new(ViewerOptions::default()),
            cache_max_age: 3600,
        }
    }

    pub fn with_viewer(mut self, viewer: ViewerOptions) -> Self {
        self.viewer = Arc::new(viewer);
        self
    }

    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }
}

impl<S: TileStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            layout: self.layout,
            viewer: Arc::clone(&self.viewer),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `/tiles/{z}/{x}/{filename}`
/// where filename is `{y}` or `{y}.png`
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    /// Zoom level (0 = most downsampled)
    pub z: u8,

    /// Tile column
    pub x: u32,

    /// Tile row with optional .png extension (e.g., "0" or "0.png")
    pub filename: String,
}

impl TilePathParams {
    /// Parse the row from the filename, stripping any .png extension.
    pub fn y(&self) -> Result<u32, std::num::ParseIntError> {
        let y_str = self
            .filename
            .strip_suffix(TILE_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .unwrap_or(&self.filename);
        y_str.parse()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_path")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Completeness of one level of the served pyramid.
#[derive(Debug, Serialize)]
pub struct LevelStatusResponse {
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,

    /// Tiles the layout says this level should have
    pub expected_tiles: u64,

    /// Tiles actually found in the store
    pub present_tiles: u64,

    pub complete: bool,
}

/// Response from the pyramid metadata endpoint.
#[derive(Debug, Serialize)]
pub struct PyramidResponse {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub max_zoom: u8,
    pub tile_url_template: String,
    pub bounds: PlanarBounds,

    /// False when any level is missing tiles
    pub complete: bool,

    pub levels: Vec<LevelStatusResponse>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileServeError to HTTP response.
///
/// 5xx errors are logged at ERROR, 404s at DEBUG (the viewer probes for the
/// root tile and Leaflet requests edge tiles freely), other 4xx at WARN.
impl IntoResponse for TileServeError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileServeError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            TileServeError::InvalidPath { .. } => (StatusCode::BAD_REQUEST, "invalid_path"),
            TileServeError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /tiles/{z}/{x}/{y}.png`
///
/// # Response
///
/// - `200 OK`: PNG tile with `Content-Type: image/png`
/// - `400 Bad Request`: Row segment is not a number
/// - `404 Not Found`: No such tile in the tree
/// - `500 Internal Server Error`: Tile file could not be read
pub async fn tile_handler<S: TileStore>(
    State(state): State<AppState<S>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, TileServeError> {
    let y = params.y().map_err(|_| TileServeError::InvalidPath {
        filename: params.filename.clone(),
    })?;
    let coord = TileCoord::new(params.z, params.x, y);

    let data = state
        .store
        .read_tile(coord)
        .await?
        .ok_or(TileServeError::NotFound {
            z: coord.z,
            x: coord.x,
            y: coord.y,
        })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", state.cache_max_age),
            ),
        ],
        data,
    )
        .into_response())
}

/// Handle pyramid metadata requests.
///
/// # Endpoint
///
/// `GET /pyramid`
///
/// # Response
///
/// `200 OK` with JSON describing the layout, planar bounds, and how many of
/// each level's tiles are present. The viewer uses it to warn about holes
/// left by failed levels.
pub async fn pyramid_handler<S: TileStore>(
    State(state): State<AppState<S>>,
) -> Json<PyramidResponse> {
    let layout = state.layout;

    let mut levels = Vec::with_capacity(usize::from(layout.max_zoom) + 1);
    for level in layout.levels() {
        levels.push(level_status(state.store.as_ref(), &level).await);
    }

    Json(PyramidResponse {
        width: layout.width,
        height: layout.height,
        tile_size: layout.tile_size,
        max_zoom: layout.max_zoom,
        tile_url_template: TILE_URL_TEMPLATE.to_string(),
        bounds: layout.bounds(),
        complete: levels.iter().all(|level| level.complete),
        levels,
    })
}

/// Count the tiles of `level` present in `store`.
pub async fn level_status<S: TileStore>(store: &S, level: &LevelLayout) -> LevelStatusResponse {
    let present_tiles = store.count_tiles(*level).await;
    let expected_tiles = level.tile_count();

    LevelStatusResponse {
        zoom: level.zoom,
        width: level.width,
        height: level.height,
        tiles_x: level.tiles_x,
        tiles_y: level.tiles_y,
        expected_tiles,
        present_tiles,
        complete: present_tiles == expected_tiles,
    }
}

/// Handle viewer requests - serves the Leaflet page.
///
/// # Endpoint
///
/// `GET /`
pub async fn viewer_handler<S: TileStore>(State(state): State<AppState<S>>) -> Html<String> {
    Html(generate_viewer_html(&state.layout, &state.viewer))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
