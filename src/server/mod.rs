//! HTTP server layer: static tile tree plus the Leaflet viewer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     GET /   GET /tiles/{z}/{x}/{y}.png   GET /pyramid           │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │   viewer    │  │        routes           │  │
//! │  │ (requests)  │  │ (HTML page) │  │  (router config)        │  │
//! │  └──────┬──────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────┼───────────────────────────────────────────────────────┘
//!           ▼
//!     TileStore (filesystem tile tree)
//! ```

pub mod handlers;
pub mod routes;
pub mod store;
pub mod viewer;

pub use handlers::{
    health_handler, level_status, pyramid_handler, tile_handler, viewer_handler, AppState,
    ErrorResponse, HealthResponse, LevelStatusResponse, PyramidResponse, TilePathParams,
};
pub use routes::{create_router, RouterConfig, DEFAULT_CACHE_MAX_AGE};
pub use store::{FsTileStore, TileStore};
pub use viewer::{
    generate_viewer_html, root_tile_url, FallbackBasemap, ViewerOptions, FALLBACK_CENTER,
    FALLBACK_ZOOM, TILE_URL_TEMPLATE,
};
