//! # raster-tiler
//!
//! Turns one very large raster into a `{z}/{x}/{y}.png` tile pyramid and
//! serves it to a Leaflet viewer.
//!
//! ## Features
//!
//! - **Format conversion**: Re-encodes the source (typically a GeoTIFF) to PNG, losslessly
//! - **Pyramid generation**: Downsamples the source per zoom level and cuts 256px tiles
//! - **Partial-failure reporting**: A failed level is recorded and the run continues
//! - **Built-in web viewer**: Leaflet page with a planar CRS and an OpenStreetMap fallback
//!
//! ## Architecture
//!
//! - [`raster`] - Decoding large rasters and resampling filters
//! - [`convert`] - TIFF to PNG conversion
//! - [`pyramid`] - Level geometry, tile generation and the `pyramid.json` manifest
//! - [`server`] - Axum-based HTTP server, tile store and viewer page
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use raster_tiler::{GeneratorOptions, TileGenerator};
//!
//! let generator = TileGenerator::new(GeneratorOptions::default());
//! let report = generator
//!     .generate(Path::new("public/Map.png"), Path::new("public/tiles"))
//!     .unwrap();
//!
//! for level in &report.levels {
//!     println!("z={} {:?}", level.layout.zoom, level.outcome);
//! }
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod pyramid;
pub mod raster;
pub mod server;

// Re-export commonly used types
pub use config::{Cli, Command, ConvertConfig, GenerateConfig, ServeConfig};
pub use convert::{convert, target_format, Conversion, LOSSLESS_TARGETS};
pub use error::{ConvertError, GenerateError, LevelError, ManifestError, TileServeError};
pub use pyramid::{
    read_manifest, write_manifest, GenerationReport, GeneratorOptions, LevelLayout, LevelOutcome,
    LevelReport, PlanarBounds, PngCompression, PngTileEncoder, PyramidLayout, TileCoord,
    TileGenerator, TileRect, DEFAULT_MAX_ZOOM, DEFAULT_TILE_SIZE, MANIFEST_FILE_NAME,
};
pub use raster::{open_raster, raster_dimensions, ResampleFilter};
pub use server::{
    create_router, generate_viewer_html, health_handler, pyramid_handler, tile_handler,
    viewer_handler, AppState, ErrorResponse, FsTileStore, HealthResponse, PyramidResponse,
    RouterConfig, TilePathParams, TileStore, ViewerOptions,
};
