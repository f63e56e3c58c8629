//! Tile pyramid generation.
//!
//! # Components
//!
//! - [`PyramidLayout`] / [`LevelLayout`]: level sizes and tile grids derived from the source size
//! - [`TileGenerator`]: decodes the source and writes `{z}/{x}/{y}.png` for every level
//! - [`PngTileEncoder`]: lossless tile encoding
//! - [`GenerationReport`]: per-level outcome, persisted as `pyramid.json`
//!
//! # Example
//!
//! ```
//! use raster_tiler::pyramid::PyramidLayout;
//!
//! let layout = PyramidLayout::new(31354, 24066, 256, 4);
//! let level = layout.level(0).unwrap();
//!
//! assert_eq!((level.width, level.height), (1959, 1504));
//! assert_eq!((level.tiles_x, level.tiles_y), (8, 6));
//! ```

mod encoder;
mod generator;
mod layout;
mod manifest;

pub use encoder::{PngCompression, PngTileEncoder};
pub use generator::{GenerationReport, GeneratorOptions, LevelOutcome, LevelReport, TileGenerator};
pub use layout::{
    LevelLayout, PlanarBounds, PyramidLayout, TileCoord, TileRect, DEFAULT_MAX_ZOOM,
    DEFAULT_TILE_SIZE, MAX_TILE_SIZE, MAX_ZOOM_LIMIT, TILE_EXTENSION,
};
pub use manifest::{manifest_path, read_manifest, write_manifest, MANIFEST_FILE_NAME};
