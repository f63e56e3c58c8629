//! Pyramid geometry: level dimensions, tile grids and tile rectangles.
//!
//! Level `z` of a pyramid with maximum zoom `Z` is the source scaled by
//! `2^-(Z-z)`, with each dimension floored to whole pixels. Every level is
//! cut into `tile_size` squares starting at the top-left corner; the last
//! column and row are clamped to the level edge and may be narrower.
//!
//! ```text
//!  z = Z-1 (W/2 x H/2)          z = Z (W x H)
//! ┌────┬────┬──┐              ┌────┬────┬────┬────┬─┐
//! │0,0 │1,0 │2 │              │0,0 │1,0 │2,0 │3,0 │ │
//! ├────┼────┼──┤              ├────┼────┼────┼────┼─┤
//! │0,1 │1,1 │  │              │0,1 │1,1 │    │    │ │
//! └────┴────┴──┘              ├────┼────┼────┼────┼─┤
//!                             └────┴────┴────┴────┴─┘
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default edge length of a tile in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default highest zoom level (full resolution).
pub const DEFAULT_MAX_ZOOM: u8 = 4;

/// File extension of every tile in the tree.
pub const TILE_EXTENSION: &str = "png";

/// Largest tile edge accepted anywhere in the crate.
pub const MAX_TILE_SIZE: u32 = 8192;

/// Highest zoom accepted. Past this every lower level of a 32-bit-sized
/// source is empty anyway.
pub const MAX_ZOOM_LIMIT: u8 = 31;

// =============================================================================
// Tile Coordinates
// =============================================================================

/// Address of one tile in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level (0 = most downsampled)
    pub z: u8,

    /// Column, 0-indexed from the left
    pub x: u32,

    /// Row, 0-indexed from the top
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Path of the tile relative to the tree root: `{z}/{x}/{y}.png`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.z.to_string())
            .join(self.x.to_string())
            .join(format!("{}.{}", self.y, TILE_EXTENSION))
    }

    /// Absolute path of the tile under `root`.
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

// =============================================================================
// Tile Rectangle
// =============================================================================

/// Pixel rectangle a tile covers inside its level raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub coord: TileCoord,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

// =============================================================================
// Level Layout
// =============================================================================

/// Dimensions and tile grid of a single zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub zoom: u8,

    /// Number of halvings from full resolution (`Z - z`)
    pub shift: u8,

    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl LevelLayout {
    fn new(zoom: u8, max_zoom: u8, source_width: u32, source_height: u32, tile_size: u32) -> Self {
        let shift = max_zoom - zoom;
        let width = scale_down(source_width, shift);
        let height = scale_down(source_height, shift);

        Self {
            zoom,
            shift,
            width,
            height,
            tile_size,
            tiles_x: width.div_ceil(tile_size),
            tiles_y: height.div_ceil(tile_size),
        }
    }

    /// True for the level that is the source at its native size.
    pub fn is_full_resolution(&self) -> bool {
        self.shift == 0
    }

    /// A level collapses to zero pixels when the source is narrower than `2^shift`.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Downsample factor relative to the source (`2^shift`).
    pub fn downsample(&self) -> f64 {
        2f64.powi(i32::from(self.shift))
    }

    pub fn tile_count(&self) -> u64 {
        u64::from(self.tiles_x) * u64::from(self.tiles_y)
    }

    /// Rectangle of tile `(x, y)`, clamped to the level edge.
    ///
    /// Returns `None` when the tile lies outside the grid.
    pub fn tile_rect(&self, x: u32, y: u32) -> Option<TileRect> {
        if x >= self.tiles_x || y >= self.tiles_y {
            return None;
        }

        let left = x * self.tile_size;
        let top = y * self.tile_size;

        Some(TileRect {
            coord: TileCoord::new(self.zoom, x, y),
            left,
            top,
            width: self.tile_size.min(self.width - left),
            height: self.tile_size.min(self.height - top),
        })
    }

    /// Every tile of the level, column by column.
    pub fn tiles(&self) -> impl Iterator<Item = TileRect> + '_ {
        (0..self.tiles_x)
            .flat_map(move |x| (0..self.tiles_y).filter_map(move |y| self.tile_rect(x, y)))
    }
}

/// `floor(value / 2^shift)`, which is `value >> shift` for unsigned pixels.
fn scale_down(value: u32, shift: u8) -> u32 {
    value.checked_shr(u32::from(shift)).unwrap_or(0)
}

// =============================================================================
// Pyramid Layout
// =============================================================================

/// Geometry of a whole pyramid, derived from the source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PyramidLayout {
    /// Source width in pixels
    pub width: u32,

    /// Source height in pixels
    pub height: u32,

    pub tile_size: u32,

    /// Highest zoom level, rendered at full resolution
    pub max_zoom: u8,
}

impl PyramidLayout {
    pub fn new(width: u32, height: u32, tile_size: u32, max_zoom: u8) -> Self {
        Self {
            width,
            height,
            tile_size,
            max_zoom,
        }
    }

    /// Layout of level `zoom`, or `None` above `max_zoom`.
    pub fn level(&self, zoom: u8) -> Option<LevelLayout> {
        (zoom <= self.max_zoom).then(|| {
            LevelLayout::new(zoom, self.max_zoom, self.width, self.height, self.tile_size)
        })
    }

    /// All levels from 0 up to and including `max_zoom`.
    pub fn levels(&self) -> impl Iterator<Item = LevelLayout> + '_ {
        (0..=self.max_zoom).filter_map(move |zoom| self.level(zoom))
    }

    pub fn total_tiles(&self) -> u64 {
        self.levels().map(|level| level.tile_count()).sum()
    }

    pub fn bounds(&self) -> PlanarBounds {
        PlanarBounds::from_layout(self)
    }

    /// Check that the layout can be cut into tiles.
    ///
    /// Layouts built from flags are validated by the CLI; layouts read back
    /// from disk go through here before anything divides by `tile_size`.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "width and height must be greater than 0, got {}x{}",
                self.width, self.height
            ));
        }
        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(format!(
                "tile_size must be between 1 and {}, got {}",
                MAX_TILE_SIZE, self.tile_size
            ));
        }
        if self.max_zoom > MAX_ZOOM_LIMIT {
            return Err(format!(
                "max_zoom must be at most {}, got {}",
                MAX_ZOOM_LIMIT, self.max_zoom
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Planar Bounds
// =============================================================================

/// Extent of the pyramid in the viewer's planar (`CRS.Simple`) coordinates.
///
/// At `max_zoom` one map unit spans `2^max_zoom` source pixels, the y axis
/// points up, and the source's top-left corner sits at the origin. The image
/// therefore spans `[-H/2^Z, 0]` in latitude and `[0, W/2^Z]` in longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl PlanarBounds {
    pub fn from_layout(layout: &PyramidLayout) -> Self {
        let scale = 2f64.powi(i32::from(layout.max_zoom));

        Self {
            south: -f64::from(layout.height) / scale,
            west: 0.0,
            north: 0.0,
            east: f64::from(layout.width) / scale,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
