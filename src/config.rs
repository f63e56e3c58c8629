//! Command-line configuration for raster-tiler.
//!
//! One subcommand per component:
//!
//! - `convert`  - re-encode the source raster to PNG
//! - `generate` - cut the PNG into a `{z}/{x}/{y}.png` pyramid
//! - `serve`    - serve the pyramid and the Leaflet viewer
//!
//! Every default matches the layout of a typical web project
//! (`public/Map.tif` → `public/Map.png` → `public/tiles`).
//!
//! # Environment Variables
//!
//! All options can also be set with the `TILER_` prefix, for example:
//!
//! - `TILER_SOURCE` / `TILER_OUTPUT` - generator input and tile directory
//! - `TILER_TILE_SIZE` - tile edge in pixels (default: 256)
//! - `TILER_MAX_ZOOM` - highest zoom level (default: 4)
//! - `TILER_TILES_DIR` - directory served by `serve` (default: public/tiles)
//! - `TILER_HOST` / `TILER_PORT` - bind address (default: 0.0.0.0:3000)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::pyramid::{
    read_manifest, GeneratorOptions, PngCompression, PyramidLayout, DEFAULT_MAX_ZOOM, DEFAULT_TILE_SIZE,
    MAX_TILE_SIZE, MAX_ZOOM_LIMIT,
};
use crate::raster::ResampleFilter;
use crate::server::DEFAULT_CACHE_MAX_AGE;

// =============================================================================
// Default Values
// =============================================================================

/// Default raster handed to the converter.
pub const DEFAULT_CONVERT_SOURCE: &str = "public/Map.tif";

/// Default converter output, also the generator's default input.
pub const DEFAULT_IMAGE_PATH: &str = "public/Map.png";

/// Default tile tree root.
pub const DEFAULT_TILES_DIR: &str = "public/tiles";

pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 3000;

/// Source width assumed by `serve` when the tile tree has no manifest.
pub const DEFAULT_SOURCE_WIDTH: u32 = 31354;

/// Source height assumed by `serve` when the tile tree has no manifest.
pub const DEFAULT_SOURCE_HEIGHT: u32 = 24066;

pub const DEFAULT_TITLE: &str = "Interactive Map";

// =============================================================================
// CLI Arguments
// =============================================================================

/// raster-tiler - cut a large raster into slippy-map tiles and view them.
#[derive(Parser, Debug, Clone)]
#[command(name = "raster-tiler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false, env = "TILER_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Re-encode a raster (e.g. TIFF) into a lossless web format.
    Convert(ConvertConfig),

    /// Generate the tile pyramid from a raster.
    Generate(GenerateConfig),

    /// Serve the tile pyramid and the map viewer.
    Serve(ServeConfig),
}

// =============================================================================
// Convert
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ConvertConfig {
    /// Raster to read.
    #[arg(long, default_value = DEFAULT_CONVERT_SOURCE, env = "TILER_CONVERT_SOURCE")]
    pub source: PathBuf,

    /// File to write; the extension selects the format (.png, .tif, .tiff).
    #[arg(long, default_value = DEFAULT_IMAGE_PATH, env = "TILER_CONVERT_TARGET")]
    pub target: PathBuf,
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.source == self.target {
            return Err("source and target must be different files".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Generate
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct GenerateConfig {
    /// Raster to cut into tiles.
    #[arg(long, default_value = DEFAULT_IMAGE_PATH, env = "TILER_SOURCE")]
    pub source: PathBuf,

    /// Root of the `{z}/{x}/{y}.png` tile tree.
    #[arg(short, long, default_value = DEFAULT_TILES_DIR, env = "TILER_OUTPUT")]
    pub output: PathBuf,

    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILER_TILE_SIZE")]
    pub tile_size: u32,

    /// Highest zoom level; rendered at the source's full resolution.
    #[arg(long, default_value_t = DEFAULT_MAX_ZOOM, env = "TILER_MAX_ZOOM")]
    pub max_zoom: u8,

    /// Resampling filter for the downsampled levels.
    #[arg(long, value_enum, default_value_t = ResampleFilter::Lanczos3, env = "TILER_FILTER")]
    pub filter: ResampleFilter,

    /// PNG compression effort.
    #[arg(long, value_enum, default_value_t = PngCompression::Default, env = "TILER_COMPRESSION")]
    pub compression: PngCompression,
}

impl GenerateConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(format!(
                "tile_size must be between 1 and {}",
                MAX_TILE_SIZE
            ));
        }
        if self.max_zoom > MAX_ZOOM_LIMIT {
            return Err(format!("max_zoom must be at most {}", MAX_ZOOM_LIMIT));
        }
        Ok(())
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            tile_size: self.tile_size,
            max_zoom: self.max_zoom,
            filter: self.filter,
            compression: self.compression,
        }
    }
}

// =============================================================================
// Serve
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILER_PORT")]
    pub port: u16,

    /// Root of the tile tree to serve.
    #[arg(long, default_value = DEFAULT_TILES_DIR, env = "TILER_TILES_DIR")]
    pub tiles_dir: PathBuf,

    /// Source width, used only when the tile tree has no pyramid.json.
    #[arg(long, default_value_t = DEFAULT_SOURCE_WIDTH, env = "TILER_WIDTH")]
    pub width: u32,

    /// Source height, used only when the tile tree has no pyramid.json.
    #[arg(long, default_value_t = DEFAULT_SOURCE_HEIGHT, env = "TILER_HEIGHT")]
    pub height: u32,

    /// Tile edge, used only when the tile tree has no pyramid.json.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "TILER_TILE_SIZE")]
    pub tile_size: u32,

    /// Highest zoom level, used only when the tile tree has no pyramid.json.
    #[arg(long, default_value_t = DEFAULT_MAX_ZOOM, env = "TILER_MAX_ZOOM")]
    pub max_zoom: u8,

    /// Title shown on the viewer page.
    #[arg(long, default_value = DEFAULT_TITLE, env = "TILER_TITLE")]
    pub title: String,

    /// HTTP Cache-Control max-age for tiles, in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "TILER_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated). Any origin if not set.
    #[arg(long, env = "TILER_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Disable request tracing.
    #[arg(long, default_value_t = false, env = "TILER_NO_TRACING")]
    pub no_tracing: bool,
}

impl ServeConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.flag_layout().validate()
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Layout described by the command-line flags.
    pub fn flag_layout(&self) -> PyramidLayout {
        PyramidLayout::new(self.width, self.height, self.tile_size, self.max_zoom)
    }

    /// Layout to serve: the one recorded in `pyramid.json` when it exists
    /// and is usable, otherwise the one described by the flags.
    pub fn resolve_layout(&self) -> PyramidLayout {
        match read_manifest(&self.tiles_dir) {
            Ok(Some(report)) => {
                info!("Loaded pyramid manifest from {}", self.tiles_dir.display());
                report.layout
            }
            Ok(None) => {
                warn!("No pyramid manifest found; using --width/--height/--max-zoom");
                self.flag_layout()
            }
            Err(e) => {
                warn!("Ignoring unusable manifest: {}", e);
                self.flag_layout()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
