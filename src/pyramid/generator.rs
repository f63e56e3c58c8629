//! Tile pyramid generator.
//!
//! Runs strictly sequentially: one level at a time, one tile at a time.
//!
//! ```text
//! source ──decode──► DynamicImage
//!                        │
//!          for z in 0..=Z│
//!                        ▼
//!            resize to level (z < Z) ──► crop tile ──► PNG ──► {z}/{x}/{y}.png
//!                        │
//!                        └── drop level raster
//! ```
//!
//! A missing or undecodable source aborts before any tile is written. Any
//! error inside a level abandons the rest of that level; the run carries on
//! with the next one and the failure is recorded in the report.

use std::fs;
use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{GenerateError, LevelError};
use crate::raster::{open_raster, ResampleFilter};

use super::encoder::{PngCompression, PngTileEncoder};
use super::layout::{
    LevelLayout, PyramidLayout, TileCoord, DEFAULT_MAX_ZOOM, DEFAULT_TILE_SIZE, MAX_TILE_SIZE,
    MAX_ZOOM_LIMIT,
};
use super::manifest::write_manifest;

// =============================================================================
// Options
// =============================================================================

/// Tunables of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub tile_size: u32,
    pub max_zoom: u8,
    pub filter: ResampleFilter,
    pub compression: PngCompression,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            max_zoom: DEFAULT_MAX_ZOOM,
            filter: ResampleFilter::default(),
            compression: PngCompression::default(),
        }
    }
}

impl GeneratorOptions {
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(GenerateError::InvalidOptions(format!(
                "tile_size must be between 1 and {}, got {}",
                MAX_TILE_SIZE, self.tile_size
            )));
        }
        if self.max_zoom > MAX_ZOOM_LIMIT {
            return Err(GenerateError::InvalidOptions(format!(
                "max_zoom must be at most {}, got {}",
                MAX_ZOOM_LIMIT, self.max_zoom
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Report
// =============================================================================

/// What happened to one zoom level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LevelOutcome {
    /// Every tile of the level was written
    Complete { tiles: u64 },

    /// The level has zero width or height, so it has no tiles
    Empty,

    /// The level was abandoned; `tiles_written` tiles made it to disk first
    Failed { error: String, tiles_written: u64 },
}

/// Per-level entry of a [`GenerationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelReport {
    #[serde(flatten)]
    pub layout: LevelLayout,

    pub outcome: LevelOutcome,
}

/// Result of a generation run. Also the on-disk manifest format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub layout: PyramidLayout,
    pub levels: Vec<LevelReport>,
}

impl GenerationReport {
    /// True when no level failed.
    pub fn is_complete(&self) -> bool {
        self.failed_levels().next().is_none()
    }

    pub fn failed_levels(&self) -> impl Iterator<Item = &LevelReport> {
        self.levels
            .iter()
            .filter(|level| matches!(level.outcome, LevelOutcome::Failed { .. }))
    }

    pub fn tiles_written(&self) -> u64 {
        self.levels
            .iter()
            .map(|level| match level.outcome {
                LevelOutcome::Complete { tiles } => tiles,
                LevelOutcome::Empty => 0,
                LevelOutcome::Failed { tiles_written, .. } => tiles_written,
            })
            .sum()
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Cuts a source raster into a `{z}/{x}/{y}.png` tile tree.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use raster_tiler::pyramid::{GeneratorOptions, TileGenerator};
///
/// let generator = TileGenerator::new(GeneratorOptions::default());
/// let report = generator
///     .generate(Path::new("public/Map.png"), Path::new("public/tiles"))
///     .unwrap();
/// println!("{} tiles written", report.tiles_written());
/// ```
#[derive(Debug, Clone)]
pub struct TileGenerator {
    options: GeneratorOptions,
    encoder: PngTileEncoder,
}

impl TileGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            encoder: PngTileEncoder::new(options.compression),
        }
    }

    /// Decode `source`, write its pyramid under `output_dir` and persist the
    /// manifest next to the tiles.
    ///
    /// # Errors
    ///
    /// Fails without writing anything when the options are invalid or the
    /// source is missing or undecodable. Fails after writing tiles only if
    /// the manifest cannot be saved. Level failures are not errors; check
    /// [`GenerationReport::is_complete`].
    pub fn generate(
        &self,
        source: &Path,
        output_dir: &Path,
    ) -> Result<GenerationReport, GenerateError> {
        self.options.validate()?;

        info!("Generating tiles from {}", source.display());

        if !source.is_file() {
            return Err(GenerateError::SourceNotFound(source.to_path_buf()));
        }

        let image = open_raster(source).map_err(|e| GenerateError::Decode {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;

        let report = self.generate_from_image(&image, output_dir)?;
        write_manifest(output_dir, &report)?;

        info!("Tiles available in {}", output_dir.display());
        Ok(report)
    }

    /// Write the pyramid of an already decoded image.
    ///
    /// Does not write the manifest.
    pub fn generate_from_image(
        &self,
        image: &DynamicImage,
        output_dir: &Path,
    ) -> Result<GenerationReport, GenerateError> {
        self.options.validate()?;

        let layout = PyramidLayout::new(
            image.width(),
            image.height(),
            self.options.tile_size,
            self.options.max_zoom,
        );
        info!(
            "Source dimensions: {}x{}, {} levels, {} tiles",
            layout.width,
            layout.height,
            usize::from(layout.max_zoom) + 1,
            layout.total_tiles()
        );

        fs::create_dir_all(output_dir).map_err(|e| GenerateError::OutputDir {
            path: output_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut levels = Vec::with_capacity(usize::from(layout.max_zoom) + 1);

        for level in layout.levels() {
            info!(
                zoom = level.zoom,
                "Level {}: {}x{} px (1/{} scale), {}x{} tiles",
                level.zoom,
                level.width,
                level.height,
                level.downsample(),
                level.tiles_x,
                level.tiles_y
            );

            let outcome = if level.is_empty() {
                warn!(zoom = level.zoom, "Level {} is empty, skipping", level.zoom);
                LevelOutcome::Empty
            } else {
                let mut written = 0;
                match self.generate_level(image, &level, output_dir, &mut written) {
                    Ok(()) => LevelOutcome::Complete { tiles: written },
                    Err(e) => {
                        error!(
                            zoom = level.zoom,
                            tiles_written = written,
                            "Failed to generate level {}: {}",
                            level.zoom,
                            e
                        );
                        LevelOutcome::Failed {
                            error: e.to_string(),
                            tiles_written: written,
                        }
                    }
                }
            };

            levels.push(LevelReport {
                layout: level,
                outcome,
            });
        }

        let report = GenerationReport { layout, levels };
        info!(
            "Generation finished: {} tiles written, {} level(s) failed",
            report.tiles_written(),
            report.failed_levels().count()
        );

        Ok(report)
    }

    /// Write every tile of one level. `written` counts tiles on disk so far,
    /// so a failed level still reports its progress.
    fn generate_level(
        &self,
        source: &DynamicImage,
        level: &LevelLayout,
        output_dir: &Path,
        written: &mut u64,
    ) -> Result<(), LevelError> {
        let zoom_dir = output_dir.join(level.zoom.to_string());
        create_dir(&zoom_dir)?;

        let resized;
        let raster = if level.is_full_resolution() {
            source
        } else {
            resized = source.resize_exact(level.width, level.height, self.options.filter.into());
            &resized
        };

        for rect in level.tiles() {
            let TileCoord { x, y, .. } = rect.coord;
            if y == 0 {
                create_dir(&zoom_dir.join(x.to_string()))?;
            }

            let tile = raster.crop_imm(rect.left, rect.top, rect.width, rect.height);
            let encoded = self
                .encoder
                .encode(&tile)
                .map_err(|e| LevelError::Encode {
                    x,
                    y,
                    message: e.to_string(),
                })?;

            let path = rect.coord.path_under(output_dir);
            fs::write(&path, &encoded).map_err(|e| LevelError::Write {
                path: path.clone(),
                message: e.to_string(),
            })?;
            *written += 1;

            if y + 1 == level.tiles_y {
                debug!(
                    zoom = level.zoom,
                    "Level {}: {}% ({}/{} columns)",
                    level.zoom,
                    (x + 1) * 100 / level.tiles_x,
                    x + 1,
                    level.tiles_x
                );
            }
        }

        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<(), LevelError> {
    fs::create_dir_all(path).map_err(|e| LevelError::CreateDir {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
