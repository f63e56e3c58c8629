//! Tile storage abstraction.
//!
//! The server never renders tiles; it only hands out what the generator left
//! on disk. [`TileStore`] keeps the handlers independent of where that is.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::TileServeError;
use crate::pyramid::{LevelLayout, TileCoord, TILE_EXTENSION};

/// Read-only access to a `{z}/{x}/{y}.png` tile tree.
#[async_trait]
pub trait TileStore: Send + Sync + 'static {
    /// Fetch the encoded tile, or `None` if the pyramid has no such tile.
    async fn read_tile(&self, coord: TileCoord) -> Result<Option<Bytes>, TileServeError>;

    /// Check for a tile without reading it.
    async fn contains(&self, coord: TileCoord) -> bool;

    /// Number of the level's tiles present in the store.
    ///
    /// The default asks [`contains`](TileStore::contains) once per tile.
    async fn count_tiles(&self, level: LevelLayout) -> u64 {
        let mut present = 0;
        for rect in level.tiles() {
            if self.contains(rect.coord).await {
                present += 1;
            }
        }
        present
    }
}

/// Tile store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsTileStore {
    root: PathBuf,
}

impl FsTileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl TileStore for FsTileStore {
    async fn read_tile(&self, coord: TileCoord) -> Result<Option<Bytes>, TileServeError> {
        match tokio::fs::read(coord.path_under(&self.root)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TileServeError::Io(e.to_string())),
        }
    }

    async fn contains(&self, coord: TileCoord) -> bool {
        tokio::fs::metadata(coord.path_under(&self.root))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// One walk of `{root}/{z}` on the blocking pool instead of a metadata
    /// call per tile.
    async fn count_tiles(&self, level: LevelLayout) -> u64 {
        let zoom_dir = self.root.join(level.zoom.to_string());

        tokio::task::spawn_blocking(move || count_level_files(&zoom_dir, &level))
            .await
            .unwrap_or_else(|e| {
                warn!(zoom = level.zoom, "Tile count task failed: {}", e);
                0
            })
    }
}

/// Count `{x}/{y}.png` files under a level directory that fall inside the
/// level's grid.
fn count_level_files(zoom_dir: &Path, level: &LevelLayout) -> u64 {
    let count = WalkDir::new(zoom_dir)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| tile_position(entry.path()))
        .filter(|&(x, y)| x < level.tiles_x && y < level.tiles_y)
        .count();

    count as u64
}

/// Column and row of a tile path ending in `{x}/{y}.png`.
fn tile_position(path: &Path) -> Option<(u32, u32)> {
    let y = path
        .file_name()?
        .to_str()?
        .strip_suffix(TILE_EXTENSION)?
        .strip_suffix('.')?;
    let x = path.parent()?.file_name()?.to_str()?;
    Some((canonical_index(x)?, canonical_index(y)?))
}

/// Parse a path segment written by the generator; "01" or "+1" would alias
/// another tile and are rejected.
fn canonical_index(segment: &str) -> Option<u32> {
    segment
        .parse()
        .ok()
        .filter(|index: &u32| index.to_string() == segment)
}
