//! `pyramid.json`: the generation report persisted next to the tiles.
//!
//! The viewer reads it to learn the source size and zoom range instead of
//! having them hardcoded.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ManifestError;

use super::generator::GenerationReport;

/// File name of the manifest inside the tile directory.
pub const MANIFEST_FILE_NAME: &str = "pyramid.json";

pub fn manifest_path(tile_dir: &Path) -> PathBuf {
    tile_dir.join(MANIFEST_FILE_NAME)
}

/// Write `report` as pretty-printed JSON into `tile_dir`.
pub fn write_manifest(tile_dir: &Path, report: &GenerationReport) -> Result<(), ManifestError> {
    let path = manifest_path(tile_dir);

    let json = serde_json::to_vec_pretty(report).map_err(|e| ManifestError::Parse {
        path: path.clone(),
        message: e.to_string(),
    })?;

    fs::write(&path, json).map_err(|e| ManifestError::Io {
        path,
        message: e.to_string(),
    })
}

/// Load the manifest from `tile_dir`.
///
/// Returns `Ok(None)` when there is no manifest, e.g. for tile trees produced
/// by other tools. A manifest whose layout cannot be tiled (zero tile size,
/// zero dimensions, zoom past the limit) is rejected.
pub fn read_manifest(tile_dir: &Path) -> Result<Option<GenerationReport>, ManifestError> {
    let path = manifest_path(tile_dir);

    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ManifestError::Io {
                path,
                message: e.to_string(),
            })
        }
    };

    let report: GenerationReport =
        serde_json::from_slice(&data).map_err(|e| ManifestError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;

    report
        .layout
        .validate()
        .map_err(|message| ManifestError::InvalidLayout { path, message })?;

    Ok(Some(report))
}
