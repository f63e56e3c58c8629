use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the format converter. All of them are terminal.
#[derive(Debug, Clone, Error)]
pub enum ConvertError {
    /// The source raster does not exist
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The target extension does not name a lossless format we can write
    #[error("Unsupported target format for {}: {reason}", path.display())]
    UnsupportedTarget { path: PathBuf, reason: String },

    /// The source exists but could not be decoded
    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Encoding or writing the target failed
    #[error("Failed to encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },

    /// Filesystem error around the target (e.g. creating its directory)
    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Fatal errors that stop a tile generation run.
///
/// Per-level failures are not fatal; they are reported as [`LevelError`]
/// inside the generation report instead.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// The source raster does not exist; nothing was written
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source could not be decoded; nothing was written
    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Generator options are unusable (e.g. zero tile size)
    #[error("Invalid generator options: {0}")]
    InvalidOptions(String),

    /// The output directory could not be created
    #[error("Cannot create output directory {}: {message}", path.display())]
    OutputDir { path: PathBuf, message: String },

    /// Tiles were written but the manifest could not be persisted
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

/// Error that aborts a single zoom level.
#[derive(Debug, Clone, Error)]
pub enum LevelError {
    /// A level or column directory could not be created
    #[error("Cannot create directory {}: {message}", path.display())]
    CreateDir { path: PathBuf, message: String },

    /// A tile could not be encoded
    #[error("Failed to encode tile {x}/{y}: {message}")]
    Encode { x: u32, y: u32, message: String },

    /// A tile could not be written to disk
    #[error("Failed to write tile {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
}

/// Errors reading or writing the pyramid manifest.
#[derive(Debug, Clone, Error)]
pub enum ManifestError {
    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Malformed manifest {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The manifest parsed but describes a layout that cannot be tiled
    #[error("Invalid layout in manifest {}: {message}", path.display())]
    InvalidLayout { path: PathBuf, message: String },
}

/// Errors raised while serving tiles over HTTP.
#[derive(Debug, Clone, Error)]
pub enum TileServeError {
    /// No tile file exists at the requested coordinates
    #[error("Tile not found: {z}/{x}/{y}")]
    NotFound { z: u8, x: u32, y: u32 },

    /// The last path segment is not `{y}` or `{y}.png`
    #[error("Invalid tile path segment: {filename}")]
    InvalidPath { filename: String },

    /// Reading from the tile store failed
    #[error("I/O error: {0}")]
    Io(String),
}
