//! Format converter: re-encode a source raster into a lossless web format.
//!
//! The usual input is a large TIFF exported from GIS tooling; the output is
//! the PNG that the tile generator reads.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::info;

use crate::error::ConvertError;
use crate::raster::{open_raster, png_compatible, raster_dimensions};

/// Target formats the converter writes. All of them are lossless.
pub const LOSSLESS_TARGETS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Tiff];

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub target: PathBuf,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Resolve the target format from the target path's extension.
pub fn target_format(target: &Path) -> Result<ImageFormat, ConvertError> {
    let format = ImageFormat::from_path(target).map_err(|e| ConvertError::UnsupportedTarget {
        path: target.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !LOSSLESS_TARGETS.contains(&format) {
        return Err(ConvertError::UnsupportedTarget {
            path: target.to_path_buf(),
            reason: format!("{:?} is not a lossless output format (use .png or .tiff)", format),
        });
    }

    Ok(format)
}

/// Decode `source` and write it to `target` in the format named by the
/// target's extension.
///
/// Single attempt: any error is returned to the caller as is.
pub fn convert(source: &Path, target: &Path) -> Result<Conversion, ConvertError> {
    let format = target_format(target)?;

    if !source.is_file() {
        return Err(ConvertError::SourceNotFound(source.to_path_buf()));
    }

    let decode_error = |e: image::ImageError| ConvertError::Decode {
        path: source.to_path_buf(),
        message: e.to_string(),
    };

    let (width, height) = raster_dimensions(source).map_err(decode_error)?;
    info!("Reading {} ({}x{})", source.display(), width, height);
    let image = open_raster(source).map_err(decode_error)?;

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConvertError::Io {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }

    info!("Writing {:?} to {}", format, target.display());
    let encodable = if format == ImageFormat::Png {
        png_compatible(&image)
    } else {
        Cow::Borrowed(&image)
    };
    encodable
        .save_with_format(target, format)
        .map_err(|e| ConvertError::Encode {
            path: target.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(Conversion {
        target: target.to_path_buf(),
        format,
        width: image.width(),
        height: image.height(),
    })
}
