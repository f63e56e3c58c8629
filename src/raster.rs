//! Raster decoding helpers shared by the converter and the tile generator.

use std::borrow::Cow;
use std::path::Path;

use clap::ValueEnum;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageReader, ImageResult};
use serde::{Deserialize, Serialize};

/// Resampling filter used when downsampling a zoom level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Decode a raster from disk, guessing the format from its content.
///
/// The default decoder allocation limit (512 MiB) is lifted: source maps are
/// routinely larger than that once expanded to pixels.
pub fn open_raster(path: &Path) -> ImageResult<DynamicImage> {
    let mut reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.no_limits();
    reader.decode()
}

/// Read the pixel dimensions of a raster without decoding it.
pub fn raster_dimensions(path: &Path) -> ImageResult<(u32, u32)> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
}

/// Return an image whose pixel layout the PNG encoder accepts.
///
/// PNG has no floating point samples, so 32-bit float images are narrowed
/// to 16 bits per channel. Everything else is passed through untouched.
pub fn png_compatible(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            Cow::Owned(DynamicImage::ImageRgba16(image.to_rgba16()))
        }
        _ => Cow::Borrowed(image),
    }
}
