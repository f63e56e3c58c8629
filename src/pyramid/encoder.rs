//! PNG tile encoder.
//!
//! Tiles are always written as PNG so the pyramid stays lossless at every
//! level. The only knob is the zlib effort, trading generation time for
//! file size.

use bytes::Bytes;
use clap::ValueEnum;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ImageFormat, ImageReader, ImageResult};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::raster::png_compatible;

/// PNG compression effort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

impl From<PngCompression> for CompressionType {
    fn from(compression: PngCompression) -> Self {
        match compression {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

/// Encodes cropped tiles to PNG bytes.
#[derive(Debug, Clone, Default)]
pub struct PngTileEncoder {
    compression: PngCompression,
}

impl PngTileEncoder {
    pub fn new(compression: PngCompression) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> PngCompression {
        self.compression
    }

    /// Encode a tile raster to PNG.
    ///
    /// # Errors
    ///
    /// Returns the underlying `image` error if the encoder rejects the
    /// pixel layout or the write fails.
    pub fn encode(&self, tile: &DynamicImage) -> ImageResult<Bytes> {
        let tile = png_compatible(tile);

        let mut output = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut output, self.compression.into(), PngFilter::Adaptive);
        tile.write_with_encoder(encoder)?;

        Ok(Bytes::from(output))
    }

    /// Read the dimensions of an encoded tile without decoding its pixels.
    ///
    /// # Returns
    ///
    /// `(width, height)` in pixels.
    pub fn dimensions(&self, encoded: &[u8]) -> ImageResult<(u32, u32)> {
        ImageReader::with_format(Cursor::new(encoded), ImageFormat::Png).into_dimensions()
    }
}

// =============================================================================
// Tests
// =============================================================================
