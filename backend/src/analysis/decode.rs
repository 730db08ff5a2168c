use image::error::{ImageError, LimitError, LimitErrorKind, ParameterError, ParameterErrorKind};
use image::imageops::FilterType;
use image::{GrayImage, ImageReader, Limits, Luma, RgbImage};
use std::io::Cursor;

use super::AnalysisError;

pub const TARGET_SIZE: u32 = 224;

/// Per-upload decode bounds.
const MAX_DIMENSION: u32 = 8192;
const MAX_DECODE_ALLOC: u64 = 128 * 1024 * 1024;

/// A 224x224 RGB pixel grid, the only input the feature extractor accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pixels: RgbImage,
}

impl DecodedImage {
    /// Wraps an RGB buffer, resizing it to the working size when needed.
    pub fn from_rgb(pixels: RgbImage) -> Self {
        if pixels.dimensions() == (TARGET_SIZE, TARGET_SIZE) {
            return Self { pixels };
        }
        let pixels = image::imageops::resize(&pixels, TARGET_SIZE, TARGET_SIZE, FilterType::Triangle);
        Self { pixels }
    }

    /// Single-channel luminance with BT.601 weights.
    pub fn luminance(&self) -> GrayImage {
        GrayImage::from_fn(TARGET_SIZE, TARGET_SIZE, |x, y| {
            let [r, g, b] = self.pixels.get_pixel(x, y).0;
            let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            Luma([luma.round().clamp(0.0, 255.0) as u8])
        })
    }
}

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Parses raw upload bytes in any format the `image` crate can sniff and
/// normalises them to RGB before resizing. Images without pixels are rejected.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, AnalysisError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?;
    reader.limits(decode_limits());
    let img = reader.decode()?;

    if img.width() == 0 || img.height() == 0 {
        return Err(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))
        .into());
    }
    // The RGB copy is as large again as the decoded buffer.
    let rgb_bytes = img.width() as u64 * img.height() as u64 * 3;
    if rgb_bytes > MAX_DECODE_ALLOC {
        return Err(ImageError::Limits(LimitError::from_kind(
            LimitErrorKind::InsufficientMemory,
        ))
        .into());
    }
    Ok(DecodedImage::from_rgb(img.to_rgb8()))
}
