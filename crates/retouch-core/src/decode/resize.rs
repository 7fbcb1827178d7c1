//! Raster resizing.
//!
//! Used to bring rasters produced elsewhere (an edited result, an upscaled
//! image) back onto the pixel grid of the source image.

use serde::{Deserialize, Serialize};

use super::{DecodeError, ImageRaster};

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, keeps hard mask edges).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Resize a raster to exact dimensions. The format tag is preserved.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` for a zero target size.
pub fn resize(
    image: &ImageRaster,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<ImageRaster, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgba = image
        .to_rgba_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Failed to create RgbaImage".to_string()))?;

    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());
    Ok(ImageRaster::from_rgba_image(resized, image.format))
}
