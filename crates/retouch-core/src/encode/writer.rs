//! Format-specific encoders built on the `image` crate.
//!
//! JPEG has no alpha channel, so translucent pixels are composited over
//! black before encoding. WEBP output is lossless.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::{ImageFormat, ImageRaster};

/// Quality used when re-encoding baked JPEG output.
pub const JPEG_QUALITY: u8 = 92;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec rejected the data
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: &'static str,
        message: String,
    },
}

/// Encode a raster to the format it carries.
///
/// This is the bake path: an adjusted image leaves the core in the same
/// mime type it arrived in.
pub fn encode_image(raster: &ImageRaster) -> Result<Vec<u8>, EncodeError> {
    encode_as(raster, raster.format)
}

/// Encode a raster to an explicit format, ignoring its own tag.
pub fn encode_as(raster: &ImageRaster, format: ImageFormat) -> Result<Vec<u8>, EncodeError> {
    match format {
        ImageFormat::Png => encode_png(raster),
        ImageFormat::Jpeg => encode_jpeg(raster, JPEG_QUALITY),
        ImageFormat::WebP => encode_webp(raster),
    }
}

/// Encode as PNG, keeping the alpha channel intact.
pub fn encode_png(raster: &ImageRaster) -> Result<Vec<u8>, EncodeError> {
    validate(raster)?;

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            &raster.pixels,
            raster.width,
            raster.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| failed("PNG", e))?;

    Ok(buffer)
}

/// Encode as JPEG.
///
/// # Arguments
///
/// * `raster` - RGBA source; alpha is flattened onto black
/// * `quality` - JPEG quality, clamped to 1-100
pub fn encode_jpeg(raster: &ImageRaster, quality: u8) -> Result<Vec<u8>, EncodeError> {
    validate(raster)?;

    let rgb: Vec<u8> = raster
        .pixels
        .chunks_exact(4)
        .flat_map(|px| {
            let a = px[3] as u16;
            let flatten = move |c: u8| ((c as u16 * a + 127) / 255) as u8;
            [flatten(px[0]), flatten(px[1]), flatten(px[2])]
        })
        .collect();

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(&rgb, raster.width, raster.height, ExtendedColorType::Rgb8)
        .map_err(|e| failed("JPEG", e))?;

    Ok(buffer)
}

fn encode_webp(raster: &ImageRaster) -> Result<Vec<u8>, EncodeError> {
    validate(raster)?;

    let mut buffer = Vec::new();
    WebPEncoder::new_lossless(&mut buffer)
        .write_image(
            &raster.pixels,
            raster.width,
            raster.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| failed("WEBP", e))?;

    Ok(buffer)
}

fn validate(raster: &ImageRaster) -> Result<(), EncodeError> {
    if raster.width == 0 || raster.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: raster.width,
            height: raster.height,
        });
    }

    let expected = ImageRaster::buffer_len(raster.width, raster.height);
    if raster.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: raster.pixels.len(),
        });
    }
    Ok(())
}

fn failed(format: &'static str, err: image::ImageError) -> EncodeError {
    EncodeError::EncodingFailed {
        format,
        message: err.to_string(),
    }
}
