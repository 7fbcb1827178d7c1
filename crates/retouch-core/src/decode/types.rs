//! Core raster types shared by decoding, the pipeline and the mask engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The mime type is not one of the supported raster formats.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The bytes could not be decoded as the declared format.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Width or height is zero.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel buffer does not match the declared dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

/// Raster formats the editor accepts and re-encodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Resolve a mime type tag such as `image/jpeg`. Parameters after `;`
    /// and letter case are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Convert to the image crate's format enum.
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    /// Flip horizontal + rotate 270 CW
    Transpose,
    Rotate90CW,
    /// Flip horizontal + rotate 90 CW
    Transverse,
    Rotate270CW,
}

impl Orientation {
    /// Map the raw EXIF tag value; anything unknown is treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90CW,
            7 => Self::Transverse,
            8 => Self::Rotate270CW,
            _ => Self::Normal,
        }
    }
}

/// An RGBA raster with the format it originated from.
///
/// Used both for the source photo and for finalized masks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRaster {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Interleaved RGBA pixel data in row-major order (4 bytes per pixel).
    pub pixels: Vec<u8>,
    /// Format the raster was decoded from, and re-encodes to.
    pub format: ImageFormat,
}

impl ImageRaster {
    /// Create a raster, checking that the buffer matches the dimensions.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        format: ImageFormat,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        let expected = Self::buffer_len(width, height);
        if pixels.len() != expected {
            return Err(DecodeError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            format,
        })
    }

    /// A raster filled with a single RGBA colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4], format: ImageFormat) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(Self::buffer_len(width, height))
            .collect();
        Self {
            width,
            height,
            pixels,
            format,
        }
    }

    /// Create a raster from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage, format: ImageFormat) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
            format,
        }
    }

    /// Convert to an image::RgbaImage for further processing.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// RGBA value at (x, y), or None outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels
            .get(i..i + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    pub fn same_dimensions(&self, other: &ImageRaster) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub(crate) fn buffer_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }
}
