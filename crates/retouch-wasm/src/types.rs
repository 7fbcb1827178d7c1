//! WASM-compatible wrapper types for image data.
//!
//! These types wrap the core raster and display types and convert between
//! the Rust and JavaScript representations.

use retouch_core::decode::{FilterType, ImageFormat, ImageRaster};
use retouch_core::DisplayRect;
use wasm_bindgen::prelude::*;

/// A decoded RGBA image for JavaScript.
///
/// Pixels are straight-alpha RGBA, row-major, ready for `new ImageData(...)`.
/// The mime type is the one the image will be re-encoded to.
///
/// # Memory Management
///
/// Pixel data lives in WASM memory. `pixels()` copies it into a JavaScript
/// `Uint8Array`. `free()` releases the WASM copy early; otherwise the
/// wasm-bindgen finalizer does it.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsImage {
    inner: ImageRaster,
}

#[wasm_bindgen]
impl JsImage {
    /// Wrap raw RGBA pixels.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `pixels` - RGBA pixel data (4 bytes per pixel)
    /// * `mime` - Target mime type; unknown types fall back to PNG
    ///
    /// # Errors
    /// Returns an error if the buffer length doesn't match the dimensions.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, mime: &str) -> Result<JsImage, JsValue> {
        let format = ImageFormat::from_mime(mime).unwrap_or_default();
        ImageRaster::new(width, height, pixels, format)
            .map(JsImage::from_raster)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Mime type the image encodes to.
    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.inner.mime_type().to_string()
    }

    /// Number of bytes in the pixel buffer (width * height * 4).
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.inner.pixels.len()
    }

    /// Returns RGBA pixel data as a `Uint8Array` copy.
    pub fn pixels(&self) -> Vec<u8> {
        self.inner.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsImage {
    pub(crate) fn from_raster(inner: ImageRaster) -> Self {
        Self { inner }
    }

    pub(crate) fn raster(&self) -> &ImageRaster {
        &self.inner
    }
}

/// Convert a u8 filter value to the core FilterType.
///
/// Values:
/// - 0 = Nearest
/// - 1 = Bilinear
/// - 2 = Lanczos3
///
/// Any other value defaults to Bilinear.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear,
    }
}

/// Build a display rect from `getBoundingClientRect()` fields.
pub(crate) fn display_rect(left: f32, top: f32, width: f32, height: f32) -> DisplayRect {
    DisplayRect::new(left, top, width, height)
}
