//! Image encoding WASM bindings.
//!
//! # Functions
//!
//! - [`encode_image`] - Encode to the image's own mime type
//! - [`encode_png`] - Encode as PNG (used for masks)
//! - [`encode_jpeg`] - Encode as JPEG with an explicit quality
//!
//! # Example
//!
//! ```typescript
//! const bytes = encode_image(adjusted);
//! const blob = new Blob([bytes], { type: adjusted.mime });
//! ```

use crate::types::JsImage;
use retouch_core::encode;
use wasm_bindgen::prelude::*;

/// Encode an image to its own mime type.
///
/// # Errors
///
/// Returns an error if the pixel buffer is inconsistent or encoding fails.
#[wasm_bindgen]
pub fn encode_image(image: &JsImage) -> Result<Vec<u8>, JsValue> {
    encode::encode_image(image.raster()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode an image as PNG, keeping alpha.
#[wasm_bindgen]
pub fn encode_png(image: &JsImage) -> Result<Vec<u8>, JsValue> {
    encode::encode_png(image.raster()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode an image as JPEG.
///
/// Alpha is flattened onto black. `quality` is clamped to 1-100.
#[wasm_bindgen]
pub fn encode_jpeg(image: &JsImage, quality: u8) -> Result<Vec<u8>, JsValue> {
    encode::encode_jpeg(image.raster(), quality).map_err(|e| JsValue::from_str(&e.to_string()))
}
