//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_image`] - Decode PNG / JPEG / WEBP bytes to RGBA, EXIF orientation applied
//! - [`resize`] - Resize an image to exact dimensions
//!
//! # Example
//!
//! ```typescript
//! import { decode_image } from '@retouch/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes, file.type);
//! console.log(`Decoded ${image.width}x${image.height} ${image.mime}`);
//! ```

use crate::types::{filter_from_u8, JsImage};
use retouch_core::decode;
use wasm_bindgen::prelude::*;

/// Decode an image from bytes.
///
/// # Arguments
///
/// * `bytes` - The encoded file bytes
/// * `mime` - The file's mime type (`image/png`, `image/jpeg` or `image/webp`)
///
/// # Errors
///
/// Returns an error if the mime type is unsupported or the bytes don't
/// decode as that format.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8], mime: &str) -> Result<JsImage, JsValue> {
    decode::decode_image(bytes, mime)
        .map(JsImage::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Resize an image to exact dimensions.
///
/// # Arguments
///
/// * `image` - The source image
/// * `width` - Target width in pixels
/// * `height` - Target height in pixels
/// * `filter` - 0=Nearest, 1=Bilinear (default), 2=Lanczos3
///
/// # Errors
///
/// Returns an error if width or height is zero.
#[wasm_bindgen]
pub fn resize(image: &JsImage, width: u32, height: u32, filter: u8) -> Result<JsImage, JsValue> {
    decode::resize(image.raster(), width, height, filter_from_u8(filter))
        .map(JsImage::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(&[0, 1, 2, 3], "image/png").is_err());
    }

    #[wasm_bindgen_test]
    fn test_decode_unsupported_mime_fails() {
        assert!(decode_image(&[0, 1, 2, 3], "image/gif").is_err());
    }
}
