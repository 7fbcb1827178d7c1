//! Image decoding for Retouch.
//!
//! This module provides functionality for:
//! - Identifying source images by their mime type (PNG, JPEG, WEBP)
//! - Decoding them to RGBA rasters with EXIF orientation applied
//! - Resizing rasters, e.g. to bring an edited result back to the source size
//!
//! # Architecture
//!
//! Decoding is synchronous and single-threaded. A decode failure rejects the
//! whole operation; no partial raster is ever produced.

mod reader;
mod resize;
mod types;

pub use reader::{decode_image, decode_image_no_orientation, get_orientation};
pub use resize::{resize, FilterType};
pub use types::{DecodeError, ImageFormat, ImageRaster, Orientation};
