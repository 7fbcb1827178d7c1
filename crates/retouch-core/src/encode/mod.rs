//! Raster encoding for baked images and exported masks.
//!
//! This module provides functionality for:
//! - Re-encoding an adjusted raster to the mime type it was loaded from
//! - Encoding finalized masks as PNG so their alpha channel survives
//!
//! # Examples
//!
//! ```ignore
//! use retouch_core::encode::encode_image;
//! use retouch_core::{ImageFormat, ImageRaster};
//!
//! let raster = ImageRaster::filled(100, 100, [128, 128, 128, 255], ImageFormat::Jpeg);
//! let jpeg_bytes = encode_image(&raster).unwrap();
//! println!("Encoded {} bytes", jpeg_bytes.len());
//! ```

mod writer;

pub use writer::{encode_as, encode_image, encode_jpeg, encode_png, EncodeError, JPEG_QUALITY};
