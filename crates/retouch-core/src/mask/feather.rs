//! Mask finalization: optional feather blur, then export.

use image::{ImageBuffer, Luma};

use super::{coverage_to_raster, MaskSurface};
use crate::decode::ImageRaster;

/// Produce the mask raster for the current surface.
///
/// With `feather > 0` a Gaussian blur with that radius (as the standard
/// deviation, like CSS `blur()`) is applied to a copy of the coverage;
/// otherwise the coverage is exported as is. The surface itself is never
/// modified, so later strokes keep painting onto the sharp original.
pub fn finalize_mask(surface: &MaskSurface, feather: f32) -> ImageRaster {
    let (width, height) = (surface.width(), surface.height());

    if feather.is_nan() || feather <= 0.0 || width == 0 || height == 0 {
        return surface.to_raster();
    }

    let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
        match ImageBuffer::from_raw(width, height, surface.coverages().to_vec()) {
            Some(buffer) => buffer,
            None => {
                log::warn!("mask buffer does not match {}x{}, skipping feather", width, height);
                return surface.to_raster();
            }
        };

    let blurred = image::imageops::blur(&buffer, feather);
    log::debug!("feathered {}x{} mask by {}px", width, height, feather);
    coverage_to_raster(width, height, blurred.as_raw())
}
