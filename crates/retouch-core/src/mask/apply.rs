//! Masked compositing
//!
//! Restricts an edit to the painted region: where the mask is opaque the
//! edited pixel wins, where it is transparent the original is kept, and
//! feathered edges blend between the two.

use std::borrow::Cow;

use crate::decode::{resize, DecodeError, FilterType, ImageRaster};

/// Blend `edited` into `original` by the mask's alpha channel.
///
/// # Arguments
/// * `original` - Source raster; its size and format define the output
/// * `edited` - Edited raster, resized to the original if it differs
/// * `mask` - Finalized mask; alpha is the blend weight
///
/// # Algorithm
/// Per channel: `output = original * (1 - m) + edited * m`, `m = alpha / 255`.
///
/// # Errors
/// Only resizing can fail, which requires a degenerate raster.
pub fn apply_mask(
    original: &ImageRaster,
    edited: &ImageRaster,
    mask: &ImageRaster,
) -> Result<ImageRaster, DecodeError> {
    let edited = fit_to(edited, original, FilterType::Bilinear)?;
    let mask = fit_to(mask, original, FilterType::Bilinear)?;

    let mut output = original.clone();
    for ((out, src), m) in output
        .pixels
        .chunks_exact_mut(4)
        .zip(edited.pixels.chunks_exact(4))
        .zip(mask.pixels.chunks_exact(4))
    {
        let weight = m[3] as f32 / 255.0;

        // Skip if mask has no effect at this pixel
        if weight <= 0.0 {
            continue;
        }
        if weight >= 1.0 {
            out.copy_from_slice(src);
            continue;
        }

        for (o, &e) in out.iter_mut().zip(src) {
            let blended = *o as f32 * (1.0 - weight) + e as f32 * weight;
            *o = blended.clamp(0.0, 255.0).round() as u8;
        }
    }

    Ok(output)
}

fn fit_to<'a>(
    image: &'a ImageRaster,
    target: &ImageRaster,
    filter: FilterType,
) -> Result<Cow<'a, ImageRaster>, DecodeError> {
    if image.same_dimensions(target) {
        return Ok(Cow::Borrowed(image));
    }
    log::debug!(
        "resizing {}x{} to {}x{} for masked composite",
        image.width,
        image.height,
        target.width,
        target.height
    );
    resize(image, target.width, target.height, filter).map(Cow::Owned)
}
