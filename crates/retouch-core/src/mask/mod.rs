//! Brush-painted selection masks.
//!
//! A mask is painted with white radial stamps onto a `MaskSurface` the size
//! of the source image. Only coverage is stored: the paint colour is always
//! white, so every blend mode leaves the colour white and alpha is the one
//! channel that carries information.
//!
//! ## Flow
//!
//! - `BrushEngine` turns pointer samples into stamps (`stroke`)
//! - each stamp is a radial falloff disc (`brush`)
//! - on stroke end the surface is feathered and exported (`feather`)
//! - the exported mask restricts an edit to a region (`apply`)

pub mod apply;
pub mod brush;
pub mod feather;
pub mod stroke;

pub use apply::apply_mask;
pub use brush::{falloff, stamp, BrushMode, BrushSettings};
pub use feather::finalize_mask;
pub use stroke::{
    interpolate_segment, BrushEngine, Point, SegmentStamps, StampWindow, StrokeState,
};

use crate::decode::{ImageFormat, ImageRaster};

/// Accumulated stamp coverage, one alpha value (0.0 to 1.0) per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSurface {
    width: u32,
    height: u32,
    alpha: Vec<f32>,
}

impl MaskSurface {
    /// A fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Coverage at (x, y); 0.0 outside the surface.
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.alpha[self.index(x, y)]
    }

    /// Row-major coverage values.
    pub fn coverages(&self) -> &[f32] {
        &self.alpha
    }

    /// Erase all coverage.
    pub fn clear(&mut self) {
        self.alpha.fill(0.0);
    }

    /// True when nothing has been painted.
    pub fn is_blank(&self) -> bool {
        self.alpha.iter().all(|&a| a <= 0.0)
    }

    pub(crate) fn coverage_mut(&mut self, x: u32, y: u32) -> &mut f32 {
        let i = self.index(x, y);
        &mut self.alpha[i]
    }

    /// Export as a white RGBA raster whose alpha is the coverage.
    pub fn to_raster(&self) -> ImageRaster {
        coverage_to_raster(self.width, self.height, &self.alpha)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Build a white PNG-tagged raster from per-pixel coverage.
pub(crate) fn coverage_to_raster(width: u32, height: u32, alpha: &[f32]) -> ImageRaster {
    let pixels = alpha
        .iter()
        .flat_map(|&a| [255, 255, 255, (a.clamp(0.0, 1.0) * 255.0).round() as u8])
        .collect();
    ImageRaster {
        width,
        height,
        pixels,
        format: ImageFormat::Png,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_blank() {
        let surface = MaskSurface::new(4, 3);
        assert_eq!(surface.coverages().len(), 12);
        assert!(surface.is_blank());
        assert_eq!(surface.coverage(10, 10), 0.0);
    }

    #[test]
    fn test_clear_resets_coverage() {
        let mut surface = MaskSurface::new(2, 2);
        *surface.coverage_mut(1, 1) = 0.7;
        assert!(!surface.is_blank());
        assert_eq!(surface.coverage(1, 1), 0.7);

        surface.clear();
        assert!(surface.is_blank());
    }

    #[test]
    fn test_to_raster_is_white_with_alpha() {
        let mut surface = MaskSurface::new(2, 1);
        *surface.coverage_mut(1, 0) = 0.5;

        let raster = surface.to_raster();
        assert_eq!(raster.format, ImageFormat::Png);
        assert_eq!(raster.pixel(0, 0), Some([255, 255, 255, 0]));
        assert_eq!(raster.pixel(1, 0), Some([255, 255, 255, 128]));
    }
}
