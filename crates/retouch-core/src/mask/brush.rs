//! Brush configuration and single-stamp rasterization.
//!
//! A stamp is a disc of radius `size / 2`. Coverage is full (the configured
//! opacity) out to `hardness * radius`, then fades linearly to zero at the
//! rim. Coverage is sampled at pixel centres.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::MaskSurface;
use crate::adjustments::{clamp_to, RangeError};
use crate::blend::{composite, destination_out, BlendMode};

pub const SIZE_RANGE: RangeInclusive<f32> = 2.0..=150.0;
pub const HARDNESS_RANGE: RangeInclusive<f32> = 0.01..=1.0;
pub const OPACITY_RANGE: RangeInclusive<f32> = 0.01..=1.0;
pub const FEATHER_RANGE: RangeInclusive<f32> = 0.0..=50.0;

/// Largest spacing between interpolated stamps, in mask pixels.
pub const MAX_STAMP_STEP: f32 = 4.0;

/// Whether stamps add or remove coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrushMode {
    #[default]
    #[serde(rename = "brush", alias = "paint")]
    Paint,
    #[serde(rename = "eraser", alias = "erase")]
    Erase,
}

/// Brush configuration for mask painting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrushSettings {
    /// Diameter in mask pixels (2 to 150)
    pub size: f32,
    /// Fraction of the radius painted at full opacity (0.01 to 1.0)
    pub hardness: f32,
    /// Stamp opacity in paint mode (0.01 to 1.0)
    pub opacity: f32,
    pub mode: BrushMode,
    /// Blur radius applied when a stroke ends (0 to 50)
    pub feather: f32,
    /// Compositing operator in paint mode; ignored when erasing
    pub blend_mode: BlendMode,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            size: 40.0,
            hardness: 0.5,
            opacity: 1.0,
            mode: BrushMode::Paint,
            feather: 0.0,
            blend_mode: BlendMode::SourceOver,
        }
    }
}

impl BrushSettings {
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    /// Spacing of interpolated stamps along a stroke: `min(4, size / 4)`.
    pub fn step(&self) -> f32 {
        MAX_STAMP_STEP.min(self.size / 4.0)
    }

    pub fn validate(&self) -> Result<(), RangeError> {
        RangeError::check("size", self.size, &SIZE_RANGE)?;
        RangeError::check("hardness", self.hardness, &HARDNESS_RANGE)?;
        RangeError::check("opacity", self.opacity, &OPACITY_RANGE)?;
        RangeError::check("feather", self.feather, &FEATHER_RANGE)?;
        Ok(())
    }

    /// Copy with every numeric field clamped into range.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        Self {
            size: clamp_to(self.size, &SIZE_RANGE, d.size),
            hardness: clamp_to(self.hardness, &HARDNESS_RANGE, d.hardness),
            opacity: clamp_to(self.opacity, &OPACITY_RANGE, d.opacity),
            mode: self.mode,
            feather: clamp_to(self.feather, &FEATHER_RANGE, d.feather),
            blend_mode: self.blend_mode,
        }
    }
}

/// Radial falloff at `distance` from the stamp centre, in 0..=1.
///
/// # Arguments
/// * `distance` - Distance from the centre in pixels
/// * `radius` - Outer radius of the stamp
/// * `hardness` - Fraction of the radius at full strength
#[inline]
pub fn falloff(distance: f32, radius: f32, hardness: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    let hardness = hardness.clamp(0.01, 1.0);
    let t = distance / radius;
    if t > 1.0 {
        0.0
    } else if t <= hardness {
        1.0
    } else {
        ((1.0 - t) / (1.0 - hardness)).clamp(0.0, 1.0)
    }
}

/// Composite one stamp centred at (cx, cy) onto `surface`.
///
/// Paint mode lays down white at `opacity * falloff` through the
/// configured blend mode. Erase mode is `destination-out` at full strength,
/// so it only ever lowers coverage.
pub fn stamp(surface: &mut MaskSurface, cx: f32, cy: f32, settings: &BrushSettings) {
    let radius = settings.radius();
    if radius <= 0.0 || !cx.is_finite() || !cy.is_finite() {
        return;
    }

    // Only pixels whose centre can fall inside the disc.
    let x0 = (cx - radius - 0.5).floor().max(0.0);
    let y0 = (cy - radius - 0.5).floor().max(0.0);
    let x1 = (cx + radius - 0.5).ceil().min(surface.width() as f32 - 1.0);
    let y1 = (cy + radius - 0.5).ceil().min(surface.height() as f32 - 1.0);
    if x1 < x0 || y1 < y0 {
        return;
    }

    let erase = settings.mode == BrushMode::Erase;
    let opacity = settings.opacity.clamp(0.0, 1.0);

    for py in (y0 as u32)..=(y1 as u32) {
        for px in (x0 as u32)..=(x1 as u32) {
            let d = (px as f32 + 0.5 - cx).hypot(py as f32 + 0.5 - cy);
            let f = falloff(d, radius, settings.hardness);
            if f <= 0.0 {
                continue;
            }

            let cov = surface.coverage_mut(px, py);
            *cov = if erase {
                destination_out([1.0, 1.0, 1.0, *cov], f)[3]
            } else {
                composite(
                    settings.blend_mode,
                    [1.0, 1.0, 1.0, *cov],
                    [1.0, 1.0, 1.0, opacity * f],
                )[3]
            };
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Erasing never increases coverage anywhere.
        #[test]
        fn prop_erase_never_increases(
            (px, py) in (0.0f32..40.0, 0.0f32..40.0),
            (ex, ey) in (0.0f32..40.0, 0.0f32..40.0),
            size in 2.0f32..=150.0,
            hardness in 0.01f32..=1.0,
        ) {
            let mut surface = MaskSurface::new(40, 40);
            stamp(&mut surface, px, py, &BrushSettings { size: 30.0, ..BrushSettings::default() });
            let before = surface.clone();

            let eraser = BrushSettings { size, hardness, mode: BrushMode::Erase, ..BrushSettings::default() };
            stamp(&mut surface, ex, ey, &eraser);

            for (a, b) in surface.coverages().iter().zip(before.coverages()) {
                prop_assert!(a <= b);
            }
        }

        /// Painting never lowers coverage, whatever the blend mode.
        #[test]
        fn prop_paint_never_decreases(
            (x, y) in (0.0f32..40.0, 0.0f32..40.0),
            mode_index in 0usize..5,
            opacity in 0.01f32..=1.0,
        ) {
            let mut surface = MaskSurface::new(40, 40);
            stamp(&mut surface, 20.0, 20.0, &BrushSettings { size: 24.0, opacity: 0.6, ..BrushSettings::default() });
            let before = surface.clone();

            let brush = BrushSettings { opacity, blend_mode: BlendMode::ALL[mode_index], ..BrushSettings::default() };
            stamp(&mut surface, x, y, &brush);

            for (a, b) in surface.coverages().iter().zip(before.coverages()) {
                prop_assert!(*a >= *b - 1e-6);
                prop_assert!(*a <= 1.0);
            }
        }
    }
}
