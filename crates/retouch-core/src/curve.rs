//! Tone curve interpolation and LUT generation using Catmull-Rom splines.
//!
//! The curve is padded with a duplicate of its first and last point, which
//! gives the spline zero velocity at both ends. Catmull-Rom does not
//! guarantee monotonicity, so strongly uneven point placement can overshoot
//! the neighbouring control values; the LUT saturates those excursions at
//! 0 and 255.

use crate::{Channel, Curve, CurvePoint, Curves, TONE_MAX};

// ============================================================================
// LUT Type
// ============================================================================

/// Pre-computed 256-entry lookup table for efficient curve application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneCurveLut {
    /// LUT values: lut[input] = output
    pub lut: [u8; 256],
}

impl ToneCurveLut {
    /// Generate LUT from a tone curve.
    pub fn from_curve(curve: &Curve) -> Self {
        // The padded spline is not linear even for the identity curve, so
        // the identity is special-cased to stay an exact no-op.
        if curve.is_identity() {
            return Self::identity();
        }

        let points = curve.points();
        let last = points.len() - 1;
        let mut lut = [0u8; 256];
        let mut segment = 0;

        for (i, lut_value) in lut.iter_mut().enumerate() {
            let x = i as f32;
            // Both the scan and the points ascend in x, so the cursor only moves forward.
            while segment + 1 < last && points[segment + 1].x <= x {
                segment += 1;
            }
            *lut_value = to_tone(evaluate_segment(points, segment, x));
        }

        Self { lut }
    }

    /// Create identity LUT (no change).
    pub fn identity() -> Self {
        let mut lut = [0u8; 256];
        for (i, lut_value) in lut.iter_mut().enumerate() {
            *lut_value = i as u8;
        }
        Self { lut }
    }

    /// Check if this LUT is identity.
    pub fn is_identity(&self) -> bool {
        self.lut.iter().enumerate().all(|(i, &v)| v == i as u8)
    }

    #[inline]
    pub fn map(&self, value: u8) -> u8 {
        self.lut[value as usize]
    }
}

impl Default for ToneCurveLut {
    fn default() -> Self {
        Self::identity()
    }
}

// ============================================================================
// Per-channel LUT set
// ============================================================================

/// The four LUTs of a `Curves` value, kept together so they can be
/// regenerated one channel at a time while a curve is being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurveLuts {
    pub rgb: ToneCurveLut,
    pub r: ToneCurveLut,
    pub g: ToneCurveLut,
    pub b: ToneCurveLut,
}

impl CurveLuts {
    pub fn from_curves(curves: &Curves) -> Self {
        Self {
            rgb: ToneCurveLut::from_curve(&curves.rgb),
            r: ToneCurveLut::from_curve(&curves.r),
            g: ToneCurveLut::from_curve(&curves.g),
            b: ToneCurveLut::from_curve(&curves.b),
        }
    }

    pub fn get(&self, channel: Channel) -> &ToneCurveLut {
        match channel {
            Channel::Rgb => &self.rgb,
            Channel::Red => &self.r,
            Channel::Green => &self.g,
            Channel::Blue => &self.b,
        }
    }

    /// Regenerate the LUT of a single channel after its curve changed.
    pub fn rebuild(&mut self, channel: Channel, curves: &Curves) {
        let lut = ToneCurveLut::from_curve(curves.get(channel));
        match channel {
            Channel::Rgb => self.rgb = lut,
            Channel::Red => self.r = lut,
            Channel::Green => self.g = lut,
            Channel::Blue => self.b = lut,
        }
    }

    pub fn is_identity(&self) -> bool {
        Channel::ALL.iter().all(|&c| self.get(c).is_identity())
    }

    /// Remap one pixel: master curve first, then the channel's own curve.
    #[inline]
    pub fn map_rgb(&self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        (
            self.r.map(self.rgb.map(r)),
            self.g.map(self.rgb.map(g)),
            self.b.map(self.rgb.map(b)),
        )
    }
}

// ============================================================================
// Curve Application
// ============================================================================

/// Apply the curve LUTs to RGBA pixels in place. Alpha is left untouched.
///
/// # Arguments
/// * `pixels` - RGBA pixel data (4 bytes per pixel)
/// * `luts` - Pre-computed lookup tables
pub fn apply_curves(pixels: &mut [u8], luts: &CurveLuts) {
    // Early exit for identity
    if luts.is_identity() {
        return;
    }

    for chunk in pixels.chunks_exact_mut(4) {
        let (r, g, b) = luts.map_rgb(chunk[0], chunk[1], chunk[2]);
        chunk[0] = r;
        chunk[1] = g;
        chunk[2] = b;
    }
}

// ============================================================================
// Catmull-Rom Spline
// ============================================================================

/// Standard Catmull-Rom blend of four control values at local parameter `t`.
#[inline]
fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let v0 = (p2 - p0) * 0.5;
    let v1 = (p3 - p1) * 0.5;
    let t2 = t * t;
    let t3 = t2 * t;
    (2.0 * p1 - 2.0 * p2 + v0 + v1) * t3 + (-3.0 * p1 + 3.0 * p2 - 2.0 * v0 - v1) * t2 + v0 * t + p1
}

/// Evaluate segment `k` (between points k and k+1) at input `x`.
///
/// Out-of-range neighbours fall back to the segment's own endpoints, which is
/// the same as padding the point list with duplicated first/last points.
fn evaluate_segment(points: &[CurvePoint], k: usize, x: f32) -> f32 {
    let p1 = points[k];
    let p2 = points[k + 1];
    let p0 = if k == 0 { p1 } else { points[k - 1] };
    let p3 = points.get(k + 2).copied().unwrap_or(p2);

    let t = ((x - p1.x) / (p2.x - p1.x)).clamp(0.0, 1.0);
    catmull_rom(p0.y, p1.y, p2.y, p3.y, t)
}

/// Store a spline value the way an 8-bit clamped buffer would: saturate,
/// then round half to even.
#[inline]
fn to_tone(value: f32) -> u8 {
    value.clamp(0.0, TONE_MAX).round_ties_even() as u8
}

// ============================================================================
// Public Curve Evaluation (for UI preview)
// ============================================================================

/// Evaluate a tone curve at a given input tone, clamped to 0-255.
/// Used for drawing the curve in the UI.
pub fn evaluate_curve(curve: &Curve, x: f32) -> f32 {
    if curve.is_identity() {
        return x.clamp(0.0, TONE_MAX);
    }

    let points = curve.points();
    let x = x.clamp(0.0, TONE_MAX);
    let segment = points
        .partition_point(|p| p.x <= x)
        .saturating_sub(1)
        .min(points.len() - 2);

    evaluate_segment(points, segment, x).clamp(0.0, TONE_MAX)
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property-Based Tests
// ============================================================================
