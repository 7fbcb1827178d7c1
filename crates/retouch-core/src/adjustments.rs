//! Adjustment parameters and the global tone operators.
//!
//! `Adjustments` is the value object the editing session owns. Only
//! brightness, contrast and saturation (plus curves and the colour overlay,
//! handled in `pipeline`) change pixels. Exposure, highlights, shadows,
//! vibrance, temperature, tint, sharpen, vignette and grain are accepted,
//! range-checked and round-tripped, but have no pixel effect.
//!
//! ## Tone Operator Order
//! 1. Brightness: `v * b`
//! 2. Contrast: `(v - 127.5) * c + 127.5`
//! 3. Saturation: luminance-preserving colour matrix
//!
//! Each operator clamps to 0-255 before the next one runs, so chaining
//! behaves like a stack of CSS filter functions.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Curves;

/// Overlay colour used when `filter_color` cannot be parsed.
pub const DEFAULT_FILTER_COLOR: &str = "#ffffff";

pub const BRIGHTNESS_RANGE: RangeInclusive<f32> = 0.0..=200.0;
pub const CONTRAST_RANGE: RangeInclusive<f32> = 0.0..=200.0;
pub const SATURATION_RANGE: RangeInclusive<f32> = 0.0..=200.0;
/// Range shared by vibrance, exposure, highlights, shadows, temperature and tint.
pub const BIPOLAR_RANGE: RangeInclusive<f32> = -100.0..=100.0;
/// Range shared by sharpen, vignette, grain and filter strength.
pub const PERCENT_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// A configuration value outside its declared range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("invalid filter colour {0:?}, expected #rrggbb")]
    InvalidColor(String),
}

impl RangeError {
    pub(crate) fn check(
        field: &'static str,
        value: f32,
        range: &RangeInclusive<f32>,
    ) -> Result<(), RangeError> {
        if value.is_finite() && range.contains(&value) {
            Ok(())
        } else {
            Err(RangeError::OutOfRange {
                field,
                value,
                min: *range.start(),
                max: *range.end(),
            })
        }
    }
}

/// Clamp into `range`, replacing NaN/infinite input with `fallback`.
pub(crate) fn clamp_to(value: f32, range: &RangeInclusive<f32>, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(*range.start(), *range.end())
    } else {
        fallback
    }
}

/// Global adjustment settings for an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Adjustments {
    /// Brightness percentage (0 to 200, 100 = neutral)
    pub brightness: f32,
    /// Contrast percentage (0 to 200, 100 = neutral)
    pub contrast: f32,
    /// Saturation percentage (0 to 200, 100 = neutral)
    pub saturation: f32,
    /// Vibrance (-100 to +100), inert
    pub vibrance: f32,
    /// Exposure (-100 to +100), inert
    pub exposure: f32,
    /// Highlights (-100 to +100), inert
    pub highlights: f32,
    /// Shadows (-100 to +100), inert
    pub shadows: f32,
    /// Temperature (-100 to +100), inert
    pub temperature: f32,
    /// Tint (-100 to +100), inert
    pub tint: f32,
    /// Sharpen (0 to 100), inert
    pub sharpen: f32,
    /// Vignette (0 to 100), inert
    pub vignette: f32,
    /// Grain (0 to 100), inert
    pub grain: f32,
    /// Tone curves for all four channels
    pub curves: Curves,
    /// Overlay colour as a CSS hex string
    pub filter_color: String,
    /// Overlay opacity percentage (0 to 100)
    pub filter_strength: f32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            vibrance: 0.0,
            exposure: 0.0,
            highlights: 0.0,
            shadows: 0.0,
            temperature: 0.0,
            tint: 0.0,
            sharpen: 0.0,
            vignette: 0.0,
            grain: 0.0,
            curves: Curves::default(),
            filter_color: DEFAULT_FILTER_COLOR.to_string(),
            filter_strength: 0.0,
        }
    }
}

impl Adjustments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every numeric field with its name and declared range.
    fn numeric_fields(&self) -> [(&'static str, f32, RangeInclusive<f32>); 13] {
        [
            ("brightness", self.brightness, BRIGHTNESS_RANGE),
            ("contrast", self.contrast, CONTRAST_RANGE),
            ("saturation", self.saturation, SATURATION_RANGE),
            ("vibrance", self.vibrance, BIPOLAR_RANGE),
            ("exposure", self.exposure, BIPOLAR_RANGE),
            ("highlights", self.highlights, BIPOLAR_RANGE),
            ("shadows", self.shadows, BIPOLAR_RANGE),
            ("temperature", self.temperature, BIPOLAR_RANGE),
            ("tint", self.tint, BIPOLAR_RANGE),
            ("sharpen", self.sharpen, PERCENT_RANGE),
            ("vignette", self.vignette, PERCENT_RANGE),
            ("grain", self.grain, PERCENT_RANGE),
            ("filterStrength", self.filter_strength, PERCENT_RANGE),
        ]
    }

    /// Check every field against its range, reporting the first violation.
    pub fn validate(&self) -> Result<(), RangeError> {
        for (field, value, range) in self.numeric_fields() {
            RangeError::check(field, value, &range)?;
        }
        if parse_hex_color(&self.filter_color).is_none() {
            return Err(RangeError::InvalidColor(self.filter_color.clone()));
        }
        Ok(())
    }

    /// Copy with every numeric field clamped into range.
    ///
    /// Non-finite values fall back to the field's default and an unparsable
    /// colour falls back to white.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        let filter_color = if parse_hex_color(&self.filter_color).is_some() {
            self.filter_color.clone()
        } else {
            d.filter_color.clone()
        };

        Self {
            brightness: clamp_to(self.brightness, &BRIGHTNESS_RANGE, d.brightness),
            contrast: clamp_to(self.contrast, &CONTRAST_RANGE, d.contrast),
            saturation: clamp_to(self.saturation, &SATURATION_RANGE, d.saturation),
            vibrance: clamp_to(self.vibrance, &BIPOLAR_RANGE, d.vibrance),
            exposure: clamp_to(self.exposure, &BIPOLAR_RANGE, d.exposure),
            highlights: clamp_to(self.highlights, &BIPOLAR_RANGE, d.highlights),
            shadows: clamp_to(self.shadows, &BIPOLAR_RANGE, d.shadows),
            temperature: clamp_to(self.temperature, &BIPOLAR_RANGE, d.temperature),
            tint: clamp_to(self.tint, &BIPOLAR_RANGE, d.tint),
            sharpen: clamp_to(self.sharpen, &PERCENT_RANGE, d.sharpen),
            vignette: clamp_to(self.vignette, &PERCENT_RANGE, d.vignette),
            grain: clamp_to(self.grain, &PERCENT_RANGE, d.grain),
            curves: self.curves.clone(),
            filter_color,
            filter_strength: clamp_to(self.filter_strength, &PERCENT_RANGE, d.filter_strength),
        }
    }

    /// True when brightness, contrast and saturation are all at 100.
    pub fn tone_is_neutral(&self) -> bool {
        self.brightness == 100.0 && self.contrast == 100.0 && self.saturation == 100.0
    }

    /// True when the pipeline would leave every pixel untouched.
    ///
    /// Inert fields are ignored.
    pub fn is_neutral(&self) -> bool {
        self.tone_is_neutral() && self.curves.is_identity() && self.filter_strength <= 0.0
    }

    /// Overlay colour as RGB, white if unparsable.
    pub fn filter_rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.filter_color).unwrap_or([255, 255, 255])
    }

    /// Overlay opacity in 0..=1.
    pub fn filter_opacity(&self) -> f32 {
        clamp_to(self.filter_strength, &PERCENT_RANGE, 0.0) / 100.0
    }
}

/// Parse `#rrggbb` or `#rgb` (the `#` is optional, case-insensitive).
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.is_ascii() {
        return None;
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?]),
        3 => {
            let short = |s: &str| channel(s).map(|v| v * 17);
            Some([short(&hex[0..1])?, short(&hex[1..2])?, short(&hex[2..3])?])
        }
        _ => None,
    }
}

/// Apply brightness, contrast and saturation to RGBA pixel data in place.
///
/// # Arguments
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `adjustments` - The adjustment values to apply; inputs are clamped
///
/// Alpha is left untouched. Each operator is skipped at its neutral value,
/// so neutral settings leave the buffer bit-identical.
pub fn apply_tone(pixels: &mut [u8], adjustments: &Adjustments) {
    let brightness = clamp_to(adjustments.brightness, &BRIGHTNESS_RANGE, 100.0) / 100.0;
    let contrast = clamp_to(adjustments.contrast, &CONTRAST_RANGE, 100.0) / 100.0;
    let saturation = clamp_to(adjustments.saturation, &SATURATION_RANGE, 100.0) / 100.0;

    // Early exit if no adjustments
    if brightness == 1.0 && contrast == 1.0 && saturation == 1.0 {
        return;
    }

    for chunk in pixels.chunks_exact_mut(4) {
        let mut rgb = [chunk[0] as f32, chunk[1] as f32, chunk[2] as f32];

        rgb = apply_brightness(rgb, brightness);
        rgb = apply_contrast(rgb, contrast);
        rgb = apply_saturation(rgb, saturation);

        for (dst, v) in chunk.iter_mut().zip(rgb) {
            *dst = v.clamp(0.0, 255.0).round() as u8;
        }
    }
}

/// Multiply every channel by `factor`.
#[inline]
fn apply_brightness(rgb: [f32; 3], factor: f32) -> [f32; 3] {
    if factor == 1.0 {
        return rgb;
    }
    rgb.map(|v| (v * factor).clamp(0.0, 255.0))
}

/// Scale distance from mid-grey by `factor`.
#[inline]
fn apply_contrast(rgb: [f32; 3], factor: f32) -> [f32; 3] {
    if factor == 1.0 {
        return rgb;
    }
    let mid = 127.5;
    rgb.map(|v| ((v - mid) * factor + mid).clamp(0.0, 255.0))
}

/// Interpolate between luminance grey and the colour.
///
/// Rows of the matrix sum to one, so greys are unchanged at any amount.
#[inline]
fn apply_saturation(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    if amount == 1.0 {
        return rgb;
    }
    const LR: f32 = 0.213;
    const LG: f32 = 0.715;
    const LB: f32 = 0.072;
    let s = amount;
    let [r, g, b] = rgb;
    [
        ((LR + (1.0 - LR) * s) * r + (LG - LG * s) * g + (LB - LB * s) * b).clamp(0.0, 255.0),
        ((LR - LR * s) * r + (LG + (1.0 - LG) * s) * g + (LB - LB * s) * b).clamp(0.0, 255.0),
        ((LR - LR * s) * r + (LG - LG * s) * g + (LB + (1.0 - LB) * s) * b).clamp(0.0, 255.0),
    ]
}
