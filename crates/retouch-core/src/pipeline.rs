//! The ordered adjustment pipeline.
//!
//! ## Stage Order
//! 1. Tone: brightness, contrast, saturation (`adjustments::apply_tone`)
//! 2. Curves: master LUT, then the per-channel LUT (`curve::apply_curves`)
//! 3. Overlay: soft-light fill with the filter colour at `filterStrength / 100`
//!
//! The stages run against one `Adjustments` snapshot held by the pipeline,
//! so a pass can never observe a half-applied edit.

use crate::adjustments::{apply_tone, Adjustments};
use crate::blend::{composite, BlendMode};
use crate::curve::{apply_curves, CurveLuts};
use crate::decode::ImageRaster;
use crate::Curves;

/// An immutable adjustment snapshot with its curve LUTs prepared.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentPipeline {
    adjustments: Adjustments,
    luts: CurveLuts,
}

impl AdjustmentPipeline {
    /// Clamp the settings and build the four LUTs.
    pub fn new(adjustments: &Adjustments) -> Self {
        let adjustments = adjustments.clamped();
        let luts = CurveLuts::from_curves(&adjustments.curves);
        Self { adjustments, luts }
    }

    /// Reuse LUTs that were already built for `adjustments.curves`.
    pub fn with_luts(adjustments: &Adjustments, luts: CurveLuts) -> Self {
        Self {
            adjustments: adjustments.clamped(),
            luts,
        }
    }

    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    pub fn luts(&self) -> &CurveLuts {
        &self.luts
    }

    pub fn is_neutral(&self) -> bool {
        self.adjustments.tone_is_neutral()
            && self.luts.is_identity()
            && self.adjustments.filter_strength <= 0.0
    }

    /// Run all stages over RGBA pixels in place.
    pub fn apply(&self, pixels: &mut [u8]) {
        if self.is_neutral() {
            return;
        }

        apply_tone(pixels, &self.adjustments);
        apply_curves(pixels, &self.luts);

        let opacity = self.adjustments.filter_opacity();
        if opacity > 0.0 {
            apply_overlay(pixels, self.adjustments.filter_rgb(), opacity);
        }
    }

    /// Produce an adjusted copy of `source` with identical dimensions and format.
    pub fn process(&self, source: &ImageRaster) -> ImageRaster {
        let mut output = source.clone();
        self.apply(&mut output.pixels);
        log::trace!(
            "pipeline pass over {}x{} (neutral: {})",
            source.width,
            source.height,
            self.is_neutral()
        );
        output
    }
}

/// Apply an `Adjustments` value to a raster.
///
/// # Example
/// ```ignore
/// use retouch_core::{apply_adjustments, Adjustments, ImageFormat, ImageRaster};
///
/// let gray = ImageRaster::filled(100, 100, [128, 128, 128, 255], ImageFormat::Png);
/// let mut adj = Adjustments::default();
/// adj.brightness = 150.0;
///
/// let out = apply_adjustments(&gray, &adj);
/// assert_eq!(out.pixel(0, 0), Some([192, 192, 192, 255]));
/// ```
pub fn apply_adjustments(source: &ImageRaster, adjustments: &Adjustments) -> ImageRaster {
    AdjustmentPipeline::new(adjustments).process(source)
}

/// Fill the raster with `color` using soft-light at `opacity`.
///
/// # Arguments
/// * `pixels` - RGBA pixel data, modified in place
/// * `color` - Overlay colour
/// * `opacity` - Overlay alpha in 0..=1
pub fn apply_overlay(pixels: &mut [u8], color: [u8; 3], opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }

    let source = [
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        opacity,
    ];

    for chunk in pixels.chunks_exact_mut(4) {
        let backdrop = [
            chunk[0] as f32 / 255.0,
            chunk[1] as f32 / 255.0,
            chunk[2] as f32 / 255.0,
            chunk[3] as f32 / 255.0,
        ];
        let out = composite(BlendMode::SoftLight, backdrop, source);
        for (dst, v) in chunk.iter_mut().zip(out) {
            *dst = (v * 255.0).clamp(0.0, 255.0).round() as u8;
        }
    }
}

// ============================================================================
// Latest-wins scheduling
// ============================================================================

/// A pipeline result tagged with the submission it was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub generation: u64,
    pub image: ImageRaster,
}

/// Serializes preview passes for one image.
///
/// Only the most recent submission is kept; older pending snapshots are
/// dropped without being rendered. LUTs are memoized per `Curves` value,
/// so slider drags that leave the curves alone skip LUT generation.
#[derive(Debug, Default)]
pub struct RenderQueue {
    pending: Option<Adjustments>,
    generation: u64,
    cached_luts: Option<(Curves, CurveLuts)>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snapshot, replacing any pending one. Returns its generation.
    pub fn submit(&mut self, adjustments: Adjustments) -> u64 {
        if self.pending.is_some() {
            log::trace!("render generation {} superseded", self.generation);
        }
        self.generation += 1;
        self.pending = Some(adjustments);
        self.generation
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Generation of the newest submission (0 before the first).
    pub fn latest_generation(&self) -> u64 {
        self.generation
    }

    /// True if no newer snapshot has been submitted since `generation`.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Render the newest pending snapshot against `source`, if any.
    pub fn render_latest(&mut self, source: &ImageRaster) -> Option<RenderedFrame> {
        let adjustments = self.pending.take()?;
        let pipeline = self.pipeline_for(&adjustments);
        Some(RenderedFrame {
            generation: self.generation,
            image: pipeline.process(source),
        })
    }

    fn pipeline_for(&mut self, adjustments: &Adjustments) -> AdjustmentPipeline {
        let luts = match &self.cached_luts {
            Some((curves, luts)) if *curves == adjustments.curves => luts.clone(),
            _ => {
                let luts = CurveLuts::from_curves(&adjustments.curves);
                self.cached_luts = Some((adjustments.curves.clone(), luts.clone()));
                luts
            }
        };
        AdjustmentPipeline::with_luts(adjustments, luts)
    }
}
