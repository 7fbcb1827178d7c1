//! Retouch Core - Photo adjustment and mask painting engine
//!
//! This crate provides the numeric core behind the Retouch editor:
//! tone curve LUT generation, the ordered adjustment pipeline, and the
//! brush engine that paints soft-edged selection masks.

pub mod adjustments;
pub mod blend;
pub mod compare;
pub mod curve;
pub mod decode;
pub mod editor;
pub mod encode;
pub mod mask;
pub mod pipeline;
pub mod session;

pub use adjustments::{Adjustments, RangeError};
pub use blend::BlendMode;
pub use compare::CompareSlider;
pub use curve::{evaluate_curve, CurveLuts, ToneCurveLut};
pub use decode::{decode_image, DecodeError, ImageFormat, ImageRaster};
pub use editor::{CurveEditor, PointerButton, Tooltip};
pub use mask::{BrushEngine, BrushMode, BrushSettings, MaskSurface};
pub use pipeline::{apply_adjustments, AdjustmentPipeline, RenderQueue};
pub use session::{
    AspectRatio, EditMode, EditRequest, EditResponse, EditSession, EncodedImage, ImageEditService,
    ServiceError, SessionError,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest tone value on either curve axis.
pub const TONE_MAX: f32 = 255.0;

/// On-screen bounds of a rendered element, in client (CSS pixel) units.
///
/// Pointer events arrive in client coordinates; the rect converts them into
/// the element's own pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// True when the element has no visible area.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Map a client position into a `target_width` x `target_height` space
    /// stretched over this rect. Returns None for an empty rect.
    pub fn map_to(
        &self,
        client_x: f32,
        client_y: f32,
        target_width: f32,
        target_height: f32,
    ) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }
        Some((
            (client_x - self.left) * (target_width / self.width),
            (client_y - self.top) * (target_height / self.height),
        ))
    }
}

/// Errors raised when a curve would break its structural invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("a curve needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("first point must sit at x = 0, found x = {0}")]
    UnpinnedStart(f32),

    #[error("last point must sit at x = 255, found x = {0}")]
    UnpinnedEnd(f32),

    #[error("point {index} does not have a strictly greater x than its predecessor")]
    NotIncreasing { index: usize },

    #[error("point {index} lies outside the 0-255 tone range")]
    OutOfRange { index: usize },
}

/// Tone curve control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Input tone (0 to 255)
    pub x: f32,
    /// Output tone (0 to 255)
    pub y: f32,
}

impl CurvePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Tone curve for one channel.
///
/// Points are strictly increasing in x, there are at least two of them, and
/// the first and last points are pinned to x = 0 and x = 255. Every
/// constructor and editing operation keeps these invariants, so downstream
/// LUT generation never sees a degenerate segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CurvePoint>", into = "Vec<CurvePoint>")]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    /// Build a curve from control points, validating every invariant.
    pub fn new(points: Vec<CurvePoint>) -> Result<Self, CurveError> {
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints(points.len()));
        }

        for (index, p) in points.iter().enumerate() {
            let in_range = |v: f32| v.is_finite() && (0.0..=TONE_MAX).contains(&v);
            if !in_range(p.x) || !in_range(p.y) {
                return Err(CurveError::OutOfRange { index });
            }
        }

        let first = points[0];
        let last = points[points.len() - 1];
        if first.x != 0.0 {
            return Err(CurveError::UnpinnedStart(first.x));
        }
        if last.x != TONE_MAX {
            return Err(CurveError::UnpinnedEnd(last.x));
        }

        if let Some(index) = points
            .windows(2)
            .position(|pair| pair[1].x <= pair[0].x)
        {
            return Err(CurveError::NotIncreasing { index: index + 1 });
        }

        Ok(Self { points })
    }

    /// The identity curve: (0, 0) to (255, 255).
    pub fn identity() -> Self {
        Self {
            points: vec![CurvePoint::new(0.0, 0.0), CurvePoint::new(TONE_MAX, TONE_MAX)],
        }
    }

    /// Control points, sorted by x.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Check if the curve is exactly the two-endpoint identity.
    pub fn is_identity(&self) -> bool {
        self.points.len() == 2
            && self.points[0] == CurvePoint::new(0.0, 0.0)
            && self.points[1] == CurvePoint::new(TONE_MAX, TONE_MAX)
    }

    pub(crate) fn points_mut(&mut self) -> &mut Vec<CurvePoint> {
        &mut self.points
    }
}

impl Default for Curve {
    fn default() -> Self {
        Self::identity()
    }
}

impl TryFrom<Vec<CurvePoint>> for Curve {
    type Error = CurveError;

    fn try_from(points: Vec<CurvePoint>) -> Result<Self, Self::Error> {
        Curve::new(points)
    }
}

impl From<Curve> for Vec<CurvePoint> {
    fn from(curve: Curve) -> Self {
        curve.points
    }
}

/// Curve channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Channel {
    /// Master curve, applied to R, G and B before their own curves
    #[default]
    #[serde(rename = "rgb")]
    Rgb,
    #[serde(rename = "r")]
    Red,
    #[serde(rename = "g")]
    Green,
    #[serde(rename = "b")]
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Rgb, Channel::Red, Channel::Green, Channel::Blue];

    /// Short name used by the host UI ("rgb", "r", "g", "b").
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Rgb => "rgb",
            Channel::Red => "r",
            Channel::Green => "g",
            Channel::Blue => "b",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

/// One curve per channel; all four are always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Curves {
    pub rgb: Curve,
    pub r: Curve,
    pub g: Curve,
    pub b: Curve,
}

impl Curves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: Channel) -> &Curve {
        match channel {
            Channel::Rgb => &self.rgb,
            Channel::Red => &self.r,
            Channel::Green => &self.g,
            Channel::Blue => &self.b,
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut Curve {
        match channel {
            Channel::Rgb => &mut self.rgb,
            Channel::Red => &mut self.r,
            Channel::Green => &mut self.g,
            Channel::Blue => &mut self.b,
        }
    }

    /// True when every channel is the identity curve.
    pub fn is_identity(&self) -> bool {
        Channel::ALL.iter().all(|&c| self.get(c).is_identity())
    }
}
