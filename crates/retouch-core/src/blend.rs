//! Separable compositing operators.
//!
//! Colours are normalized to 0..=1 and alpha is straight (not
//! premultiplied). Formulas follow the W3C compositing model used by canvas
//! `globalCompositeOperation`, so results match what a browser would draw.

use serde::{Deserialize, Serialize};

/// Compositing operator for brush stamps and the colour overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    SourceOver,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
}

impl BlendMode {
    pub const ALL: [BlendMode; 5] = [
        BlendMode::SourceOver,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::SoftLight,
    ];

    /// Canvas operator name, e.g. `"soft-light"`.
    pub fn css_name(self) -> &'static str {
        match self {
            BlendMode::SourceOver => "source-over",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::SoftLight => "soft-light",
        }
    }

    pub fn from_css_name(name: &str) -> Option<Self> {
        BlendMode::ALL
            .into_iter()
            .find(|m| m.css_name().eq_ignore_ascii_case(name.trim()))
    }

    /// The mixing function `B(cb, cs)` for one channel.
    #[inline]
    pub fn blend(self, cb: f32, cs: f32) -> f32 {
        match self {
            BlendMode::SourceOver => cs,
            BlendMode::Multiply => cb * cs,
            BlendMode::Screen => cb + cs - cb * cs,
            BlendMode::Overlay => hard_light(cs, cb),
            BlendMode::SoftLight => soft_light(cb, cs),
        }
    }
}

/// W3C soft-light for one channel.
#[inline]
pub fn soft_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        let d = if cb <= 0.25 {
            ((16.0 * cb - 12.0) * cb + 4.0) * cb
        } else {
            cb.sqrt()
        };
        cb + (2.0 * cs - 1.0) * (d - cb)
    }
}

/// Overlay is hard-light with the layers swapped.
#[inline]
fn hard_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb * 2.0 * cs
    } else {
        let s = 2.0 * cs - 1.0;
        cb + s - cb * s
    }
}

/// Composite a straight-alpha `source` over `backdrop` with `mode`.
///
/// Both are `[r, g, b, a]` in 0..=1.
pub fn composite(mode: BlendMode, backdrop: [f32; 4], source: [f32; 4]) -> [f32; 4] {
    let ab = backdrop[3];
    let a_s = source[3];
    let ao = a_s + ab * (1.0 - a_s);
    if ao <= 0.0 {
        return [0.0; 4];
    }

    let mut out = [0.0, 0.0, 0.0, ao];
    for c in 0..3 {
        let cb = backdrop[c];
        let cs = source[c];
        let mixed = a_s * (1.0 - ab) * cs + a_s * ab * mode.blend(cb, cs) + (1.0 - a_s) * ab * cb;
        out[c] = (mixed / ao).clamp(0.0, 1.0);
    }
    out
}

/// `destination-out`: keep the backdrop only where the source is absent.
#[inline]
pub fn destination_out(backdrop: [f32; 4], source_alpha: f32) -> [f32; 4] {
    let [r, g, b, a] = backdrop;
    [r, g, b, a * (1.0 - source_alpha.clamp(0.0, 1.0))]
}
