//! Stroke state machine and stamp interpolation.
//!
//! ```text
//! Idle --pointer_down--> Drawing --pointer_move--> Drawing
//!   ^                       |
//!   +--pointer_up/leave-----+   (finalizes the mask)
//! ```
//!
//! Pointer samples only carry the current position, so each move fills the
//! segment from the previous sample with stamps spaced `settings.step()`
//! apart, then stamps the exact current point.

use serde::{Deserialize, Serialize};

use super::brush::{stamp, BrushSettings};
use super::feather::finalize_mask;
use super::MaskSurface;
use crate::decode::ImageRaster;
use crate::DisplayRect;

/// A position in mask pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Drawing {
        last: Point,
    },
}

/// Region of mask space where a stamp centre can still touch a pixel:
/// the surface grown by the brush radius on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampWindow {
    pub min: Point,
    pub max: Point,
}

impl StampWindow {
    pub fn around(width: u32, height: u32, radius: f32) -> Self {
        let radius = radius.max(0.0);
        Self {
            min: Point::new(-radius, -radius),
            max: Point::new(width as f32 + radius, height as f32 + radius),
        }
    }

    fn diagonal(&self) -> f64 {
        let w = (self.max.x - self.min.x).max(0.0) as f64;
        let h = (self.max.y - self.min.y).max(0.0) as f64;
        w.hypot(h)
    }

    /// Distances along the ray `origin + dir * t`, `t` in `0..=len`, that
    /// lie inside the window (Liang-Barsky).
    fn clip(&self, origin: (f64, f64), dir: (f64, f64), len: f64) -> Option<(f64, f64)> {
        let (mut t0, mut t1): (f64, f64) = (0.0, len);
        let edges = [
            (-dir.0, origin.0 - self.min.x as f64),
            (dir.0, self.max.x as f64 - origin.0),
            (-dir.1, origin.1 - self.min.y as f64),
            (dir.1, self.max.y as f64 - origin.1),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        Some((t0, t1))
    }
}

/// Lazily yields the stamp centres of one segment. See `interpolate_segment`.
#[derive(Debug, Clone)]
pub struct SegmentStamps {
    origin: (f64, f64),
    dir: (f64, f64),
    step: f64,
    index: f64,
    limit: f64,
    inclusive: bool,
    remaining: usize,
    end: Option<Point>,
}

impl Iterator for SegmentStamps {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.remaining > 0 {
            let i = self.index * self.step;
            let within = if self.inclusive {
                i <= self.limit
            } else {
                i < self.limit
            };
            if within {
                self.index += 1.0;
                self.remaining -= 1;
                return Some(Point::new(
                    (self.origin.0 + self.dir.0 * i) as f32,
                    (self.origin.1 + self.dir.1 * i) as f32,
                ));
            }
            self.remaining = 0;
        }
        self.end.take()
    }
}

/// Stamp centres for a move from `from` to `to`.
///
/// Centres are placed at `from + dir * i` for `i = 0, step, 2 * step, ...`
/// while `i < distance`, and `to` itself is always the final centre.
/// Centres outside `window` are skipped without being generated, so the
/// work is bounded by the window size however far apart the points are.
pub fn interpolate_segment(
    from: Point,
    to: Point,
    step: f32,
    window: &StampWindow,
) -> SegmentStamps {
    let origin = (from.x as f64, from.y as f64);
    let delta = (to.x as f64 - origin.0, to.y as f64 - origin.1);
    let dist = delta.0.hypot(delta.1);
    let step = step as f64;

    let mut stamps = SegmentStamps {
        origin,
        dir: (0.0, 0.0),
        step,
        index: 0.0,
        limit: 0.0,
        inclusive: false,
        remaining: 0,
        end: Some(to),
    };
    if !(step > 0.0 && dist > 0.0 && dist.is_finite()) {
        return stamps;
    }

    stamps.dir = (delta.0 / dist, delta.1 / dist);
    if let Some((t0, t1)) = window.clip(origin, stamps.dir, dist) {
        stamps.index = (t0 / step).ceil();
        // Short of `to` unless clipping ends the run first; `to` is stamped separately.
        stamps.limit = t1.min(dist);
        stamps.inclusive = t1 < dist;
        stamps.remaining = (window.diagonal() / step).ceil() as usize + 2;
    }
    stamps
}

/// Paints a `MaskSurface` from a stream of pointer samples.
#[derive(Debug, Clone)]
pub struct BrushEngine {
    settings: BrushSettings,
    surface: MaskSurface,
    state: StrokeState,
}

impl BrushEngine {
    /// Engine with default brush settings over a blank `width` x `height` surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_settings(width, height, BrushSettings::default())
    }

    pub fn with_settings(width: u32, height: u32, settings: BrushSettings) -> Self {
        Self {
            settings: settings.clamped(),
            surface: MaskSurface::new(width, height),
            state: StrokeState::Idle,
        }
    }

    pub fn settings(&self) -> &BrushSettings {
        &self.settings
    }

    /// Replace the brush settings, clamped to their ranges.
    ///
    /// Takes effect from the next stamp, including mid-stroke.
    pub fn set_settings(&mut self, settings: BrushSettings) {
        self.settings = settings.clamped();
    }

    pub fn surface(&self) -> &MaskSurface {
        &self.surface
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    /// Start over on a blank surface of a new size. Any stroke is dropped.
    pub fn reset_surface(&mut self, width: u32, height: u32) {
        self.surface = MaskSurface::new(width, height);
        self.state = StrokeState::Idle;
    }

    /// Erase everything painted so far. Any stroke is dropped.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.state = StrokeState::Idle;
    }

    /// Map a client position onto the surface, given where it is displayed.
    pub fn map_pointer(&self, rect: &DisplayRect, client_x: f32, client_y: f32) -> Option<Point> {
        let (x, y) = rect.map_to(
            client_x,
            client_y,
            self.surface.width() as f32,
            self.surface.height() as f32,
        )?;
        Some(Point::new(x, y))
    }

    /// Begin a stroke and stamp the first point.
    pub fn pointer_down(&mut self, point: Point) {
        log::trace!("stroke begin at ({:.1}, {:.1})", point.x, point.y);
        self.stamp_at(point);
        self.state = StrokeState::Drawing { last: point };
    }

    /// Extend the stroke to `point`. Returns the number of stamps laid.
    ///
    /// Ignored while idle.
    pub fn pointer_move(&mut self, point: Point) -> usize {
        let StrokeState::Drawing { last } = self.state else {
            return 0;
        };

        let window = StampWindow::around(
            self.surface.width(),
            self.surface.height(),
            self.settings.radius(),
        );
        let mut laid = 0;
        for centre in interpolate_segment(last, point, self.settings.step(), &window) {
            self.stamp_at(centre);
            laid += 1;
        }
        self.state = StrokeState::Drawing { last: point };
        laid
    }

    /// End the stroke and emit the finalized mask.
    ///
    /// Returns None when no stroke was in progress.
    pub fn pointer_up(&mut self) -> Option<ImageRaster> {
        if !self.is_drawing() {
            return None;
        }
        self.state = StrokeState::Idle;
        log::debug!("stroke end, feather {}", self.settings.feather);
        Some(self.finalize())
    }

    /// Leaving the element ends the stroke exactly like releasing.
    pub fn pointer_leave(&mut self) -> Option<ImageRaster> {
        self.pointer_up()
    }

    /// Feathered snapshot of the current surface; the surface is unchanged.
    pub fn finalize(&self) -> ImageRaster {
        finalize_mask(&self.surface, self.settings.feather)
    }

    fn stamp_at(&mut self, point: Point) {
        stamp(&mut self.surface, point.x, point.y, &self.settings);
    }
}
