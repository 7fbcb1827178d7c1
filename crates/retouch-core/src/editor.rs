//! Interactive curve editing.
//!
//! Point edits live on `Curve` so that every mutation path keeps the curve
//! invariants: sorted by x, at least two points, endpoints pinned to x = 0
//! and x = 255, and no two points sharing an x. `CurveEditor` layers the
//! pointer gestures of the curve canvas on top of those edits.

use serde::{Deserialize, Serialize};

use crate::{Channel, Curve, CurvePoint, Curves, DisplayRect, TONE_MAX};

/// Minimum x separation kept between neighbouring points.
pub const MIN_POINT_GAP: f32 = 0.01;

/// Side length of the curve canvas in curve units.
pub const CANVAS_SIZE: f32 = 256.0;

/// Hit radius of a control point handle, in curve units.
pub const POINT_RADIUS: f32 = 5.0;

/// Vertical offset of the tooltip above the point, in display pixels.
const TOOLTIP_OFFSET: f32 = 10.0;

// ============================================================================
// Point edits
// ============================================================================

impl Curve {
    /// Insert a point, keeping the list sorted. Returns its index.
    ///
    /// x is kept at least `MIN_POINT_GAP` inside the pinned endpoints.
    /// Returns None (and leaves the curve unchanged) when another point
    /// already sits on, or within half a gap of, x.
    pub fn add_point(&mut self, x: f32, y: f32) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let x = x.clamp(MIN_POINT_GAP, TONE_MAX - MIN_POINT_GAP);
        let y = y.clamp(0.0, TONE_MAX);

        if self
            .points()
            .iter()
            .any(|p| (p.x - x).abs() < MIN_POINT_GAP * 0.5)
        {
            return None;
        }

        let index = self.points().partition_point(|p| p.x < x);
        self.points_mut().insert(index, CurvePoint::new(x, y));
        Some(index)
    }

    /// Move the point at `index` toward (x, y).
    ///
    /// The first point stays at x = 0 and the last at x = 255. Interior
    /// points are clamped to `MIN_POINT_GAP` inside their neighbours; if the
    /// neighbours are closer than that, x is left as is. Returns false for an
    /// out-of-range index.
    pub fn move_point(&mut self, index: usize, x: f32, y: f32) -> bool {
        let len = self.len();
        if index >= len {
            return false;
        }
        let y = if y.is_finite() {
            y.clamp(0.0, TONE_MAX)
        } else {
            self.points()[index].y
        };

        let x = if index == 0 {
            0.0
        } else if index == len - 1 {
            TONE_MAX
        } else {
            let current = self.points()[index].x;
            let lo = self.points()[index - 1].x + MIN_POINT_GAP;
            let hi = self.points()[index + 1].x - MIN_POINT_GAP;
            if lo <= hi && x.is_finite() {
                x.clamp(lo, hi)
            } else {
                current
            }
        };

        self.points_mut()[index] = CurvePoint::new(x, y);
        true
    }

    /// Remove an interior point. Endpoints cannot be removed.
    pub fn remove_point(&mut self, index: usize) -> bool {
        if index == 0 || index + 1 >= self.len() {
            return false;
        }
        self.points_mut().remove(index);
        true
    }

    /// Index of the point nearest (x, y) within `radius`, if any.
    pub fn point_near(&self, x: f32, y: f32, radius: f32) -> Option<usize> {
        self.points()
            .iter()
            .enumerate()
            .map(|(i, p)| (i, (p.x - x).hypot(p.y - y)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

// ============================================================================
// Pointer-driven editor
// ============================================================================

/// Which mouse button started a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    Primary,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(Self::Primary),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// Readout shown next to a hovered or dragged point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    /// Position relative to the canvas, in display pixels.
    pub x: f32,
    pub y: f32,
    pub input: i32,
    pub output: i32,
}

/// Gesture state of the curve canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurveEditor {
    active: Channel,
    dragging: Option<usize>,
}

impl CurveEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Channel {
        self.active
    }

    /// Switch channel. Any drag in progress ends.
    pub fn set_active(&mut self, channel: Channel) {
        self.active = channel;
        self.dragging = None;
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Client position mapped into curve space: 0-256 on both axes, y up.
    pub fn canvas_position(rect: &DisplayRect, client_x: f32, client_y: f32) -> Option<(f32, f32)> {
        let (x, y) = rect.map_to(client_x, client_y, CANVAS_SIZE, CANVAS_SIZE)?;
        Some((
            x.clamp(0.0, CANVAS_SIZE),
            (CANVAS_SIZE - y).clamp(0.0, CANVAS_SIZE),
        ))
    }

    /// Handle a pointer press on the canvas.
    ///
    /// Secondary press, or primary with ctrl held, on an interior point
    /// deletes it. A primary press on a point starts dragging it; on empty
    /// canvas it adds a point and starts dragging the new one. Returns the
    /// channel whose curve changed.
    pub fn press(
        &mut self,
        curves: &mut Curves,
        rect: &DisplayRect,
        client_x: f32,
        client_y: f32,
        button: PointerButton,
        ctrl: bool,
    ) -> Option<Channel> {
        let (x, y) = Self::canvas_position(rect, client_x, client_y)?;
        let channel = self.active;
        let curve = curves.get_mut(channel);
        let hit = curve.point_near(x, y, POINT_RADIUS);

        if button == PointerButton::Secondary || ctrl {
            let index = hit?;
            return curve.remove_point(index).then_some(channel);
        }

        match hit {
            Some(index) => {
                self.dragging = Some(index);
                None
            }
            None => {
                let index = curve.add_point(x, y)?;
                self.dragging = Some(index);
                Some(channel)
            }
        }
    }

    /// Handle pointer movement while a point is held.
    pub fn drag(
        &mut self,
        curves: &mut Curves,
        rect: &DisplayRect,
        client_x: f32,
        client_y: f32,
    ) -> Option<Channel> {
        let index = self.dragging?;
        let (x, y) = Self::canvas_position(rect, client_x, client_y)?;
        curves
            .get_mut(self.active)
            .move_point(index, x, y)
            .then_some(self.active)
    }

    /// End the drag, if any.
    pub fn release(&mut self) {
        self.dragging = None;
    }

    /// Tooltip for the dragged point, or for `hovered` when idle.
    pub fn tooltip(
        &self,
        curves: &Curves,
        rect: &DisplayRect,
        hovered: Option<usize>,
    ) -> Option<Tooltip> {
        let index = self.dragging.or(hovered)?;
        let point = curves.get(self.active).points().get(index)?;
        Some(Tooltip {
            x: point.x / CANVAS_SIZE * rect.width,
            y: (CANVAS_SIZE - point.y) / CANVAS_SIZE * rect.height - TOOLTIP_OFFSET,
            input: point.x.round() as i32,
            output: point.y.round() as i32,
        })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add(f32, f32),
        Move(usize, f32, f32),
        Remove(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-20.0f32..280.0, -20.0f32..280.0).prop_map(|(x, y)| Op::Add(x, y)),
            (0usize..12, -20.0f32..280.0, -20.0f32..280.0).prop_map(|(i, x, y)| Op::Move(i, x, y)),
            (0usize..12).prop_map(Op::Remove),
        ]
    }

    proptest! {
        /// Any sequence of edits keeps every curve invariant.
        #[test]
        fn prop_edits_preserve_invariants(ops in prop::collection::vec(op_strategy(), 0..60)) {
            let mut curve = Curve::identity();
            for op in ops {
                match op {
                    Op::Add(x, y) => { curve.add_point(x, y); }
                    Op::Move(i, x, y) => { curve.move_point(i, x, y); }
                    Op::Remove(i) => { curve.remove_point(i); }
                }
            }

            let points = curve.points();
            prop_assert!(points.len() >= 2);
            prop_assert_eq!(points[0].x, 0.0);
            prop_assert_eq!(points[points.len() - 1].x, TONE_MAX);
            for pair in points.windows(2) {
                prop_assert!(pair[0].x < pair[1].x);
            }
            for p in points {
                prop_assert!((0.0..=TONE_MAX).contains(&p.y));
            }
            // The edited curve must still pass full validation.
            prop_assert!(Curve::new(points.to_vec()).is_ok());
        }
    }
}
