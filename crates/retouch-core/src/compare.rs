//! Before/after comparison slider.
//!
//! The edited image is drawn over the original and clipped from the right,
//! so the divider at `position` percent shows edited content to its left.

use crate::DisplayRect;

/// Divider position, in percent of the container width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareSlider {
    position: f32,
    dragging: bool,
}

impl Default for CompareSlider {
    fn default() -> Self {
        Self {
            position: 50.0,
            dragging: false,
        }
    }
}

impl CompareSlider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn set_position(&mut self, percent: f32) {
        if percent.is_finite() {
            self.position = percent.clamp(0.0, 100.0);
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Percentage for a client x inside `rect`, clamped to 0-100.
    pub fn percentage_at(rect: &DisplayRect, client_x: f32) -> Option<f32> {
        if rect.is_empty() {
            return None;
        }
        Some(((client_x - rect.left) / rect.width * 100.0).clamp(0.0, 100.0))
    }

    pub fn begin_drag(&mut self, rect: &DisplayRect, client_x: f32) {
        self.dragging = true;
        self.drag_to(rect, client_x);
    }

    /// Move the divider; ignored unless a drag is in progress.
    pub fn drag_to(&mut self, rect: &DisplayRect, client_x: f32) {
        if !self.dragging {
            return;
        }
        if let Some(percent) = Self::percentage_at(rect, client_x) {
            self.position = percent;
        }
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Share of the width hidden on the right of the edited layer.
    pub fn right_inset(&self) -> f32 {
        100.0 - self.position
    }

    /// CSS `clip-path` for the edited layer.
    pub fn clip_path(&self) -> String {
        format!("inset(0 {}% 0 0)", self.right_inset())
    }

    /// Number of leading columns of a `width`-pixel image showing the edit.
    pub fn split_column(&self, width: u32) -> u32 {
        ((self.position / 100.0) * width as f32).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> DisplayRect {
        DisplayRect::new(100.0, 0.0, 400.0, 300.0)
    }

    #[test]
    fn test_default_centered() {
        let slider = CompareSlider::new();
        assert_eq!(slider.position(), 50.0);
        assert_eq!(slider.clip_path(), "inset(0 50% 0 0)");
    }

    #[test]
    fn test_percentage_at() {
        assert_eq!(CompareSlider::percentage_at(&rect(), 200.0), Some(25.0));
        assert_eq!(CompareSlider::percentage_at(&rect(), 50.0), Some(0.0));
        assert_eq!(CompareSlider::percentage_at(&rect(), 900.0), Some(100.0));
        assert_eq!(
            CompareSlider::percentage_at(&DisplayRect::new(0.0, 0.0, 0.0, 10.0), 5.0),
            None
        );
    }

    #[test]
    fn test_drag_cycle() {
        let mut slider = CompareSlider::new();
        slider.drag_to(&rect(), 200.0);
        assert_eq!(slider.position(), 50.0);

        slider.begin_drag(&rect(), 400.0);
        assert!(slider.is_dragging());
        assert_eq!(slider.position(), 75.0);
        assert_eq!(slider.clip_path(), "inset(0 25% 0 0)");

        slider.end_drag();
        slider.drag_to(&rect(), 100.0);
        assert_eq!(slider.position(), 75.0);
    }

    #[test]
    fn test_set_position_clamps() {
        let mut slider = CompareSlider::new();
        slider.set_position(140.0);
        assert_eq!(slider.position(), 100.0);
        assert_eq!(slider.right_inset(), 0.0);
        slider.set_position(f32::NAN);
        assert_eq!(slider.position(), 100.0);
    }

    #[test]
    fn test_split_column() {
        let mut slider = CompareSlider::new();
        slider.set_position(25.0);
        assert_eq!(slider.split_column(200), 50);
        slider.set_position(0.0);
        assert_eq!(slider.split_column(200), 0);
    }
}
