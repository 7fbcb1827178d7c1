//! Mask WASM bindings.
//!
//! A standalone brush engine for hosts that manage their own session state,
//! plus the masked compositing step.

use crate::types::{display_rect, JsImage};
use retouch_core::mask::{self, BrushEngine, BrushMode, BrushSettings};
use retouch_core::BlendMode;
use wasm_bindgen::prelude::*;

/// Brush engine painting onto a mask the size of the source image.
///
/// Pointer positions are client coordinates together with the displayed
/// element's bounding rect, exactly as a `PointerEvent` handler sees them.
///
/// # Example (TypeScript)
/// ```typescript
/// const brush = new JsBrushEngine(image.width, image.height);
/// brush.size = 60;
/// brush.hardness = 0.3;
///
/// canvas.onpointerdown = (e) => {
///   const r = canvas.getBoundingClientRect();
///   brush.pointer_down(r.left, r.top, r.width, r.height, e.clientX, e.clientY);
/// };
/// canvas.onpointerup = () => {
///   const mask = brush.pointer_up();
///   if (mask) upload(encode_png(mask));
/// };
/// ```
#[wasm_bindgen]
pub struct JsBrushEngine {
    inner: BrushEngine,
}

#[wasm_bindgen]
impl JsBrushEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: BrushEngine::new(width, height),
        }
    }

    /// Brush diameter in mask pixels
    #[wasm_bindgen(getter)]
    pub fn size(&self) -> f32 {
        self.inner.settings().size
    }

    #[wasm_bindgen(setter)]
    pub fn set_size(&mut self, value: f32) {
        self.update(|s| s.size = value);
    }

    #[wasm_bindgen(getter)]
    pub fn hardness(&self) -> f32 {
        self.inner.settings().hardness
    }

    #[wasm_bindgen(setter)]
    pub fn set_hardness(&mut self, value: f32) {
        self.update(|s| s.hardness = value);
    }

    #[wasm_bindgen(getter)]
    pub fn opacity(&self) -> f32 {
        self.inner.settings().opacity
    }

    #[wasm_bindgen(setter)]
    pub fn set_opacity(&mut self, value: f32) {
        self.update(|s| s.opacity = value);
    }

    #[wasm_bindgen(getter)]
    pub fn feather(&self) -> f32 {
        self.inner.settings().feather
    }

    #[wasm_bindgen(setter)]
    pub fn set_feather(&mut self, value: f32) {
        self.update(|s| s.feather = value);
    }

    /// True in eraser mode
    #[wasm_bindgen(getter)]
    pub fn erasing(&self) -> bool {
        self.inner.settings().mode == BrushMode::Erase
    }

    #[wasm_bindgen(setter)]
    pub fn set_erasing(&mut self, value: bool) {
        let mode = if value {
            BrushMode::Erase
        } else {
            BrushMode::Paint
        };
        self.update(|s| s.mode = mode);
    }

    /// Paint compositing operator by CSS name (`source-over`, `multiply`,
    /// `screen`, `overlay`, `soft-light`). Unknown names are ignored.
    pub fn set_blend_mode(&mut self, name: &str) {
        if let Some(mode) = BlendMode::from_css_name(name) {
            self.update(|s| s.blend_mode = mode);
        }
    }

    /// Replace all settings from a plain JS object (camelCase fields).
    pub fn set_settings(&mut self, value: JsValue) -> Result<(), JsValue> {
        let settings: BrushSettings =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.set_settings(settings);
        Ok(())
    }

    pub fn settings(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.settings())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn is_drawing(&self) -> bool {
        self.inner.is_drawing()
    }

    /// True if nothing has been painted.
    pub fn is_blank(&self) -> bool {
        self.inner.surface().is_blank()
    }

    /// Start a stroke. Returns false if the rect has no area.
    pub fn pointer_down(
        &mut self,
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        client_x: f32,
        client_y: f32,
    ) -> bool {
        let rect = display_rect(left, top, width, height);
        match self.inner.map_pointer(&rect, client_x, client_y) {
            Some(point) => {
                self.inner.pointer_down(point);
                true
            }
            None => false,
        }
    }

    /// Extend the stroke. Returns the number of stamps laid.
    pub fn pointer_move(
        &mut self,
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        client_x: f32,
        client_y: f32,
    ) -> usize {
        let rect = display_rect(left, top, width, height);
        self.inner
            .map_pointer(&rect, client_x, client_y)
            .map_or(0, |point| self.inner.pointer_move(point))
    }

    /// End the stroke. Returns the finalized mask, or undefined when no
    /// stroke was in progress.
    pub fn pointer_up(&mut self) -> Option<JsImage> {
        self.inner.pointer_up().map(JsImage::from_raster)
    }

    pub fn pointer_leave(&mut self) -> Option<JsImage> {
        self.inner.pointer_leave().map(JsImage::from_raster)
    }

    /// Feathered mask of everything painted so far.
    pub fn finalize(&self) -> JsImage {
        JsImage::from_raster(self.inner.finalize())
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Start over on a blank mask of a new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.inner.reset_surface(width, height);
    }
}

impl JsBrushEngine {
    fn update(&mut self, edit: impl FnOnce(&mut BrushSettings)) {
        let mut settings = self.inner.settings().clone();
        edit(&mut settings);
        self.inner.set_settings(settings);
    }
}

/// Blend `edited` into `original` through the mask's alpha.
///
/// `edited` and `mask` are resized to `original` if their sizes differ.
#[wasm_bindgen]
pub fn apply_mask(original: &JsImage, edited: &JsImage, mask: &JsImage) -> Result<JsImage, JsValue> {
    mask::apply_mask(original.raster(), edited.raster(), mask.raster())
        .map(JsImage::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Tests that avoid `JsValue`; the serde entry points run under
/// wasm-bindgen-test only.
#[cfg(test)]
mod tests {
    use super::*;
    use retouch_core::decode::{ImageFormat, ImageRaster};

    #[test]
    fn test_setters_clamp() {
        let mut brush = JsBrushEngine::new(10, 10);
        assert_eq!(brush.size(), 40.0);

        brush.set_size(500.0);
        assert_eq!(brush.size(), 150.0);
        brush.set_hardness(0.0);
        assert_eq!(brush.hardness(), 0.01);
        brush.set_feather(-3.0);
        assert_eq!(brush.feather(), 0.0);
    }

    #[test]
    fn test_erasing_toggle() {
        let mut brush = JsBrushEngine::new(10, 10);
        assert!(!brush.erasing());
        brush.set_erasing(true);
        assert!(brush.erasing());
    }

    #[test]
    fn test_blend_mode_by_name() {
        let mut brush = JsBrushEngine::new(10, 10);
        brush.set_blend_mode("multiply");
        assert_eq!(brush.inner.settings().blend_mode, BlendMode::Multiply);
        brush.set_blend_mode("bogus");
        assert_eq!(brush.inner.settings().blend_mode, BlendMode::Multiply);
    }

    #[test]
    fn test_stroke_through_display_rect() {
        // 100x100 mask shown at 50x50, offset by (20, 30).
        let mut brush = JsBrushEngine::new(100, 100);
        brush.set_size(10.0);
        brush.set_hardness(1.0);

        assert!(brush.pointer_down(20.0, 30.0, 50.0, 50.0, 25.0, 35.0));
        assert!(brush.is_drawing());
        let stamps = brush.pointer_move(20.0, 30.0, 50.0, 50.0, 45.0, 35.0);
        assert!(stamps > 0);

        let mask = brush.pointer_up().unwrap();
        assert!(!brush.is_drawing());
        assert_eq!((mask.width(), mask.height()), (100, 100));
        // Mapped centre (10, 10) through (50, 10).
        assert_eq!(mask.raster().pixel(30, 10).unwrap()[3], 255);
        assert_eq!(mask.raster().pixel(30, 80).unwrap()[3], 0);
        assert!(brush.pointer_up().is_none());
    }

    #[test]
    fn test_pointer_down_on_empty_rect() {
        let mut brush = JsBrushEngine::new(10, 10);
        assert!(!brush.pointer_down(0.0, 0.0, 0.0, 0.0, 1.0, 1.0));
        assert!(brush.is_blank());
    }

    #[test]
    fn test_clear_and_resize() {
        let mut brush = JsBrushEngine::new(10, 10);
        brush.pointer_down(0.0, 0.0, 10.0, 10.0, 5.0, 5.0);
        brush.pointer_leave();
        assert!(!brush.is_blank());

        brush.clear();
        assert!(brush.is_blank());

        brush.resize(20, 5);
        assert_eq!(brush.finalize().width(), 20);
        assert_eq!(brush.finalize().height(), 5);
    }

    #[test]
    fn test_apply_mask_binding() {
        let original = JsImage::from_raster(ImageRaster::filled(
            2,
            2,
            [0, 0, 0, 255],
            ImageFormat::Png,
        ));
        let edited = JsImage::from_raster(ImageRaster::filled(
            2,
            2,
            [255, 255, 255, 255],
            ImageFormat::Png,
        ));
        let mask = JsImage::from_raster(ImageRaster::filled(
            2,
            2,
            [255, 255, 255, 255],
            ImageFormat::Png,
        ));
        let out = apply_mask(&original, &edited, &mask).unwrap();
        assert_eq!(&out.pixels()[0..4], &[255, 255, 255, 255]);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_settings_from_js_object() {
        let mut brush = JsBrushEngine::new(10, 10);
        let value = serde_wasm_bindgen::to_value(&BrushSettings {
            size: 12.0,
            mode: BrushMode::Erase,
            ..BrushSettings::default()
        })
        .unwrap();
        brush.set_settings(value).unwrap();
        assert_eq!(brush.size(), 12.0);
        assert!(brush.erasing());
    }

    #[wasm_bindgen_test]
    fn test_settings_reject_garbage() {
        let mut brush = JsBrushEngine::new(10, 10);
        assert!(brush.set_settings(JsValue::from_str("big")).is_err());
    }
}
