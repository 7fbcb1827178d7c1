//! Editing session WASM bindings.
//!
//! `JsEditSession` owns the whole editor state. The UI forwards pointer
//! events and slider values, renders `render_preview()` frames, and talks to
//! the image edit service itself: `prepare_edit` builds the request, the
//! service's answer goes back through `accept_edit_response`.
//!
//! # Example
//!
//! ```typescript
//! const session = new JsEditSession();
//! session.load_image(bytes, file.type);
//!
//! const request = session.prepare_edit(prompt);   // throws on validation errors
//! session.clear_result();
//! const reply = await callEditService(request);
//! session.accept_edit_response(reply.image, reply.mime, reply.text);
//! ```

use std::fmt::Display;

use js_sys::{Object, Reflect, Uint8Array};
use retouch_core::session::{AspectRatio, EditMode, EditResponse, EditSession, EncodedImage};
use retouch_core::{Adjustments, BrushSettings, PointerButton};
use wasm_bindgen::prelude::*;

use crate::adjustments::JsAdjustments;
use crate::curve::{channel_from_str, sample_curve};
use crate::types::{display_rect, JsImage};

fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Set `key` on a plain JS object.
fn set_field(target: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value).map(|_| ())
}

fn encoded_to_js(image: &EncodedImage) -> Result<JsValue, JsValue> {
    let object = Object::new();
    set_field(&object, "bytes", &Uint8Array::from(image.bytes.as_slice()).into())?;
    set_field(&object, "mime", &JsValue::from_str(&image.mime))?;
    Ok(object.into())
}

fn encoded(bytes: Option<Vec<u8>>, mime: Option<String>) -> Option<EncodedImage> {
    bytes.map(|bytes| EncodedImage {
        bytes,
        mime: mime.unwrap_or_else(|| "image/png".to_string()),
    })
}

/// The editor session exposed to JavaScript.
#[wasm_bindgen]
pub struct JsEditSession {
    inner: EditSession,
}

impl Default for JsEditSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl JsEditSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: EditSession::new(),
        }
    }

    // ========================================================================
    // Image lifecycle
    // ========================================================================

    /// Decode and adopt a source image. Resets adjustments, mask and result.
    ///
    /// # Errors
    /// Returns an error if decoding fails; the session is then unchanged.
    pub fn load_image(&mut self, bytes: &[u8], mime: &str) -> Result<(), JsValue> {
        self.inner.load_image(bytes, mime).map_err(js_error)
    }

    pub fn close_image(&mut self) {
        self.inner.close_image();
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.inner.has_image()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.source().map_or(0, |s| s.width)
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.source().map_or(0, |s| s.height)
    }

    /// Soft reset: default adjustments and brush, no mask, no result.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    // ========================================================================
    // Adjustments and preview
    // ========================================================================

    pub fn adjustments(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.adjustments()).map_err(js_error)
    }

    /// Replace the adjustment snapshot from a plain JS object.
    pub fn set_adjustments(&mut self, value: JsValue) -> Result<(), JsValue> {
        let adjustments: Adjustments = serde_wasm_bindgen::from_value(value).map_err(js_error)?;
        self.inner.set_adjustments(adjustments);
        Ok(())
    }

    /// Replace the adjustment snapshot from a `JsAdjustments` wrapper.
    pub fn apply_adjustments(&mut self, adjustments: &JsAdjustments) {
        self.inner.set_adjustments(adjustments.inner().clone());
    }

    /// Render the newest adjustment snapshot. Returns undefined when nothing
    /// changed since the last frame.
    pub fn render_preview(&mut self) -> Option<JsImage> {
        self.inner
            .render_preview()
            .map(|frame| JsImage::from_raster(frame.image))
    }

    /// Adjusted source, encoded to its own mime type.
    pub fn bake(&self) -> Result<Vec<u8>, JsValue> {
        self.inner.bake().map(|e| e.bytes).map_err(js_error)
    }

    // ========================================================================
    // Curves
    // ========================================================================

    #[wasm_bindgen(getter)]
    pub fn active_channel(&self) -> String {
        self.inner.curve_editor().active().as_str().to_string()
    }

    /// Select `rgb`, `r`, `g` or `b`. Unknown names select `rgb`.
    pub fn set_active_channel(&mut self, name: &str) {
        self.inner.set_active_channel(channel_from_str(name));
    }

    /// Control points of the active channel.
    pub fn curve_points(&self) -> Result<JsValue, JsValue> {
        let channel = self.inner.curve_editor().active();
        serde_wasm_bindgen::to_value(self.inner.adjustments().curves.get(channel))
            .map_err(js_error)
    }

    /// The active channel's curve sampled at `samples` points across 0-255.
    pub fn curve_path(&self, samples: u32) -> Vec<f32> {
        let channel = self.inner.curve_editor().active();
        sample_curve(self.inner.adjustments().curves.get(channel), samples)
    }

    /// 256-entry LUT of a channel.
    pub fn lut(&self, name: &str) -> Vec<u8> {
        self.inner.luts().get(channel_from_str(name)).lut.to_vec()
    }

    /// Pointer press on the curve canvas. `button` is `PointerEvent.button`.
    /// Returns true if the curve changed.
    #[allow(clippy::too_many_arguments)]
    pub fn curve_pointer_down(
        &mut self,
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        client_x: f32,
        client_y: f32,
        button: i16,
        ctrl: bool,
    ) -> bool {
        let Some(button) = PointerButton::from_dom(button) else {
            return false;
        };
        let rect = display_rect(left, top, width, height);
        self.inner
            .curve_press(&rect, client_x, client_y, button, ctrl)
    }

    pub fn curve_pointer_move(
        &mut self,
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        client_x: f32,
        client_y: f32,
    ) -> bool {
        let rect = display_rect(left, top, width, height);
        self.inner.curve_drag(&rect, client_x, client_y)
    }

    pub fn curve_pointer_up(&mut self) {
        self.inner.curve_release();
    }

    /// Tooltip `{x, y, input, output}` for the dragged or hovered point.
    pub fn curve_tooltip(
        &self,
        width: f32,
        height: f32,
        hovered: Option<usize>,
    ) -> Result<JsValue, JsValue> {
        let rect = display_rect(0.0, 0.0, width, height);
        let tooltip = self.inner.curve_editor().tooltip(
            &self.inner.adjustments().curves,
            &rect,
            hovered,
        );
        serde_wasm_bindgen::to_value(&tooltip).map_err(js_error)
    }

    // ========================================================================
    // Mask painting
    // ========================================================================

    /// `global` or `mask`.
    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        match self.inner.mode() {
            EditMode::Global => "global",
            EditMode::Mask => "mask",
        }
        .to_string()
    }

    /// Switch edit mode. Entering `mask` clears the mask. Returns false for
    /// an unknown mode name.
    pub fn set_mode(&mut self, name: &str) -> bool {
        let mode = match name {
            "global" => EditMode::Global,
            "mask" => EditMode::Mask,
            _ => return false,
        };
        self.inner.set_mode(mode);
        true
    }

    pub fn brush_settings(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.brush_settings()).map_err(js_error)
    }

    /// Replace brush settings from a plain JS object. Values are clamped.
    pub fn set_brush_settings(&mut self, value: JsValue) -> Result<(), JsValue> {
        let settings: BrushSettings = serde_wasm_bindgen::from_value(value).map_err(js_error)?;
        self.inner.set_brush_settings(settings);
        Ok(())
    }

    /// Start a stroke. Ignored (returns false) outside mask mode.
    pub fn mask_pointer_down(
        &mut self,
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        client_x: f32,
        client_y: f32,
    ) -> bool {
        let rect = display_rect(left, top, width, height);
        self.inner.pointer_down(&rect, client_x, client_y)
    }

    pub fn mask_pointer_move(
        &mut self,
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        client_x: f32,
        client_y: f32,
    ) {
        let rect = display_rect(left, top, width, height);
        self.inner.pointer_move(&rect, client_x, client_y);
    }

    pub fn mask_pointer_up(&mut self) {
        self.inner.pointer_up();
    }

    pub fn mask_pointer_leave(&mut self) {
        self.inner.pointer_leave();
    }

    /// The last finalized mask, if any.
    pub fn mask(&self) -> Option<JsImage> {
        self.inner.mask().cloned().map(JsImage::from_raster)
    }

    pub fn mask_png(&self) -> Result<Option<Vec<u8>>, JsValue> {
        self.inner.mask_png().map_err(js_error)
    }

    // ========================================================================
    // Compare slider
    // ========================================================================

    #[wasm_bindgen(getter)]
    pub fn compare_position(&self) -> f32 {
        self.inner.compare().position()
    }

    #[wasm_bindgen(setter)]
    pub fn set_compare_position(&mut self, percent: f32) {
        self.inner.compare_mut().set_position(percent);
    }

    pub fn compare_pointer_down(&mut self, left: f32, width: f32, client_x: f32) {
        let rect = display_rect(left, 0.0, width, 1.0);
        self.inner.compare_mut().begin_drag(&rect, client_x);
    }

    pub fn compare_pointer_move(&mut self, left: f32, width: f32, client_x: f32) {
        let rect = display_rect(left, 0.0, width, 1.0);
        self.inner.compare_mut().drag_to(&rect, client_x);
    }

    pub fn compare_pointer_up(&mut self) {
        self.inner.compare_mut().end_drag();
    }

    /// CSS `clip-path` for the edited layer.
    pub fn compare_clip_path(&self) -> String {
        self.inner.compare().clip_path()
    }

    // ========================================================================
    // Edit service round trips
    // ========================================================================

    #[wasm_bindgen(getter)]
    pub fn aspect_ratio(&self) -> String {
        self.inner.aspect_ratio().label().to_string()
    }

    /// Set the target ratio by label (`1:1`, `16:9`, ..., `Original`).
    /// Returns false for an unknown label.
    pub fn set_aspect_ratio(&mut self, label: &str) -> bool {
        match AspectRatio::from_label(label) {
            Some(ratio) => {
                self.inner.set_aspect_ratio(ratio);
                true
            }
            None => false,
        }
    }

    /// Build the edit request `{ image: {bytes, mime}, prompt, mask }`.
    /// `mask` is `null` outside mask mode.
    ///
    /// # Errors
    /// No image, blank prompt, or mask mode without a painted mask.
    pub fn prepare_edit(&self, prompt: &str) -> Result<JsValue, JsValue> {
        let request = self.inner.prepare_edit(prompt).map_err(js_error)?;

        let object = Object::new();
        set_field(&object, "image", &encoded_to_js(&request.image)?)?;
        set_field(&object, "prompt", &JsValue::from_str(&request.prompt))?;
        let mask = match &request.mask {
            Some(mask) => encoded_to_js(mask)?,
            None => JsValue::NULL,
        };
        set_field(&object, "mask", &mask)?;
        Ok(object.into())
    }

    /// Forget the previous result; call before sending a new request.
    pub fn clear_result(&mut self) {
        self.inner.clear_result();
    }

    /// Store the service reply.
    ///
    /// # Errors
    /// Fails when the reply has neither an image nor text.
    pub fn accept_edit_response(
        &mut self,
        image: Option<Vec<u8>>,
        mime: Option<String>,
        text: Option<String>,
    ) -> Result<(), JsValue> {
        self.inner
            .accept_edit_response(EditResponse {
                image: encoded(image, mime),
                text,
            })
            .map_err(js_error)
    }

    /// Bytes to send for upscaling.
    ///
    /// # Errors
    /// No edited image yet, or it was already upscaled.
    pub fn prepare_upscale(&self) -> Result<Vec<u8>, JsValue> {
        self.inner
            .prepare_upscale()
            .map(|image| image.bytes.clone())
            .map_err(js_error)
    }

    pub fn accept_upscale(&mut self, image: Option<Vec<u8>>, mime: Option<String>) -> Result<(), JsValue> {
        self.inner
            .accept_upscale(encoded(image, mime))
            .map_err(js_error)
    }

    pub fn edited_image(&self) -> Option<Vec<u8>> {
        self.inner.edited_image().map(|e| e.bytes.clone())
    }

    pub fn edited_mime(&self) -> Option<String> {
        self.inner.edited_image().map(|e| e.mime.clone())
    }

    pub fn response_text(&self) -> Option<String> {
        self.inner.response_text().map(str::to_string)
    }

    #[wasm_bindgen(getter)]
    pub fn is_upscaled(&self) -> bool {
        self.inner.is_upscaled()
    }

    /// The edited result blended into the adjusted source through the mask.
    /// Undefined unless both exist.
    pub fn composite_result(&self) -> Result<Option<JsImage>, JsValue> {
        self.inner
            .composite_result()
            .map(|image| image.map(JsImage::from_raster))
            .map_err(js_error)
    }
}

/// Native tests stay on paths that never construct a `JsValue`.
#[cfg(test)]
mod tests {
    use super::*;
    use retouch_core::decode::{ImageFormat, ImageRaster};
    use retouch_core::encode::encode_png;

    fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        encode_png(&ImageRaster::filled(width, height, rgba, ImageFormat::Png)).unwrap()
    }

    fn loaded() -> JsEditSession {
        let mut session = JsEditSession::new();
        session
            .load_image(&png(20, 10, [128, 128, 128, 255]), "image/png")
            .unwrap();
        session
    }

    #[test]
    fn test_load_and_dimensions() {
        let session = loaded();
        assert!(session.has_image());
        assert_eq!((session.width(), session.height()), (20, 10));
        assert_eq!(session.mode(), "global");
        assert_eq!(session.aspect_ratio(), "1:1");
    }

    #[test]
    fn test_preview_after_adjustments() {
        let mut session = loaded();
        let _ = session.render_preview();

        let mut adj = JsAdjustments::new();
        adj.set_brightness(50.0);
        session.apply_adjustments(&adj);

        let frame = session.render_preview().unwrap();
        assert_eq!(&frame.pixels()[0..4], &[64, 64, 64, 255]);
        assert!(session.render_preview().is_none());
    }

    #[test]
    fn test_curve_pointer_flow() {
        let mut session = loaded();
        session.set_active_channel("g");
        assert_eq!(session.active_channel(), "g");

        // 256x256 canvas: client (128, 28) is curve (128, 228).
        assert!(session.curve_pointer_down(0.0, 0.0, 256.0, 256.0, 128.0, 28.0, 0, false));
        assert_eq!(session.lut("g")[128], 228);
        assert!(session.lut("rgb").iter().enumerate().all(|(i, &v)| v as usize == i));

        session.curve_pointer_up();
        assert!(!session.curve_pointer_move(0.0, 0.0, 256.0, 256.0, 10.0, 10.0));
        assert_eq!(session.curve_path(3).len(), 3);
    }

    #[test]
    fn test_unknown_pointer_button_ignored() {
        let mut session = loaded();
        assert!(!session.curve_pointer_down(0.0, 0.0, 256.0, 256.0, 128.0, 28.0, 1, false));
        assert_eq!(session.lut("rgb")[128], 128);
    }

    #[test]
    fn test_mask_painting_requires_mask_mode() {
        let mut session = loaded();
        assert!(!session.mask_pointer_down(0.0, 0.0, 20.0, 10.0, 5.0, 5.0));

        assert!(session.set_mode("mask"));
        assert!(!session.set_mode("lasso"));
        assert_eq!(session.mode(), "mask");

        assert!(session.mask_pointer_down(0.0, 0.0, 20.0, 10.0, 5.0, 5.0));
        session.mask_pointer_move(0.0, 0.0, 20.0, 10.0, 15.0, 5.0);
        session.mask_pointer_up();

        let mask = session.mask().unwrap();
        assert_eq!((mask.width(), mask.height()), (20, 10));
        assert!(session.mask_png().unwrap().is_some());
    }

    #[test]
    fn test_aspect_ratio_labels() {
        let mut session = JsEditSession::new();
        assert!(session.set_aspect_ratio("16:9"));
        assert_eq!(session.aspect_ratio(), "16:9");
        assert!(!session.set_aspect_ratio("5:4"));
        assert_eq!(session.aspect_ratio(), "16:9");
    }

    #[test]
    fn test_compare_slider() {
        let mut session = loaded();
        assert_eq!(session.compare_position(), 50.0);
        session.compare_pointer_down(0.0, 200.0, 50.0);
        assert_eq!(session.compare_position(), 25.0);
        session.compare_pointer_move(0.0, 200.0, 150.0);
        session.compare_pointer_up();
        session.compare_pointer_move(0.0, 200.0, 0.0);
        assert_eq!(session.compare_position(), 75.0);
        assert_eq!(session.compare_clip_path(), "inset(0 25% 0 0)");
    }

    #[test]
    fn test_accept_response_and_upscale() {
        let mut session = loaded();
        session
            .accept_edit_response(Some(png(20, 10, [255, 0, 0, 255])), None, Some("ok".into()))
            .unwrap();
        assert_eq!(session.edited_mime().as_deref(), Some("image/png"));
        assert_eq!(session.response_text().as_deref(), Some("ok"));

        assert!(!session.prepare_upscale().unwrap().is_empty());
        session
            .accept_upscale(Some(png(40, 20, [255, 0, 0, 255])), Some("image/png".into()))
            .unwrap();
        assert!(session.is_upscaled());

        session.clear_result();
        assert!(!session.is_upscaled());
        assert!(session.edited_image().is_none());
    }

    #[test]
    fn test_composite_result_needs_mask() {
        let mut session = loaded();
        session
            .accept_edit_response(Some(png(20, 10, [255, 0, 0, 255])), None, None)
            .unwrap();
        assert!(session.composite_result().unwrap().is_none());

        session.set_mode("mask");
        session.mask_pointer_down(0.0, 0.0, 20.0, 10.0, 10.0, 5.0);
        session.mask_pointer_up();
        let out = session.composite_result().unwrap().unwrap();
        assert_eq!((out.width(), out.height()), (20, 10));
        assert_eq!(&out.pixels()[(5 * 20 + 10) * 4..(5 * 20 + 10) * 4 + 4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_bake_matches_source_format() {
        let session = loaded();
        let bytes = session.bake().unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_reset_keeps_image() {
        let mut session = loaded();
        session.set_mode("mask");
        session.set_aspect_ratio("Original");
        session.reset();
        assert!(session.has_image());
        assert_eq!(session.mode(), "global");
        assert_eq!(session.aspect_ratio(), "1:1");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use retouch_core::decode::{ImageFormat, ImageRaster};
    use retouch_core::encode::encode_png;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn loaded() -> JsEditSession {
        let bytes = encode_png(&ImageRaster::filled(8, 8, [90, 90, 90, 255], ImageFormat::Png))
            .unwrap();
        let mut session = JsEditSession::new();
        session.load_image(&bytes, "image/png").unwrap();
        session
    }

    #[wasm_bindgen_test]
    fn test_prepare_edit_object() {
        let session = loaded();
        let request = session.prepare_edit("add clouds").unwrap();
        let prompt = Reflect::get(&request, &"prompt".into()).unwrap();
        assert!(prompt.as_string().unwrap().ends_with("\"add clouds\""));
        assert!(Reflect::get(&request, &"mask".into()).unwrap().is_null());
    }

    #[wasm_bindgen_test]
    fn test_prepare_edit_rejects_blank_prompt() {
        assert!(loaded().prepare_edit("  ").is_err());
    }

    #[wasm_bindgen_test]
    fn test_adjustments_round_trip_through_js() {
        let mut session = loaded();
        let value = session.adjustments().unwrap();
        session.set_adjustments(value).unwrap();
        assert!(session.render_preview().is_some());
    }
}
