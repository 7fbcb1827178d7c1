//! Adjustment WASM bindings.
//!
//! Wraps the core `Adjustments` snapshot so the sliders in the web UI can
//! edit it field by field, and exposes the one-shot pipeline.

use crate::types::JsImage;
use retouch_core::pipeline::AdjustmentPipeline;
use retouch_core::Adjustments;
use wasm_bindgen::prelude::*;

/// Adjustment snapshot wrapper for JavaScript.
///
/// Setters store values as given; they are clamped into range when the
/// snapshot is applied.
#[wasm_bindgen]
pub struct JsAdjustments {
    inner: Adjustments,
}

#[wasm_bindgen]
impl JsAdjustments {
    /// Create adjustments with default (neutral) values
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: Adjustments::new(),
        }
    }

    /// Brightness in percent, 100 = unchanged
    #[wasm_bindgen(getter)]
    pub fn brightness(&self) -> f32 {
        self.inner.brightness
    }

    #[wasm_bindgen(setter)]
    pub fn set_brightness(&mut self, value: f32) {
        self.inner.brightness = value;
    }

    /// Contrast in percent, 100 = unchanged
    #[wasm_bindgen(getter)]
    pub fn contrast(&self) -> f32 {
        self.inner.contrast
    }

    #[wasm_bindgen(setter)]
    pub fn set_contrast(&mut self, value: f32) {
        self.inner.contrast = value;
    }

    /// Saturation in percent, 100 = unchanged
    #[wasm_bindgen(getter)]
    pub fn saturation(&self) -> f32 {
        self.inner.saturation
    }

    #[wasm_bindgen(setter)]
    pub fn set_saturation(&mut self, value: f32) {
        self.inner.saturation = value;
    }

    /// Overlay colour as `#rrggbb`
    #[wasm_bindgen(getter)]
    pub fn filter_color(&self) -> String {
        self.inner.filter_color.clone()
    }

    #[wasm_bindgen(setter)]
    pub fn set_filter_color(&mut self, value: String) {
        self.inner.filter_color = value;
    }

    /// Overlay strength in percent, 0 = off
    #[wasm_bindgen(getter)]
    pub fn filter_strength(&self) -> f32 {
        self.inner.filter_strength
    }

    #[wasm_bindgen(setter)]
    pub fn set_filter_strength(&mut self, value: f32) {
        self.inner.filter_strength = value;
    }

    /// Check if the snapshot leaves every pixel untouched
    pub fn is_neutral(&self) -> bool {
        self.inner.clamped().is_neutral()
    }

    /// Serialize to a plain JS object (camelCase fields)
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Deserialize from a plain JS object. Missing fields take defaults.
    pub fn from_json(value: JsValue) -> Result<JsAdjustments, JsValue> {
        let inner: Adjustments =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { inner })
    }
}

impl Default for JsAdjustments {
    fn default() -> Self {
        Self::new()
    }
}

impl JsAdjustments {
    pub(crate) fn inner(&self) -> &Adjustments {
        &self.inner
    }
}

/// The default adjustment snapshot as a plain JS object.
#[wasm_bindgen]
pub fn default_adjustments() -> Result<JsValue, JsValue> {
    JsAdjustments::new().to_json()
}

/// Run the full pipeline (tone, curves, overlay) on a copy of `image`.
///
/// # Example (TypeScript)
/// ```typescript
/// const adj = new JsAdjustments();
/// adj.brightness = 150;
/// adj.filter_color = '#ff8800';
/// adj.filter_strength = 30;
///
/// const adjusted = apply_adjustments(sourceImage, adj);
/// ctx.putImageData(new ImageData(new Uint8ClampedArray(adjusted.pixels()), adjusted.width), 0, 0);
/// ```
#[wasm_bindgen]
pub fn apply_adjustments(image: &JsImage, adjustments: &JsAdjustments) -> JsImage {
    let pipeline = AdjustmentPipeline::new(adjustments.inner());
    JsImage::from_raster(pipeline.process(image.raster()))
}
