//! Tone curve WASM bindings.
//!
//! LUT generation and curve sampling for the curves panel. Points use the
//! 0-255 tone scale on both axes.

use retouch_core::curve::apply_curves;
use retouch_core::{Channel, Curve, CurveLuts, CurvePoint, ToneCurveLut};
use wasm_bindgen::prelude::*;

use crate::types::JsImage;

/// JavaScript-accessible tone curve LUT.
///
/// # Example (TypeScript)
/// ```typescript
/// const lut = new JsToneCurveLut([
///   { x: 0, y: 0 },
///   { x: 64, y: 40 },
///   { x: 192, y: 215 },
///   { x: 255, y: 255 },
/// ]);
/// const curved = lut.apply(image);
/// lut.free();
/// ```
#[wasm_bindgen]
pub struct JsToneCurveLut {
    inner: ToneCurveLut,
}

#[derive(serde::Deserialize)]
struct CurvePointJs {
    x: f32,
    y: f32,
}

#[wasm_bindgen]
impl JsToneCurveLut {
    /// Create a LUT from control points.
    ///
    /// # Errors
    /// Returns an error if the points can't be deserialized, or if they don't
    /// form a valid curve (at least two points, ascending x, endpoints at 0
    /// and 255).
    #[wasm_bindgen(constructor)]
    pub fn new(points: JsValue) -> Result<JsToneCurveLut, JsValue> {
        let points: Vec<CurvePointJs> = serde_wasm_bindgen::from_value(points)
            .map_err(|e| JsValue::from_str(&format!("Invalid curve points: {}", e)))?;
        let curve = curve_from_js(points).map_err(|e| JsValue::from_str(&e))?;
        Ok(JsToneCurveLut {
            inner: ToneCurveLut::from_curve(&curve),
        })
    }

    /// Create an identity (no-op) LUT.
    pub fn identity() -> JsToneCurveLut {
        JsToneCurveLut {
            inner: ToneCurveLut::identity(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.inner.is_identity()
    }

    /// Raw LUT data (256 bytes), lut[i] = output for input i.
    pub fn get_lut(&self) -> Vec<u8> {
        self.inner.lut.to_vec()
    }

    /// Apply this LUT to R, G and B of a copy of `image`.
    pub fn apply(&self, image: &JsImage) -> JsImage {
        let luts = CurveLuts {
            rgb: self.inner.clone(),
            ..CurveLuts::default()
        };
        let mut raster = image.raster().clone();
        apply_curves(&mut raster.pixels, &luts);
        JsImage::from_raster(raster)
    }

    pub fn free(self) {}
}

/// Sample a curve at `samples` evenly spaced inputs across 0-255, for
/// drawing the curve path.
#[wasm_bindgen]
pub fn evaluate_curve(points: JsValue, samples: u32) -> Result<Vec<f32>, JsValue> {
    let points: Vec<CurvePointJs> = serde_wasm_bindgen::from_value(points)
        .map_err(|e| JsValue::from_str(&format!("Invalid curve points: {}", e)))?;
    let curve = curve_from_js(points).map_err(|e| JsValue::from_str(&e))?;
    Ok(sample_curve(&curve, samples))
}

fn curve_from_js(points: Vec<CurvePointJs>) -> Result<Curve, String> {
    Curve::new(
        points
            .into_iter()
            .map(|p| CurvePoint::new(p.x, p.y))
            .collect(),
    )
    .map_err(|e| e.to_string())
}

pub(crate) fn sample_curve(curve: &Curve, samples: u32) -> Vec<f32> {
    let samples = samples.max(2);
    let step = 255.0 / (samples - 1) as f32;
    (0..samples)
        .map(|i| retouch_core::evaluate_curve(curve, i as f32 * step))
        .collect()
}

/// Parse a channel name from the UI, defaulting to the master curve.
pub(crate) fn channel_from_str(name: &str) -> Channel {
    Channel::from_name(name).unwrap_or(Channel::Rgb)
}
