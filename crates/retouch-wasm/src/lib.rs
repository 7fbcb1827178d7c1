//! Retouch WASM - WebAssembly bindings for the Retouch editor
//!
//! This crate exposes the retouch-core engine to the browser UI.
//!
//! # Module Structure
//!
//! - `types` - Image wrapper and display rect helpers
//! - `adjustments` - Adjustment snapshots and the one-shot pipeline
//! - `curve` - Tone curve LUTs
//! - `decode` - Image decoding and resizing
//! - `encode` - PNG / JPEG / WEBP encoding
//! - `mask` - Standalone brush engine and masked compositing
//! - `session` - The full editing session: curves, brush, edit service round trips
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditSession } from '@retouch/wasm';
//!
//! await init();
//!
//! const session = new JsEditSession();
//! session.load_image(new Uint8Array(await file.arrayBuffer()), file.type);
//! session.set_adjustments({ brightness: 120, contrast: 100, saturation: 100 });
//! const frame = session.render_preview();
//! ```

use wasm_bindgen::prelude::*;

mod adjustments;
mod curve;
mod decode;
mod encode;
mod mask;
mod session;
mod types;

pub use adjustments::{apply_adjustments, default_adjustments, JsAdjustments};
pub use curve::{evaluate_curve, JsToneCurveLut};
pub use decode::{decode_image, resize};
pub use encode::{encode_image, encode_jpeg, encode_png};
pub use mask::{apply_mask, JsBrushEngine};
pub use session::JsEditSession;
pub use types::JsImage;

/// Initialize the WASM module (called automatically on load).
///
/// Routes panics and `log` output to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("retouch: logger already initialized"));
    }
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
