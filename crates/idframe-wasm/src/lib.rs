//! idframe WASM - WebAssembly bindings for idframe
//!
//! This crate exposes the idframe-core ID-photo engine to JavaScript/TypeScript
//! front ends.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrappers for rasters and tickets
//! - `decode` - Image decoding and upload format checks
//! - `encode` - PNG export
//! - `transform` - Segmentation, crop planning and coordinate conversion
//! - `composite` - Flattening a crop onto a background color
//! - `pipeline` - `JsPipeline`, the stateful controller
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsPipeline, is_supported_upload } from '@idframe/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const pipeline = new JsPipeline();
//! const upload = pipeline.begin_upload(file.type, new Uint8Array(await file.arrayBuffer()));
//! ```

use idframe_core::{AspectRatio, BackgroundColor};
use serde::Serialize;
use wasm_bindgen::prelude::*;

mod composite;
mod decode;
mod encode;
mod pipeline;
mod transform;
mod types;

// Re-export public types
pub use composite::composite;
pub use decode::{decode_raster, is_supported_upload, supported_mime_types};
pub use encode::{encode_png, encode_png_from_image, export_file_name};
pub use pipeline::JsPipeline;
pub use transform::{extract_crop, plan_crop, segment_alpha, to_display_rect, to_natural_rect};
pub use types::{JsCropTicket, JsRasterImage, JsUploadTicket};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[derive(Serialize)]
struct AspectRatioPreset {
    label: &'static str,
    value: f64,
}

#[derive(Serialize)]
struct BackgroundPreset {
    label: &'static str,
    hex: String,
}

/// Aspect ratio presets as `[{ label: '3:4', value: 0.75 }, ...]`.
#[wasm_bindgen]
pub fn aspect_ratio_presets() -> Result<JsValue, JsValue> {
    let presets: Vec<AspectRatioPreset> = AspectRatio::presets()
        .map(|(ratio, label)| AspectRatioPreset {
            label,
            value: ratio.value(),
        })
        .collect();
    serde_wasm_bindgen::to_value(&presets).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Background color presets as `[{ label: 'White', hex: '#ffffff' }, ...]`.
#[wasm_bindgen]
pub fn background_presets() -> Result<JsValue, JsValue> {
    let presets: Vec<BackgroundPreset> = BackgroundColor::presets()
        .map(|(color, label)| BackgroundPreset {
            label,
            hex: color.to_hex(),
        })
        .collect();
    serde_wasm_bindgen::to_value(&presets).map_err(|e| JsValue::from_str(&e.to_string()))
}
