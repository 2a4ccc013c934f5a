//! WASM bindings for segmentation and crop geometry.
//!
//! Rectangles and segmentation results cross the boundary as plain JS
//! objects (`{ left, top, width, height }`, etc.) through
//! `serde-wasm-bindgen`.

use crate::types::JsRasterImage;
use idframe_core::config::{FramingConfig, SegmentationConfig};
use idframe_core::segment::{segment, SegmentationResult};
use idframe_core::transform::{
    extract_crop as core_extract, plan_crop as core_plan, to_display, to_natural, CropRect,
    DisplayRect, ScaleFactors,
};
use idframe_core::AspectRatio;
use wasm_bindgen::prelude::*;

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

fn aspect_ratio(value: f64) -> Result<AspectRatio, JsValue> {
    AspectRatio::new(value)
        .ok_or_else(|| JsValue::from_str(&format!("Invalid aspect ratio: {}", value)))
}

fn scale(scale_x: f64, scale_y: f64) -> Result<ScaleFactors, JsValue> {
    ScaleFactors::new(scale_x, scale_y)
        .ok_or_else(|| JsValue::from_str("Scale factors must be positive and finite"))
}

/// Compute alpha statistics for a matted image.
///
/// Returns `{ image_width, image_height, bbox, rows }`.
///
/// # Errors
///
/// Returns an error if the image has no pixel with alpha above
/// `alpha_threshold`.
#[wasm_bindgen]
pub fn segment_alpha(
    image: &JsRasterImage,
    alpha_threshold: u8,
    min_row_pixels: u32,
) -> Result<JsValue, JsValue> {
    let config = SegmentationConfig {
        alpha_threshold,
        min_row_pixels,
    };
    let result = segment(image.raster(), &config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&result)
}

/// Plan a crop from a segmentation result using the default framing.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const seg = segment_alpha(matte, 10, 20);
/// const rect = plan_crop(seg, 3 / 4);
/// console.log(`Crop ${rect.width}x${rect.height} at ${rect.left},${rect.top}`);
/// ```
#[wasm_bindgen]
pub fn plan_crop(segmentation: JsValue, aspect_ratio_value: f64) -> Result<JsValue, JsValue> {
    let seg: SegmentationResult = from_js(segmentation, "segmentation result")?;
    let rect = core_plan(&seg, aspect_ratio(aspect_ratio_value)?, &FramingConfig::default());
    to_js(&rect)
}

/// Natural pixel rectangle to crop-widget display units.
#[wasm_bindgen]
pub fn to_display_rect(rect: JsValue, scale_x: f64, scale_y: f64) -> Result<JsValue, JsValue> {
    let rect: CropRect = from_js(rect, "crop rectangle")?;
    to_js(&to_display(&rect, scale(scale_x, scale_y)?))
}

/// Crop-widget display rectangle back to natural pixels.
#[wasm_bindgen]
pub fn to_natural_rect(rect: JsValue, scale_x: f64, scale_y: f64) -> Result<JsValue, JsValue> {
    let rect: DisplayRect = from_js(rect, "display rectangle")?;
    to_js(&to_natural(&rect, scale(scale_x, scale_y)?))
}

/// Cut a rectangle (natural pixels) out of an image, keeping transparency.
///
/// Parts of the rectangle outside the image come out fully transparent.
/// Throws for non-finite or empty rectangles and for oversized ones.
#[wasm_bindgen]
pub fn extract_crop(
    image: &JsRasterImage,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
) -> Result<JsRasterImage, JsValue> {
    let rect = CropRect::new(left, top, width, height);
    core_extract(image.raster(), &rect)
        .map(JsRasterImage::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
