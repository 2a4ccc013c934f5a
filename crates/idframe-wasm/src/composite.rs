//! Compositing WASM binding.

use crate::types::JsRasterImage;
use idframe_core::composite::composite as core_composite;
use idframe_core::{BackgroundColor, CropRect};
use wasm_bindgen::prelude::*;

pub(crate) fn parse_background(hex: &str) -> Result<BackgroundColor, JsValue> {
    BackgroundColor::from_hex(hex)
        .ok_or_else(|| JsValue::from_str(&format!("Invalid background color: {}", hex)))
}

/// Flatten a crop of a matted image onto a solid background color.
///
/// `background` is a CSS hex color (`#rrggbb` or `#rgb`). The result is
/// fully opaque and sized to the rounded crop rectangle.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const photo = composite(matte, rect.left, rect.top, rect.width, rect.height, '#ffffff');
/// ctx.putImageData(new ImageData(new Uint8ClampedArray(photo.pixels()), photo.width), 0, 0);
/// ```
#[wasm_bindgen]
pub fn composite(
    image: &JsRasterImage,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    background: &str,
) -> Result<JsRasterImage, JsValue> {
    let color = parse_background(background)?;
    let rect = CropRect::new(left, top, width, height);
    core_composite(image.raster(), &rect, color)
        .map(JsRasterImage::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
