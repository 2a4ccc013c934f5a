//! Image encoding WASM bindings.
//!
//! The only export format is a flattened PNG of the composited photo.
//!
//! # Example
//!
//! ```typescript
//! import { encode_png_from_image, export_file_name } from '@idframe/wasm';
//!
//! const png = encode_png_from_image(finalImage);
//! const link = document.createElement('a');
//! link.href = URL.createObjectURL(new Blob([png], { type: 'image/png' }));
//! link.download = export_file_name();
//! link.click();
//! ```

use crate::types::JsRasterImage;
use idframe_core::encode;
use wasm_bindgen::prelude::*;

/// Encode RGBA pixel data to PNG bytes.
///
/// # Errors
///
/// Returns an error if:
/// - The pixel data length doesn't match width * height * 4
/// - Width or height is zero
/// - Encoding fails internally
#[wasm_bindgen]
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, JsValue> {
    encode::encode_png(pixels, width, height).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode a JsRasterImage to PNG bytes.
#[wasm_bindgen]
pub fn encode_png_from_image(image: &JsRasterImage) -> Result<Vec<u8>, JsValue> {
    encode::encode_raster_png(image.raster()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Default file name for the downloaded photo.
#[wasm_bindgen]
pub fn export_file_name() -> String {
    encode::EXPORT_FILE_NAME.to_string()
}
