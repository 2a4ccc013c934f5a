//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_raster`] - Decode encoded image bytes (e.g. the matted PNG from
//!   the background-removal service) into an RGBA raster
//! - [`is_supported_upload`] - Check a file's MIME type before uploading it
//! - [`supported_mime_types`] - The accepted upload MIME types
//!
//! # Example
//!
//! ```typescript
//! import { decode_raster, is_supported_upload } from '@idframe/wasm';
//!
//! if (!is_supported_upload(file.type)) {
//!   throw new Error('Unsupported file type');
//! }
//! const matte = decode_raster(new Uint8Array(await blob.arrayBuffer()));
//! console.log(`Matte: ${matte.width}x${matte.height}`);
//! ```

use crate::types::JsRasterImage;
use idframe_core::decode;
use idframe_core::pipeline::{UploadFormat, SUPPORTED_MIME_TYPES};
use wasm_bindgen::prelude::*;

/// Decode image bytes into RGBA, applying EXIF orientation.
///
/// # Errors
///
/// Returns an error if the format is unrecognized or the data is corrupted.
#[wasm_bindgen]
pub fn decode_raster(bytes: &[u8]) -> Result<JsRasterImage, JsValue> {
    decode::decode_raster(bytes)
        .map(JsRasterImage::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Whether a file with this MIME type can be uploaded.
#[wasm_bindgen]
pub fn is_supported_upload(mime_type: &str) -> bool {
    UploadFormat::from_mime(mime_type).is_some()
}

/// The accepted upload MIME types, e.g. for an `<input accept>` attribute.
#[wasm_bindgen]
pub fn supported_mime_types() -> Vec<String> {
    SUPPORTED_MIME_TYPES.iter().map(|m| m.to_string()).collect()
}
