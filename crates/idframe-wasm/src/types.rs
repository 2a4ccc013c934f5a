//! WASM-compatible wrapper types for rasters and tickets.
//!
//! This module provides JavaScript-friendly types that wrap the core idframe
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use idframe_core::pipeline::{CropTicket, Version};
use idframe_core::RasterImage;
use wasm_bindgen::prelude::*;

/// An RGBA raster for JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is
/// made to JavaScript memory as a `Uint8Array`, which can be wrapped in an
/// `ImageData` for drawing to a canvas.
#[wasm_bindgen]
pub struct JsRasterImage {
    inner: RasterImage,
}

#[wasm_bindgen]
impl JsRasterImage {
    /// Create a raster from dimensions and RGBA pixel data
    /// (4 bytes per pixel, row-major order).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<JsRasterImage, JsValue> {
        RasterImage::new(width, height, pixels)
            .map(Self::from_raster)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.inner.pixels().len()
    }

    /// Returns RGBA pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.inner.pixels().to_vec()
    }

    /// Explicitly free WASM memory.
    ///
    /// This is optional - wasm-bindgen's finalizer will handle cleanup automatically.
    pub fn free(self) {}
}

impl JsRasterImage {
    pub(crate) fn from_raster(inner: RasterImage) -> Self {
        Self { inner }
    }

    pub(crate) fn raster(&self) -> &RasterImage {
        &self.inner
    }

    pub(crate) fn into_raster(self) -> RasterImage {
        self.inner
    }
}

/// Opaque handle for one upload.
///
/// Returned by `JsPipeline.begin_upload` and handed back with the
/// background-removal result so late results for a replaced photo are
/// ignored.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct JsUploadTicket {
    version: Version,
}

#[wasm_bindgen]
impl JsUploadTicket {
    /// Upload sequence number, for logging.
    #[wasm_bindgen(getter)]
    pub fn version(&self) -> f64 {
        self.version.get() as f64
    }
}

impl JsUploadTicket {
    pub(crate) fn new(version: Version) -> Self {
        Self { version }
    }

    pub(crate) fn get(&self) -> Version {
        self.version
    }
}

/// Opaque handle for one auto-crop session.
///
/// Pass it to `JsPipeline.widget_ready` once the crop widget created for
/// this session has initialized.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct JsCropTicket {
    ticket: CropTicket,
}

#[wasm_bindgen]
impl JsCropTicket {
    #[wasm_bindgen(getter)]
    pub fn version(&self) -> f64 {
        self.ticket.version.get() as f64
    }

    #[wasm_bindgen(getter)]
    pub fn epoch(&self) -> f64 {
        self.ticket.epoch as f64
    }
}

impl JsCropTicket {
    pub(crate) fn new(ticket: CropTicket) -> Self {
        Self { ticket }
    }

    pub(crate) fn get(&self) -> CropTicket {
        self.ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_raster_image_creation() {
        let img = JsRasterImage::new(100, 50, vec![0u8; 100 * 50 * 4]).unwrap();
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
        assert_eq!(img.byte_length(), 20000);
    }

    #[test]
    fn test_js_raster_image_pixels() {
        let pixels = vec![255u8, 128, 64, 255, 32, 16, 8, 0];
        let img = JsRasterImage::new(2, 1, pixels.clone()).unwrap();
        assert_eq!(img.pixels(), pixels);
    }

    #[test]
    fn test_raster_round_trip() {
        let raster = RasterImage::new(3, 2, vec![7u8; 24]).unwrap();
        let js_img = JsRasterImage::from_raster(raster.clone());
        assert_eq!(js_img.raster(), &raster);
        assert_eq!(js_img.into_raster(), raster);
    }
}
