//! `JsPipeline` - the pipeline controller for the browser.
//!
//! The background-removal service and the crop widget both live on the
//! JavaScript side, so the controller's async hand-offs are split into
//! explicit calls:
//!
//! ```typescript
//! const pipeline = new JsPipeline();
//! const upload = pipeline.begin_upload(file.type, bytes);
//! const matte = await removeBackground(file);              // external service
//! const crop = pipeline.complete_segmentation(upload, matte);
//! if (crop) {
//!   const cropper = new Cropper(img, { ready: () => {
//!     pipeline.widget_ready(crop, cropper.getImageData().naturalWidth, ...);
//!   }});
//! }
//! const photo = pipeline.composite('#ffffff');
//! ```
//!
//! Errors thrown to JavaScript carry the user-facing message; the technical
//! detail goes to the browser console.

use crate::composite::parse_background;
use crate::types::{JsCropTicket, JsRasterImage, JsUploadTicket};
use idframe_core::pipeline::{CropWidget, Delivery, Matte, PipelineError, RemovalError, Upload};
use idframe_core::transform::{DisplayMetrics, NaturalMetrics};
use idframe_core::{AspectRatio, DisplayRect, PipelineConfig, PipelineController};
use wasm_bindgen::prelude::*;

/// Widget state as reported by JavaScript for one call.
struct ReportedWidget {
    rect: DisplayRect,
    natural: NaturalMetrics,
    display: DisplayMetrics,
}

impl CropWidget for ReportedWidget {
    fn crop_rect(&self) -> DisplayRect {
        self.rect
    }

    fn set_crop_rect(&mut self, rect: DisplayRect) {
        self.rect = rect;
    }

    fn natural_metrics(&self) -> NaturalMetrics {
        self.natural
    }

    fn display_metrics(&self) -> DisplayMetrics {
        self.display
    }
}

impl ReportedWidget {
    fn new(
        natural_width: f64,
        natural_height: f64,
        display_width: f64,
        display_height: f64,
    ) -> Self {
        Self {
            rect: DisplayRect::new(0.0, 0.0, 0.0, 0.0),
            natural: NaturalMetrics {
                natural_width,
                natural_height,
            },
            display: DisplayMetrics {
                display_width,
                display_height,
            },
        }
    }
}

fn log_warning(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

fn to_js_error(err: PipelineError) -> JsValue {
    log_warning(&format!("idframe: {}", err));
    JsValue::from_str(&err.user_message())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// ID-photo pipeline for one photo at a time.
#[wasm_bindgen]
pub struct JsPipeline {
    inner: PipelineController,
}

#[wasm_bindgen]
impl JsPipeline {
    /// Create a pipeline with default settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsPipeline {
        Self {
            inner: PipelineController::default(),
        }
    }

    /// Create a pipeline from a config object, e.g.
    /// `{ quality: 'large', framing: { head_top_margin: 0.2 } }`.
    /// Missing fields take their defaults.
    pub fn with_config(config: JsValue) -> Result<JsPipeline, JsValue> {
        let config: PipelineConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid pipeline config: {}", e)))?;
        Ok(Self {
            inner: PipelineController::new(config),
        })
    }

    /// Current stage: `empty`, `uploaded`, `segmented`, `cropped` or `composited`.
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.inner.state().name().to_string()
    }

    /// Model size to request from the background-removal service.
    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> String {
        match self.inner.config().quality {
            idframe_core::RemovalQuality::Small => "small",
            idframe_core::RemovalQuality::Medium => "medium",
            idframe_core::RemovalQuality::Large => "large",
        }
        .to_string()
    }

    /// Start processing a new file. Send the bytes to the background-removal
    /// service and hand its answer back with the returned ticket.
    pub fn begin_upload(
        &mut self,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<JsUploadTicket, JsValue> {
        self.inner
            .begin_upload(Upload::new(mime_type, bytes))
            .map(|request| JsUploadTicket::new(request.version))
            .map_err(to_js_error)
    }

    /// Deliver the encoded matte (PNG with transparency) for an upload.
    ///
    /// Returns the crop ticket for the new crop widget, or `undefined` if
    /// the upload has since been replaced.
    pub fn complete_segmentation(
        &mut self,
        upload: &JsUploadTicket,
        matte: Vec<u8>,
    ) -> Result<Option<JsCropTicket>, JsValue> {
        self.deliver(upload, Ok(Matte::Encoded(matte)))
    }

    /// Like `complete_segmentation`, for a matte that is already decoded.
    pub fn complete_segmentation_raster(
        &mut self,
        upload: &JsUploadTicket,
        matte: JsRasterImage,
    ) -> Result<Option<JsCropTicket>, JsValue> {
        self.deliver(upload, Ok(Matte::Raster(matte.into_raster())))
    }

    /// Report that the background-removal service failed for an upload.
    ///
    /// `kind` is `'unsupported_input'` when the service refused the file
    /// and `'model_failure'` when it broke while processing it.
    pub fn fail_segmentation(
        &mut self,
        upload: &JsUploadTicket,
        kind: &str,
        message: String,
    ) -> Result<(), JsValue> {
        let error = removal_error(kind, message)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown removal failure: {}", kind)))?;
        self.deliver(upload, Err(error)).map(|_| ())
    }

    /// Change the target aspect ratio (e.g. `3, 4`).
    ///
    /// Returns a new crop ticket when the crop was re-planned; the crop
    /// widget must be re-created for it.
    pub fn set_aspect_ratio(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Option<JsCropTicket>, JsValue> {
        let ratio = AspectRatio::from_proportions(width, height).ok_or_else(|| {
            JsValue::from_str(&format!("Invalid aspect ratio: {}:{}", width, height))
        })?;
        self.inner
            .set_aspect_ratio(ratio)
            .map(|ticket| ticket.map(JsCropTicket::new))
            .map_err(to_js_error)
    }

    /// The crop widget created for `ticket` is ready.
    ///
    /// Returns the rectangle (display units) to apply with
    /// `cropper.setData`, or `null` when the ticket has been superseded.
    pub fn widget_ready(
        &mut self,
        ticket: &JsCropTicket,
        natural_width: f64,
        natural_height: f64,
        display_width: f64,
        display_height: f64,
    ) -> Result<JsValue, JsValue> {
        let mut widget =
            ReportedWidget::new(natural_width, natural_height, display_width, display_height);
        match self
            .inner
            .widget_ready(ticket.get(), &mut widget)
            .map_err(to_js_error)?
        {
            Delivery::Applied(rect) => to_js(&rect),
            Delivery::Discarded => Ok(JsValue::NULL),
        }
    }

    /// The crop widget was resized; returns the current crop in the new
    /// display units.
    pub fn widget_resized(
        &mut self,
        natural_width: f64,
        natural_height: f64,
        display_width: f64,
        display_height: f64,
    ) -> Result<JsValue, JsValue> {
        let mut widget =
            ReportedWidget::new(natural_width, natural_height, display_width, display_height);
        let rect = self
            .inner
            .widget_resized(&mut widget)
            .map_err(to_js_error)?;
        to_js(&rect)
    }

    /// The user moved the crop box (display units). Returns the crop in
    /// natural pixels. If already composited, the photo is redrawn.
    pub fn crop_adjusted(
        &mut self,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) -> Result<JsValue, JsValue> {
        let rect = self
            .inner
            .crop_adjusted(DisplayRect::new(left, top, width, height))
            .map_err(to_js_error)?;
        to_js(&rect)
    }

    /// Flatten the current crop onto a background (`#rrggbb`).
    pub fn composite(&mut self, background: &str) -> Result<JsRasterImage, JsValue> {
        let color = parse_background(background)?;
        self.inner.composite_now(color).map_err(to_js_error)?;
        self.output()
            .ok_or_else(|| JsValue::from_str("Composited photo unavailable"))
    }

    /// The composited photo, if any.
    pub fn output(&self) -> Option<JsRasterImage> {
        self.inner.output().cloned().map(JsRasterImage::from_raster)
    }

    /// The current crop with transparency kept, for preview.
    pub fn cropped_preview(&self) -> Option<JsRasterImage> {
        self.inner.cropped_preview().map(JsRasterImage::from_raster)
    }

    /// PNG bytes of the composited photo.
    pub fn export_png(&self) -> Result<Vec<u8>, JsValue> {
        self.inner.export_png().map_err(to_js_error)
    }

    /// Drop the current photo.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl JsPipeline {
    fn deliver(
        &mut self,
        upload: &JsUploadTicket,
        outcome: Result<Matte, RemovalError>,
    ) -> Result<Option<JsCropTicket>, JsValue> {
        self.inner
            .complete_segmentation(upload.get(), outcome)
            .map(|delivery| delivery.applied().map(JsCropTicket::new))
            .map_err(to_js_error)
    }
}

fn removal_error(kind: &str, message: String) -> Option<RemovalError> {
    match kind {
        "unsupported_input" => Some(RemovalError::UnsupportedInput(message)),
        "model_failure" => Some(RemovalError::ModelFailure(message)),
        _ => None,
    }
}

impl Default for JsPipeline {
    fn default() -> Self {
        Self::new()
    }
}
