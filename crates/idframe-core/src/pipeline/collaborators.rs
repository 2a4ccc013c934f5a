//! Interfaces to the pipeline's external collaborators.
//!
//! The background-removal service and the interactive crop widget live
//! outside this crate. The controller only talks to them through the traits
//! below, which keeps it testable with in-memory fakes.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RemovalQuality;
use crate::decode::{decode_raster, DecodeError, RasterImage};
use crate::transform::{DisplayMetrics, DisplayRect, NaturalMetrics};

/// MIME types accepted for upload.
pub const SUPPORTED_MIME_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
    "image/svg+xml",
];

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Tiff,
    Svg,
}

impl UploadFormat {
    /// Match a MIME type, ignoring ASCII case and any `;` parameters.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        let format = match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" => UploadFormat::Jpeg,
            "image/png" => UploadFormat::Png,
            "image/gif" => UploadFormat::Gif,
            "image/webp" => UploadFormat::Webp,
            "image/bmp" => UploadFormat::Bmp,
            "image/tiff" => UploadFormat::Tiff,
            "image/svg+xml" => UploadFormat::Svg,
            _ => return None,
        };
        Some(format)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            UploadFormat::Jpeg => "image/jpeg",
            UploadFormat::Png => "image/png",
            UploadFormat::Gif => "image/gif",
            UploadFormat::Webp => "image/webp",
            UploadFormat::Bmp => "image/bmp",
            UploadFormat::Tiff => "image/tiff",
            UploadFormat::Svg => "image/svg+xml",
        }
    }
}

/// A file handed to the pipeline by the user.
///
/// Bytes are shared so the pipeline can keep them in its `Uploaded` state
/// while a removal request is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl Upload {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn format(&self) -> Option<UploadFormat> {
        UploadFormat::from_mime(&self.mime_type)
    }
}

/// Failure reported by the background-removal service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemovalError {
    /// The service can't read the input image.
    #[error("Input not supported by the background-removal service: {0}")]
    UnsupportedInput(String),

    /// Inference itself failed.
    #[error("Background-removal model failed: {0}")]
    ModelFailure(String),
}

/// Output of the background-removal service.
///
/// Services either hand back pixels directly or an encoded image (PNG in
/// practice) that still has to be decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Matte {
    Raster(RasterImage),
    Encoded(Vec<u8>),
}

impl Matte {
    /// Materialize the matte as an RGBA raster.
    pub fn into_raster(self) -> Result<RasterImage, DecodeError> {
        match self {
            Matte::Raster(raster) => Ok(raster),
            Matte::Encoded(bytes) => decode_raster(&bytes),
        }
    }
}

/// Background-removal service.
///
/// Implementations receive the original upload bytes and return the subject
/// on a transparent background.
pub trait BackgroundRemover {
    fn remove_background(
        &self,
        image: &[u8],
        quality: RemovalQuality,
    ) -> impl Future<Output = Result<Matte, RemovalError>>;
}

/// Interactive crop widget.
///
/// All rectangles are in the widget's display units.
pub trait CropWidget {
    fn crop_rect(&self) -> DisplayRect;
    fn set_crop_rect(&mut self, rect: DisplayRect);
    fn natural_metrics(&self) -> NaturalMetrics;
    fn display_metrics(&self) -> DisplayMetrics;
}
