//! Pipeline error taxonomy.

use thiserror::Error;

use super::collaborators::{RemovalError, SUPPORTED_MIME_TYPES};
use crate::composite::CompositeError;
use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::segment::SegmentError;

/// Every way a pipeline operation can fail.
///
/// No failure is fatal: the controller falls back to `Empty` or to the last
/// stage that was fully applied, and stays usable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// The upload's MIME type is not an accepted image format.
    #[error("Unsupported file type: {mime_type}")]
    UnsupportedFormat { mime_type: String },

    /// The matte contains no opaque pixel.
    #[error("No subject found: the matte contains no opaque pixels")]
    EmptySubject,

    /// The background-removal service failed.
    #[error("Background removal failed: {0}")]
    SegmentationFailure(#[from] RemovalError),

    /// The matte couldn't be turned into a raster.
    #[error("Failed to decode matte: {0}")]
    DecodeFailure(#[from] DecodeError),

    /// The compositing surface couldn't be provisioned.
    #[error("Compositing failed: {0}")]
    CompositingFailure(#[from] CompositeError),

    /// The composited photo couldn't be encoded for download.
    #[error("Export failed: {0}")]
    DownloadFailure(#[from] EncodeError),

    /// The operation isn't valid in the current pipeline state.
    #[error("Cannot {operation} while the pipeline is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// The crop widget reported unusable natural or display metrics.
    #[error("Crop widget reported invalid metrics")]
    InvalidWidgetMetrics,

    /// The crop widget reported a rectangle with no area or non-finite fields.
    #[error("Crop widget reported an invalid crop rectangle")]
    InvalidCropRect,
}

impl From<SegmentError> for PipelineError {
    fn from(err: SegmentError) -> Self {
        match err {
            SegmentError::EmptySubject => PipelineError::EmptySubject,
        }
    }
}

impl PipelineError {
    /// Short message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::UnsupportedFormat { .. } => format!(
                "Unsupported file type. Supported formats: {}",
                SUPPORTED_MIME_TYPES.join(", ")
            ),
            PipelineError::EmptySubject => {
                "No person was found in the photo. Please try another image.".to_string()
            }
            PipelineError::SegmentationFailure(_) => "Background removal failed.".to_string(),
            PipelineError::DecodeFailure(_) => "Image loading failed.".to_string(),
            PipelineError::CompositingFailure(_) => "Background change error.".to_string(),
            PipelineError::DownloadFailure(_) => "Download failed, please try again".to_string(),
            PipelineError::InvalidState { .. } | PipelineError::InvalidWidgetMetrics => {
                "Cropper or image not ready".to_string()
            }
            PipelineError::InvalidCropRect => "Error updating preview.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message_lists_formats() {
        let err = PipelineError::UnsupportedFormat {
            mime_type: "application/pdf".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.starts_with("Unsupported file type."));
        assert!(msg.contains("image/jpeg"));
        assert!(msg.contains("image/svg+xml"));
        assert_eq!(err.to_string(), "Unsupported file type: application/pdf");
    }

    #[test]
    fn test_segment_error_conversion() {
        let err: PipelineError = SegmentError::EmptySubject.into();
        assert_eq!(err, PipelineError::EmptySubject);
    }

    #[test]
    fn test_removal_error_conversion() {
        let err: PipelineError = RemovalError::ModelFailure("oom".to_string()).into();
        assert!(matches!(err, PipelineError::SegmentationFailure(_)));
        assert_eq!(err.user_message(), "Background removal failed.");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = PipelineError::InvalidState {
            operation: "composite",
            state: "empty",
        };
        assert_eq!(err.to_string(), "Cannot composite while the pipeline is empty");
    }
}
