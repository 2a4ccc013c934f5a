//! Pipeline stages and the tokens that tie async results to them.

use serde::{Deserialize, Serialize};

use super::collaborators::Upload;
use crate::decode::RasterImage;
use crate::segment::SegmentationResult;
use crate::transform::CropRect;
use crate::BackgroundColor;

/// Identifies one upload. Issued in strictly increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub(crate) u64);

impl Version {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Identifies one auto-crop session of one upload.
///
/// The epoch increases every time the crop is re-planned (new segmentation
/// or aspect-ratio change), so a widget created for an older plan can't
/// apply it after a newer one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropTicket {
    pub version: Version,
    pub epoch: u64,
}

/// Whether an async result was applied or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery<T> {
    Applied(T),
    Discarded,
}

impl<T> Delivery<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Delivery::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Delivery::Applied(value) => Some(value),
            Delivery::Discarded => None,
        }
    }
}

/// Where the pipeline currently stands.
///
/// Each stage carries everything needed to regenerate the ones after it.
#[derive(Debug, Clone, Default)]
pub enum PipelineState {
    #[default]
    Empty,
    /// Waiting on the background-removal service.
    Uploaded { version: Version, upload: Upload },
    Segmented {
        version: Version,
        raster: RasterImage,
        segmentation: SegmentationResult,
    },
    Cropped {
        version: Version,
        raster: RasterImage,
        segmentation: SegmentationResult,
        crop: CropRect,
    },
    Composited {
        version: Version,
        raster: RasterImage,
        segmentation: SegmentationResult,
        crop: CropRect,
        background: BackgroundColor,
        output: RasterImage,
    },
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Empty => "empty",
            PipelineState::Uploaded { .. } => "uploaded",
            PipelineState::Segmented { .. } => "segmented",
            PipelineState::Cropped { .. } => "cropped",
            PipelineState::Composited { .. } => "composited",
        }
    }

    pub fn version(&self) -> Option<Version> {
        match self {
            PipelineState::Empty => None,
            PipelineState::Uploaded { version, .. }
            | PipelineState::Segmented { version, .. }
            | PipelineState::Cropped { version, .. }
            | PipelineState::Composited { version, .. } => Some(*version),
        }
    }

    /// The matted raster, once segmentation has succeeded.
    pub fn raster(&self) -> Option<&RasterImage> {
        match self {
            PipelineState::Segmented { raster, .. }
            | PipelineState::Cropped { raster, .. }
            | PipelineState::Composited { raster, .. } => Some(raster),
            _ => None,
        }
    }

    pub fn segmentation(&self) -> Option<&SegmentationResult> {
        match self {
            PipelineState::Segmented { segmentation, .. }
            | PipelineState::Cropped { segmentation, .. }
            | PipelineState::Composited { segmentation, .. } => Some(segmentation),
            _ => None,
        }
    }

    pub fn crop(&self) -> Option<CropRect> {
        match self {
            PipelineState::Cropped { crop, .. } | PipelineState::Composited { crop, .. } => {
                Some(*crop)
            }
            _ => None,
        }
    }

    pub fn background(&self) -> Option<BackgroundColor> {
        match self {
            PipelineState::Composited { background, .. } => Some(*background),
            _ => None,
        }
    }

    /// The flattened export raster.
    pub fn output(&self) -> Option<&RasterImage> {
        match self {
            PipelineState::Composited { output, .. } => Some(output),
            _ => None,
        }
    }
}
