//! Tunable constants for segmentation, framing and the pipeline.
//!
//! Defaults reproduce common passport-photo framing: the head is not flush
//! with the top edge and the chest is not flush with the bottom edge.

use serde::{Deserialize, Serialize};

use crate::composite::DEFAULT_MAX_SURFACE_SIDE;

/// Parameters for [`crate::segment::segment`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// A pixel is opaque when its alpha is strictly greater than this.
    /// Rejects antialiasing fringe left by matting.
    pub alpha_threshold: u8,
    /// Rows with fewer opaque pixels than this are left out of row statistics.
    pub min_row_pixels: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: 10,
            min_row_pixels: 20,
        }
    }
}

/// Parameters for [`crate::transform::plan_crop`].
///
/// All values are fractions of the subject height (top to bottom of the
/// opaque bounding box).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// How far below the head/shoulder transition the shoulders may extend.
    pub shoulder_extent: f64,
    /// Margin kept above the head.
    pub head_top_margin: f64,
    /// Margin kept below the shoulders.
    pub shoulder_bottom_margin: f64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            shoulder_extent: 0.3,
            head_top_margin: 0.15,
            shoulder_bottom_margin: 0.2,
        }
    }
}

/// Model size requested from the background-removal service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalQuality {
    Small,
    #[default]
    Medium,
    Large,
}

/// Configuration for a [`crate::pipeline::PipelineController`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub segmentation: SegmentationConfig,
    pub framing: FramingConfig,
    pub quality: RemovalQuality,
    /// Largest width or height the compositing surface may take.
    pub max_surface_side: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationConfig::default(),
            framing: FramingConfig::default(),
            quality: RemovalQuality::default(),
            max_surface_side: DEFAULT_MAX_SURFACE_SIDE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.segmentation.alpha_threshold, 10);
        assert_eq!(config.segmentation.min_row_pixels, 20);
        assert!((config.framing.shoulder_extent - 0.3).abs() < f64::EPSILON);
        assert!((config.framing.head_top_margin - 0.15).abs() < f64::EPSILON);
        assert!((config.framing.shoulder_bottom_margin - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.quality, RemovalQuality::Medium);
    }

    #[test]
    fn test_field_reassignment() {
        let mut config = SegmentationConfig::default();
        config.min_row_pixels = 1;
        assert_eq!(config.alpha_threshold, 10);
        assert_eq!(config.min_row_pixels, 1);
    }
}
