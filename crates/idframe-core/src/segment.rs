//! Alpha-channel segmentation of a matted subject.
//!
//! The background-removal service leaves the subject opaque and everything
//! else transparent. This module reduces that matte to a global bounding box
//! and per-row width statistics, which is all the crop planner needs.
//!
//! # Noise filtering
//!
//! Two thresholds keep matting artifacts out of the statistics:
//! - a pixel only counts as opaque when `alpha > alpha_threshold`
//!   (antialiasing fringe sits just above zero)
//! - a row only contributes a [`RowStat`] when it holds at least
//!   `min_row_pixels` opaque pixels (stray specks would otherwise
//!   corrupt the width profile)
//!
//! Filtered rows still contribute to the bounding box.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SegmentationConfig;
use crate::decode::RasterImage;

/// Segmentation failed because no pixel exceeded the alpha threshold.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("No subject found: the matte contains no opaque pixels")]
    EmptySubject,
}

/// Statistics for one row with enough opaque pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowStat {
    /// Row index in the source raster.
    pub y: u32,
    /// Leftmost opaque x.
    pub left_x: u32,
    /// Rightmost opaque x.
    pub right_x: u32,
    /// Mean x of the opaque pixels.
    pub center_x: f64,
    pub opaque_count: u32,
}

impl RowStat {
    /// Horizontal extent, `right_x - left_x`.
    #[inline]
    pub fn width(&self) -> u32 {
        self.right_x - self.left_x
    }
}

/// Inclusive bounding box of every opaque pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_y: u32,
    pub bottom_y: u32,
    pub left_x: u32,
    pub right_x: u32,
}

impl BoundingBox {
    /// Vertical extent, `bottom_y - top_y`.
    pub fn height(&self) -> u32 {
        self.bottom_y - self.top_y
    }

    pub fn width(&self) -> u32 {
        self.right_x - self.left_x
    }
}

/// Output of [`segment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub image_width: u32,
    pub image_height: u32,
    pub bbox: BoundingBox,
    /// Valid rows only, top to bottom.
    pub rows: Vec<RowStat>,
}

/// Scan a raster's alpha channel in one pass.
///
/// # Errors
///
/// Returns [`SegmentError::EmptySubject`] if no pixel is opaque.
pub fn segment(
    raster: &RasterImage,
    config: &SegmentationConfig,
) -> Result<SegmentationResult, SegmentError> {
    let width = raster.width();
    let height = raster.height();
    let row_stride = width as usize * RasterImage::CHANNELS;

    let mut bbox: Option<BoundingBox> = None;
    let mut rows = Vec::new();

    for (y, row) in raster.pixels().chunks_exact(row_stride).enumerate() {
        let y = y as u32;
        let mut row_left = u32::MAX;
        let mut row_right = 0u32;
        let mut sum_x = 0u64;
        let mut count = 0u32;

        for (x, px) in row.chunks_exact(RasterImage::CHANNELS).enumerate() {
            if px[3] <= config.alpha_threshold {
                continue;
            }
            let x = x as u32;
            row_left = row_left.min(x);
            row_right = row_right.max(x);
            sum_x += x as u64;
            count += 1;
        }

        if count == 0 {
            continue;
        }

        bbox = Some(match bbox {
            None => BoundingBox {
                top_y: y,
                bottom_y: y,
                left_x: row_left,
                right_x: row_right,
            },
            Some(b) => BoundingBox {
                top_y: b.top_y,
                bottom_y: y,
                left_x: b.left_x.min(row_left),
                right_x: b.right_x.max(row_right),
            },
        });

        if count >= config.min_row_pixels {
            rows.push(RowStat {
                y,
                left_x: row_left,
                right_x: row_right,
                center_x: sum_x as f64 / count as f64,
                opaque_count: count,
            });
        }
    }

    let bbox = bbox.ok_or(SegmentError::EmptySubject)?;

    tracing::debug!(
        width,
        height,
        top_y = bbox.top_y,
        bottom_y = bbox.bottom_y,
        left_x = bbox.left_x,
        right_x = bbox.right_x,
        valid_rows = rows.len(),
        "segmented subject"
    );

    Ok(SegmentationResult {
        image_width: width,
        image_height: height,
        bbox,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transparent canvas helper: paint opaque spans with `set`.
    struct Canvas {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    }

    impl Canvas {
        fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0u8; (width * height * 4) as usize],
            }
        }

        fn set(&mut self, x: u32, y: u32, alpha: u8) {
            let idx = ((y * self.width + x) * 4) as usize;
            self.pixels[idx..idx + 4].copy_from_slice(&[255, 255, 255, alpha]);
        }

        fn fill(&mut self, x0: u32, x1: u32, y0: u32, y1: u32, alpha: u8) {
            for y in y0..y1 {
                for x in x0..x1 {
                    self.set(x, y, alpha);
                }
            }
        }

        fn build(self) -> RasterImage {
            RasterImage::new(self.width, self.height, self.pixels).unwrap()
        }
    }

    #[test]
    fn test_solid_rectangle_bbox() {
        let mut canvas = Canvas::new(60, 40);
        canvas.fill(10, 50, 5, 30, 255);

        let seg = segment(&canvas.build(), &SegmentationConfig::default()).unwrap();
        assert_eq!(
            seg.bbox,
            BoundingBox {
                top_y: 5,
                bottom_y: 29,
                left_x: 10,
                right_x: 49
            }
        );
        assert_eq!(seg.rows.len(), 25);
        assert_eq!(seg.image_width, 60);
        assert_eq!(seg.image_height, 40);

        let first = seg.rows[0];
        assert_eq!(first.y, 5);
        assert_eq!(first.left_x, 10);
        assert_eq!(first.right_x, 49);
        assert_eq!(first.opaque_count, 40);
        assert!((first.center_x - 29.5).abs() < 1e-9);
    }

    #[test]
    fn test_noise_rows_excluded_from_row_stats() {
        let mut canvas = Canvas::new(60, 40);
        canvas.fill(10, 50, 10, 20, 255);
        // Single-pixel specks above and below the subject
        canvas.set(3, 2, 255);
        canvas.set(55, 35, 255);

        let seg = segment(&canvas.build(), &SegmentationConfig::default()).unwrap();

        // Specks still widen the bounding box
        assert_eq!(seg.bbox.top_y, 2);
        assert_eq!(seg.bbox.bottom_y, 35);
        assert_eq!(seg.bbox.left_x, 3);
        assert_eq!(seg.bbox.right_x, 55);

        // ...but never appear in row statistics
        assert_eq!(seg.rows.len(), 10);
        assert!(seg.rows.iter().all(|r| (10..20).contains(&r.y)));
    }

    #[test]
    fn test_row_at_exact_min_pixel_threshold_is_valid() {
        let mut canvas = Canvas::new(40, 3);
        canvas.fill(0, 20, 0, 1, 255); // exactly 20 pixels
        canvas.fill(0, 19, 2, 3, 255); // one short

        let seg = segment(&canvas.build(), &SegmentationConfig::default()).unwrap();
        assert_eq!(seg.rows.len(), 1);
        assert_eq!(seg.rows[0].y, 0);
    }

    #[test]
    fn test_alpha_threshold_is_exclusive() {
        let mut canvas = Canvas::new(30, 2);
        canvas.fill(0, 30, 0, 1, 10); // at threshold: transparent
        canvas.fill(0, 30, 1, 2, 11); // just above: opaque

        let seg = segment(&canvas.build(), &SegmentationConfig::default()).unwrap();
        assert_eq!(seg.bbox.top_y, 1);
        assert_eq!(seg.bbox.bottom_y, 1);
    }

    #[test]
    fn test_empty_matte_fails() {
        let mut canvas = Canvas::new(20, 20);
        canvas.fill(0, 20, 0, 20, 5); // faint fringe only

        let result = segment(&canvas.build(), &SegmentationConfig::default());
        assert_eq!(result, Err(SegmentError::EmptySubject));
    }

    #[test]
    fn test_center_uses_opaque_pixels_only() {
        let mut canvas = Canvas::new(100, 1);
        canvas.fill(0, 10, 0, 1, 255);
        canvas.fill(90, 100, 0, 1, 255);

        let mut config = SegmentationConfig::default();
        config.min_row_pixels = 1;
        let seg = segment(&canvas.build(), &config).unwrap();

        let row = seg.rows[0];
        assert_eq!(row.left_x, 0);
        assert_eq!(row.right_x, 99);
        assert_eq!(row.opaque_count, 20);
        assert!((row.center_x - 49.5).abs() < 1e-9);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
