//! Auto-crop planning from segmentation statistics.
//!
//! # Algorithm
//!
//! The silhouette of a head-and-shoulders subject is narrow at the head and
//! widens sharply where the shoulders begin. The planner:
//!
//! 1. Computes the fractional width change between consecutive valid rows
//! 2. Takes the row with the largest positive change (first on ties) as the
//!    head/shoulder transition `head_end_y`
//! 3. Bounds the shoulders to `shoulder_extent * subject_height` below it
//! 4. Adds a head-top margin and a shoulder-bottom margin
//! 5. Derives the width from the aspect ratio and centers it on the mean of
//!    the row centers
//! 6. Caps the rectangle to the image, then shifts it inside
//!
//! Everything here is pure and deterministic.

use serde::{Deserialize, Serialize};

use super::CropRect;
use crate::config::FramingConfig;
use crate::segment::SegmentationResult;
use crate::AspectRatio;

/// Full output of the planner, including intermediate geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropPlan {
    /// Row where the shoulders begin (`top_y` when no widening was found).
    pub head_end_y: f64,
    /// Lowest row considered part of the shoulders.
    pub shoulder_end_y: f64,
    /// Horizontal center of the subject.
    pub center_x: f64,
    pub head_top_buffer: f64,
    pub shoulder_bottom_buffer: f64,
    /// Largest fractional width change, 0.0 when none was positive.
    pub max_width_change: f64,
    /// Final crop rectangle in natural pixels.
    pub rect: CropRect,
}

/// Plan a crop rectangle for `aspect_ratio`.
pub fn plan_crop(
    seg: &SegmentationResult,
    aspect_ratio: AspectRatio,
    framing: &FramingConfig,
) -> CropRect {
    plan_framing(seg, aspect_ratio, framing).rect
}

/// Like [`plan_crop`], but also returns the intermediate geometry.
pub fn plan_framing(
    seg: &SegmentationResult,
    aspect_ratio: AspectRatio,
    framing: &FramingConfig,
) -> CropPlan {
    let bbox = seg.bbox;
    let top_y = bbox.top_y as f64;
    let bottom_y = bbox.bottom_y as f64;
    let person_height = bottom_y - top_y;

    let transition = find_shoulder_transition(seg);
    let (head_end_y, shoulder_end_y, max_width_change) = match transition {
        Some((y, change)) => {
            let head_end = y as f64;
            let shoulder_end = bottom_y.min(head_end + framing.shoulder_extent * person_height);
            (head_end, shoulder_end, change)
        }
        None => (top_y, bottom_y, 0.0),
    };

    // Every valid row weighs the same regardless of how wide it is
    let center_x = if seg.rows.is_empty() {
        (bbox.left_x as f64 + bbox.right_x as f64) / 2.0
    } else {
        seg.rows.iter().map(|r| r.center_x).sum::<f64>() / seg.rows.len() as f64
    };

    let head_top_buffer = framing.head_top_margin * person_height;
    let shoulder_bottom_buffer = framing.shoulder_bottom_margin * person_height;

    let ratio = aspect_ratio.value();
    let recommended_height =
        ((shoulder_end_y - head_end_y) + head_top_buffer + shoulder_bottom_buffer).max(1.0);
    let (width, height) = cap_to_image(
        recommended_height * ratio,
        recommended_height,
        ratio,
        seg.image_width as f64,
        seg.image_height as f64,
    );

    let left = center_x - width / 2.0;
    let top = top_y.max(head_end_y - head_top_buffer);

    let img_w = seg.image_width as f64;
    let img_h = seg.image_height as f64;
    let rect = CropRect {
        left: left.min(img_w - width).max(0.0),
        top: top.min(img_h - height).max(0.0),
        width,
        height,
    };

    tracing::debug!(
        head_end_y,
        shoulder_end_y,
        center_x,
        head_top_buffer,
        max_width_change,
        crop_left = rect.left,
        crop_top = rect.top,
        crop_width = rect.width,
        crop_height = rect.height,
        "planned crop"
    );

    CropPlan {
        head_end_y,
        shoulder_end_y,
        center_x,
        head_top_buffer,
        shoulder_bottom_buffer,
        max_width_change,
        rect,
    }
}

/// Row index and size of the sharpest widening between consecutive valid rows.
///
/// Pairs whose upper row has zero width are skipped. Returns `None` when no
/// change is positive.
fn find_shoulder_transition(seg: &SegmentationResult) -> Option<(u32, f64)> {
    let mut best: Option<(u32, f64)> = None;

    for pair in seg.rows.windows(2) {
        let prev = pair[0].width();
        if prev == 0 {
            continue;
        }
        let change = (pair[1].width() as f64 - prev as f64) / prev as f64;
        let best_change = best.map_or(0.0, |(_, c)| c);
        if change > best_change {
            best = Some((pair[1].y, change));
        }
    }

    best
}

/// Shrink `(width, height)` uniformly so it fits the image, keeping `ratio`.
fn cap_to_image(width: f64, height: f64, ratio: f64, img_w: f64, img_h: f64) -> (f64, f64) {
    let (mut w, mut h) = (width, height);
    if w > img_w {
        w = img_w;
        h = w / ratio;
    }
    if h > img_h {
        h = img_h;
        w = h * ratio;
    }
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentationConfig;
    use crate::decode::RasterImage;
    use crate::segment::{segment, BoundingBox, RowStat};

    /// Silhouette with one width for the head and another for the shoulders,
    /// each centered on `center`.
    fn silhouette(
        img_w: u32,
        img_h: u32,
        bands: &[(u32, u32, u32)], // (y0, y1 exclusive, width)
        center: u32,
    ) -> RasterImage {
        let mut pixels = vec![0u8; (img_w * img_h * 4) as usize];
        for &(y0, y1, w) in bands {
            let x0 = center - w / 2;
            for y in y0..y1 {
                for x in x0..x0 + w {
                    pixels[((y * img_w + x) * 4 + 3) as usize] = 255;
                }
            }
        }
        RasterImage::new(img_w, img_h, pixels).unwrap()
    }

    fn plan_for(img: &RasterImage, ratio: AspectRatio) -> CropPlan {
        let seg = segment(img, &SegmentationConfig::default()).unwrap();
        plan_framing(&seg, ratio, &FramingConfig::default())
    }

    #[test]
    fn test_reference_scenario() {
        // 100x200, head 40px wide on rows 50..80, shoulders 90px on rows 80..150
        let img = silhouette(100, 200, &[(50, 80, 40), (80, 150, 90)], 50);
        let plan = plan_for(&img, AspectRatio::from_proportions(3, 4).unwrap());

        assert!((plan.head_end_y - 80.0).abs() < 1e-9);
        // min(149, 80 + 0.3 * 99)
        assert!((plan.shoulder_end_y - 109.7).abs() < 1e-9);
        // Both bands span x = 30..70 and 5..95, mean 49.5
        assert!((plan.center_x - 49.5).abs() < 1e-9);

        // 29.7 + 14.85 + 19.8
        let rect = plan.rect;
        assert!((rect.height - 64.35).abs() < 1e-9);
        assert!((rect.width - 64.35 * 0.75).abs() < 1e-9);
        assert!((rect.left - (49.5 - rect.width / 2.0)).abs() < 1e-9);
        // max(50, 80 - 14.85)
        assert!((rect.top - 65.15).abs() < 1e-9);
        assert!(rect.fits_within(100, 200, 1e-9));
    }

    #[test]
    fn test_head_end_is_first_shoulder_row() {
        for h in [5u32, 17, 33] {
            let img = silhouette(120, 120, &[(10, 10 + h, 30), (10 + h, 100, 80)], 60);
            let plan = plan_for(&img, AspectRatio::default());
            assert!(
                (plan.head_end_y - (10 + h) as f64).abs() < 1e-9,
                "expected head end at {}, got {}",
                10 + h,
                plan.head_end_y
            );
        }
    }

    #[test]
    fn test_noise_rows_above_head_do_not_shift_transition() {
        let mut img = silhouette(100, 100, &[(20, 40, 30), (40, 90, 70)], 50);
        // Stray speck well above the subject moves top_y but not the transition row
        let mut pixels = img.clone().into_pixels();
        pixels[((5 * 100 + 50) * 4 + 3) as usize] = 255;
        img = RasterImage::new(100, 100, pixels).unwrap();

        let plan = plan_for(&img, AspectRatio::default());
        assert!((plan.head_end_y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_take_first_occurrence() {
        let rows = [(0, 20), (1, 40), (2, 40), (3, 80)]
            .iter()
            .map(|&(y, w)| RowStat {
                y,
                left_x: 0,
                right_x: w,
                center_x: w as f64 / 2.0,
                opaque_count: w + 1,
            })
            .collect();
        let seg = SegmentationResult {
            image_width: 100,
            image_height: 100,
            bbox: BoundingBox {
                top_y: 0,
                bottom_y: 3,
                left_x: 0,
                right_x: 80,
            },
            rows,
        };

        // 20 -> 40 and 40 -> 80 are both +100%
        assert_eq!(find_shoulder_transition(&seg), Some((1, 1.0)));
    }

    #[test]
    fn test_no_widening_treats_subject_as_head() {
        // Constant-width column
        let img = silhouette(100, 100, &[(20, 80, 30)], 50);
        let plan = plan_for(&img, AspectRatio::default());

        assert!((plan.head_end_y - 20.0).abs() < 1e-9);
        assert!((plan.shoulder_end_y - 79.0).abs() < 1e-9);
        assert!((plan.max_width_change - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_narrowing_only_is_not_a_transition() {
        let img = silhouette(100, 100, &[(20, 50, 60), (50, 80, 30)], 50);
        let plan = plan_for(&img, AspectRatio::default());
        assert!((plan.head_end_y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_rows_are_skipped() {
        let rows = [(0, 0), (1, 10), (2, 30)]
            .iter()
            .map(|&(y, w)| RowStat {
                y,
                left_x: 5,
                right_x: 5 + w,
                center_x: 5.0 + w as f64 / 2.0,
                opaque_count: 20,
            })
            .collect();
        let seg = SegmentationResult {
            image_width: 50,
            image_height: 50,
            bbox: BoundingBox {
                top_y: 0,
                bottom_y: 2,
                left_x: 5,
                right_x: 35,
            },
            rows,
        };

        // 0 -> 10 is skipped; 10 -> 30 is +200%
        assert_eq!(find_shoulder_transition(&seg), Some((2, 2.0)));
    }

    #[test]
    fn test_no_valid_rows_centers_on_bbox() {
        let seg = SegmentationResult {
            image_width: 100,
            image_height: 100,
            bbox: BoundingBox {
                top_y: 10,
                bottom_y: 60,
                left_x: 20,
                right_x: 40,
            },
            rows: Vec::new(),
        };
        let plan = plan_framing(&seg, AspectRatio::default(), &FramingConfig::default());
        assert!((plan.center_x - 30.0).abs() < 1e-9);
        assert!(plan.rect.is_well_formed());
    }

    #[test]
    fn test_clamping_shifts_without_resizing() {
        // Subject hugging the right edge: the centered crop would overhang
        let img = silhouette(100, 200, &[(50, 80, 20), (80, 150, 40)], 78);
        let ratio = AspectRatio::from_proportions(3, 4).unwrap();
        let plan = plan_for(&img, ratio);

        let unclamped_left = plan.center_x - plan.rect.width / 2.0;
        assert!(unclamped_left + plan.rect.width > 100.0);
        assert!((plan.rect.right() - 100.0).abs() < 1e-9);
        assert!((plan.rect.aspect_ratio() - ratio.value()).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_recommendation_is_capped() {
        // No widening and the subject spans the full height: the margins alone
        // push the recommended height past the image
        let img = silhouette(400, 100, &[(0, 100, 30)], 200);
        let ratio = AspectRatio::from_proportions(3, 4).unwrap();
        let plan = plan_for(&img, ratio);

        assert!((plan.rect.height - 100.0).abs() < 1e-9);
        assert!((plan.rect.width - 75.0).abs() < 1e-9);
        assert!(plan.rect.fits_within(400, 100, 1e-9));
    }

    #[test]
    fn test_wide_ratio_capped_by_width() {
        let img = silhouette(40, 200, &[(10, 60, 24), (60, 190, 36)], 20);
        let ratio = AspectRatio::from_proportions(9, 7).unwrap();
        let plan = plan_for(&img, ratio);

        assert!(plan.rect.width <= 40.0 + 1e-9);
        assert!(plan.rect.fits_within(40, 200, 1e-9));
        assert!((plan.rect.aspect_ratio() - ratio.value()).abs() < 1e-9);
    }

    #[test]
    fn test_single_row_subject_has_positive_size() {
        let img = silhouette(50, 50, &[(25, 26, 30)], 25);
        let rect = plan_crop(
            &segment(&img, &SegmentationConfig::default()).unwrap(),
            AspectRatio::default(),
            &FramingConfig::default(),
        );
        assert!(rect.is_well_formed());
        assert!(rect.fits_within(50, 50, 1e-9));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
