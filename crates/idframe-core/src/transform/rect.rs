//! Crop rectangles in natural and display coordinate spaces.
//!
//! Natural coordinates are pixels of the source raster. Display coordinates
//! are whatever the on-screen crop widget uses. The two are kept as distinct
//! types so a rectangle can't silently cross spaces without going through
//! [`super::scale`].

use serde::{Deserialize, Serialize};

/// Crop rectangle in natural pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Crop rectangle in the crop widget's display units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer pixel window of a crop rectangle, after rounding.
///
/// `left`/`top` may be negative or beyond the image when the rectangle
/// is; callers decide how to treat pixels outside the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// True when every field is finite and both sides are positive.
    pub fn is_well_formed(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// True when the rectangle lies inside a `width`×`height` image,
    /// allowing `tolerance` pixels of floating error.
    pub fn fits_within(&self, width: u32, height: u32, tolerance: f64) -> bool {
        self.left >= -tolerance
            && self.top >= -tolerance
            && self.right() <= width as f64 + tolerance
            && self.bottom() <= height as f64 + tolerance
    }

    /// Fit the rectangle inside a `width`×`height` image.
    ///
    /// Sides longer than the image are shortened to it, then the rectangle is
    /// shifted (never resized further) so it lies fully inside. Used for
    /// rectangles coming back from the crop widget, which may overshoot by
    /// rounding.
    pub fn fitted_to(&self, width: u32, height: u32) -> Self {
        let img_w = width as f64;
        let img_h = height as f64;
        let w = self.width.min(img_w);
        let h = self.height.min(img_h);
        Self {
            left: self.left.min(img_w - w).max(0.0),
            top: self.top.min(img_h - h).max(0.0),
            width: w,
            height: h,
        }
    }

    /// Round to whole pixels. Output sides are at least one pixel.
    pub fn pixel_bounds(&self) -> PixelBounds {
        PixelBounds {
            left: self.left.round() as i64,
            top: self.top.round() as i64,
            width: (self.width.round() as u32).max(1),
            height: (self.height.round() as u32).max(1),
        }
    }
}

impl PixelBounds {
    /// Output columns `[start, end)` that overlap a source `source_width` wide.
    ///
    /// Empty (`start >= end`) when the window misses the source entirely.
    pub fn source_columns(&self, source_width: i64) -> (i64, i64) {
        let out_w = self.width as i64;
        let start = self.left.saturating_neg().clamp(0, out_w);
        let end = source_width.saturating_sub(self.left).clamp(0, out_w);
        (start, end)
    }
}

impl DisplayRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let rect = CropRect::new(10.0, 20.0, 30.0, 40.0);
        assert!((rect.right() - 40.0).abs() < f64::EPSILON);
        assert!((rect.bottom() - 60.0).abs() < f64::EPSILON);
        assert!((rect.aspect_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_well_formed() {
        assert!(CropRect::new(0.0, 0.0, 1.0, 1.0).is_well_formed());
        assert!(!CropRect::new(0.0, 0.0, 0.0, 1.0).is_well_formed());
        assert!(!CropRect::new(f64::NAN, 0.0, 1.0, 1.0).is_well_formed());
        assert!(!CropRect::new(0.0, 0.0, 1.0, -2.0).is_well_formed());
    }

    #[test]
    fn test_fits_within() {
        let rect = CropRect::new(10.0, 10.0, 80.0, 80.0);
        assert!(rect.fits_within(90, 90, 0.0));
        assert!(!rect.fits_within(89, 90, 0.0));
        assert!(rect.fits_within(89, 90, 1.0));
    }

    #[test]
    fn test_fitted_to_shifts_overhanging_rect() {
        let rect = CropRect::new(-5.0, 95.0, 50.0, 20.0);
        let fitted = rect.fitted_to(100, 100);
        assert_eq!(fitted, CropRect::new(0.0, 80.0, 50.0, 20.0));
    }

    #[test]
    fn test_fitted_to_shrinks_oversized_rect() {
        let rect = CropRect::new(3.0, 3.0, 150.0, 40.0);
        let fitted = rect.fitted_to(100, 100);
        assert_eq!(fitted, CropRect::new(0.0, 3.0, 100.0, 40.0));
    }

    #[test]
    fn test_pixel_bounds_rounding() {
        let bounds = CropRect::new(25.37, 65.15, 48.26, 64.35).pixel_bounds();
        assert_eq!(
            bounds,
            PixelBounds {
                left: 25,
                top: 65,
                width: 48,
                height: 64
            }
        );
    }

    #[test]
    fn test_source_columns() {
        let inside = CropRect::new(2.0, 0.0, 4.0, 1.0).pixel_bounds();
        assert_eq!(inside.source_columns(10), (0, 4));

        let overhang = CropRect::new(-3.0, 0.0, 6.0, 1.0).pixel_bounds();
        assert_eq!(overhang.source_columns(2), (3, 5));

        let far_left = CropRect::new(-1e19, 0.0, 6.0, 1.0).pixel_bounds();
        assert_eq!(far_left.left, i64::MIN);
        let (start, end) = far_left.source_columns(10);
        assert!(start >= end);

        let far_right = CropRect::new(1e19, 0.0, 6.0, 1.0).pixel_bounds();
        let (start, end) = far_right.source_columns(10);
        assert!(start >= end);
    }

    #[test]
    fn test_pixel_bounds_minimum_size() {
        let bounds = CropRect::new(0.0, 0.0, 0.2, 0.3).pixel_bounds();
        assert_eq!(bounds.width, 1);
        assert_eq!(bounds.height, 1);
    }
}
