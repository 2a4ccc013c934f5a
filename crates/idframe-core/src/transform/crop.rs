//! Crop extraction in natural pixel coordinates.
//!
//! Produces the transparent cut-out preview of the current crop, before
//! any background is applied. The rectangle is rounded to whole pixels with
//! [`CropRect::pixel_bounds`], the same rounding the compositor uses, so the
//! preview and the final export always cover identical pixels.
//!
//! # Example
//!
//! ```ignore
//! let preview = extract_crop(&raster, &CropRect::new(25.0, 65.0, 48.0, 64.0))?;
//! assert_eq!(preview.width(), 48);
//! ```

use super::CropRect;
use crate::composite::{surface_bounds, surface_len, CompositeError, DEFAULT_MAX_SURFACE_SIDE};
use crate::decode::RasterImage;

/// Copy the region under `rect` into a new raster.
///
/// Pixels of the rectangle that fall outside the source stay fully
/// transparent. The output is never smaller than 1x1. Rectangles that are
/// not well formed, or whose sides exceed [`DEFAULT_MAX_SURFACE_SIDE`], are
/// rejected before anything is allocated.
pub fn extract_crop(image: &RasterImage, rect: &CropRect) -> Result<RasterImage, CompositeError> {
    let bounds = surface_bounds(rect, DEFAULT_MAX_SURFACE_SIDE)?;
    let out_width = bounds.width;
    let out_height = bounds.height;
    const CH: usize = RasterImage::CHANNELS;

    let len = surface_len(&bounds)?;
    let mut output = Vec::new();
    output
        .try_reserve_exact(len)
        .map_err(|_| CompositeError::AllocationFailed {
            width: out_width,
            height: out_height,
        })?;
    output.resize(len, 0u8);

    let src = image.pixels();
    let src_w = image.width() as i64;
    let src_h = image.height() as i64;

    // Intersection of the crop window with the source, in output coordinates
    let (x_start, x_end) = bounds.source_columns(src_w);

    if x_start < x_end {
        for y in 0..out_height as i64 {
            let src_y = bounds.top.saturating_add(y);
            if src_y < 0 || src_y >= src_h {
                continue;
            }

            let src_row_start = (src_y * src_w + bounds.left + x_start) as usize * CH;
            let dst_row_start = (y * out_width as i64 + x_start) as usize * CH;
            let len = (x_end - x_start) as usize * CH;

            output[dst_row_start..dst_row_start + len]
                .copy_from_slice(&src[src_row_start..src_row_start + len]);
        }
    }

    Ok(RasterImage::from_parts(out_width, out_height, output))
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_image(width: u32, height: u32) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        RasterImage::new(width, height, pixels).unwrap()
    }

    proptest! {
        /// Property: output size is the rounded rectangle size.
        #[test]
        fn prop_output_matches_rounded_rect(
            (width, height) in (4u32..=60, 4u32..=60),
            left in -20.0f64..80.0,
            top in -20.0f64..80.0,
            w in 1.0f64..60.0,
            h in 1.0f64..60.0,
        ) {
            let img = create_test_image(width, height);
            let rect = CropRect::new(left, top, w, h);
            let result = extract_crop(&img, &rect).unwrap();
            let bounds = rect.pixel_bounds();

            prop_assert_eq!(result.width(), bounds.width);
            prop_assert_eq!(result.height(), bounds.height);
        }

        /// Property: every in-bounds output pixel is the matching source pixel.
        #[test]
        fn prop_pixels_from_source(
            (width, height) in (4u32..=40, 4u32..=40),
            left in -10.0f64..40.0,
            top in -10.0f64..40.0,
            w in 1.0f64..30.0,
            h in 1.0f64..30.0,
        ) {
            let img = create_test_image(width, height);
            let rect = CropRect::new(left, top, w, h);
            let bounds = rect.pixel_bounds();
            let result = extract_crop(&img, &rect).unwrap();

            for y in 0..result.height() {
                for x in 0..result.width() {
                    let sx = bounds.left + x as i64;
                    let sy = bounds.top + y as i64;
                    let expected = if sx >= 0 && sy >= 0 {
                        img.pixel(sx as u32, sy as u32).unwrap_or([0, 0, 0, 0])
                    } else {
                        [0, 0, 0, 0]
                    };
                    prop_assert_eq!(result.pixel(x, y), Some(expected));
                }
            }
        }
    }
}
