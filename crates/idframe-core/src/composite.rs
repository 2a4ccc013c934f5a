//! Flattening a matted crop onto a solid background.
//!
//! The output is always fully opaque: each pixel is the source blended
//! "over" the background color,
//! `out = src * a + bg * (1 - a)`, computed in integer arithmetic so that
//! identical inputs always yield byte-identical output.
//!
//! # Scratch surface
//!
//! A [`Compositor`] owns one drawing surface that it reuses between calls.
//! Each [`Compositor::composite`] call borrows it mutably for the whole
//! resize, fill, draw and read-out sequence, so two compositing calls can
//! never interleave on the same surface.

use thiserror::Error;

use crate::decode::RasterImage;
use crate::transform::{CropRect, PixelBounds};
use crate::BackgroundColor;

/// Largest surface side accepted when no limit is configured.
pub const DEFAULT_MAX_SURFACE_SIDE: u32 = 16_384;

/// The drawing surface couldn't be provisioned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompositeError {
    /// Crop rectangle has a non-finite field or a non-positive size.
    #[error("Crop rectangle must be finite with a positive size")]
    InvalidRect,

    /// Requested surface exceeds the configured maximum side length.
    #[error("Surface {width}x{height} exceeds the maximum side of {max_side} pixels")]
    SurfaceTooLarge {
        width: u32,
        height: u32,
        max_side: u32,
    },

    /// Memory for the surface couldn't be reserved.
    #[error("Could not allocate a {width}x{height} drawing surface")]
    AllocationFailed { width: u32, height: u32 },
}

/// Owns the scratch surface used for compositing.
#[derive(Debug)]
pub struct Compositor {
    scratch: Vec<u8>,
    max_surface_side: u32,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SURFACE_SIDE)
    }
}

impl Compositor {
    pub fn new(max_surface_side: u32) -> Self {
        Self {
            scratch: Vec::new(),
            max_surface_side,
        }
    }

    /// Flatten the part of `raster` under `rect` onto `background`.
    ///
    /// The output is `rect` rounded to whole pixels (see
    /// [`CropRect::pixel_bounds`]). Parts of the rectangle outside the
    /// raster show the plain background.
    pub fn composite(
        &mut self,
        raster: &RasterImage,
        rect: &CropRect,
        background: BackgroundColor,
    ) -> Result<RasterImage, CompositeError> {
        let bounds = surface_bounds(rect, self.max_surface_side)?;
        let (out_w, out_h) = (bounds.width, bounds.height);
        let len = surface_len(&bounds)?;
        const CH: usize = RasterImage::CHANNELS;

        // Resize
        self.scratch.clear();
        self.scratch
            .try_reserve(len)
            .map_err(|_| CompositeError::AllocationFailed {
                width: out_w,
                height: out_h,
            })?;

        // Fill
        let fill = [background.r, background.g, background.b, 255];
        for _ in 0..(len / CH) {
            self.scratch.extend_from_slice(&fill);
        }

        // Draw
        let src = raster.pixels();
        let src_w = raster.width() as i64;
        let src_h = raster.height() as i64;
        let (x_start, x_end) = bounds.source_columns(src_w);

        if x_start < x_end {
            for y in 0..out_h as i64 {
                let src_y = bounds.top.saturating_add(y);
                if src_y < 0 || src_y >= src_h {
                    continue;
                }

                let src_row = (src_y * src_w + bounds.left + x_start) as usize * CH;
                let dst_row = (y * out_w as i64 + x_start) as usize * CH;
                let len = (x_end - x_start) as usize * CH;

                let src_px = src[src_row..src_row + len].chunks_exact(CH);
                let dst_px = self.scratch[dst_row..dst_row + len].chunks_exact_mut(CH);
                for (s, d) in src_px.zip(dst_px) {
                    blend_over(s, d);
                }
            }
        }

        // Read out
        Ok(RasterImage::from_parts(out_w, out_h, self.scratch.clone()))
    }
}

/// Round `rect` to whole pixels and check it against `max_side`.
pub(crate) fn surface_bounds(
    rect: &CropRect,
    max_side: u32,
) -> Result<PixelBounds, CompositeError> {
    if !rect.is_well_formed() {
        return Err(CompositeError::InvalidRect);
    }

    let bounds = rect.pixel_bounds();
    if bounds.width > max_side || bounds.height > max_side {
        return Err(CompositeError::SurfaceTooLarge {
            width: bounds.width,
            height: bounds.height,
            max_side,
        });
    }
    Ok(bounds)
}

/// Byte length of an RGBA surface covering `bounds`.
pub(crate) fn surface_len(bounds: &PixelBounds) -> Result<usize, CompositeError> {
    (bounds.width as usize)
        .checked_mul(bounds.height as usize)
        .and_then(|n| n.checked_mul(RasterImage::CHANNELS))
        .ok_or(CompositeError::AllocationFailed {
            width: bounds.width,
            height: bounds.height,
        })
}

/// Blend one RGBA source pixel over an opaque destination pixel.
#[inline]
fn blend_over(src: &[u8], dst: &mut [u8]) {
    let a = src[3] as u32;
    match a {
        0 => {}
        255 => {
            dst[..3].copy_from_slice(&src[..3]);
        }
        _ => {
            let inv = 255 - a;
            for c in 0..3 {
                dst[c] = ((src[c] as u32 * a + dst[c] as u32 * inv + 127) / 255) as u8;
            }
        }
    }
    dst[3] = 255;
}

/// One-off compositing with an ephemeral surface.
pub fn composite(
    raster: &RasterImage,
    rect: &CropRect,
    background: BackgroundColor,
) -> Result<RasterImage, CompositeError> {
    Compositor::default().composite(raster, rect, background)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn raster_strategy() -> impl Strategy<Value = RasterImage> {
        (1u32..=24, 1u32..=24).prop_flat_map(|(w, h)| {
            proptest::collection::vec(any::<u8>(), (w * h * 4) as usize)
                .prop_map(move |pixels| RasterImage::new(w, h, pixels).unwrap())
        })
    }

    proptest! {
        /// Property: identical arguments give byte-identical output.
        #[test]
        fn prop_composite_is_idempotent(
            img in raster_strategy(),
            left in -5.0f64..20.0,
            top in -5.0f64..20.0,
            w in 1.0f64..20.0,
            h in 1.0f64..20.0,
            (r, g, b) in (any::<u8>(), any::<u8>(), any::<u8>()),
        ) {
            let rect = CropRect::new(left, top, w, h);
            let bg = BackgroundColor::new(r, g, b);
            let mut compositor = Compositor::default();

            let first = compositor.composite(&img, &rect, bg).unwrap();
            let second = compositor.composite(&img, &rect, bg).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: blended channels stay between source and background.
        #[test]
        fn prop_blend_is_bounded(
            src in proptest::array::uniform4(any::<u8>()),
            bg in proptest::array::uniform3(any::<u8>()),
        ) {
            let mut dst = [bg[0], bg[1], bg[2], 255];
            blend_over(&src, &mut dst);
            for c in 0..3 {
                let lo = src[c].min(bg[c]);
                let hi = src[c].max(bg[c]);
                prop_assert!(dst[c] >= lo && dst[c] <= hi);
            }
            prop_assert_eq!(dst[3], 255);
        }
    }
}
