//! Conversion between natural pixel space and crop-widget display space.
//!
//! `displayed = natural * scale`, per axis. Scale factors are derived from
//! the metrics the widget reports when it initializes and must be derived
//! again whenever a fresh widget instance is created.

use serde::{Deserialize, Serialize};

use super::{CropRect, DisplayRect};

/// Source image size as reported by the crop widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NaturalMetrics {
    pub natural_width: f64,
    pub natural_height: f64,
}

/// Rendered canvas size as reported by the crop widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub display_width: f64,
    pub display_height: f64,
}

/// Per-axis display/natural ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ScaleFactors {
    /// Identity scale (display space equals natural space).
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
    };

    /// Returns `None` unless both components are positive and finite.
    pub fn new(scale_x: f64, scale_y: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        (valid(scale_x) && valid(scale_y)).then_some(Self { scale_x, scale_y })
    }

    /// Derive from widget metrics. `None` when any metric is zero, negative
    /// or not finite.
    pub fn from_metrics(natural: NaturalMetrics, display: DisplayMetrics) -> Option<Self> {
        Self::new(
            display.display_width / natural.natural_width,
            display.display_height / natural.natural_height,
        )
    }
}

/// Natural pixels to display units.
pub fn to_display(rect: &CropRect, scale: ScaleFactors) -> DisplayRect {
    DisplayRect {
        left: rect.left * scale.scale_x,
        top: rect.top * scale.scale_y,
        width: rect.width * scale.scale_x,
        height: rect.height * scale.scale_y,
    }
}

/// Display units back to natural pixels.
pub fn to_natural(rect: &DisplayRect, scale: ScaleFactors) -> CropRect {
    CropRect {
        left: rect.left / scale.scale_x,
        top: rect.top / scale.scale_y,
        width: rect.width / scale.scale_x,
        height: rect.height / scale.scale_y,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: natural -> display -> natural is the identity within rounding.
        #[test]
        fn prop_round_trip(
            left in 0.0f64..5000.0,
            top in 0.0f64..5000.0,
            width in 0.01f64..5000.0,
            height in 0.01f64..5000.0,
            sx in 0.001f64..100.0,
            sy in 0.001f64..100.0,
        ) {
            let rect = CropRect::new(left, top, width, height);
            let scale = ScaleFactors::new(sx, sy).unwrap();
            let back = to_natural(&to_display(&rect, scale), scale);

            let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * a.abs().max(1.0);
            prop_assert!(close(back.left, rect.left));
            prop_assert!(close(back.top, rect.top));
            prop_assert!(close(back.width, rect.width));
            prop_assert!(close(back.height, rect.height));
        }

        /// Property: scaling preserves the displayed aspect relation.
        #[test]
        fn prop_uniform_scale_preserves_ratio(
            width in 1.0f64..5000.0,
            height in 1.0f64..5000.0,
            s in 0.01f64..10.0,
        ) {
            let rect = CropRect::new(0.0, 0.0, width, height);
            let scale = ScaleFactors::new(s, s).unwrap();
            let display = to_display(&rect, scale);
            let rel = (display.width / display.height - rect.aspect_ratio()).abs()
                / rect.aspect_ratio();
            prop_assert!(rel < 1e-9);
        }
    }
}
