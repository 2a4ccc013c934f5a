//! idframe Core - ID photo framing and compositing
//!
//! This crate turns a matted subject photo (background already removed to
//! transparency) into a document-ready ID photo: it infers head and shoulder
//! boundaries from the alpha channel, plans a crop at the requested aspect
//! ratio, and flattens the crop onto a solid background color.
//!
//! # Stages
//!
//! 1. [`segment`] - alpha bounding box and per-row width statistics
//! 2. [`transform::plan_crop`] - crop rectangle in natural pixel coordinates
//! 3. [`transform::to_display`] / [`transform::to_natural`] - crop widget space
//! 4. [`composite::Compositor`] - opaque raster for export
//!
//! [`pipeline::PipelineController`] drives the stages and owns all state.

pub mod composite;
pub mod config;
pub mod decode;
pub mod encode;
pub mod pipeline;
pub mod segment;
pub mod transform;

use std::fmt;

pub use composite::{CompositeError, Compositor};
pub use config::{FramingConfig, PipelineConfig, RemovalQuality, SegmentationConfig};
pub use decode::RasterImage;
pub use pipeline::{
    BackgroundRemover, CropWidget, Matte, PipelineController, PipelineError, PipelineState, Upload,
};
pub use segment::{segment, SegmentError, SegmentationResult};
pub use transform::{plan_crop, CropRect, DisplayRect, ScaleFactors};

/// Target document aspect ratio (width / height).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AspectRatio(f64);

/// Common ID and passport formats as `(width, height, label)`.
pub const ASPECT_RATIO_PRESETS: [(u32, u32, &str); 7] = [
    (1, 1, "1:1"),
    (2, 3, "2:3"),
    (3, 4, "3:4"),
    (4, 3, "4:3"),
    (5, 7, "5:7"),
    (7, 9, "7:9"),
    (9, 7, "9:7"),
];

impl AspectRatio {
    /// Create from a width/height quotient. Returns `None` unless positive and finite.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    /// Create from integer proportions, e.g. `from_proportions(3, 4)`.
    pub fn from_proportions(width: u32, height: u32) -> Option<Self> {
        if height == 0 {
            return None;
        }
        Self::new(width as f64 / height as f64)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// All presets with their labels.
    pub fn presets() -> impl Iterator<Item = (AspectRatio, &'static str)> {
        ASPECT_RATIO_PRESETS
            .iter()
            .map(|&(w, h, label)| (Self(w as f64 / h as f64), label))
    }
}

impl Default for AspectRatio {
    /// 3:4, the usual passport proportion.
    fn default() -> Self {
        Self(3.0 / 4.0)
    }
}

impl TryFrom<f64> for AspectRatio {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
            .ok_or_else(|| format!("aspect ratio must be positive and finite, got {value}"))
    }
}

impl From<AspectRatio> for f64 {
    fn from(ratio: AspectRatio) -> Self {
        ratio.0
    }
}

/// Opaque RGB background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Named background presets as `(name, hex)`.
pub const BACKGROUND_PRESETS: [(&str, &str); 9] = [
    ("White", "#ffffff"),
    ("Red", "#ff0000"),
    ("Blue", "#0000ff"),
    ("Bright Blue", "#4285F4"),
    ("Light Blue", "#add8e6"),
    ("Sky Blue", "#87ceeb"),
    ("Navy Blue", "#000080"),
    ("Gray", "#808080"),
    ("Light Gray", "#d3d3d3"),
];

impl BackgroundColor {
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional, case-insensitive).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let expand = |s: &str| channel(s).map(|v| v * 17);
                Some(Self::new(
                    expand(&digits[0..1])?,
                    expand(&digits[1..2])?,
                    expand(&digits[2..3])?,
                ))
            }
            _ => None,
        }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        self.to_string()
    }

    /// All presets with their names.
    pub fn presets() -> impl Iterator<Item = (BackgroundColor, &'static str)> {
        BACKGROUND_PRESETS
            .iter()
            .filter_map(|&(name, hex)| Self::from_hex(hex).map(|c| (c, name)))
    }
}

impl Default for BackgroundColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_validation() {
        assert!(AspectRatio::new(0.75).is_some());
        assert!(AspectRatio::new(0.0).is_none());
        assert!(AspectRatio::new(-1.0).is_none());
        assert!(AspectRatio::new(f64::NAN).is_none());
        assert!(AspectRatio::new(f64::INFINITY).is_none());
        assert!(AspectRatio::from_proportions(3, 0).is_none());
    }

    #[test]
    fn test_aspect_ratio_try_from() {
        assert_eq!(AspectRatio::try_from(0.75).unwrap().value(), 0.75);
        assert_eq!(
            AspectRatio::try_from(-2.0).unwrap_err(),
            "aspect ratio must be positive and finite, got -2"
        );
    }

    #[test]
    fn test_aspect_ratio_default_is_three_by_four() {
        assert_eq!(AspectRatio::default(), AspectRatio::from_proportions(3, 4).unwrap());
    }

    #[test]
    fn test_aspect_ratio_presets() {
        let presets: Vec<_> = AspectRatio::presets().collect();
        assert_eq!(presets.len(), 7);
        assert_eq!(presets[0].1, "1:1");
        assert!((presets[0].0.value() - 1.0).abs() < f64::EPSILON);
        assert!((presets[6].0.value() - 9.0 / 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_background_from_hex() {
        assert_eq!(BackgroundColor::from_hex("#ffffff"), Some(BackgroundColor::WHITE));
        assert_eq!(
            BackgroundColor::from_hex("4285F4"),
            Some(BackgroundColor::new(0x42, 0x85, 0xf4))
        );
        assert_eq!(
            BackgroundColor::from_hex("#f00"),
            Some(BackgroundColor::new(255, 0, 0))
        );
        assert_eq!(BackgroundColor::from_hex("#ff00"), None);
        assert_eq!(BackgroundColor::from_hex("#gg0000"), None);
        assert_eq!(BackgroundColor::from_hex("#ééé"), None);
    }

    #[test]
    fn test_background_hex_round_trip() {
        let color = BackgroundColor::new(0xad, 0xd8, 0xe6);
        assert_eq!(color.to_hex(), "#add8e6");
        assert_eq!(BackgroundColor::from_hex(&color.to_hex()), Some(color));
    }

    #[test]
    fn test_background_presets_all_parse() {
        assert_eq!(BackgroundColor::presets().count(), BACKGROUND_PRESETS.len());
    }
}
