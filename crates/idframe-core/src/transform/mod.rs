//! Crop geometry: planning, coordinate spaces and extraction.
//!
//! # Coordinate Systems
//!
//! - Natural: pixels of the source raster, origin top-left
//! - Display: units of the on-screen crop widget, `display = natural * scale`
//!
//! The planner always works in natural coordinates. Rectangles only enter
//! display space on their way to the crop widget and come back through
//! [`to_natural`].

mod crop;
mod plan;
mod rect;
mod scale;

pub use crop::extract_crop;
pub use plan::{plan_crop, plan_framing, CropPlan};
pub use rect::{CropRect, DisplayRect, PixelBounds};
pub use scale::{to_display, to_natural, DisplayMetrics, NaturalMetrics, ScaleFactors};
