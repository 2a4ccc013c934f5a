//! Raster decoding for idframe.
//!
//! This module provides:
//! - The [`RasterImage`] type that every pipeline stage consumes and produces
//! - Decoding of encoded image bytes (the background-removal output) into RGBA
//!   with EXIF orientation correction
//!
//! # Examples
//!
//! ```ignore
//! use idframe_core::decode::decode_raster;
//!
//! let matted = std::fs::read("subject.png").unwrap();
//! let raster = decode_raster(&matted).unwrap();
//! println!("Decoded {}x{} raster", raster.width(), raster.height());
//! ```

mod raster;
mod types;

pub use raster::decode_raster;
pub use types::{DecodeError, Orientation, RasterImage};
