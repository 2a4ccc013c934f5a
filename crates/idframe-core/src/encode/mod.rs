//! Image encoding for idframe.
//!
//! The only export format is a flattened PNG of the composited photo.
//!
//! # Examples
//!
//! ```ignore
//! use idframe_core::encode::encode_raster_png;
//!
//! let png = encode_raster_png(&final_raster).unwrap();
//! std::fs::write(idframe_core::encode::EXPORT_FILE_NAME, png).unwrap();
//! ```

mod png;

pub use png::{encode_png, encode_raster_png, EncodeError, EXPORT_FILE_NAME};
