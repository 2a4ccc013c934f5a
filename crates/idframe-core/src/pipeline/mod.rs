//! Stage orchestration for one photo at a time.
//!
//! [`PipelineController`] is the only stateful piece of the crate. It talks to
//! the background-removal service and the crop widget through the traits in
//! [`collaborators`], and tags every async hand-off with a [`Version`] or
//! [`CropTicket`] so late results for a replaced photo are dropped.

pub mod collaborators;
mod controller;
mod error;
mod state;

pub use collaborators::{
    BackgroundRemover, CropWidget, Matte, RemovalError, Upload, UploadFormat,
    SUPPORTED_MIME_TYPES,
};
pub use controller::{PipelineController, RemovalRequest, StageRuns};
pub use error::PipelineError;
pub use state::{CropTicket, Delivery, PipelineState, Version};
