//! The pipeline state machine.
//!
//! # Flow
//!
//! ```text
//! Empty --begin_upload--> Uploaded --complete_segmentation--> Segmented
//!   --plan_and_scale--> Cropped --crop_adjusted--> Cropped
//!   --composite_now--> Composited --composite_now / crop_adjusted--> Composited
//! ```
//!
//! A new upload may arrive from any state. Results for an older upload
//! (identified by [`Version`]) and widgets created for an older crop plan
//! (identified by [`CropTicket`]) are dropped when they arrive.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::collaborators::{BackgroundRemover, CropWidget, Matte, RemovalError, Upload};
use super::error::PipelineError;
use super::state::{CropTicket, Delivery, PipelineState, Version};
use crate::composite::{CompositeError, Compositor};
use crate::config::{PipelineConfig, RemovalQuality};
use crate::decode::RasterImage;
use crate::encode::encode_raster_png;
use crate::segment::{segment, SegmentationResult};
use crate::transform::{
    extract_crop, plan_crop, to_display, to_natural, CropRect, DisplayRect, ScaleFactors,
};
use crate::{AspectRatio, BackgroundColor};

/// What the caller must send to the background-removal service.
#[derive(Debug, Clone)]
pub struct RemovalRequest {
    pub version: Version,
    pub bytes: Arc<[u8]>,
    pub quality: RemovalQuality,
}

/// How many times each stage has been computed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageRuns {
    pub segmentations: u64,
    pub plans: u64,
    pub composites: u64,
}

/// A planned crop waiting for its widget.
#[derive(Debug, Clone, Copy)]
struct PendingCrop {
    ticket: CropTicket,
    rect: CropRect,
}

/// Drives an upload through segmentation, cropping and compositing.
///
/// All state lives here: the current stage, the widget scale, the pending
/// auto-crop and the compositing surface.
#[derive(Debug)]
pub struct PipelineController {
    config: PipelineConfig,
    state: PipelineState,
    last_version: u64,
    crop_epoch: u64,
    aspect_ratio: AspectRatio,
    background: BackgroundColor,
    scale: Option<ScaleFactors>,
    pending_crop: Option<PendingCrop>,
    compositor: Compositor,
    runs: StageRuns,
}

impl Default for PipelineController {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl PipelineController {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: PipelineState::Empty,
            last_version: 0,
            crop_epoch: 0,
            aspect_ratio: AspectRatio::default(),
            background: BackgroundColor::WHITE,
            scale: None,
            pending_crop: None,
            compositor: Compositor::new(config.max_surface_side),
            runs: StageRuns::default(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Background used by the most recent successful composite.
    pub fn background(&self) -> BackgroundColor {
        self.background
    }

    /// Widget scale, once a widget has reported ready for the current plan.
    pub fn scale(&self) -> Option<ScaleFactors> {
        self.scale
    }

    /// Ticket of the auto-crop still waiting for a widget, if any.
    pub fn pending_ticket(&self) -> Option<CropTicket> {
        self.pending_crop.map(|p| p.ticket)
    }

    pub fn runs(&self) -> StageRuns {
        self.runs
    }

    /// Accept a new upload and start a new version.
    ///
    /// Everything derived from the previous upload is dropped, including
    /// any removal request still in flight for it. Unsupported formats leave
    /// the pipeline `Empty` and never reach the removal service.
    pub fn begin_upload(&mut self, upload: Upload) -> Result<RemovalRequest, PipelineError> {
        self.last_version += 1;
        let version = Version(self.last_version);
        self.scale = None;
        self.pending_crop = None;

        let Some(format) = upload.format() else {
            warn!(mime_type = %upload.mime_type, "Rejected upload with unsupported format");
            self.state = PipelineState::Empty;
            return Err(PipelineError::UnsupportedFormat {
                mime_type: upload.mime_type,
            });
        };

        info!(
            version = version.get(),
            format = format.mime_type(),
            bytes = upload.bytes.len(),
            "Upload accepted"
        );

        let request = RemovalRequest {
            version,
            bytes: Arc::clone(&upload.bytes),
            quality: self.config.quality,
        };
        self.state = PipelineState::Uploaded { version, upload };
        Ok(request)
    }

    /// Deliver the removal service's answer for `version`.
    ///
    /// On success the matte is segmented and an auto-crop is planned; the
    /// returned ticket identifies the crop session the widget should be
    /// created for. Failures reset the pipeline to `Empty`.
    pub fn complete_segmentation(
        &mut self,
        version: Version,
        outcome: Result<Matte, RemovalError>,
    ) -> Result<Delivery<CropTicket>, PipelineError> {
        let awaiting = matches!(
            self.state,
            PipelineState::Uploaded { version: current, .. } if current == version
        );
        if !awaiting {
            warn!(
                version = version.get(),
                state = self.state.name(),
                "Discarding stale segmentation result"
            );
            return Ok(Delivery::Discarded);
        }

        match self.segment_matte(outcome) {
            Ok((raster, segmentation)) => {
                info!(
                    version = version.get(),
                    width = raster.width(),
                    height = raster.height(),
                    valid_rows = segmentation.rows.len(),
                    "Segmentation complete"
                );
                self.state = PipelineState::Segmented {
                    version,
                    raster,
                    segmentation,
                };
                self.plan_and_scale().map(Delivery::Applied)
            }
            Err(err) => {
                warn!(version = version.get(), error = %err, "Segmentation failed");
                self.state = PipelineState::Empty;
                Err(err)
            }
        }
    }

    fn segment_matte(
        &mut self,
        outcome: Result<Matte, RemovalError>,
    ) -> Result<(RasterImage, SegmentationResult), PipelineError> {
        let raster = outcome?.into_raster()?;
        self.runs.segmentations += 1;
        let segmentation = segment(&raster, &self.config.segmentation)?;
        Ok((raster, segmentation))
    }

    /// Upload, remove the background and plan the auto-crop in one go.
    pub async fn process_upload<R: BackgroundRemover>(
        &mut self,
        upload: Upload,
        remover: &R,
    ) -> Result<Delivery<CropTicket>, PipelineError> {
        let request = self.begin_upload(upload)?;
        let outcome = remover
            .remove_background(&request.bytes, request.quality)
            .await;
        self.complete_segmentation(request.version, outcome)
    }

    /// Plan a crop at the current aspect ratio and queue it for the widget.
    ///
    /// Valid once segmentation has succeeded. A composited result is
    /// dropped: the pipeline returns to `Cropped`. The widget scale is
    /// cleared because the widget is re-created for the new plan.
    pub fn plan_and_scale(&mut self) -> Result<CropTicket, PipelineError> {
        let (version, raster, segmentation) = match std::mem::take(&mut self.state) {
            PipelineState::Segmented {
                version,
                raster,
                segmentation,
            }
            | PipelineState::Cropped {
                version,
                raster,
                segmentation,
                ..
            }
            | PipelineState::Composited {
                version,
                raster,
                segmentation,
                ..
            } => (version, raster, segmentation),
            other => {
                let state = other.name();
                self.state = other;
                return Err(PipelineError::InvalidState {
                    operation: "plan a crop",
                    state,
                });
            }
        };

        let crop = plan_crop(&segmentation, self.aspect_ratio, &self.config.framing);
        self.runs.plans += 1;
        self.crop_epoch += 1;
        let ticket = CropTicket {
            version,
            epoch: self.crop_epoch,
        };
        self.scale = None;
        self.pending_crop = Some(PendingCrop { ticket, rect: crop });

        info!(
            version = version.get(),
            epoch = ticket.epoch,
            aspect_ratio = self.aspect_ratio.value(),
            "Auto-crop planned"
        );

        self.state = PipelineState::Cropped {
            version,
            raster,
            segmentation,
            crop,
        };
        Ok(ticket)
    }

    /// Change the target aspect ratio.
    ///
    /// When a segmentation is available the crop is re-planned and the new
    /// ticket returned; any auto-crop still pending for the old ratio is
    /// superseded. Otherwise the ratio applies to the next segmentation.
    pub fn set_aspect_ratio(
        &mut self,
        aspect_ratio: AspectRatio,
    ) -> Result<Option<CropTicket>, PipelineError> {
        self.aspect_ratio = aspect_ratio;
        if self.state.segmentation().is_none() {
            return Ok(None);
        }
        self.plan_and_scale().map(Some)
    }

    /// The widget created for `ticket` has finished initializing.
    ///
    /// Derives the scale from the widget's metrics and hands it the planned
    /// crop in display units. Tickets that no longer match the pending
    /// crop are discarded.
    pub fn widget_ready<W: CropWidget>(
        &mut self,
        ticket: CropTicket,
        widget: &mut W,
    ) -> Result<Delivery<DisplayRect>, PipelineError> {
        let Some(pending) = self.pending_crop.filter(|p| p.ticket == ticket) else {
            warn!(
                version = ticket.version.get(),
                epoch = ticket.epoch,
                "Discarding ready signal from a superseded crop widget"
            );
            return Ok(Delivery::Discarded);
        };

        let scale = ScaleFactors::from_metrics(widget.natural_metrics(), widget.display_metrics())
            .ok_or(PipelineError::InvalidWidgetMetrics)?;
        let shown = to_display(&pending.rect, scale);
        widget.set_crop_rect(shown);

        self.scale = Some(scale);
        self.pending_crop = None;
        debug!(
            scale_x = scale.scale_x,
            scale_y = scale.scale_y,
            left = shown.left,
            top = shown.top,
            width = shown.width,
            height = shown.height,
            "Applied auto-crop to widget"
        );
        Ok(Delivery::Applied(shown))
    }

    /// The widget was resized or re-rendered without a new crop plan.
    ///
    /// Re-derives the scale and puts the current crop back on the widget.
    pub fn widget_resized<W: CropWidget>(
        &mut self,
        widget: &mut W,
    ) -> Result<DisplayRect, PipelineError> {
        let crop = self.state.crop().ok_or(PipelineError::InvalidState {
            operation: "rescale the crop",
            state: self.state.name(),
        })?;
        if self.pending_crop.is_some() {
            return Err(PipelineError::InvalidState {
                operation: "rescale the crop",
                state: "awaiting widget",
            });
        }

        let scale = ScaleFactors::from_metrics(widget.natural_metrics(), widget.display_metrics())
            .ok_or(PipelineError::InvalidWidgetMetrics)?;
        let display = to_display(&crop, scale);
        widget.set_crop_rect(display);
        self.scale = Some(scale);
        Ok(display)
    }

    /// The user moved or resized the crop box.
    ///
    /// The rectangle is converted to natural pixels and fitted to the image.
    /// When already composited, the output is redrawn with the retained
    /// background; if that fails the previous result is kept.
    pub fn crop_adjusted(&mut self, display: DisplayRect) -> Result<CropRect, PipelineError> {
        let Some(scale) = self.scale else {
            return Err(PipelineError::InvalidState {
                operation: "adjust the crop",
                state: self.state.name(),
            });
        };
        let Some(raster) = self.state.raster() else {
            return Err(PipelineError::InvalidState {
                operation: "adjust the crop",
                state: self.state.name(),
            });
        };

        let natural = to_natural(&display, scale);
        if !natural.is_well_formed() {
            return Err(PipelineError::InvalidCropRect);
        }
        let crop = natural.fitted_to(raster.width(), raster.height());

        match &mut self.state {
            PipelineState::Cropped { crop: current, .. } => {
                *current = crop;
            }
            PipelineState::Composited {
                raster,
                crop: current,
                background,
                output,
                ..
            } => {
                *output = self
                    .compositor
                    .composite(raster, &crop, *background)
                    .map_err(compositing_failed)?;
                self.runs.composites += 1;
                *current = crop;
            }
            other => {
                return Err(PipelineError::InvalidState {
                    operation: "adjust the crop",
                    state: other.name(),
                });
            }
        }

        debug!(
            left = crop.left,
            top = crop.top,
            width = crop.width,
            height = crop.height,
            "Crop adjusted"
        );
        Ok(crop)
    }

    /// Read the widget's current rectangle and apply it as an adjustment.
    pub fn sync_crop_from<W: CropWidget>(&mut self, widget: &W) -> Result<CropRect, PipelineError> {
        self.crop_adjusted(widget.crop_rect())
    }

    /// Flatten the current crop onto `background`.
    ///
    /// Only the compositor runs; segmentation and the crop are reused. On
    /// failure the pipeline keeps its previous state.
    pub fn composite_now(&mut self, background: BackgroundColor) -> Result<(), PipelineError> {
        let (raster, crop) = match &self.state {
            PipelineState::Cropped { raster, crop, .. }
            | PipelineState::Composited { raster, crop, .. } => (raster, *crop),
            other => {
                return Err(PipelineError::InvalidState {
                    operation: "composite",
                    state: other.name(),
                });
            }
        };

        let output = self
            .compositor
            .composite(raster, &crop, background)
            .map_err(compositing_failed)?;
        self.runs.composites += 1;
        self.background = background;

        self.state = match std::mem::take(&mut self.state) {
            PipelineState::Cropped {
                version,
                raster,
                segmentation,
                crop,
            }
            | PipelineState::Composited {
                version,
                raster,
                segmentation,
                crop,
                ..
            } => PipelineState::Composited {
                version,
                raster,
                segmentation,
                crop,
                background,
                output,
            },
            other => other,
        };

        info!(
            background = %background,
            width = crop.width,
            height = crop.height,
            "Composited"
        );
        Ok(())
    }

    /// The flattened photo, once composited.
    pub fn output(&self) -> Option<&RasterImage> {
        self.state.output()
    }

    /// The current crop of the matte, transparency kept.
    ///
    /// `None` before a crop exists or when the crop can't be extracted.
    pub fn cropped_preview(&self) -> Option<RasterImage> {
        let raster = self.state.raster()?;
        let crop = self.state.crop()?;
        match extract_crop(raster, &crop) {
            Ok(preview) => Some(preview),
            Err(err) => {
                warn!(error = %err, "Could not extract crop preview");
                None
            }
        }
    }

    /// Encode the composited photo as PNG for download.
    pub fn export_png(&self) -> Result<Vec<u8>, PipelineError> {
        let output = self.state.output().ok_or(PipelineError::InvalidState {
            operation: "export",
            state: self.state.name(),
        })?;
        encode_raster_png(output).map_err(|err| {
            warn!(error = %err, "Export failed");
            PipelineError::DownloadFailure(err)
        })
    }

    /// Drop everything and return to `Empty`.
    ///
    /// In-flight removal results for the dropped upload will be discarded.
    pub fn reset(&mut self) {
        self.state = PipelineState::Empty;
        self.scale = None;
        self.pending_crop = None;
        info!("Pipeline reset");
    }
}

fn compositing_failed(err: CompositeError) -> PipelineError {
    warn!(error = %err, "Compositing failed, keeping previous result");
    PipelineError::CompositingFailure(err)
}
