//! Whole-frame and masked intensity statistics.

use std::path::Path;

use super::{ForegroundMask, GrayFrame};
use crate::error::CollaboratorError;

/// Intensity statistics of one frame split by its foreground mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub whole_frame_mean: f64,
    /// Mean over mask == 0 pixels.
    ///
    /// When the mask has no foreground at all, the whole frame counts as
    /// background. When it has no background pixels, this falls back to the
    /// whole-frame mean so the running background mean stays finite.
    pub background_mean: f64,
    pub foreground_area_percent: f64,
    pub foreground_pixels: u64,
    pub total_area: u64,
}

impl FrameStats {
    /// Measure `frame` against `mask`; `mask_path` is used for error reporting.
    pub fn measure(
        frame: &GrayFrame,
        mask: &ForegroundMask,
        mask_path: &Path,
    ) -> Result<Self, CollaboratorError> {
        if frame.width() != mask.width() || frame.height() != mask.height() {
            return Err(CollaboratorError::DimensionMismatch {
                path: mask_path.to_path_buf(),
                width: frame.width(),
                height: frame.height(),
                mask_width: mask.width(),
                mask_height: mask.height(),
            });
        }

        let mut total_sum = 0.0f64;
        let mut background_sum = 0.0f64;
        let mut background_pixels = 0u64;
        for (i, &value) in frame.pixels().iter().enumerate() {
            let value = f64::from(value);
            total_sum += value;
            if !mask.is_foreground(i) {
                background_sum += value;
                background_pixels += 1;
            }
        }

        let total_area = frame.pixels().len() as u64;
        let foreground_pixels = total_area - background_pixels;
        if total_area == 0 {
            return Ok(Self {
                whole_frame_mean: 0.0,
                background_mean: 0.0,
                foreground_area_percent: 0.0,
                foreground_pixels: 0,
                total_area: 0,
            });
        }

        let whole_frame_mean = total_sum / total_area as f64;
        let background_mean = if background_pixels == 0 {
            whole_frame_mean
        } else {
            background_sum / background_pixels as f64
        };

        Ok(Self {
            whole_frame_mean,
            background_mean,
            foreground_area_percent: 100.0 * foreground_pixels as f64 / total_area as f64,
            foreground_pixels,
            total_area,
        })
    }
}
