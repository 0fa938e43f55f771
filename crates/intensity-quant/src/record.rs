//! Per-slice output of the quantifier.

use crate::params::ThresholdMethod;

/// Result of quantifying one slice.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub slice_index: u32,
    /// Background intensity subtracted from the whole-frame mean
    pub background_used: f64,
    /// `raw_integrated_density / exposure_seconds`
    pub normalized_integrated_density: f64,
    /// `(whole_frame_mean - background_used) * total_area`
    pub raw_integrated_density: f64,
    pub whole_frame_mean: f64,
    pub exposure_seconds: f64,
    pub foreground_area_percent: f64,
    pub total_area: u64,
    /// True when `background_used` is the frozen running mean
    pub background_frozen: bool,
    pub rolling_ball_radius: f64,
    pub threshold_method: ThresholdMethod,
    pub area_threshold_percent: f64,
}
