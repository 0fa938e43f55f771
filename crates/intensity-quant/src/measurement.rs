//! Per-slice input to the quantifier.

/// Intensity statistics of one time slice.
///
/// Produced by whatever segments the frame into foreground and background;
/// the quantifier only reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceMeasurement {
    /// 1-based position of the slice in its stack
    pub slice_index: u32,
    /// Mean intensity over the entire frame
    pub whole_frame_mean: f64,
    /// Mean intensity over the background region (outside the object mask)
    pub background_mean: f64,
    /// Percentage (0-100) of the frame classified as foreground
    pub foreground_area_percent: f64,
    /// Pixel count of the whole frame
    pub total_area: u64,
    /// Exposure duration of the slice in seconds
    pub exposure_seconds: f64,
}
