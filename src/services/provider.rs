use intensity_quant::SliceMeasurement;

use crate::error::CollaboratorError;

/// One slice as delivered by a measurement provider
#[derive(Debug, Clone, PartialEq)]
pub struct SliceSample {
    pub measurement: SliceMeasurement,
    /// Minutes since the first frame of the stack, if timestamps are known
    pub elapsed_minutes: Option<f64>,
}

/// Source of per-slice measurements for one stack.
///
/// Implementations hide how frames are loaded and segmented. Slices are
/// requested in ascending order starting at 1; `measurement.slice_index` of
/// the returned sample must equal the requested index.
pub trait MeasurementProvider {
    /// Number of slices in the (windowed) stack
    fn stack_len(&self) -> u32;

    /// Measure one slice (1-based)
    fn sample(&mut self, slice_index: u32) -> Result<SliceSample, CollaboratorError>;
}

/// Which part of an ordered sequence gets loaded: the first `max_slices`
/// items starting at the 1-based `start_slice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceWindow {
    start_slice: u32,
    max_slices: u32,
}

impl SliceWindow {
    pub fn new(start_slice: u32, max_slices: u32) -> Self {
        Self {
            start_slice: start_slice.max(1),
            max_slices,
        }
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip((self.start_slice as usize).saturating_sub(1))
            .take(self.max_slices as usize)
            .collect()
    }
}

impl Default for SliceWindow {
    fn default() -> Self {
        Self::new(1, u32::MAX)
    }
}

pub(crate) fn check_range(slice_index: u32, len: u32) -> Result<usize, CollaboratorError> {
    if slice_index == 0 || slice_index > len {
        return Err(CollaboratorError::SliceOutOfRange {
            index: slice_index,
            len,
        });
    }
    Ok(slice_index as usize - 1)
}

/// In-memory provider over precomputed samples
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    samples: Vec<SliceSample>,
}

impl SyntheticProvider {
    pub fn new(samples: Vec<SliceSample>) -> Self {
        Self { samples }
    }

    /// Samples without timing information
    pub fn from_measurements(measurements: impl IntoIterator<Item = SliceMeasurement>) -> Self {
        Self::new(
            measurements
                .into_iter()
                .map(|measurement| SliceSample {
                    measurement,
                    elapsed_minutes: None,
                })
                .collect(),
        )
    }
}

impl MeasurementProvider for SyntheticProvider {
    fn stack_len(&self) -> u32 {
        self.samples.len() as u32
    }

    fn sample(&mut self, slice_index: u32) -> Result<SliceSample, CollaboratorError> {
        let idx = check_range(slice_index, self.stack_len())?;
        Ok(self.samples[idx].clone())
    }
}
