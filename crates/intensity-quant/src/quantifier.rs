//! The per-slice quantification step.

use crate::error::QuantError;
use crate::measurement::SliceMeasurement;
use crate::params::QuantParams;
use crate::record::OutputRecord;
use crate::state::QuantificationState;

/// Quantify one slice and advance `state`.
///
/// The measurement is validated before anything is mutated, so a rejected
/// slice leaves `state` exactly as it was.
///
/// The running background mean is updated first. If the foreground covers at
/// least `params.area_threshold_percent` of the frame (or the background was
/// frozen earlier), the background freezes at that updated running mean and
/// stays there for the rest of the stack.
pub fn process_slice(
    measurement: &SliceMeasurement,
    params: &QuantParams,
    state: &mut QuantificationState,
) -> Result<OutputRecord, QuantError> {
    let slice_index = measurement.slice_index;

    let expected = state.next_slice_index();
    if slice_index != expected {
        return Err(QuantError::OutOfOrderSlice {
            expected,
            found: slice_index,
        });
    }
    let exposure = measurement.exposure_seconds;
    if !exposure.is_finite() || exposure <= 0.0 {
        return Err(QuantError::ZeroExposureTime {
            slice_index,
            exposure_seconds: exposure,
        });
    }
    if measurement.total_area == 0 {
        return Err(QuantError::EmptyFrame { slice_index });
    }

    state.observe_background(slice_index, measurement.background_mean);

    let below_threshold = measurement.foreground_area_percent < params.area_threshold_percent;
    let background_used = if below_threshold && !state.is_frozen() {
        measurement.background_mean
    } else {
        state.freeze();
        state.frozen_background_mean().unwrap_or(measurement.background_mean)
    };

    let raw_integrated_density =
        (measurement.whole_frame_mean - background_used) * measurement.total_area as f64;

    Ok(OutputRecord {
        slice_index,
        background_used,
        normalized_integrated_density: raw_integrated_density / exposure,
        raw_integrated_density,
        whole_frame_mean: measurement.whole_frame_mean,
        exposure_seconds: exposure,
        foreground_area_percent: measurement.foreground_area_percent,
        total_area: measurement.total_area,
        background_frozen: state.is_frozen(),
        rolling_ball_radius: params.rolling_ball_radius,
        threshold_method: params.threshold_method,
        area_threshold_percent: params.area_threshold_percent,
    })
}

/// A quantifier bound to one stack: owns its parameters and state.
#[derive(Debug, Clone)]
pub struct StackQuantifier {
    params: QuantParams,
    state: QuantificationState,
}

impl StackQuantifier {
    pub fn new(params: QuantParams) -> Self {
        Self {
            params,
            state: QuantificationState::new(),
        }
    }

    /// Quantify the next slice of the stack.
    pub fn push(&mut self, measurement: &SliceMeasurement) -> Result<OutputRecord, QuantError> {
        process_slice(measurement, &self.params, &mut self.state)
    }

    pub fn params(&self) -> &QuantParams {
        &self.params
    }

    pub fn state(&self) -> &QuantificationState {
        &self.state
    }

    /// Discard all accumulated state, keeping the parameters.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn finish(self) -> QuantificationState {
        self.state
    }
}
