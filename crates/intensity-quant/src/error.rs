//! Error type for the quantifier.
//!
//! Every variant is fatal for the stack being processed: the running
//! background mean cannot be repaired once a slice is skipped or
//! misnumbered, so callers abort the stack instead of substituting values.

use std::fmt;

/// Errors raised while quantifying a slice.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantError {
    /// Exposure time is zero, negative or not finite, so the integrated
    /// density cannot be normalized.
    ZeroExposureTime {
        /// Slice carrying the bad exposure
        slice_index: u32,
        /// The offending exposure value in seconds
        exposure_seconds: f64,
    },
    /// The frame has no pixels.
    EmptyFrame {
        /// Slice reporting a zero total area
        slice_index: u32,
    },
    /// The slice does not directly follow the previously processed one.
    OutOfOrderSlice {
        /// Index the state was waiting for
        expected: u32,
        /// Index that was actually supplied
        found: u32,
    },
}

impl QuantError {
    /// Slice the error refers to.
    pub fn slice_index(&self) -> u32 {
        match self {
            QuantError::ZeroExposureTime { slice_index, .. } => *slice_index,
            QuantError::EmptyFrame { slice_index } => *slice_index,
            QuantError::OutOfOrderSlice { found, .. } => *found,
        }
    }
}

impl fmt::Display for QuantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantError::ZeroExposureTime {
                slice_index,
                exposure_seconds,
            } => write!(
                f,
                "slice {}: exposure time must be positive (got {} s)",
                slice_index, exposure_seconds
            ),
            QuantError::EmptyFrame { slice_index } => {
                write!(f, "slice {}: frame has zero total area", slice_index)
            }
            QuantError::OutOfOrderSlice { expected, found } => write!(
                f,
                "slice {} supplied out of order (expected slice {})",
                found, expected
            ),
        }
    }
}

impl std::error::Error for QuantError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_exposure_display() {
        let err = QuantError::ZeroExposureTime {
            slice_index: 4,
            exposure_seconds: 0.0,
        };
        assert_eq!(
            err.to_string(),
            "slice 4: exposure time must be positive (got 0 s)"
        );
        assert_eq!(err.slice_index(), 4);
    }

    #[test]
    fn test_empty_frame_display() {
        let err = QuantError::EmptyFrame { slice_index: 1 };
        assert_eq!(err.to_string(), "slice 1: frame has zero total area");
    }

    #[test]
    fn test_out_of_order_display() {
        let err = QuantError::OutOfOrderSlice {
            expected: 3,
            found: 5,
        };
        assert_eq!(
            err.to_string(),
            "slice 5 supplied out of order (expected slice 3)"
        );
        assert_eq!(err.slice_index(), 5);
    }
}
