//! intensity-quant: background-tracking intensity quantification
//!
//! This library turns per-slice intensity measurements of a fluorescence
//! time series into background-subtracted, exposure-normalized integrated
//! densities. It has no image-processing dependency: whatever segments the
//! frames and computes the statistics hands over a [`SliceMeasurement`] per
//! slice, and the quantifier does the rest.
//!
//! # Quick Start
//!
//! ```
//! use intensity_quant::{QuantParams, SliceMeasurement, StackQuantifier, ThresholdMethod};
//!
//! let params = QuantParams::new(50.0, 50.0, ThresholdMethod::MaxEntropy);
//! let mut quantifier = StackQuantifier::new(params);
//!
//! let record = quantifier
//!     .push(&SliceMeasurement {
//!         slice_index: 1,
//!         whole_frame_mean: 50.0,
//!         background_mean: 10.0,
//!         foreground_area_percent: 10.0,
//!         total_area: 1000,
//!         exposure_seconds: 1.0,
//!     })
//!     .unwrap();
//!
//! assert_eq!(record.background_used, 10.0);
//! assert_eq!(record.raw_integrated_density, 40_000.0);
//! ```
//!
//! # Background Tracking
//!
//! As cells grow they cover more of the frame, and the pixels left over as
//! "background" stop being a trustworthy estimate. The quantifier therefore
//! uses each slice's own background mean only while the foreground covers
//! less than the configured area threshold. On the first slice at or above
//! the threshold it freezes the running mean of all background means seen so
//! far (including that slice) and subtracts that frozen value from then on,
//! even if the foreground later shrinks again.
//!
//! The running mean uses the streaming update
//!
//! ```text
//! running += (background_mean - running) / slice_index
//! ```
//!
//! which is why slices must arrive in strictly ascending order starting at 1.
//! [`QuantificationState`] enforces this and rejects anything else with
//! [`QuantError::OutOfOrderSlice`].

pub mod error;
pub mod measurement;
pub mod params;
pub mod quantifier;
pub mod record;
pub mod state;


pub use error::QuantError;
pub use measurement::SliceMeasurement;
pub use params::{ParseThresholdMethodError, QuantParams, ThresholdMethod};
pub use quantifier::{process_slice, StackQuantifier};
pub use record::OutputRecord;
pub use state::QuantificationState;
