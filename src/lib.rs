//! fluorquant - fluorescence time-series quantification
//!
//! Measures image stacks of a microscopy experiment and reports background
//! subtracted, exposure-normalized integrated densities per time slice.
//! The quantification itself lives in the `intensity-quant` crate; this
//! library adds configuration, experiment layout, measurement providers and
//! the results table.

pub mod error;
pub mod imaging;
pub mod models;
pub mod services;
