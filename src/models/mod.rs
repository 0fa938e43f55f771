pub mod acquisition;
pub mod channel;
pub mod config;

pub use acquisition::{AcquisitionLog, Timepoint};
pub use channel::Wavelength;
pub use config::{AnalysisConfig, MeasurementSource};
