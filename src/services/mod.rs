pub mod experiment;
pub mod image_provider;
pub mod provider;
pub mod report;
pub mod runner;
pub mod table_provider;

pub use experiment::{ExperimentLayout, StackLocation};
pub use image_provider::MaskedImageProvider;
pub use provider::{MeasurementProvider, SliceSample, SliceWindow, SyntheticProvider};
pub use report::{ReportWriter, SliceRow};
pub use runner::{analyze_stack, quantify_stack, run_batch, run_single, RunSummary, StackReport};
pub use table_provider::TableProvider;
