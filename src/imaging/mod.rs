pub mod frame;
pub mod stats;

pub use frame::{ForegroundMask, GrayFrame};
pub use stats::FrameStats;
