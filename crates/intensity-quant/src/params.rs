//! Quantification parameters.
//!
//! Only the area threshold drives the algorithm. The rolling-ball radius and
//! the threshold method describe how the upstream segmentation was done and
//! are echoed into every [`OutputRecord`](crate::OutputRecord) so a results
//! table can be traced back to the settings that produced it.

use std::fmt;
use std::str::FromStr;

/// Automatic threshold method used by the upstream segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThresholdMethod {
    #[default]
    MaxEntropy,
    Default,
    Huang,
    RenyiEntropy,
}

impl ThresholdMethod {
    /// All supported methods, in the order they are offered to users.
    pub const ALL: [ThresholdMethod; 4] = [
        ThresholdMethod::MaxEntropy,
        ThresholdMethod::Default,
        ThresholdMethod::Huang,
        ThresholdMethod::RenyiEntropy,
    ];

    /// Canonical method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdMethod::MaxEntropy => "MaxEntropy",
            ThresholdMethod::Default => "Default",
            ThresholdMethod::Huang => "Huang",
            ThresholdMethod::RenyiEntropy => "RenyiEntropy",
        }
    }
}

impl fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a threshold method name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseThresholdMethodError(pub String);

impl fmt::Display for ParseThresholdMethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown threshold method '{}' (expected one of MaxEntropy, Default, Huang, RenyiEntropy)",
            self.0
        )
    }
}

impl std::error::Error for ParseThresholdMethodError {}

impl FromStr for ThresholdMethod {
    type Err = ParseThresholdMethodError;

    /// Names match case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseThresholdMethodError(s.to_string()))
    }
}

/// Parameters shared by every slice of a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantParams {
    /// Foreground coverage (percent of frame) at which the background freezes
    pub area_threshold_percent: f64,
    /// Rolling-ball radius used upstream, echoed only
    pub rolling_ball_radius: f64,
    /// Threshold method used upstream, echoed only
    pub threshold_method: ThresholdMethod,
}

impl QuantParams {
    pub fn new(
        area_threshold_percent: f64,
        rolling_ball_radius: f64,
        threshold_method: ThresholdMethod,
    ) -> Self {
        Self {
            area_threshold_percent,
            rolling_ball_radius,
            threshold_method,
        }
    }
}

impl Default for QuantParams {
    fn default() -> Self {
        Self::new(50.0, 50.0, ThresholdMethod::MaxEntropy)
    }
}
