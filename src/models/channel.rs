use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Acquisition wavelength channel, named after its stack directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum Wavelength {
    WL0,
    WL1,
    WL2,
    WL3,
    WL4,
    WL5,
}

impl Wavelength {
    pub const ALL: [Wavelength; 6] = [
        Wavelength::WL0,
        Wavelength::WL1,
        Wavelength::WL2,
        Wavelength::WL3,
        Wavelength::WL4,
        Wavelength::WL5,
    ];

    /// Directory name of the channel
    pub fn as_str(&self) -> &'static str {
        match self {
            Wavelength::WL0 => "WL0",
            Wavelength::WL1 => "WL1",
            Wavelength::WL2 => "WL2",
            Wavelength::WL3 => "WL3",
            Wavelength::WL4 => "WL4",
            Wavelength::WL5 => "WL5",
        }
    }
}

impl fmt::Display for Wavelength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Wavelength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|wl| wl.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown wavelength '{s}' (expected WL0-WL5)"))
    }
}

impl TryFrom<String> for Wavelength {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
