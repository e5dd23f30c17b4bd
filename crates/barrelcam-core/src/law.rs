//! Motion laws applied between two adjacent control points.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CamError, Result};

/// Persisted code reserved for a cubic law that has never been implemented.
pub const CUBIC_CODE: u8 = 3;

/// Interpolation used on the segment that ends at a control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionLaw {
    /// Dwell: constant displacement across the segment.
    #[default]
    Linear,
    /// Half-sine rise or return with zero slope at both ends.
    Sinusoidal,
    /// Two quadratic pieces meeting at the segment midpoint.
    Parabolic,
}

impl MotionLaw {
    /// All implemented laws, in code order.
    pub const ALL: [MotionLaw; 3] = [Self::Linear, Self::Sinusoidal, Self::Parabolic];

    /// Stable code written to cam files.
    pub fn code(self) -> u8 {
        match self {
            Self::Linear => 0,
            Self::Sinusoidal => 1,
            Self::Parabolic => 2,
        }
    }

    /// Human readable name.
    pub fn description(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::Sinusoidal => "Sinusoidal",
            Self::Parabolic => "Parabolic",
        }
    }
}

impl TryFrom<u8> for MotionLaw {
    type Error = CamError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Linear),
            1 => Ok(Self::Sinusoidal),
            2 => Ok(Self::Parabolic),
            CUBIC_CODE => Err(CamError::UnsupportedLaw("cubic".into())),
            other => Err(CamError::UnsupportedLaw(format!("code {}", other))),
        }
    }
}

impl FromStr for MotionLaw {
    type Err = CamError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "dwell" => Ok(Self::Linear),
            "sinusoidal" | "sine" => Ok(Self::Sinusoidal),
            "parabolic" => Ok(Self::Parabolic),
            other => Err(CamError::UnsupportedLaw(other.to_string())),
        }
    }
}

impl fmt::Display for MotionLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        for law in MotionLaw::ALL {
            assert_eq!(MotionLaw::try_from(law.code()).unwrap(), law);
        }
        assert_eq!(MotionLaw::Parabolic.code(), 2);
    }

    #[test]
    fn test_cubic_rejected() {
        assert!(matches!(
            MotionLaw::try_from(CUBIC_CODE),
            Err(CamError::UnsupportedLaw(_))
        ));
        assert!(MotionLaw::try_from(9).is_err());
        assert!("cubic".parse::<MotionLaw>().is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Sine".parse::<MotionLaw>().unwrap(), MotionLaw::Sinusoidal);
        assert_eq!(" parabolic ".parse::<MotionLaw>().unwrap(), MotionLaw::Parabolic);
        assert_eq!(MotionLaw::Linear.to_string(), "Linear");
    }
}
