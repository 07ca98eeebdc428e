//! Small validating newtypes shared across the loader and evaluator,
//! following the teacher's `ServiceName`/`ResourceTypeName` newtype idiom
//! (construct-time validation, no raw `u8`/`String` passed around).

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A SLSA build-integrity level, always in `0..=4` (`spec.md` §3, §8 I-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlsaLevel(u8);

pub const MAX_SLSA_LEVEL: u8 = 4;

impl SlsaLevel {
    pub fn new(value: u8) -> Result<Self, PolicyError> {
        if value > MAX_SLSA_LEVEL {
            return Err(PolicyError::invalid_field(
                "kernel",
                format!("SLSA level {value} is out of range 0..={MAX_SLSA_LEVEL}"),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SlsaLevel {
    type Error = PolicyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SlsaLevel> for u8 {
    fn from(level: SlsaLevel) -> Self {
        level.0
    }
}

impl fmt::Display for SlsaLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_in_range() {
        for v in 0..=MAX_SLSA_LEVEL {
            assert!(SlsaLevel::new(v).is_ok());
        }
    }

    #[test]
    fn rejects_levels_out_of_range() {
        assert!(SlsaLevel::new(MAX_SLSA_LEVEL + 1).is_err());
    }

    #[test]
    fn orders_by_value() {
        assert!(SlsaLevel::new(1).unwrap() < SlsaLevel::new(2).unwrap());
    }
}
