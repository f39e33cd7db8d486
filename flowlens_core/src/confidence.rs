//! Bounded confidence value for analysis outputs
//!
//! Confidence is a newtype wrapper around f64 that enforces bounds [0.1, 1.0]
//! and rejects NaN values. Every stage result and the aggregate carry one;
//! the floor of 0.1 is what a fully degraded stage reports.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bounded confidence value [0.1, 1.0]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f64);

#[derive(Error, Debug)]
pub enum ConfidenceError {
    #[error("Confidence value cannot be NaN")]
    NaN,

    #[error("Confidence out of bounds: {value} (must be {min} to {max})")]
    OutOfBounds { value: f64, min: f64, max: f64 },
}

impl Confidence {
    pub const MIN: f64 = 0.1;
    pub const MAX: f64 = 1.0;

    /// Create a new confidence value with bounds validation
    ///
    /// # Errors
    /// - Returns `ConfidenceError::NaN` if value is NaN
    /// - Returns `ConfidenceError::OutOfBounds` if value < 0.1 or > 1.0
    pub fn new(value: f64) -> Result<Self, ConfidenceError> {
        if value.is_nan() {
            return Err(ConfidenceError::NaN);
        }
        if value < Self::MIN || value > Self::MAX {
            return Err(ConfidenceError::OutOfBounds {
                value,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(value))
    }

    /// Clamp an arbitrary score into the valid range (NaN becomes the floor)
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    /// Get the underlying f64 value
    pub fn get(self) -> f64 {
        self.0
    }

    /// Add a bonus, saturating at the upper bound
    pub fn gain(self, delta: f64) -> Self {
        Self::clamped(self.0 + delta)
    }

    /// Subtract a penalty, saturating at the floor
    pub fn penalize(self, delta: f64) -> Self {
        Self::clamped(self.0 - delta)
    }

    /// Floor confidence (0.1) reported by a degraded stage
    pub fn floor() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<f64> for Confidence {
    type Error = ConfidenceError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::floor()
    }
}
