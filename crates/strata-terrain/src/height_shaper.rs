//! Maps raw noise samples to world-space heights.

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// How raw noise is reshaped before range mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapePolicy {
    /// Continuous power curve `raw ^ exponent`.
    #[default]
    Elevation,
    /// Quantized steps `round(raw * n) / n`.
    Terrace,
}

/// Height shaping parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Active shaping policy.
    pub policy: ShapePolicy,
    /// Exponent for [`ShapePolicy::Elevation`], in `[1, 10]`.
    pub elevation_exponent: f64,
    /// Step count for [`ShapePolicy::Terrace`], in `[1, 32]`.
    pub terrace_count: u32,
    /// `(min, max)` world heights that shaped `0` and `1` map to.
    pub height_range: (f64, f64),
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            policy: ShapePolicy::Elevation,
            elevation_exponent: 1.0,
            terrace_count: 8,
            height_range: (0.0, 10.0),
        }
    }
}

impl ShapeConfig {
    /// Check exponent, terrace count and height range.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if !(1.0..=10.0).contains(&self.elevation_exponent) {
            return Err(TerrainError::ExponentOutOfRange(self.elevation_exponent));
        }
        if !(1..=32).contains(&self.terrace_count) {
            return Err(TerrainError::TerraceCountOutOfRange(self.terrace_count));
        }
        if !self.height_range.0.is_finite() || !self.height_range.1.is_finite() {
            return Err(TerrainError::NonFiniteParameter("shape.height_range"));
        }
        Ok(())
    }
}

/// Apply the shaping policy and map into `height_range`.
pub fn shape(raw_height: f64, config: &ShapeConfig) -> f64 {
    let y = match config.policy {
        ShapePolicy::Terrace => terrace(raw_height, config.terrace_count),
        ShapePolicy::Elevation => elevate(raw_height, config.elevation_exponent),
    };
    let (min, max) = config.height_range;
    min + y * (max - min)
}

/// Quantize to `count + 1` levels. Halfway values round to the even level.
#[inline]
pub fn terrace(raw_height: f64, count: u32) -> f64 {
    let n = count as f64;
    (raw_height * n).round_ties_even() / n
}

/// Power curve. Negative noise overshoot is floored at zero so fractional
/// exponents stay real.
#[inline]
pub fn elevate(raw_height: f64, exponent: f64) -> f64 {
    raw_height.max(0.0).powf(exponent)
}
