//! Multi-octave coherent noise sampler.
//!
//! Averages several layers of Perlin noise, doubling the frequency of each
//! successive layer. Unlike amplitude-weighted fBm every octave contributes
//! equally, so the result stays in the same `[0, 1]` band as a single layer.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::grid_mesh::GridSpec;

/// Upper bound for the base frequency. Higher values alias on a unit grid.
pub const MAX_FREQUENCY: f64 = 0.5;

/// Largest scaled coordinate handed to Perlin (2^52). Past this `f64` has no
/// fractional bits left and the lattice lookup overflows soon after.
pub const MAX_NOISE_COORDINATE: f64 = 4_503_599_627_370_496.0;

/// Configuration for the multi-octave noise evaluated at every grid vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Permutation seed for the underlying Perlin noise.
    pub seed: u32,
    /// Translation applied to `(x, z)` before scaling, in grid units.
    pub offset: (f64, f64),
    /// Frequency of the first octave. Must lie in `[0, 0.5]`.
    pub frequency: f64,
    /// Number of octaves to average. Must be at least 1.
    pub octaves: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            offset: (0.0, 0.0),
            frequency: 0.08,
            octaves: 3,
        }
    }
}

impl NoiseConfig {
    /// Check the octave count and frequency range.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.octaves == 0 {
            return Err(TerrainError::ZeroOctaves);
        }
        if !self.offset.0.is_finite() || !self.offset.1.is_finite() {
            return Err(TerrainError::NonFiniteParameter("noise.offset"));
        }
        if !(0.0..=MAX_FREQUENCY).contains(&self.frequency) {
            return Err(TerrainError::FrequencyOutOfRange(self.frequency));
        }
        Ok(())
    }

    /// Largest coordinate magnitude any octave evaluates over `grid`.
    ///
    /// Infinite when the octave count overflows the frequency.
    pub fn max_scaled_coordinate(&self, grid: GridSpec) -> f64 {
        if self.frequency == 0.0 {
            return 0.0;
        }
        let reach_x = self.offset.0.abs() + grid.width as f64;
        let reach_z = self.offset.1.abs() + grid.depth as f64;
        let top_frequency = self.frequency * 2f64.powf((self.octaves.max(1) - 1) as f64);
        reach_x.max(reach_z) * top_frequency
    }

    /// Check that every octave over `grid` stays within [`MAX_NOISE_COORDINATE`].
    ///
    /// Requires [`NoiseConfig::validate`] to have passed.
    pub fn validate_domain(&self, grid: GridSpec) -> Result<(), TerrainError> {
        let coordinate = self.max_scaled_coordinate(grid);
        if coordinate.is_finite() && coordinate <= MAX_NOISE_COORDINATE {
            Ok(())
        } else {
            Err(TerrainError::NoiseDomainTooLarge { coordinate })
        }
    }
}

/// Evaluates averaged multi-octave noise over the XZ plane.
pub struct NoiseSampler {
    noise: Perlin,
    config: NoiseConfig,
}

impl NoiseSampler {
    /// Create a sampler. The config is assumed to have passed [`NoiseConfig::validate`].
    pub fn new(config: NoiseConfig) -> Self {
        let noise = Perlin::new(config.seed);
        Self { noise, config }
    }

    /// A single layer of coherent noise remapped from `[-1, 1]` to `[0, 1]`.
    ///
    /// Integer lattice points evaluate to exactly `0.5`.
    #[inline]
    pub fn coherent(&self, x: f64, z: f64) -> f64 {
        (self.noise.get([x, z]) + 1.0) * 0.5
    }

    /// Sample the averaged noise at grid coordinate `(x, z)`.
    ///
    /// The result is approximately in `[0, 1]`; callers must not assume hard
    /// clamping.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let (offset_x, offset_z) = self.config.offset;
        let mut frequency = self.config.frequency;
        let mut total = 0.0;

        for _ in 0..self.config.octaves {
            total += self.coherent((x + offset_x) * frequency, (z + offset_z) * frequency);
            frequency *= 2.0;
        }

        total / self.config.octaves as f64
    }

    /// Return a reference to the current configuration.
    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }
}
