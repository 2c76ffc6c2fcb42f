//! Height-banded vertex coloring.

use serde::{Deserialize, Serialize};

/// Linear RGBA color with `f32` channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Sentinel returned when no bands are configured.
    pub const MAGENTA: Self = Self::new(1.0, 0.0, 1.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Quantize to 8-bit channels, clamping out-of-range values.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A lower height threshold paired with the color used above it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorBand {
    pub min_value: f64,
    pub color: Rgba,
}

impl ColorBand {
    pub fn new(min_value: f64, color: Rgba) -> Self {
        Self { min_value, color }
    }
}

/// A small default palette: water, sand, grass, rock, snow.
pub fn default_bands() -> Vec<ColorBand> {
    vec![
        ColorBand::new(0.0, Rgba::from_rgb8(38, 84, 160)),
        ColorBand::new(0.3, Rgba::from_rgb8(214, 196, 138)),
        ColorBand::new(0.4, Rgba::from_rgb8(76, 140, 60)),
        ColorBand::new(0.65, Rgba::from_rgb8(112, 104, 96)),
        ColorBand::new(0.8, Rgba::from_rgb8(240, 240, 245)),
    ]
}

/// Pick the color of the band with the largest `min_value` strictly below
/// `raw_height`.
///
/// Bands are unordered. Equal maximal thresholds resolve to the first such band.
/// With no bands the result is [`Rgba::MAGENTA`]. If no band qualifies, band
/// 0's color is returned whatever its threshold.
pub fn classify(raw_height: f64, bands: &[ColorBand]) -> Rgba {
    let Some(first) = bands.first() else {
        return Rgba::MAGENTA;
    };

    let mut best: Option<&ColorBand> = None;
    for band in bands {
        if band.min_value < raw_height && best.is_none_or(|b| band.min_value > b.min_value) {
            best = Some(band);
        }
    }

    best.unwrap_or(first).color
}
