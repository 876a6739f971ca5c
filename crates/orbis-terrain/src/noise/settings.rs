//! Parameter block for one layered noise evaluation.

use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which base noise a layer stacks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseType {
    /// Gradient noise.
    #[default]
    Perlin,
    /// Cellular noise.
    Cellular,
}

/// Layered noise parameters.
///
/// Octave `i` samples at `(point + offset) * frequency * lacunarity^i` with
/// amplitude `persistence^i`; the sum is scaled by `strength`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Base noise.
    pub noise_type: NoiseType,
    /// Perlin: fold the sum into ridges. Cellular: return the cell channel.
    pub is_rigid: bool,
    /// Domain offset; acts as a per-layer seed.
    pub offset: DVec3,
    /// Frequency of the first octave.
    pub frequency: f64,
    /// Number of octaves, at least 1.
    pub octaves: u32,
    /// Output scale.
    pub strength: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            noise_type: NoiseType::Perlin,
            is_rigid: false,
            offset: DVec3::ZERO,
            frequency: 1.0,
            octaves: 1,
            strength: 1.0,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl NoiseSettings {
    /// A layer that always evaluates to 0.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            strength: 0.0,
            ..Self::default()
        }
    }

    /// Redraw the offset within ±10000 per axis.
    pub fn randomize_offset<R: Rng>(&mut self, rng: &mut R) {
        self.offset = DVec3::new(
            rng.random_range(-10_000.0..10_000.0),
            rng.random_range(-10_000.0..10_000.0),
            rng.random_range(-10_000.0..10_000.0),
        );
    }
}
