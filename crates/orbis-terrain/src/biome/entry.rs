//! A single biome: where it lives in temperate/fertility space and the noise
//! layers that shape its terrain.

use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::noise::{NoiseField, NoiseSettings, NoiseType};

/// Closed interval on one biome-assignment axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeRange {
    /// Lower bound, inclusive.
    pub min: f64,
    /// Upper bound, inclusive.
    pub max: f64,
}

impl BiomeRange {
    /// A range no assignment value can reach.
    pub const UNREACHABLE: BiomeRange = BiomeRange {
        min: 100.0,
        max: 100.0,
    };

    /// Create a range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive membership.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Midpoint.
    #[must_use]
    pub fn center(&self) -> f64 {
        (self.max - self.min) / 2.0 + self.min
    }

    /// Quartic bump: 1 at the center, 0 at and beyond both ends.
    #[must_use]
    pub fn dim(&self, value: f64) -> f64 {
        let scale = 2.0 / (self.max - self.min);
        1.0 - (scale * (value - self.center())).powi(4).clamp(0.0, 1.0)
    }
}

/// Parameters of one biome.
///
/// The fourth displacement layer re-samples `mountain_height`;
/// `mountain_detail` is stored, serialized, and randomized but does not feed
/// the displacement sum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeEntry {
    /// Display name.
    pub name: String,
    /// Temperate interval this biome claims.
    pub temperate: BiomeRange,
    /// Fertility interval this biome claims.
    pub fertility: BiomeRange,
    /// Broad terrain shape.
    pub terrain_height: NoiseSettings,
    /// Fine terrain shape.
    pub terrain_detail: NoiseSettings,
    /// Ridged mountain shape.
    pub mountain_height: NoiseSettings,
    /// Ridged mountain detail.
    pub mountain_detail: NoiseSettings,
}

impl Default for BiomeEntry {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            temperate: BiomeRange::new(0.0, 1.0),
            fertility: BiomeRange::new(0.0, 1.0),
            terrain_height: NoiseSettings::default(),
            terrain_detail: NoiseSettings::default(),
            mountain_height: NoiseSettings::default(),
            mountain_detail: NoiseSettings::default(),
        }
    }
}

impl BiomeEntry {
    /// Filler for unused table slots: unreachable ranges and silent noise.
    #[must_use]
    pub fn padding() -> Self {
        Self {
            name: String::new(),
            temperate: BiomeRange::UNREACHABLE,
            fertility: BiomeRange::UNREACHABLE,
            terrain_height: NoiseSettings::silent(),
            terrain_detail: NoiseSettings::silent(),
            mountain_height: NoiseSettings::silent(),
            mountain_detail: NoiseSettings::silent(),
        }
    }

    /// Displacement before weighting:
    /// `terrain_height + terrain_detail + 2 × mountain_height`.
    #[must_use]
    pub fn layer_sum(&self, field: &NoiseField, point: DVec3) -> f64 {
        let t_height = field.evaluate(point, &self.terrain_height);
        let t_detail = field.evaluate(point, &self.terrain_detail);
        let m_height = field.evaluate(point, &self.mountain_height);
        let m_detail = field.evaluate(point, &self.mountain_height);
        t_height + t_detail + m_height + m_detail
    }

    /// Redraw all four displacement layers within the standard ranges.
    ///
    /// Offsets land within ±10000, octaves become 2, persistence 1, and
    /// lacunarity 2. Terrain layers are smooth Perlin and mountain layers are
    /// rigid Perlin. Biome ranges are left alone.
    pub fn randomize_displacement<R: Rng>(&mut self, rng: &mut R) {
        randomize_layer(&mut self.terrain_height, rng, 1.0..2.5, 2.5..25.0, false);
        randomize_layer(&mut self.terrain_detail, rng, 2.5..10.0, 1.25..12.5, false);
        randomize_layer(&mut self.mountain_height, rng, 1.0..7.5, 2.5..25.0, true);
        randomize_layer(&mut self.mountain_detail, rng, 2.5..10.0, 2.5..25.0, true);
    }
}

fn randomize_layer<R: Rng>(
    layer: &mut NoiseSettings,
    rng: &mut R,
    frequency: std::ops::Range<f64>,
    strength: std::ops::Range<f64>,
    rigid: bool,
) {
    layer.randomize_offset(rng);
    layer.noise_type = NoiseType::Perlin;
    layer.frequency = rng.random_range(frequency);
    layer.octaves = 2;
    layer.strength = rng.random_range(strength);
    layer.persistence = 1.0;
    layer.lacunarity = 2.0;
    layer.is_rigid = rigid;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_dim_boundaries() {
        let range = BiomeRange::new(0.0, 10.0);
        assert_eq!(range.dim(5.0), 1.0, "dim at the center must be exactly 1");
        assert!(range.dim(0.0).abs() < 1e-12, "dim at min must be 0");
        assert!(range.dim(10.0).abs() < 1e-12, "dim at max must be 0");
        assert_eq!(range.dim(-0.5), 0.0, "dim below min clamps to 0");
        assert_eq!(range.dim(42.0), 0.0, "dim above max clamps to 0");
    }

    #[test]
    fn test_dim_is_quartic() {
        let range = BiomeRange::new(0.0, 10.0);
        // Half way from center to edge: 1 - 0.5^4.
        assert!((range.dim(7.5) - (1.0 - 0.0625)).abs() < 1e-12);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = BiomeRange::new(0.2, 0.4);
        assert!(range.contains(0.2));
        assert!(range.contains(0.4));
        assert!(!range.contains(0.4 + 1e-9));
        assert!(!BiomeRange::UNREACHABLE.contains(0.5));
    }

    #[test]
    fn test_layer_sum_counts_mountain_height_twice() {
        let field = NoiseField::default();
        let layer = NoiseSettings {
            offset: DVec3::new(0.5, 0.25, 0.125),
            ..Default::default()
        };
        let entry = BiomeEntry {
            terrain_height: NoiseSettings::silent(),
            terrain_detail: NoiseSettings::silent(),
            mountain_height: layer,
            mountain_detail: NoiseSettings {
                strength: 1000.0,
                ..layer
            },
            ..Default::default()
        };
        let p = DVec3::new(0.3, 0.6, 0.2);
        let expected = 2.0 * field.evaluate(p, &layer);
        assert!((entry.layer_sum(&field, p) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_padding_is_silent() {
        let field = NoiseField::default();
        let pad = BiomeEntry::padding();
        assert_eq!(pad.layer_sum(&field, DVec3::new(0.1, 0.9, 0.4)), 0.0);
    }

    #[test]
    fn test_randomize_displacement_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let mut entry = BiomeEntry::default();
            entry.randomize_displacement(&mut rng);
            assert!((1.0..2.5).contains(&entry.terrain_height.frequency));
            assert!((2.5..25.0).contains(&entry.terrain_height.strength));
            assert!((2.5..10.0).contains(&entry.terrain_detail.frequency));
            assert!((1.25..12.5).contains(&entry.terrain_detail.strength));
            assert!((1.0..7.5).contains(&entry.mountain_height.frequency));
            assert!((2.5..25.0).contains(&entry.mountain_detail.strength));
            assert!(!entry.terrain_height.is_rigid && entry.mountain_height.is_rigid);
            for layer in [entry.terrain_height, entry.mountain_detail] {
                assert_eq!(layer.octaves, 2);
                assert_eq!(layer.persistence, 1.0);
                assert_eq!(layer.lacunarity, 2.0);
                assert!(layer.offset.abs().max_element() <= 10_000.0);
            }
        }
    }
}
