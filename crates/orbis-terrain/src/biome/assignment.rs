//! Global settings that place biomes on the sphere.

use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::BiomeTableError;
use crate::noise::NoiseSettings;

/// Noise channels and blending constants shared by all biomes.
///
/// Smaller channel strengths produce larger biomes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeAssignmentSettings {
    /// Height above the water line drawn with shore materials. Renderer pass-through.
    pub shore_offset: f64,
    /// Shore material transition width in `[1, 32]`. Renderer pass-through.
    pub shore_fade: f64,
    /// Divisor in `[1, 32]` for how fast ocean displacement takes over as
    /// land weight fades.
    pub ocean_overtake_fade: f64,
    /// Exponent in `[0, 1]` of the latitude mask on the temperate channel.
    pub temperate_zone_scale: f64,
    /// Temperate channel.
    pub temperate: NoiseSettings,
    /// Fertility channel.
    pub fertility: NoiseSettings,
}

impl Default for BiomeAssignmentSettings {
    fn default() -> Self {
        Self {
            shore_offset: 2.0,
            shore_fade: 4.0,
            ocean_overtake_fade: 1.0,
            temperate_zone_scale: 0.5,
            temperate: NoiseSettings {
                offset: DVec3::new(731.0, -215.0, 90.0),
                frequency: 0.5,
                strength: 1.0,
                persistence: 1.0,
                ..NoiseSettings::default()
            },
            fertility: NoiseSettings {
                offset: DVec3::new(-4_012.0, 377.0, 1_598.0),
                frequency: 0.75,
                strength: 1.0,
                persistence: 1.0,
                ..NoiseSettings::default()
            },
        }
    }
}

impl BiomeAssignmentSettings {
    /// Check every bounded field.
    pub fn validate(&self) -> Result<(), BiomeTableError> {
        check_range("temperate_zone_scale", self.temperate_zone_scale, 0.0, 1.0)?;
        check_range("ocean_overtake_fade", self.ocean_overtake_fade, 1.0, 32.0)?;
        check_range("shore_fade", self.shore_fade, 1.0, 32.0)?;
        for (layer, settings) in [("temperate", &self.temperate), ("fertility", &self.fertility)] {
            if settings.octaves == 0 {
                return Err(BiomeTableError::ZeroOctaves {
                    biome: "assignment".to_string(),
                    layer,
                });
            }
        }
        Ok(())
    }

    /// Redraw the temperate and fertility channels: offsets within ±10000,
    /// frequency in `[0.25, 1)`, one octave, strength in `[0.05, 1)`,
    /// persistence 1, lacunarity 2.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        for channel in [&mut self.temperate, &mut self.fertility] {
            channel.randomize_offset(rng);
            channel.frequency = rng.random_range(0.25..1.0);
            channel.octaves = 1;
            channel.strength = rng.random_range(0.05..1.0);
            channel.persistence = 1.0;
            channel.lacunarity = 2.0;
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), BiomeTableError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(BiomeTableError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
