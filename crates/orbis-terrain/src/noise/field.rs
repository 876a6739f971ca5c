//! Layered noise evaluation.

use glam::DVec3;
use noise::NoiseFn;
use rand::Rng;

use super::{CellularNoise, GradientNoise, NoiseSettings, NoiseType, PermutationTable};

/// A noise source bound to one permutation table.
///
/// Evaluation is a pure function of the table, the point, and the settings,
/// so fields can be shared freely across worker threads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoiseField {
    table: PermutationTable,
}

impl NoiseField {
    /// Field over an explicit table.
    #[must_use]
    pub fn new(table: PermutationTable) -> Self {
        Self { table }
    }

    /// Field over a reproducible table derived from `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::new(PermutationTable::from_seed(seed))
    }

    /// A freshly reseeded field. Meshes built from the previous field are
    /// stale once this replaces it.
    pub fn randomized<R: Rng>(rng: &mut R) -> Self {
        Self::new(PermutationTable::randomized(rng))
    }

    /// The table this field hashes through.
    #[must_use]
    pub fn table(&self) -> &PermutationTable {
        &self.table
    }

    /// Evaluate one layered noise value.
    ///
    /// Perlin: the scaled octave sum, folded to `|sum|` when rigid.
    /// Cellular: the scaled distance channel, or the scaled cell channel
    /// when rigid.
    #[must_use]
    pub fn evaluate(&self, point: DVec3, settings: &NoiseSettings) -> f64 {
        let (raw, second) = self.evaluate2(point, settings);
        if settings.is_rigid { second } else { raw }
    }

    /// Evaluate both channels.
    ///
    /// Cellular returns `(distance, cell)`. Perlin returns `(sum, |sum|)`.
    #[must_use]
    pub fn evaluate2(&self, point: DVec3, settings: &NoiseSettings) -> (f64, f64) {
        match settings.noise_type {
            NoiseType::Perlin => {
                let sum = layered(&GradientNoise::new(&self.table), point, settings);
                (sum, (-sum).abs())
            }
            NoiseType::Cellular => {
                let cellular = CellularNoise::new(&self.table);
                let mut distance = 0.0;
                let mut cell = 0.0;
                for_each_octave(point, settings, |p, amplitude| {
                    let (d, c) = cellular.sample(p.to_array());
                    distance += d * amplitude;
                    cell += c * amplitude;
                });
                (distance * settings.strength, cell * settings.strength)
            }
        }
    }
}

fn for_each_octave(point: DVec3, settings: &NoiseSettings, mut f: impl FnMut(DVec3, f64)) {
    let p = point + settings.offset;
    let mut frequency = settings.frequency;
    let mut amplitude = 1.0;
    for _ in 0..settings.octaves {
        f(p * frequency, amplitude);
        frequency *= settings.lacunarity;
        amplitude *= settings.persistence;
    }
}

fn layered<N: NoiseFn<f64, 3>>(noise: &N, point: DVec3, settings: &NoiseSettings) -> f64 {
    let mut sum = 0.0;
    for_each_octave(point, settings, |p, amplitude| {
        sum += noise.get(p.to_array()) * amplitude;
    });
    sum * settings.strength
}
