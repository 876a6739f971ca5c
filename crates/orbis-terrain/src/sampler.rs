//! Per-point terrain evaluation: latitude-masked biome weights, weighted
//! displacement with ocean overtake, and the ocean-floor slope.

use glam::{DVec2, DVec3};

use crate::biome::{BiomeTable, BiomeWeights};
use crate::noise::NoiseField;

/// The direction the latitude mask measures from.
pub const WORLD_UP: DVec3 = DVec3::Y;

/// Finite-difference step for the ocean-floor gradient, in unit-cube space.
const GRADIENT_STEP: f64 = 0.1;

/// Result of sampling the terrain at one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainSample {
    /// Unit direction from the planet center.
    pub direction: DVec3,
    /// Blend weight of every biome slot.
    pub weights: BiomeWeights,
    /// Radial offset from the reference radius.
    pub displacement: f64,
}

/// Evaluates terrain at points on the unit cube.
///
/// Sample points are cube points scaled so the cube has half extent 1;
/// noise frequencies are expressed against that scale.
#[derive(Clone, Debug)]
pub struct TerrainSampler {
    field: NoiseField,
    biomes: BiomeTable,
}

impl TerrainSampler {
    /// Combine a noise field with a biome table.
    #[must_use]
    pub fn new(field: NoiseField, biomes: BiomeTable) -> Self {
        Self { field, biomes }
    }

    /// The noise field.
    #[must_use]
    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    /// The biome table.
    #[must_use]
    pub fn biomes(&self) -> &BiomeTable {
        &self.biomes
    }

    /// `clamp01(1 − |dir · up|^temperate_zone_scale)`.
    #[must_use]
    pub fn latitude_mask(&self, direction: DVec3) -> f64 {
        let scale = self.biomes.assignment().temperate_zone_scale;
        (1.0 - direction.dot(WORLD_UP).abs().powf(scale)).clamp(0.0, 1.0)
    }

    /// Biome weights at `point`.
    #[must_use]
    pub fn biome_weights(&self, point: DVec3) -> BiomeWeights {
        let assignment = self.biomes.assignment();
        let mask = self.latitude_mask(point.normalize_or_zero());
        let temperate = self.field.evaluate(point, &assignment.temperate) * mask;
        let fertility = self.field.evaluate(point, &assignment.fertility);
        self.biomes.classify(temperate, fertility)
    }

    /// Weighted land displacement minus the ocean overtake term.
    ///
    /// Biomes with zero weight are not sampled.
    #[must_use]
    pub fn displacement(&self, point: DVec3, weights: &BiomeWeights) -> f64 {
        let slots = self.biomes.slots();
        let land: f64 = weights
            .active()
            .map(|(slot, weight)| slots[slot].layer_sum(&self.field, point) * weight)
            .sum();
        let fade = self.biomes.assignment().ocean_overtake_fade;
        let overtake = 1.0 - (weights.total() / fade).clamp(0.0, 1.0);
        land - self.ocean_depth(point) * overtake
    }

    /// Absolute ocean-biome layer sum at `point`.
    #[must_use]
    pub fn ocean_depth(&self, point: DVec3) -> f64 {
        self.biomes.ocean().layer_sum(&self.field, point).abs()
    }

    /// Normalized ocean-floor slope along the patch axes, or zero on flat floor.
    #[must_use]
    pub fn ocean_gradient(&self, point: DVec3, axis_a: DVec3, axis_b: DVec3) -> DVec2 {
        let here = self.ocean_depth(point);
        let along_a = self.ocean_depth(point + axis_a * GRADIENT_STEP);
        let along_b = self.ocean_depth(point + axis_b * GRADIENT_STEP);
        DVec2::new(along_a - here, along_b - here).normalize_or_zero()
    }

    /// Full terrain sample at `point`.
    #[must_use]
    pub fn sample(&self, point: DVec3) -> TerrainSample {
        let weights = self.biome_weights(point);
        TerrainSample {
            direction: point.normalize_or_zero(),
            weights,
            displacement: self.displacement(point, &weights),
        }
    }
}
