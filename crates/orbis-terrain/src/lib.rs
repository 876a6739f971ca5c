//! Procedural terrain evaluation: layered gradient/cellular noise, biome
//! classification, and per-point displacement for the planet surface.

pub mod biome;
pub mod noise;
mod sampler;

pub use biome::{
    BiomeAssignmentSettings, BiomeEntry, BiomeRange, BiomeTable, BiomeTableError, BiomeWeights,
    MAX_BIOMES,
};
pub use noise::{NoiseField, NoiseSettings, NoiseType, PermutationTable};
pub use sampler::{TerrainSample, TerrainSampler, WORLD_UP};
