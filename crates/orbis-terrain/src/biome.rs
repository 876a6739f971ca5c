//! Biome system: temperate/fertility ranges, per-biome displacement layers,
//! and the fixed-capacity table that turns two noise channels into blend
//! weights.

mod assignment;
mod entry;
mod table;

pub use assignment::BiomeAssignmentSettings;
pub use entry::{BiomeEntry, BiomeRange};
pub use table::{BiomeTable, BiomeTableError, BiomeWeights, MAX_BIOMES};
