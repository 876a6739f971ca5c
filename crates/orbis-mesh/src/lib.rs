//! Patch meshing: the sixteen stitching templates, renderer channel packing,
//! and the parallel patch generator.

mod packing;
mod patch;
mod template;

pub use packing::{BiomeChannels, FLAT_WATER, is_flat_water, pack_water_slope};
pub use patch::{
    PatchGenerator, PatchMesh, PatchTransform, PlanetShape, TerrainVertex, WaterVertex,
};
pub use template::{
    MAX_RESOLUTION, MIN_RESOLUTION, Template, TemplateError, TemplateLibrary, check_resolution,
};
