//! Planet level of detail: per-face quadtree sweeps, neighbor-mask
//! refresh, and off-thread patch generation with stale-result discard.

mod distances;
mod error;
mod face_tree;
mod pipeline;
mod planet;
mod timer;

pub use distances::DetailDistances;
pub use error::LodError;
pub use face_tree::{
    FaceStatistics, FaceTree, LeafView, MeshSlot, NodeState, PatchKey, PatchRequest, PatchResult,
    SweepReport,
};
pub use pipeline::GenerationPipeline;
pub use planet::{LodSettings, PlanetLod, TickReport};
pub use timer::{DEFAULT_INITIAL_DELAY, DEFAULT_INTERVAL, MaintenanceTimer};
