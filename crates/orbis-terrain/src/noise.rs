//! Noise evaluation over an explicit permutation table.
//!
//! Every [`NoiseField`] carries its own [`PermutationTable`]; reseeding builds
//! a new field instead of mutating shared state, so a field is a pure
//! function of its table, the sample point, and the [`NoiseSettings`].

mod cellular;
mod field;
mod gradient;
mod permutation;
mod settings;

pub use cellular::CellularNoise;
pub use field::NoiseField;
pub use gradient::GradientNoise;
pub use permutation::PermutationTable;
pub use settings::{NoiseSettings, NoiseType};
