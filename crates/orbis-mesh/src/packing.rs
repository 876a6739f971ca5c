//! Vertex-channel packing shared with the renderer.
//!
//! Channel order is part of the renderer contract: biome slots 0-3 go to the
//! color, then two slots per UV set in order `uv1..uv4`.

use glam::DVec2;
use orbis_terrain::BiomeWeights;

/// Water slope written where the ocean floor is flat. Flat water is not
/// drawn. No normalized slope packs to this value.
pub const FLAT_WATER: [f32; 4] = [1.0, 1.0, 0.0, 0.0];

/// Biome weights spread over one color and four UV sets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BiomeChannels {
    /// Slots 0-3.
    pub color: [f32; 4],
    /// Slots 4-11, two per set.
    pub uv: [[f32; 2]; 4],
}

impl BiomeChannels {
    /// Pack twelve weights.
    #[must_use]
    pub fn pack(weights: &BiomeWeights) -> Self {
        let w = weights.0.map(|w| w as f32);
        Self {
            color: [w[0], w[1], w[2], w[3]],
            uv: [[w[4], w[5]], [w[6], w[7]], [w[8], w[9]], [w[10], w[11]]],
        }
    }
}

/// Pack a normalized ocean-floor slope as `(−gx, −gy, gy, gx)`, or
/// [`FLAT_WATER`] for a zero slope.
#[must_use]
pub fn pack_water_slope(gradient: DVec2) -> [f32; 4] {
    if gradient == DVec2::ZERO {
        return FLAT_WATER;
    }
    let g = gradient.as_vec2();
    [-g.x, -g.y, g.y, g.x]
}

/// `true` if a packed water slope marks a vertex that should not be drawn.
#[must_use]
pub fn is_flat_water(packed: [f32; 4]) -> bool {
    packed == FLAT_WATER
}
