//! Patch mesh generation: template grid → cube → displaced sphere surface.

use std::sync::Arc;

use glam::{DVec2, DVec3};
use orbis_cubesphere::{FaceBasis, NeighborMask};
use orbis_terrain::TerrainSampler;
use rayon::prelude::*;

use crate::packing::{BiomeChannels, pack_water_slope};
use crate::template::{Template, TemplateError, TemplateLibrary};

/// Planet-wide geometry shared by every patch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanetShape {
    /// Terrain reference diameter. Undisplaced terrain sits at half of it.
    pub diameter: f64,
    /// Radius of the water sphere.
    pub sea_level: f64,
    /// Emit terrain buffers.
    pub draw_terrain: bool,
    /// Emit water buffers.
    pub draw_water: bool,
}

impl Default for PlanetShape {
    fn default() -> Self {
        Self {
            diameter: 1000.0,
            sea_level: 500.0,
            draw_terrain: true,
            draw_water: true,
        }
    }
}

impl PlanetShape {
    /// Half the diameter.
    #[must_use]
    pub fn half_diameter(&self) -> f64 {
        self.diameter / 2.0
    }
}

/// Where a patch sits on its cube face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatchTransform {
    /// Face basis.
    pub basis: FaceBasis,
    /// Patch center on the cube, in world units.
    pub center: DVec3,
    /// Half extent of the patch.
    pub radius: f64,
}

impl PatchTransform {
    /// Map a template position in `[-1, 1]²` onto the cube.
    #[must_use]
    pub fn cube_point(&self, t: DVec2) -> DVec3 {
        self.basis.cube_point(self.center, self.radius, t.x, t.y)
    }
}

/// One terrain vertex, laid out for direct upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    /// Displaced world position.
    pub position: [f32; 3],
    /// Biome weights of slots 0-3.
    pub color: [f32; 4],
    /// Biome weights of slots 4-11, two per set.
    pub uv: [[f32; 2]; 4],
}

static_assertions::assert_eq_size!(TerrainVertex, [u8; 60]);

/// One water vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterVertex {
    /// Position on the sea-level sphere.
    pub position: [f32; 3],
    /// Packed ocean-floor slope, see [`crate::pack_water_slope`].
    pub slope: [f32; 4],
}

static_assertions::assert_eq_size!(WaterVertex, [u8; 28]);

/// A finished patch: per-vertex buffers plus the shared template that
/// indexes them.
#[derive(Clone, Debug)]
pub struct PatchMesh {
    mask: NeighborMask,
    template: Arc<Template>,
    terrain: Vec<TerrainVertex>,
    water: Vec<WaterVertex>,
}

impl PatchMesh {
    /// Mask the patch was stitched for.
    #[must_use]
    pub fn mask(&self) -> NeighborMask {
        self.mask
    }

    /// The template supplying triangles and UVs.
    #[must_use]
    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    /// Triangle indices into both vertex buffers.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        self.template.triangles()
    }

    /// Terrain vertices, empty when terrain drawing is off.
    #[must_use]
    pub fn terrain(&self) -> &[TerrainVertex] {
        &self.terrain
    }

    /// Water vertices, empty when water drawing is off.
    #[must_use]
    pub fn water(&self) -> &[WaterVertex] {
        &self.water
    }

    /// Terrain buffer as bytes.
    #[must_use]
    pub fn terrain_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.terrain)
    }

    /// Water buffer as bytes.
    #[must_use]
    pub fn water_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.water)
    }
}

/// Builds patch meshes. Immutable once constructed, so one generator is
/// shared by every worker.
#[derive(Debug)]
pub struct PatchGenerator {
    sampler: TerrainSampler,
    templates: TemplateLibrary,
    shape: PlanetShape,
}

impl PatchGenerator {
    /// Create a generator for meshes of `resolution` cells per side.
    ///
    /// # Errors
    ///
    /// Fails if no template library exists for `resolution`.
    pub fn new(
        sampler: TerrainSampler,
        shape: PlanetShape,
        resolution: u32,
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            sampler,
            templates: TemplateLibrary::new(resolution)?,
            shape,
        })
    }

    /// A generator with the same templates and shape but a different
    /// sampler. Used after reseeding or randomizing biomes.
    #[must_use]
    pub fn with_sampler(&self, sampler: TerrainSampler) -> Self {
        Self {
            sampler,
            templates: self.templates.clone(),
            shape: self.shape,
        }
    }

    /// Terrain sampler.
    #[must_use]
    pub fn sampler(&self) -> &TerrainSampler {
        &self.sampler
    }

    /// Template library.
    #[must_use]
    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    /// Planet geometry.
    #[must_use]
    pub fn shape(&self) -> &PlanetShape {
        &self.shape
    }

    /// Generate one patch. Vertices are evaluated in parallel and collected
    /// before returning.
    #[must_use]
    pub fn generate(&self, transform: &PatchTransform, mask: NeighborMask) -> PatchMesh {
        let template = Arc::clone(self.templates.get(mask));
        let positions = template.positions();
        let half = self.shape.half_diameter();
        let sea_level = self.shape.sea_level;

        let terrain = if self.shape.draw_terrain {
            positions
                .par_iter()
                .map(|&t| self.terrain_vertex(transform.cube_point(t) / half))
                .collect()
        } else {
            Vec::new()
        };

        let water = if self.shape.draw_water {
            positions
                .par_iter()
                .map(|&t| {
                    self.water_vertex(transform.cube_point(t) / sea_level, &transform.basis)
                })
                .collect()
        } else {
            Vec::new()
        };

        PatchMesh {
            mask,
            template,
            terrain,
            water,
        }
    }

    fn terrain_vertex(&self, point: DVec3) -> TerrainVertex {
        let sample = self.sampler.sample(point);
        let position = sample.direction * (self.shape.half_diameter() + sample.displacement);
        let channels = BiomeChannels::pack(&sample.weights);
        TerrainVertex {
            position: position.as_vec3().to_array(),
            color: channels.color,
            uv: channels.uv,
        }
    }

    fn water_vertex(&self, point: DVec3, basis: &FaceBasis) -> WaterVertex {
        let direction = point.normalize_or_zero();
        let gradient = self
            .sampler
            .ocean_gradient(point, basis.axis_a, basis.axis_b);
        WaterVertex {
            position: (direction * self.shape.sea_level).as_vec3().to_array(),
            slope: pack_water_slope(gradient),
        }
    }
}
