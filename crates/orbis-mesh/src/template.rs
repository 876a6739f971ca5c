//! Stitching templates: one triangulation of the `(R+1)×(R+1)` patch grid per
//! neighbor mask.
//!
//! Every template is produced by the same generator. Cells are split along
//! the anti-diagonal. On a side whose neighbor is coarser, each odd edge
//! vertex is folded onto the even vertex before it, so that side only
//! references vertices the coarser neighbor also has. Triangles that fold
//! flat are dropped. The one cell where folding would leave a sliver (the
//! south-east corner with both of its sides coarse) is split along the other
//! diagonal instead.
//!
//! Cells that touch no patch edge triangulate identically in all sixteen
//! templates.

use std::sync::Arc;

use glam::{DVec2, Vec2};
use orbis_cubesphere::{EdgeDirection, NeighborMask};

/// Smallest supported mesh resolution.
pub const MIN_RESOLUTION: u32 = 2;
/// Largest supported mesh resolution.
pub const MAX_RESOLUTION: u32 = 64;

/// Errors from building a [`TemplateLibrary`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    /// Coarse edges pair up cells, so the cell count per side must be even.
    #[error("mesh resolution {0} is odd, it must be even")]
    OddResolution(u32),

    /// Resolution outside the supported range.
    #[error("mesh resolution {resolution} is outside [{min}, {max}]")]
    OutOfRange {
        /// Requested resolution.
        resolution: u32,
        /// Smallest supported value.
        min: u32,
        /// Largest supported value.
        max: u32,
    },
}

/// Check that a library can be built for `resolution` without building it.
///
/// # Errors
///
/// Same conditions as [`TemplateLibrary::new`].
pub fn check_resolution(resolution: u32) -> Result<(), TemplateError> {
    if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
        return Err(TemplateError::OutOfRange {
            resolution,
            min: MIN_RESOLUTION,
            max: MAX_RESOLUTION,
        });
    }
    if resolution % 2 != 0 {
        return Err(TemplateError::OddResolution(resolution));
    }
    Ok(())
}

/// The triangulation for one neighbor mask.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    mask: NeighborMask,
    resolution: u32,
    positions: Arc<[DVec2]>,
    uvs: Arc<[Vec2]>,
    triangles: Vec<u32>,
    edge_indices: [Vec<u32>; 4],
}

impl Template {
    /// The mask this template stitches for.
    #[must_use]
    pub fn mask(&self) -> NeighborMask {
        self.mask
    }

    /// Cells per side.
    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Vertices per side, `R + 1`.
    #[must_use]
    pub fn side(&self) -> u32 {
        self.resolution + 1
    }

    /// Unit-square positions in `[-1, 1]²`, row-major from the north-west
    /// corner. Shared by every template of a library.
    #[must_use]
    pub fn positions(&self) -> &[DVec2] {
        &self.positions
    }

    /// Per-vertex UVs, `(x / (R+1), y / (R+1))`.
    #[must_use]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    /// Triangle list, three indices per triangle, counter-clockwise seen from
    /// outside the planet.
    #[must_use]
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Vertex indices the triangles use along `side`, in grid order (west to
    /// east for north/south, north to south for east/west).
    #[must_use]
    pub fn edge_indices(&self, side: EdgeDirection) -> &[u32] {
        &self.edge_indices[side as usize]
    }
}

/// All sixteen templates for one resolution. Built once, then shared
/// read-only by every patch.
#[derive(Clone, Debug)]
pub struct TemplateLibrary {
    resolution: u32,
    templates: Vec<Arc<Template>>,
}

impl TemplateLibrary {
    /// Generate the library.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if `resolution` is odd or outside
    /// [`MIN_RESOLUTION`]`..=`[`MAX_RESOLUTION`].
    pub fn new(resolution: u32) -> Result<Self, TemplateError> {
        check_resolution(resolution)?;

        let grid = Grid::new(resolution);
        let positions: Arc<[DVec2]> = grid.positions().into();
        let uvs: Arc<[Vec2]> = grid.uvs().into();
        let templates = NeighborMask::all()
            .map(|mask| {
                Arc::new(Template {
                    mask,
                    resolution,
                    positions: Arc::clone(&positions),
                    uvs: Arc::clone(&uvs),
                    triangles: grid.triangulate(mask),
                    edge_indices: EdgeDirection::ALL.map(|side| grid.edge_indices(mask, side)),
                })
            })
            .collect();

        Ok(Self {
            resolution,
            templates,
        })
    }

    /// Cells per side.
    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// The template for `mask`.
    #[must_use]
    pub fn get(&self, mask: NeighborMask) -> &Arc<Template> {
        &self.templates[mask.index()]
    }
}

type Cell = (u32, u32);

struct Grid {
    r: u32,
}

impl Grid {
    fn new(r: u32) -> Self {
        Self { r }
    }

    fn index(&self, (x, y): Cell) -> u32 {
        y * (self.r + 1) + x
    }

    fn positions(&self) -> Vec<DVec2> {
        let half = f64::from(self.r) / 2.0;
        self.vertices()
            .map(|(x, y)| DVec2::new((f64::from(x) - half) / half, (f64::from(y) - half) / half))
            .collect()
    }

    fn uvs(&self) -> Vec<Vec2> {
        let side = (self.r + 1) as f32;
        self.vertices()
            .map(|(x, y)| Vec2::new(x as f32 / side, y as f32 / side))
            .collect()
    }

    fn vertices(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..=self.r).flat_map(move |y| (0..=self.r).map(move |x| (x, y)))
    }

    /// Fold an odd vertex on a coarse side onto its even predecessor.
    fn fold(&self, mask: NeighborMask, (mut x, mut y): Cell) -> Cell {
        let odd_x = x % 2 == 1;
        let odd_y = y % 2 == 1;
        if odd_x
            && ((y == 0 && mask.is_coarser(EdgeDirection::North))
                || (y == self.r && mask.is_coarser(EdgeDirection::South)))
        {
            x -= 1;
        }
        if odd_y
            && ((x == 0 && mask.is_coarser(EdgeDirection::West))
                || (x == self.r && mask.is_coarser(EdgeDirection::East)))
        {
            y -= 1;
        }
        (x, y)
    }

    fn triangulate(&self, mask: NeighborMask) -> Vec<u32> {
        let mut triangles = Vec::with_capacity((self.r * self.r * 6) as usize);
        for y in 0..self.r {
            for x in 0..self.r {
                let [a, b, c, d] =
                    [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)].map(|v| self.fold(mask, v));
                let mut split = [[a, c, b], [b, c, d]];
                if split.iter().any(|&t| is_sliver(t)) {
                    split = [[a, c, d], [a, d, b]];
                }
                for t in split {
                    if doubled_area(t) != 0 {
                        triangles.extend(t.map(|v| self.index(v)));
                    }
                }
            }
        }
        triangles
    }

    fn edge_indices(&self, mask: NeighborMask, side: EdgeDirection) -> Vec<u32> {
        let coarse = mask.is_coarser(side);
        (0..=self.r)
            .filter(|i| !coarse || i % 2 == 0)
            .map(|i| {
                let v = match side {
                    EdgeDirection::East => (self.r, i),
                    EdgeDirection::West => (0, i),
                    EdgeDirection::North => (i, 0),
                    EdgeDirection::South => (i, self.r),
                };
                self.index(v)
            })
            .collect()
    }
}

/// Twice the signed area in grid coordinates (`y` pointing south). Negative
/// for triangles that are counter-clockwise seen from outside.
fn doubled_area([a, b, c]: [Cell; 3]) -> i64 {
    let (ax, ay) = (i64::from(a.0), i64::from(a.1));
    let (bx, by) = (i64::from(b.0), i64::from(b.1));
    let (cx, cy) = (i64::from(c.0), i64::from(c.1));
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// Three distinct vertices on one line.
fn is_sliver(t: [Cell; 3]) -> bool {
    t[0] != t[1] && t[1] != t[2] && t[0] != t[2] && doubled_area(t) == 0
}
