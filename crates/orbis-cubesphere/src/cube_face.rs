//! The six faces of a cubesphere and the orthonormal basis each face is
//! meshed in.

use glam::DVec3;

/// The six faces of the cube that is inflated into the planet sphere.
///
/// Each variant corresponds to a face whose outward normal points
/// along the named axis direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    /// +X face
    PosX = 0,
    /// −X face
    NegX = 1,
    /// +Y face
    PosY = 2,
    /// −Y face
    NegY = 3,
    /// +Z face
    PosZ = 4,
    /// −Z face
    NegZ = 5,
}

impl CubeFace {
    /// All six faces in the order the planet builds them: up, down, left,
    /// right, forward, back.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::NegX,
        CubeFace::PosX,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Outward-pointing unit normal, the face's `localUp`.
    #[must_use]
    pub fn normal(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::X,
            CubeFace::NegX => DVec3::NEG_X,
            CubeFace::PosY => DVec3::Y,
            CubeFace::NegY => DVec3::NEG_Y,
            CubeFace::PosZ => DVec3::Z,
            CubeFace::NegZ => DVec3::NEG_Z,
        }
    }

    /// `axisA`: the in-face direction patches call north.
    #[must_use]
    pub fn axis_a(self) -> DVec3 {
        match self {
            CubeFace::PosX | CubeFace::NegX | CubeFace::PosZ | CubeFace::NegZ => DVec3::Y,
            CubeFace::PosY => DVec3::NEG_Z,
            CubeFace::NegY => DVec3::Z,
        }
    }

    /// `axisB`: the in-face direction patches call east.
    #[must_use]
    pub fn axis_b(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::NEG_Z,
            CubeFace::NegX => DVec3::Z,
            CubeFace::PosY | CubeFace::NegY | CubeFace::PosZ => DVec3::X,
            CubeFace::NegZ => DVec3::NEG_X,
        }
    }

    /// The full basis for this face.
    #[must_use]
    pub fn basis(self) -> FaceBasis {
        FaceBasis {
            local_up: self.normal(),
            axis_a: self.axis_a(),
            axis_b: self.axis_b(),
        }
    }
}

/// Orthonormal frame of one cube face.
///
/// `axis_b × axis_a == local_up`, so east-then-north winds counter-clockwise
/// seen from outside the planet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBasis {
    /// Outward face normal.
    pub local_up: DVec3,
    /// North.
    pub axis_a: DVec3,
    /// East.
    pub axis_b: DVec3,
}

impl FaceBasis {
    /// Map a unit-square template coordinate onto the cube.
    ///
    /// `tx` runs west (−1) to east (+1); `ty` runs north (−1) to south (+1),
    /// matching template rows, which are laid out north first.
    #[must_use]
    pub fn cube_point(&self, center: DVec3, radius: f64, tx: f64, ty: f64) -> DVec3 {
        center + self.axis_b * (tx * radius) - self.axis_a * (ty * radius)
    }
}
