//! Cube-sphere topology: face bases, edge directions, neighbor masks, and the
//! hash-addressed per-face quadtree.

mod cube_face;
mod edge;
mod quadtree;

pub use cube_face::{CubeFace, FaceBasis};
pub use edge::{EdgeDirection, NeighborMask};
pub use quadtree::{Corner, MAX_DEPTH, QuadNode, neighbor_hash};
