//! One cube face: the quadtree, its split/merge sweep, neighbor masks, and
//! the mesh slot of every leaf.

use std::sync::Arc;

use glam::DVec3;
use orbis_cubesphere::{CubeFace, MAX_DEPTH, NeighborMask, QuadNode};
use orbis_mesh::{PatchMesh, PatchTransform};

use crate::{DetailDistances, LodError};

/// Identity of a node: face, depth, and base-4 path hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchKey {
    /// Face the node lives on.
    pub face: CubeFace,
    /// Depth below the face root.
    pub detail_level: u8,
    /// Path hash.
    pub hash: u64,
}

/// A snapshot of everything needed to mesh one leaf off-thread.
#[derive(Clone, Debug)]
pub struct PatchRequest {
    /// Leaf to mesh.
    pub key: PatchKey,
    /// Generation the result must carry to be accepted.
    pub generation: u64,
    /// Patch placement.
    pub transform: PatchTransform,
    /// Stitching mask at request time.
    pub mask: NeighborMask,
}

/// A finished mesh addressed to the leaf that requested it.
#[derive(Debug)]
pub struct PatchResult {
    /// Leaf the mesh belongs to.
    pub key: PatchKey,
    /// Generation copied from the request.
    pub generation: u64,
    /// The mesh.
    pub mesh: PatchMesh,
}

/// Mesh state of a node.
#[derive(Clone, Debug, Default)]
pub enum MeshSlot {
    /// Nothing generated or requested.
    #[default]
    Absent,
    /// A request is in flight and nothing is shown yet.
    Pending {
        /// Generation of the outstanding request.
        generation: u64,
    },
    /// Mesh matches the node's current mask.
    Ready {
        /// The mesh.
        mesh: Arc<PatchMesh>,
    },
    /// Mesh was built for an older mask. It stays visible until the
    /// replacement commits.
    Stale {
        /// The outdated mesh.
        mesh: Arc<PatchMesh>,
        /// Outstanding replacement request, if one was dispatched.
        generation: Option<u64>,
    },
}

impl MeshSlot {
    /// Generation of an outstanding request, if any.
    #[must_use]
    pub fn pending_generation(&self) -> Option<u64> {
        match self {
            MeshSlot::Pending { generation } => Some(*generation),
            MeshSlot::Stale { generation, .. } => *generation,
            MeshSlot::Absent | MeshSlot::Ready { .. } => None,
        }
    }

    /// The mesh to draw, current or stale.
    #[must_use]
    pub fn mesh(&self) -> Option<&Arc<PatchMesh>> {
        match self {
            MeshSlot::Ready { mesh } | MeshSlot::Stale { mesh, .. } => Some(mesh),
            MeshSlot::Absent | MeshSlot::Pending { .. } => None,
        }
    }

    fn needs_request(&self) -> bool {
        matches!(
            self,
            MeshSlot::Absent | MeshSlot::Stale { generation: None, .. }
        )
    }
}

/// Per-node data the face tree keeps.
#[derive(Clone, Debug, Default)]
pub struct NodeState {
    /// Mesh slot.
    pub slot: MeshSlot,
    /// Mask from the most recent refresh.
    pub mask: NeighborMask,
}

impl NodeState {
    /// Record a new mask. A mesh built for the old mask becomes stale and
    /// any outstanding request is orphaned. Returns whether the mask changed.
    fn set_mask(&mut self, mask: NeighborMask) -> bool {
        if mask == self.mask {
            return false;
        }
        self.mask = mask;
        self.slot = match std::mem::take(&mut self.slot) {
            MeshSlot::Ready { mesh } | MeshSlot::Stale { mesh, .. } => MeshSlot::Stale {
                mesh,
                generation: None,
            },
            MeshSlot::Absent | MeshSlot::Pending { .. } => MeshSlot::Absent,
        };
        true
    }
}

/// What a sweep changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Leaves split.
    pub splits: usize,
    /// Internal nodes collapsed back to leaves.
    pub merges: usize,
    /// Outstanding requests whose node disappeared or stopped being a leaf.
    pub orphaned: Vec<PatchKey>,
}

/// A leaf as seen by a mesh consumer.
#[derive(Clone, Debug)]
pub struct LeafView<'a> {
    /// Identity.
    pub key: PatchKey,
    /// Current mask.
    pub mask: NeighborMask,
    /// Patch center on the cube.
    pub position: DVec3,
    /// Half extent.
    pub radius: f64,
    /// Mesh to draw, possibly stale.
    pub mesh: Option<&'a Arc<PatchMesh>>,
}

/// Counts over one face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceStatistics {
    /// All nodes.
    pub nodes: usize,
    /// Leaves.
    pub leaves: usize,
    /// Leaves with a current mesh.
    pub ready: usize,
    /// Leaves showing an outdated mesh.
    pub stale: usize,
    /// Leaves waiting on their first mesh.
    pub pending: usize,
    /// Deepest leaf.
    pub deepest: u8,
}

impl std::ops::AddAssign for FaceStatistics {
    fn add_assign(&mut self, other: Self) {
        self.nodes += other.nodes;
        self.leaves += other.leaves;
        self.ready += other.ready;
        self.stale += other.stale;
        self.pending += other.pending;
        self.deepest = self.deepest.max(other.deepest);
    }
}

/// The quadtree of one cube face.
///
/// Mutation happens only through [`update`](Self::update),
/// [`refresh_masks`](Self::refresh_masks),
/// [`pending_requests`](Self::pending_requests) and
/// [`commit`](Self::commit), all on the owning thread. Workers only ever see
/// [`PatchRequest`] snapshots.
#[derive(Debug)]
pub struct FaceTree {
    face: CubeFace,
    half_extent: f64,
    max_depth: u8,
    root: QuadNode<NodeState>,
    next_generation: u64,
}

impl FaceTree {
    /// A face of a cube with the given half extent, split at most
    /// `max_depth` times.
    ///
    /// # Errors
    ///
    /// Fails if `max_depth` is outside `1..=MAX_DEPTH`.
    pub fn new(face: CubeFace, half_extent: f64, max_depth: u8) -> Result<Self, LodError> {
        if !(1..=MAX_DEPTH).contains(&max_depth) {
            return Err(LodError::DepthOutOfRange(max_depth));
        }
        Ok(Self {
            face,
            half_extent,
            max_depth,
            root: QuadNode::root(face.basis(), half_extent),
            next_generation: 0,
        })
    }

    /// Which face this tree covers.
    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// Deepest allowed split.
    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Read-only access to the tree.
    #[must_use]
    pub fn root(&self) -> &QuadNode<NodeState> {
        &self.root
    }

    /// Drop every node and mesh and start again from a bare root.
    ///
    /// Generation numbers keep counting, so results requested before the
    /// reset can never be committed after it.
    pub fn reset(&mut self) -> Vec<PatchKey> {
        let face = self.face;
        let mut orphaned = Vec::new();
        self.root.merge_with(|node| orphan(face, node, &mut orphaned));
        orphan(face, &mut self.root, &mut orphaned);
        self.root = QuadNode::root(face.basis(), self.half_extent);
        orphaned
    }

    /// Split/merge sweep against `viewer`.
    ///
    /// A node splits when its nearest potential child is within its depth's
    /// threshold and it is above `max_depth`; an internal node that fails
    /// the same test merges. New children are tested immediately, so one
    /// sweep can descend several levels.
    pub fn update(&mut self, viewer: DVec3, distances: &DetailDistances) -> SweepReport {
        let mut report = SweepReport::default();
        update_node(
            self.face,
            &mut self.root,
            viewer,
            distances,
            self.max_depth,
            &mut report,
        );
        report
    }

    /// Recompute every leaf's neighbor mask against the current tree.
    ///
    /// Masks are computed for all leaves before any is written. Returns
    /// how many leaves changed mask.
    pub fn refresh_masks(&mut self) -> usize {
        let masks: Vec<NeighborMask> = self
            .root
            .leaves()
            .iter()
            .map(|leaf| self.root.neighbor_mask_of(leaf.hash(), leaf.detail_level()))
            .collect();
        let mut masks = masks.into_iter();
        let mut changed = 0;
        self.root.for_each_leaf_mut(&mut |leaf| {
            if let Some(mask) = masks.next()
                && leaf.payload.set_mask(mask)
            {
                changed += 1;
            }
        });
        changed
    }

    /// Requests for at most `limit` leaves that lack a current mesh. Each
    /// gets a fresh generation and is marked as waiting.
    pub fn pending_requests(&mut self, limit: usize) -> Vec<PatchRequest> {
        let face = self.face;
        let mut generation = self.next_generation;
        let mut requests = Vec::new();
        self.root.for_each_leaf_mut(&mut |leaf| {
            if requests.len() >= limit || !leaf.payload.slot.needs_request() {
                return;
            }
            leaf.payload.slot = match std::mem::take(&mut leaf.payload.slot) {
                MeshSlot::Stale { mesh, .. } => MeshSlot::Stale {
                    mesh,
                    generation: Some(generation),
                },
                _ => MeshSlot::Pending { generation },
            };
            requests.push(PatchRequest {
                key: key_of(face, leaf),
                generation,
                transform: PatchTransform {
                    basis: leaf.basis(),
                    center: leaf.position(),
                    radius: leaf.radius(),
                },
                mask: leaf.payload.mask,
            });
            generation += 1;
        });
        self.next_generation = generation;
        requests
    }

    /// Put a request that could not be dispatched back into the queue.
    pub fn release(&mut self, request: &PatchRequest) {
        let Some(node) = self
            .root
            .find_mut(request.key.hash, request.key.detail_level)
        else {
            return;
        };
        if node.payload.slot.pending_generation() != Some(request.generation) {
            return;
        }
        node.payload.slot = match std::mem::take(&mut node.payload.slot) {
            MeshSlot::Stale { mesh, .. } => MeshSlot::Stale {
                mesh,
                generation: None,
            },
            _ => MeshSlot::Absent,
        };
    }

    /// Install a finished mesh.
    ///
    /// Accepted only if the addressed node still exists, is a leaf, and is
    /// waiting on exactly this generation. Returns whether it was installed.
    pub fn commit(&mut self, result: PatchResult) -> bool {
        let Some(node) = self
            .root
            .find_mut(result.key.hash, result.key.detail_level)
        else {
            return false;
        };
        if !node.is_leaf() || node.payload.slot.pending_generation() != Some(result.generation) {
            return false;
        }
        node.payload.slot = MeshSlot::Ready {
            mesh: Arc::new(result.mesh),
        };
        true
    }

    /// Every leaf in depth-first corner order.
    #[must_use]
    pub fn leaves(&self) -> Vec<LeafView<'_>> {
        self.root
            .leaves()
            .into_iter()
            .map(|leaf| LeafView {
                key: key_of(self.face, leaf),
                mask: leaf.payload.mask,
                position: leaf.position(),
                radius: leaf.radius(),
                mesh: leaf.payload.slot.mesh(),
            })
            .collect()
    }

    /// Node and slot counts.
    #[must_use]
    pub fn statistics(&self) -> FaceStatistics {
        let mut stats = FaceStatistics {
            nodes: self.root.node_count(),
            ..Default::default()
        };
        for leaf in self.root.leaves() {
            stats.leaves += 1;
            stats.deepest = stats.deepest.max(leaf.detail_level());
            match leaf.payload.slot {
                MeshSlot::Ready { .. } => stats.ready += 1,
                MeshSlot::Stale { .. } => stats.stale += 1,
                MeshSlot::Absent | MeshSlot::Pending { .. } => stats.pending += 1,
            }
        }
        stats
    }
}

fn key_of(face: CubeFace, node: &QuadNode<NodeState>) -> PatchKey {
    PatchKey {
        face,
        detail_level: node.detail_level(),
        hash: node.hash(),
    }
}

/// Clear a node's slot, recording its outstanding request.
fn orphan(face: CubeFace, node: &mut QuadNode<NodeState>, orphaned: &mut Vec<PatchKey>) {
    if node.payload.slot.pending_generation().is_some() {
        orphaned.push(key_of(face, node));
    }
    node.payload = NodeState::default();
}

fn update_node(
    face: CubeFace,
    node: &mut QuadNode<NodeState>,
    viewer: DVec3,
    distances: &DetailDistances,
    max_depth: u8,
    report: &mut SweepReport,
) {
    let depth = node.detail_level();
    let wants_split =
        depth < max_depth && distances.should_split(depth, node.min_child_distance(viewer));

    if wants_split {
        if node.is_leaf() && node.subdivide() {
            orphan(face, node, &mut report.orphaned);
            report.splits += 1;
        }
        if let Some(children) = node.children_mut() {
            for child in children.iter_mut() {
                update_node(face, child, viewer, distances, max_depth, report);
            }
        }
    } else if !node.is_leaf() {
        let orphaned = &mut report.orphaned;
        node.merge_with(|descendant| orphan(face, descendant, orphaned));
        report.merges += 1;
    }
}
