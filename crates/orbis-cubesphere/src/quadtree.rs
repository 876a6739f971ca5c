//! Per-face quadtree addressed by base-4 path hashes.
//!
//! Child `i` of a node has hash `parent * 4 + i`, so the hash of a depth-`d`
//! node is its root path written two bits per level. Because the root and
//! every all-top-left descendant share hash `0`, lookups always pair a hash
//! with its depth. Nodes own their children outright; neighbor queries are
//! read-only walks down from the root by computed hash.

use glam::DVec3;

use crate::{EdgeDirection, FaceBasis, NeighborMask};

/// Deepest subdivision a `u64` path hash can address.
pub const MAX_DEPTH: u8 = 31;

/// Quadrant a node occupies inside its parent.
///
/// The discriminant is the node's low two hash bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Corner {
    /// North-west.
    TopLeft = 0,
    /// North-east.
    TopRight = 1,
    /// South-east.
    BottomRight = 2,
    /// South-west.
    BottomLeft = 3,
}

impl Corner {
    /// Child order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Corner encoded in the low two bits of `hash`.
    #[must_use]
    pub fn from_hash(hash: u64) -> Corner {
        match hash & 3 {
            0 => Corner::TopLeft,
            1 => Corner::TopRight,
            2 => Corner::BottomRight,
            _ => Corner::BottomLeft,
        }
    }

    /// `(north, east)` signs of the quadrant center relative to the parent center.
    #[must_use]
    pub fn offset_signs(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (1.0, -1.0),
            Corner::TopRight => (1.0, 1.0),
            Corner::BottomRight => (-1.0, 1.0),
            Corner::BottomLeft => (-1.0, -1.0),
        }
    }

    /// The two sides of this quadrant that lie on the parent's boundary.
    ///
    /// The other two sides always touch siblings of equal depth.
    #[must_use]
    pub fn outer_sides(self) -> [EdgeDirection; 2] {
        match self {
            Corner::TopLeft => [EdgeDirection::West, EdgeDirection::North],
            Corner::TopRight => [EdgeDirection::East, EdgeDirection::North],
            Corner::BottomRight => [EdgeDirection::East, EdgeDirection::South],
            Corner::BottomLeft => [EdgeDirection::West, EdgeDirection::South],
        }
    }
}

/// Hash of the equal-depth node across `side` of the node `(hash, depth)`.
///
/// Walks up two bits per level, mirroring each traversed group across the
/// query axis, until a group already lies on the near side of its parent.
/// Returns `None` when the walk runs off the face root: the neighbor is on a
/// different cube face.
#[must_use]
pub fn neighbor_hash(hash: u64, depth: u8, side: EdgeDirection) -> Option<u64> {
    let mirror: u64 = match side {
        EdgeDirection::North | EdgeDirection::South => 3,
        EdgeDirection::East | EdgeDirection::West => 1,
    };
    let mut mask = 0u64;
    let mut walked = hash;
    for level in 0..u32::from(depth) {
        let two = walked & 3;
        mask |= mirror << (2 * level);
        let crossed = match side {
            EdgeDirection::East => two == 0 || two == 3,
            EdgeDirection::West => two == 1 || two == 2,
            EdgeDirection::North => two == 2 || two == 3,
            EdgeDirection::South => two == 0 || two == 1,
        };
        if crossed {
            return Some(hash ^ mask);
        }
        walked >>= 2;
    }
    None
}

/// A node of a face quadtree: a square patch of the cube face.
///
/// A node has either no children (a renderable leaf) or exactly four.
/// `payload` is owned per node by whoever drives the tree.
#[derive(Debug, Clone)]
pub struct QuadNode<P> {
    hash: u64,
    detail_level: u8,
    corner: Option<Corner>,
    position: DVec3,
    radius: f64,
    basis: FaceBasis,
    children: Option<Box<[QuadNode<P>; 4]>>,
    /// Caller data attached to this node.
    pub payload: P,
}

impl<P: Default> QuadNode<P> {
    /// Root covering a whole face of a cube with the given half extent.
    #[must_use]
    pub fn root(basis: FaceBasis, half_extent: f64) -> Self {
        Self {
            hash: 0,
            detail_level: 0,
            corner: None,
            position: basis.local_up * half_extent,
            radius: half_extent,
            basis,
            children: None,
            payload: P::default(),
        }
    }

    /// Split this leaf into four children with halved radius.
    ///
    /// Returns `false` without changing anything if the node already has
    /// children or sits at [`MAX_DEPTH`].
    pub fn subdivide(&mut self) -> bool {
        if self.children.is_some() || self.detail_level >= MAX_DEPTH {
            return false;
        }
        let centers = self.child_centers();
        let children = Corner::ALL.map(|corner| QuadNode {
            hash: self.hash * 4 + corner as u64,
            detail_level: self.detail_level + 1,
            corner: Some(corner),
            position: centers[corner as usize],
            radius: self.radius * 0.5,
            basis: self.basis,
            children: None,
            payload: P::default(),
        });
        self.children = Some(Box::new(children));
        true
    }
}

impl<P> QuadNode<P> {
    /// Base-4 path hash.
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Depth below the face root.
    #[must_use]
    pub fn detail_level(&self) -> u8 {
        self.detail_level
    }

    /// Quadrant inside the parent; `None` for the root.
    #[must_use]
    pub fn corner(&self) -> Option<Corner> {
        self.corner
    }

    /// Patch center on the cube.
    #[must_use]
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Half the patch's side length.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Basis of the face this node belongs to.
    #[must_use]
    pub fn basis(&self) -> FaceBasis {
        self.basis
    }

    /// Returns true if this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// The four children, if split.
    #[must_use]
    pub fn children(&self) -> Option<&[QuadNode<P>; 4]> {
        self.children.as_deref()
    }

    /// Mutable access to the four children, if split.
    pub fn children_mut(&mut self) -> Option<&mut [QuadNode<P>; 4]> {
        self.children.as_deref_mut()
    }

    /// Centers the four children would have, in [`Corner`] order.
    #[must_use]
    pub fn child_centers(&self) -> [DVec3; 4] {
        let half = self.radius * 0.5;
        Corner::ALL.map(|corner| {
            let (north, east) = corner.offset_signs();
            self.position + self.basis.axis_a * (north * half) + self.basis.axis_b * (east * half)
        })
    }

    /// Smallest straight-line distance from `viewer` to a potential child center.
    #[must_use]
    pub fn min_child_distance(&self, viewer: DVec3) -> f64 {
        self.child_centers()
            .iter()
            .map(|c| c.distance(viewer))
            .fold(f64::INFINITY, f64::min)
    }

    /// Drop all descendants, handing each to `visit` first.
    ///
    /// Descendants are visited depth-first, children before their parent.
    /// Returns `false` if this node was already a leaf.
    pub fn merge_with<F: FnMut(&mut QuadNode<P>)>(&mut self, mut visit: F) -> bool {
        let Some(mut children) = self.children.take() else {
            return false;
        };
        for child in children.iter_mut() {
            child.visit_post_order(&mut visit);
        }
        true
    }

    /// Drop all descendants. No-op on a leaf.
    pub fn merge(&mut self) -> bool {
        self.merge_with(|_| {})
    }

    fn visit_post_order<F: FnMut(&mut QuadNode<P>)>(&mut self, visit: &mut F) {
        if let Some(children) = self.children.as_deref_mut() {
            for child in children.iter_mut() {
                child.visit_post_order(visit);
            }
        }
        visit(self);
    }

    /// Find the node `(hash, depth)` below this root.
    #[must_use]
    pub fn find(&self, hash: u64, depth: u8) -> Option<&QuadNode<P>> {
        let mut node = self;
        while node.detail_level < depth {
            let shift = 2 * u32::from(depth - node.detail_level - 1);
            let index = ((hash >> shift) & 3) as usize;
            node = &node.children.as_deref()?[index];
        }
        (node.detail_level == depth && node.hash == hash).then_some(node)
    }

    /// Mutable variant of [`find`](Self::find).
    pub fn find_mut(&mut self, hash: u64, depth: u8) -> Option<&mut QuadNode<P>> {
        let mut node = self;
        while node.detail_level < depth {
            let shift = 2 * u32::from(depth - node.detail_level - 1);
            let index = ((hash >> shift) & 3) as usize;
            node = &mut node.children.as_deref_mut()?[index];
        }
        (node.detail_level == depth && node.hash == hash).then_some(node)
    }

    /// Detail level of the node `(hash, depth)`, or 0 if the tree is not
    /// subdivided that far along the hash's path.
    #[must_use]
    pub fn detail_level_of(&self, hash: u64, depth: u8) -> u8 {
        self.find(hash, depth).map_or(0, |node| node.detail_level)
    }

    /// Neighbor mask of the node `(hash, depth)` against this root.
    ///
    /// A side's bit is set when the equal-depth neighbor across it does not
    /// exist, meaning that region is rendered by a coarser leaf. Sides on
    /// the face boundary are never set.
    #[must_use]
    pub fn neighbor_mask_of(&self, hash: u64, depth: u8) -> NeighborMask {
        let mut mask = NeighborMask::NONE;
        if depth == 0 {
            return mask;
        }
        for side in Corner::from_hash(hash).outer_sides() {
            if let Some(neighbor) = neighbor_hash(hash, depth, side) {
                mask = mask.with(side, self.detail_level_of(neighbor, depth) < depth);
            }
        }
        mask
    }

    /// All leaves, in depth-first corner order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&QuadNode<P>> {
        let mut result = Vec::new();
        self.collect_leaves(&mut result);
        result
    }

    fn collect_leaves<'a>(&'a self, result: &mut Vec<&'a QuadNode<P>>) {
        match self.children.as_deref() {
            None => result.push(self),
            Some(children) => {
                for child in children {
                    child.collect_leaves(result);
                }
            }
        }
    }

    /// Call `f` on every leaf.
    pub fn for_each_leaf_mut<F: FnMut(&mut QuadNode<P>)>(&mut self, f: &mut F) {
        match self.children.as_deref_mut() {
            None => f(self),
            Some(children) => {
                for child in children.iter_mut() {
                    child.for_each_leaf_mut(f);
                }
            }
        }
    }

    /// Total number of nodes in this subtree, including this one.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .as_deref()
            .map_or(0, |c| c.iter().map(QuadNode::node_count).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CubeFace;

    type Node = QuadNode<()>;

    fn root() -> Node {
        QuadNode::root(CubeFace::PosZ.basis(), 1.0)
    }

    /// Split the node at `path` (corner indices from the root), creating parents as needed.
    fn split_path(root: &mut Node, path: &[usize]) {
        let mut node = root;
        node.subdivide();
        for &i in path {
            node = &mut node.children_mut().unwrap()[i];
            node.subdivide();
        }
    }

    fn hash_of(path: &[usize]) -> u64 {
        path.iter().fold(0, |h, &i| h * 4 + i as u64)
    }

    #[test]
    fn test_child_hash_encodes_corner() {
        let mut tree = root();
        tree.subdivide();
        for (i, child) in tree.children().unwrap().iter().enumerate() {
            assert_eq!(child.hash() & 3, i as u64, "low bits must select child {i}");
            assert_eq!(child.corner(), Some(Corner::ALL[i]));
            assert_eq!(child.detail_level(), 1);
            assert!((child.radius() - 0.5).abs() < 1e-12, "radius must halve");
        }
    }

    #[test]
    fn test_hash_fits_in_two_bits_per_level() {
        let mut tree = root();
        split_path(&mut tree, &[3, 3, 3]);
        for leaf in tree.leaves() {
            let d = u32::from(leaf.detail_level());
            assert!(
                leaf.hash() < 1u64 << (2 * d).max(1),
                "hash {} of depth {d} exceeds {} bits",
                leaf.hash(),
                2 * d
            );
        }
    }

    #[test]
    fn test_detail_level_lookup_round_trips() {
        let mut tree = root();
        split_path(&mut tree, &[0, 2, 1]);
        split_path(&mut tree, &[3]);

        fn check(tree: &Node, node: &Node) {
            assert_eq!(
                tree.detail_level_of(node.hash(), node.detail_level()),
                node.detail_level(),
                "lookup of hash {} at depth {} failed",
                node.hash(),
                node.detail_level()
            );
            if let Some(children) = node.children() {
                for child in children {
                    check(tree, child);
                }
            }
        }
        check(&tree, &tree);
    }

    #[test]
    fn test_detail_level_lookup_misses_return_zero() {
        let mut tree = root();
        tree.subdivide();
        assert_eq!(tree.detail_level_of(hash_of(&[1, 2]), 2), 0);
        assert!(tree.find(hash_of(&[1, 2]), 2).is_none());
    }

    #[test]
    fn test_subdivide_is_idempotent() {
        let mut tree = root();
        assert!(tree.subdivide());
        tree.children_mut().unwrap()[2].subdivide();
        assert!(!tree.subdivide(), "second split must be refused");
        assert_eq!(tree.node_count(), 1 + 4 + 4, "grandchildren must survive");
    }

    #[test]
    fn test_child_centers_follow_corner_order() {
        let tree = root();
        let b = tree.basis();
        let centers = tree.child_centers();
        let expected = [
            tree.position() + b.axis_a * 0.5 - b.axis_b * 0.5,
            tree.position() + b.axis_a * 0.5 + b.axis_b * 0.5,
            tree.position() - b.axis_a * 0.5 + b.axis_b * 0.5,
            tree.position() - b.axis_a * 0.5 - b.axis_b * 0.5,
        ];
        for (i, (got, want)) in centers.iter().zip(expected).enumerate() {
            assert!((*got - want).length() < 1e-12, "center {i}: {got:?} vs {want:?}");
        }
    }

    #[test]
    fn test_sibling_neighbor_hashes() {
        let tl = hash_of(&[0]);
        assert_eq!(neighbor_hash(tl, 1, EdgeDirection::East), Some(hash_of(&[1])));
        assert_eq!(neighbor_hash(tl, 1, EdgeDirection::South), Some(hash_of(&[3])));
        let br = hash_of(&[2]);
        assert_eq!(neighbor_hash(br, 1, EdgeDirection::West), Some(hash_of(&[3])));
        assert_eq!(neighbor_hash(br, 1, EdgeDirection::North), Some(hash_of(&[1])));
    }

    #[test]
    fn test_neighbor_hash_crosses_parent_boundary() {
        // Top-left grandchild of the bottom-left child: its north neighbor is
        // the bottom-left grandchild of the top-left child.
        let node = hash_of(&[3, 0]);
        assert_eq!(
            neighbor_hash(node, 2, EdgeDirection::North),
            Some(hash_of(&[0, 3]))
        );
        // Top-right grandchild of the top-left child: east neighbor is the
        // top-left grandchild of the top-right child.
        let node = hash_of(&[0, 1]);
        assert_eq!(
            neighbor_hash(node, 2, EdgeDirection::East),
            Some(hash_of(&[1, 0]))
        );
    }

    #[test]
    fn test_neighbor_hash_off_face_is_none() {
        assert_eq!(neighbor_hash(hash_of(&[0, 0]), 2, EdgeDirection::North), None);
        assert_eq!(neighbor_hash(hash_of(&[1, 2]), 2, EdgeDirection::East), None);
        assert_eq!(neighbor_hash(0, 0, EdgeDirection::West), None);
    }

    #[test]
    fn test_neighbor_relation_is_symmetric() {
        for depth in 1..=3u8 {
            for hash in 0..(1u64 << (2 * depth)) {
                for side in EdgeDirection::ALL {
                    if let Some(n) = neighbor_hash(hash, depth, side) {
                        assert_eq!(
                            neighbor_hash(n, depth, side.opposite()),
                            Some(hash),
                            "neighbor of {hash} across {side:?} at depth {depth} does not point back"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_finer_leaf_marks_coarser_side() {
        // Split the top-right child only. Its bottom-left grandchild borders
        // the unsplit bottom-right child (south) and top-left child (west).
        let mut tree = root();
        split_path(&mut tree, &[1]);
        let node = hash_of(&[1, 3]);
        let mask = tree.neighbor_mask_of(node, 2);
        assert!(mask.is_coarser(EdgeDirection::South), "south borders a coarser leaf");
        assert!(mask.is_coarser(EdgeDirection::West), "west borders a coarser leaf");
        assert!(!mask.is_coarser(EdgeDirection::North));
        assert!(!mask.is_coarser(EdgeDirection::East));

        // Top-right grandchild sits on the face's north-east corner.
        assert_eq!(tree.neighbor_mask_of(hash_of(&[1, 1]), 2), NeighborMask::NONE);
    }

    #[test]
    fn test_equal_depth_neighbors_are_not_coarser() {
        let mut tree = root();
        split_path(&mut tree, &[0]);
        split_path(&mut tree, &[1]);
        // [0,1] and [1,0] share an edge at equal depth.
        let mask = tree.neighbor_mask_of(hash_of(&[0, 1]), 2);
        assert!(!mask.is_coarser(EdgeDirection::East));
        let mask = tree.neighbor_mask_of(hash_of(&[1, 0]), 2);
        assert!(!mask.is_coarser(EdgeDirection::West));
    }

    #[test]
    fn test_merge_visits_descendants_depth_first() {
        let mut tree = root();
        split_path(&mut tree, &[2]);
        let mut visited = Vec::new();
        let merged = tree.merge_with(|node| visited.push((node.detail_level(), node.hash())));
        assert!(merged);
        assert!(tree.is_leaf());
        assert_eq!(visited.len(), 8);
        let child_pos = visited.iter().position(|&v| v == (1, 2)).unwrap();
        let grandchild_pos = visited.iter().position(|&v| v == (2, 8)).unwrap();
        assert!(
            grandchild_pos < child_pos,
            "grandchildren must be visited before their parent"
        );
        assert!(!tree.merge(), "merging a leaf reports no change");
    }

    #[test]
    fn test_leaves_cover_face_area() {
        let mut tree = root();
        split_path(&mut tree, &[0, 3]);
        let area: f64 = tree.leaves().iter().map(|l| (2.0 * l.radius()).powi(2)).sum();
        assert!((area - 4.0).abs() < 1e-12, "leaf areas sum to {area}, expected 4");
    }

    #[test]
    fn test_max_depth_refuses_split() {
        let mut node: Node = root();
        for _ in 0..MAX_DEPTH {
            assert!(node.subdivide());
            node = node.children().unwrap()[0].clone();
        }
        assert_eq!(node.detail_level(), MAX_DEPTH);
        assert!(!node.subdivide(), "a node at MAX_DEPTH must not split");
    }
}
