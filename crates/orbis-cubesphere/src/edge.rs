//! Patch edges and the 4-bit mask recording which of them border a coarser
//! patch.

/// One of the four sides of a square patch.
///
/// The discriminant is the side's bit index in a [`NeighborMask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EdgeDirection {
    /// `+axis_b`, template column `x = R`.
    East = 0,
    /// `−axis_b`, template column `x = 0`.
    West = 1,
    /// `+axis_a`, template row `y = 0`.
    North = 2,
    /// `−axis_a`, template row `y = R`.
    South = 3,
}

impl EdgeDirection {
    /// All four sides in bit order.
    pub const ALL: [EdgeDirection; 4] = [
        EdgeDirection::East,
        EdgeDirection::West,
        EdgeDirection::North,
        EdgeDirection::South,
    ];

    /// The single mask bit for this side.
    #[must_use]
    pub fn bit(self) -> u8 {
        1 << self as u8
    }

    /// The side facing this one across a shared edge.
    #[must_use]
    pub fn opposite(self) -> EdgeDirection {
        match self {
            EdgeDirection::East => EdgeDirection::West,
            EdgeDirection::West => EdgeDirection::East,
            EdgeDirection::North => EdgeDirection::South,
            EdgeDirection::South => EdgeDirection::North,
        }
    }
}

/// Which sides of a patch meet a less detailed neighbor.
///
/// The raw value doubles as the index of the stitching template to mesh the
/// patch with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NeighborMask(u8);

impl NeighborMask {
    /// No coarser neighbors: the full-resolution template.
    pub const NONE: NeighborMask = NeighborMask(0);

    /// Number of distinct masks.
    pub const COUNT: usize = 16;

    /// Build a mask from raw bits, ignoring anything above bit 3.
    #[must_use]
    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0x0f)
    }

    /// Raw bits (`east | west << 1 | north << 2 | south << 3`).
    #[must_use]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Template index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// `true` if the neighbor across `side` is coarser.
    #[must_use]
    pub fn is_coarser(self, side: EdgeDirection) -> bool {
        self.0 & side.bit() != 0
    }

    /// Return a copy with `side` set or cleared.
    #[must_use]
    pub fn with(self, side: EdgeDirection, coarser: bool) -> Self {
        if coarser {
            Self(self.0 | side.bit())
        } else {
            Self(self.0 & !side.bit())
        }
    }

    /// Every mask, in template order.
    pub fn all() -> impl Iterator<Item = NeighborMask> {
        (0..Self::COUNT as u8).map(NeighborMask)
    }
}
