//! Directions on the level grid.
//!
//! The grid is row-major: `x` grows East and `y` grows South, so North is
//! `y - 1`. Rotations are clockwise quarter turns starting from North.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A single wall side / facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardinalDirection {
    North,
    East,
    South,
    West,
}

impl CardinalDirection {
    /// All directions in clockwise order, starting at North.
    pub const ALL: [CardinalDirection; 4] = [
        CardinalDirection::North,
        CardinalDirection::East,
        CardinalDirection::South,
        CardinalDirection::West,
    ];

    pub fn opposite(self) -> Self {
        match self {
            CardinalDirection::North => CardinalDirection::South,
            CardinalDirection::East => CardinalDirection::West,
            CardinalDirection::South => CardinalDirection::North,
            CardinalDirection::West => CardinalDirection::East,
        }
    }

    /// Unit grid offset pointing this way.
    pub fn offset(self) -> (i32, i32) {
        match self {
            CardinalDirection::North => (0, -1),
            CardinalDirection::East => (1, 0),
            CardinalDirection::South => (0, 1),
            CardinalDirection::West => (-1, 0),
        }
    }

    pub fn as_flag(self) -> CardinalDirections {
        match self {
            CardinalDirection::North => CardinalDirections::NORTH,
            CardinalDirection::East => CardinalDirections::EAST,
            CardinalDirection::South => CardinalDirections::SOUTH,
            CardinalDirection::West => CardinalDirections::WEST,
        }
    }
}

bitflags! {
    /// A combination of open sides, e.g. the entrances of a corridor cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CardinalDirections: u8 {
        const NORTH = 1 << 0;
        const EAST = 1 << 1;
        const SOUTH = 1 << 2;
        const WEST = 1 << 3;
    }
}

/// Clockwise rotation applied to a tile, in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Search order used by the tile matcher.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// The direction a tile's "up" faces after this rotation.
    pub fn facing(self) -> CardinalDirection {
        match self {
            Rotation::Deg0 => CardinalDirection::North,
            Rotation::Deg90 => CardinalDirection::East,
            Rotation::Deg180 => CardinalDirection::South,
            Rotation::Deg270 => CardinalDirection::West,
        }
    }

    /// One more clockwise quarter turn.
    pub fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// Map a pattern-window offset to a grid offset.
    ///
    /// Each quarter turn sends `(i, j)` to `(-j, i)`, so East of the window
    /// becomes South of the grid.
    pub fn apply(self, (i, j): (i32, i32)) -> (i32, i32) {
        match self {
            Rotation::Deg0 => (i, j),
            Rotation::Deg90 => (-j, i),
            Rotation::Deg180 => (-i, -j),
            Rotation::Deg270 => (j, -i),
        }
    }
}
