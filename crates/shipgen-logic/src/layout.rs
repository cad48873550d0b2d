//! Data contract between the solver and everything downstream of it.
//!
//! A [`LevelLayout`] is produced atomically by the solver and never mutated
//! afterwards. All collections are ordered (`BTreeMap`/`BTreeSet`) so that
//! iteration, and therefore door placement, is reproducible for a given seed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Solver-assigned room identifier, unique within one layout.
pub type RoomId = u64;

/// Grid position `(x, y)`.
pub type GridPos = (u32, u32);

/// Inputs for one solver invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub min_rooms: u32,
    pub max_rooms: u32,
    pub num_breaches: u32,
    pub num_portals: u32,
    /// How many candidate levels the solver may enumerate before settling.
    pub max_candidate_levels: u32,
    pub worker_threads: u32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            seed: 0,
            width: 10,
            height: 8,
            min_rooms: 2,
            max_rooms: 6,
            num_breaches: 1,
            num_portals: 0,
            max_candidate_levels: 1,
            worker_threads: 1,
        }
    }
}

/// What occupies a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SquareKind {
    Hull,
    Space,
    Ship,
    Corridor,
    Room,
    AlienBreach,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquareSpec {
    pub x: u32,
    pub y: u32,
    pub kind: SquareKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    Room,
    Corridor,
    AlienBreach,
}

impl RoomKind {
    /// The square kind a cell of this room reports.
    pub fn square_kind(self) -> SquareKind {
        match self {
            RoomKind::Room => SquareKind::Room,
            RoomKind::Corridor => SquareKind::Corridor,
            RoomKind::AlienBreach => SquareKind::AlienBreach,
        }
    }
}

/// An axis-aligned rectangle of cells. `(x, y)` is the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomSpec {
    pub id: RoomId,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub kind: RoomKind,
}

impl RoomSpec {
    /// One past the last column.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the last row.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Only plain rooms are valid destinations; corridors and breaches just
    /// carry connectivity.
    pub fn is_primary(&self) -> bool {
        self.kind == RoomKind::Room
    }
}

/// A solved level, exactly as the solver returned it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Seed of the parameters this layout was solved from.
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub squares: Vec<SquareSpec>,
    pub rooms: Vec<RoomSpec>,
    /// Adjacent rooms that get a door between them. Symmetric.
    pub doors: BTreeMap<RoomId, BTreeSet<RoomId>>,
    /// Teleport links between non-adjacent rooms, carried through unchanged.
    #[serde(default)]
    pub portals: BTreeMap<RoomId, BTreeSet<RoomId>>,
    pub start_room_id: RoomId,
    pub finish_room_id: RoomId,
    #[serde(default)]
    pub levels_enumerated: u64,
}

impl LevelLayout {
    pub fn room(&self, id: RoomId) -> Option<&RoomSpec> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn rooms_by_id(&self) -> HashMap<RoomId, &RoomSpec> {
        self.rooms.iter().map(|r| (r.id, r)).collect()
    }

    /// Every undirected door edge once, as `(low, high)`, in ascending order.
    pub fn adjacency_edges(&self) -> Vec<(RoomId, RoomId)> {
        let mut edges = BTreeSet::new();
        for (&a, neighbours) in &self.doors {
            for &b in neighbours {
                if a != b {
                    edges.insert((a.min(b), a.max(b)));
                }
            }
        }
        edges.into_iter().collect()
    }

    /// Cell kinds keyed by position. Later squares win on duplicates.
    pub fn square_grid(&self) -> HashMap<GridPos, SquareKind> {
        self.squares.iter().map(|s| ((s.x, s.y), s.kind)).collect()
    }

    /// Number of cells on the grid, used to normalise metrics.
    pub fn grid_area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
