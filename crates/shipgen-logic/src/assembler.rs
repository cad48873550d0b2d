//! Solved layout → placement plan.
//!
//! [`assemble`] is deterministic: door positions come from a ChaCha8 stream
//! seeded with the layout's seed and consumed in sorted edge order, so the
//! same layout always yields the same plan.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;

use crate::boundary::{match_boundary, BoundaryMatch, TileLibrary};
use crate::connectivity::{ConnectivityError, ConnectivityTracker};
use crate::direction::{CardinalDirections, Rotation};
use crate::doors::{contact_between, corridor_openings, place_door, DoorSpec};
use crate::layout::{GridPos, LevelLayout, RoomId, RoomKind, RoomSpec, SquareKind};

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("{context} entry references unknown room {id}")]
    UnknownRoom { id: RoomId, context: &'static str },
    #[error("room id {0} is used more than once")]
    DuplicateRoom(RoomId),
    #[error("layout has no room to start or finish in")]
    NoPrimaryRoom,
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
}

/// Everything the world builder needs to instantiate one level.
#[derive(Debug, Clone)]
pub struct PlacementPlan {
    pub layout: LevelLayout,
    /// Doors per room, in the order they were placed. Every room has an entry.
    pub doors_by_room: BTreeMap<RoomId, Vec<DoorSpec>>,
    pub boundary_matches: BTreeMap<GridPos, BoundaryMatch>,
    /// Hull cells that fell back to the library's fallback tile.
    pub unmatched_boundary: Vec<GridPos>,
    pub corridor_openings: BTreeMap<RoomId, CardinalDirections>,
    /// Filler cells between rooms and hull.
    pub ship_squares: Vec<GridPos>,
    pub start_room: RoomId,
    pub finish_room: RoomId,
    pub connectivity: ConnectivityTracker,
}

impl PlacementPlan {
    /// Record that the door between `a` and `b` has opened.
    pub fn open_door(&mut self, a: RoomId, b: RoomId) -> Result<(), ConnectivityError> {
        self.connectivity.connect(a, b)
    }

    /// Plain rooms currently reachable from `id`.
    pub fn connected_rooms(&self, id: RoomId) -> Result<Vec<RoomId>, ConnectivityError> {
        self.connectivity.connected_to(id)
    }

    pub fn doors_of(&self, id: RoomId) -> &[DoorSpec] {
        self.doors_by_room.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Total door specs placed. Two per physical door.
    pub fn door_spec_count(&self) -> usize {
        self.doors_by_room.values().map(Vec::len).sum()
    }
}

/// Build the placement plan for `layout`.
///
/// # Panics
///
/// If a door joins two rooms that do not share a wall (see [`place_door`]).
pub fn assemble(
    layout: &LevelLayout,
    library: &TileLibrary,
) -> Result<PlacementPlan, AssemblyError> {
    let rooms = layout.rooms_by_id();
    check_references(layout, &rooms)?;

    // Doors
    let mut rng = ChaCha8Rng::seed_from_u64(layout.seed);
    let mut doors_by_room: BTreeMap<RoomId, Vec<DoorSpec>> =
        layout.rooms.iter().map(|r| (r.id, Vec::new())).collect();
    for (a, b) in layout.adjacency_edges() {
        let (door_a, door_b) = place_door(rooms[&a], rooms[&b], &mut rng);
        doors_by_room.entry(a).or_default().push(door_a);
        doors_by_room.entry(b).or_default().push(door_b);
    }

    // Hull tiles
    let grid = layout.square_grid();
    let hull: BTreeSet<GridPos> = grid
        .iter()
        .filter(|(_, &kind)| kind == SquareKind::Hull)
        .map(|(&pos, _)| pos)
        .collect();
    let mut boundary_matches = BTreeMap::new();
    let mut unmatched_boundary = Vec::new();
    for pos in hull {
        let m = match_boundary(pos, &grid, &library.patterns).unwrap_or_else(|| {
            unmatched_boundary.push(pos);
            BoundaryMatch {
                tile_id: library.fallback_tile.clone(),
                rotation: Rotation::Deg0,
                mirrored: false,
            }
        });
        boundary_matches.insert(pos, m);
    }
    if !unmatched_boundary.is_empty() {
        log::debug!(
            "{} hull cells fell back to {}",
            unmatched_boundary.len(),
            library.fallback_tile
        );
    }

    // Connectivity: all doors start closed, adjoining corridors are open plan.
    let mut connectivity = ConnectivityTracker::new();
    for room in &layout.rooms {
        connectivity.add_room(room.id, room.is_primary())?;
    }
    let corridors: Vec<&RoomSpec> = layout
        .rooms
        .iter()
        .filter(|r| r.kind == RoomKind::Corridor)
        .collect();
    for (i, a) in corridors.iter().enumerate() {
        for b in &corridors[i + 1..] {
            if contact_between(a, b).is_some() {
                connectivity.connect(a.id, b.id)?;
            }
        }
    }

    let openings = corridors
        .iter()
        .map(|c| (c.id, corridor_openings(&doors_by_room[&c.id])))
        .collect();

    let start_room = resolve_endpoint(layout, layout.start_room_id, "start", false)?;
    let finish_room = resolve_endpoint(layout, layout.finish_room_id, "finish", true)?;

    let ship_squares = layout
        .squares
        .iter()
        .filter(|s| s.kind == SquareKind::Ship)
        .map(|s| (s.x, s.y))
        .collect();

    log::info!(
        "Assembled level seed {}: {} rooms, {} doors, {} hull cells ({} fallback)",
        layout.seed,
        layout.rooms.len(),
        layout.adjacency_edges().len(),
        boundary_matches.len(),
        unmatched_boundary.len()
    );

    Ok(PlacementPlan {
        layout: layout.clone(),
        doors_by_room,
        boundary_matches,
        unmatched_boundary,
        corridor_openings: openings,
        ship_squares,
        start_room,
        finish_room,
        connectivity,
    })
}

fn check_references(
    layout: &LevelLayout,
    rooms: &HashMap<RoomId, &RoomSpec>,
) -> Result<(), AssemblyError> {
    let mut seen = HashSet::new();
    for r in &layout.rooms {
        if !seen.insert(r.id) {
            log::error!(
                "Layout seed {}: room id {} is used more than once",
                layout.seed,
                r.id
            );
            return Err(AssemblyError::DuplicateRoom(r.id));
        }
    }
    for (context, map) in [("door", &layout.doors), ("portal", &layout.portals)] {
        for (&a, neighbours) in map {
            for &id in std::iter::once(&a).chain(neighbours) {
                if !rooms.contains_key(&id) {
                    log::error!(
                        "Layout seed {}: {} entry references unknown room {}",
                        layout.seed,
                        context,
                        id
                    );
                    return Err(AssemblyError::UnknownRoom { id, context });
                }
            }
        }
    }
    Ok(())
}

/// `id` if it names a room, otherwise the first (or last) plain room.
fn resolve_endpoint(
    layout: &LevelLayout,
    id: RoomId,
    label: &str,
    from_end: bool,
) -> Result<RoomId, AssemblyError> {
    if layout.room(id).is_some() {
        return Ok(id);
    }
    let mut plain = layout.rooms.iter().filter(|r| r.kind == RoomKind::Room);
    let fallback = if from_end { plain.last() } else { plain.next() };
    match fallback {
        Some(room) => {
            log::warn!(
                "Layout seed {}: {} room {} does not exist, using room {}",
                layout.seed,
                label,
                id,
                room.id
            );
            Ok(room.id)
        }
        None => Err(AssemblyError::NoPrimaryRoom),
    }
}
