//! Physical door placement between adjacent rooms.
//!
//! The solver only says *that* two rooms share a wall; this module decides
//! *where* on that wall the door goes. The point is drawn from the caller's
//! seeded RNG so a given solver seed always yields the same doors.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::direction::{CardinalDirection, CardinalDirections};
use crate::layout::{RoomId, RoomKind, RoomSpec};

/// One side of a door, in the owning room's local, 1-indexed coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorSpec {
    pub local_x: u32,
    pub local_y: u32,
    /// The wall of the owning room the door sits in.
    pub direction: CardinalDirection,
    pub connects_to_kind: RoomKind,
    pub connects_to: RoomId,
}

/// How two rectangles touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// `west`'s right edge is `east`'s left edge; rows `lo..=hi` are shared.
    Vertical {
        west: RoomId,
        east: RoomId,
        lo: u32,
        hi: u32,
    },
    /// `north`'s bottom edge is `south`'s top edge; columns `lo..=hi` are shared.
    Horizontal {
        north: RoomId,
        south: RoomId,
        lo: u32,
        hi: u32,
    },
}

/// The shared wall between `a` and `b`, if they touch along a full cell edge.
///
/// Corner-only contact and overlapping rectangles return `None`.
pub fn contact_between(a: &RoomSpec, b: &RoomSpec) -> Option<Contact> {
    let rows = overlap(a.y, a.bottom(), b.y, b.bottom());
    let cols = overlap(a.x, a.right(), b.x, b.right());

    if a.right() == b.x {
        let (lo, hi) = rows?;
        return Some(Contact::Vertical {
            west: a.id,
            east: b.id,
            lo,
            hi,
        });
    }
    if b.right() == a.x {
        let (lo, hi) = rows?;
        return Some(Contact::Vertical {
            west: b.id,
            east: a.id,
            lo,
            hi,
        });
    }
    if a.bottom() == b.y {
        let (lo, hi) = cols?;
        return Some(Contact::Horizontal {
            north: a.id,
            south: b.id,
            lo,
            hi,
        });
    }
    if b.bottom() == a.y {
        let (lo, hi) = cols?;
        return Some(Contact::Horizontal {
            north: b.id,
            south: a.id,
            lo,
            hi,
        });
    }
    None
}

/// Inclusive intersection of the half-open ranges `[a0, a1)` and `[b0, b1)`.
fn overlap(a0: u32, a1: u32, b0: u32, b1: u32) -> Option<(u32, u32)> {
    let lo = a0.max(b0);
    let hi = a1.min(b1);
    (lo < hi).then(|| (lo, hi - 1))
}

/// Place a door on the wall shared by `room` and `adjacent`.
///
/// Returns `(door in room, door in adjacent)`.
///
/// # Panics
///
/// If the rooms do not share a wall. The solver declared an adjacency the
/// geometry contradicts, and carrying on would build an unreachable level.
pub fn place_door(
    room: &RoomSpec,
    adjacent: &RoomSpec,
    rng: &mut impl Rng,
) -> (DoorSpec, DoorSpec) {
    let Some(contact) = contact_between(room, adjacent) else {
        panic!(
            "rooms {} ({},{} {}x{}) and {} ({},{} {}x{}) are declared adjacent but share no wall",
            room.id,
            room.x,
            room.y,
            room.width,
            room.height,
            adjacent.id,
            adjacent.x,
            adjacent.y,
            adjacent.width,
            adjacent.height,
        );
    };

    let (room_door, adjacent_door) = match contact {
        Contact::Vertical { west, lo, hi, .. } => {
            let y = rng.gen_range(lo..=hi);
            let (w, e) = if west == room.id {
                (room, adjacent)
            } else {
                (adjacent, room)
            };
            let west_door = door(w.width, y - w.y + 1, CardinalDirection::East, e);
            let east_door = door(1, y - e.y + 1, CardinalDirection::West, w);
            if west == room.id {
                (west_door, east_door)
            } else {
                (east_door, west_door)
            }
        }
        Contact::Horizontal { north, lo, hi, .. } => {
            let x = rng.gen_range(lo..=hi);
            let (n, s) = if north == room.id {
                (room, adjacent)
            } else {
                (adjacent, room)
            };
            let north_door = door(x - n.x + 1, n.height, CardinalDirection::South, s);
            let south_door = door(x - s.x + 1, 1, CardinalDirection::North, n);
            if north == room.id {
                (north_door, south_door)
            } else {
                (south_door, north_door)
            }
        }
    };
    log::debug!(
        "Door {}<->{}: {:?} at ({},{}) / {:?} at ({},{})",
        room.id,
        adjacent.id,
        room_door.direction,
        room_door.local_x,
        room_door.local_y,
        adjacent_door.direction,
        adjacent_door.local_x,
        adjacent_door.local_y,
    );
    (room_door, adjacent_door)
}

fn door(local_x: u32, local_y: u32, direction: CardinalDirection, other: &RoomSpec) -> DoorSpec {
    DoorSpec {
        local_x,
        local_y,
        direction,
        connects_to_kind: other.kind,
        connects_to: other.id,
    }
}

/// The sides a corridor is open on, given its doors.
pub fn corridor_openings(doors: &[DoorSpec]) -> CardinalDirections {
    doors
        .iter()
        .fold(CardinalDirections::empty(), |open, d| open | d.direction.as_flag())
}
