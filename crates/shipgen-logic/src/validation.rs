//! Sanity checks for solved layouts.
//!
//! Pure functions over a [`LevelLayout`] that return findings rather than
//! failing. The scheduler logs them; the assembler only refuses layouts it
//! cannot build at all.

use std::collections::HashSet;

use crate::doors::contact_between;
use crate::layout::{LevelLayout, RoomId, RoomKind};

/// A layout validation finding.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

// ── A. Room geometry ────────────────────────────────────────────────────

/// Check that no room is empty.
pub fn check_room_dimensions(layout: &LevelLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for r in &layout.rooms {
        if r.width == 0 || r.height == 0 {
            errors.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!("Room #{} has zero size: {}×{}", r.id, r.width, r.height),
            });
        }
    }
    errors
}

/// Check that rooms lie inside the grid. Skipped when the layout has no bounds.
pub fn check_rooms_within_grid(layout: &LevelLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if layout.width == 0 || layout.height == 0 {
        return errors;
    }
    for r in &layout.rooms {
        if r.right() > layout.width || r.bottom() > layout.height {
            errors.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!(
                    "Room #{} ({},{} {}×{}) extends past the {}×{} grid",
                    r.id, r.x, r.y, r.width, r.height, layout.width, layout.height
                ),
            });
        }
    }
    errors
}

/// Check that room ids are unique.
pub fn check_duplicate_room_ids(layout: &LevelLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for r in &layout.rooms {
        if !seen.insert(r.id) {
            errors.push(ValidationError {
                category: "room_geometry",
                severity: Severity::Error,
                message: format!("Room id #{} is used more than once", r.id),
            });
        }
    }
    errors
}

// ── B. Room-to-room ─────────────────────────────────────────────────────

/// Check that no two rooms share a cell. Touching edges are fine.
pub fn check_room_overlaps(layout: &LevelLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let rooms = &layout.rooms;
    for i in 0..rooms.len() {
        for j in (i + 1)..rooms.len() {
            let a = &rooms[i];
            let b = &rooms[j];
            let overlap_x = a.x < b.right() && b.x < a.right();
            let overlap_y = a.y < b.bottom() && b.y < a.bottom();
            if overlap_x && overlap_y {
                errors.push(ValidationError {
                    category: "room_overlap",
                    severity: Severity::Error,
                    message: format!("Rooms #{} and #{} overlap", a.id, b.id),
                });
            }
        }
    }
    errors
}

// ── C. Doors and portals ────────────────────────────────────────────────

/// Check that every door and portal endpoint is a known room.
pub fn check_references_exist(layout: &LevelLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let ids: HashSet<RoomId> = layout.rooms.iter().map(|r| r.id).collect();
    for (label, map) in [("door", &layout.doors), ("portal", &layout.portals)] {
        for (&a, neighbours) in map {
            for &b in std::iter::once(&a).chain(neighbours) {
                if !ids.contains(&b) {
                    errors.push(ValidationError {
                        category: "door_validity",
                        severity: Severity::Error,
                        message: format!("{} entry for #{} references unknown room #{}", label, a, b),
                    });
                }
            }
        }
    }
    errors
}

/// Check that the door map lists every edge from both ends.
pub fn check_doors_symmetric(layout: &LevelLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (&a, neighbours) in &layout.doors {
        for &b in neighbours {
            let back = layout.doors.get(&b).is_some_and(|n| n.contains(&a));
            if !back {
                errors.push(ValidationError {
                    category: "door_validity",
                    severity: Severity::Warning,
                    message: format!("Door #{}→#{} has no reverse entry", a, b),
                });
            }
        }
    }
    errors
}

/// Check that every door joins two rooms that share a wall.
pub fn check_doors_adjacent(layout: &LevelLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let rooms = layout.rooms_by_id();
    for (a, b) in layout.adjacency_edges() {
        let (Some(ra), Some(rb)) = (rooms.get(&a), rooms.get(&b)) else {
            continue; // caught by reference check
        };
        if contact_between(ra, rb).is_none() {
            errors.push(ValidationError {
                category: "door_validity",
                severity: Severity::Error,
                message: format!("Rooms #{} and #{} have a door but share no wall", a, b),
            });
        }
    }
    errors
}

// ── D. Start / finish ───────────────────────────────────────────────────

/// Check that start and finish name plain rooms.
pub fn check_start_finish(layout: &LevelLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (label, id) in [
        ("Start", layout.start_room_id),
        ("Finish", layout.finish_room_id),
    ] {
        match layout.room(id) {
            None => errors.push(ValidationError {
                category: "start_finish",
                severity: Severity::Error,
                message: format!("{} room #{} does not exist", label, id),
            }),
            Some(r) if r.kind != RoomKind::Room => errors.push(ValidationError {
                category: "start_finish",
                severity: Severity::Warning,
                message: format!("{} room #{} is a {:?}, not a room", label, id, r.kind),
            }),
            Some(_) => {}
        }
    }
    errors
}

// ── Master validation ───────────────────────────────────────────────────

/// Run all layout checks and return combined results.
pub fn validate_layout(layout: &LevelLayout) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_room_dimensions(layout));
    all.extend(check_rooms_within_grid(layout));
    all.extend(check_duplicate_room_ids(layout));
    all.extend(check_room_overlaps(layout));
    all.extend(check_references_exist(layout));
    all.extend(check_doors_symmetric(layout));
    all.extend(check_doors_adjacent(layout));
    all.extend(check_start_finish(layout));
    all
}
