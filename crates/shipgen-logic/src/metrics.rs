//! Scalar quality measures for a solved layout.
//!
//! Used by the simtest harness to report on generated levels. All ratios are
//! `f64` in `[0, 1]` unless noted.
//!
//! Graph metrics walk doors and portals alike. Breach rooms are left off the
//! graph; they only mark the rooms they open into as dangerous.

use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::layout::{LevelLayout, RoomId, RoomKind};

/// Rooms per grid cell.
pub fn room_count_ratio(layout: &LevelLayout) -> f64 {
    match layout.grid_area() {
        0 => 0.0,
        area => layout.rooms.len() as f64 / area as f64,
    }
}

/// Share of the grid covered by rooms.
pub fn density(layout: &LevelLayout) -> f64 {
    match layout.grid_area() {
        0 => 0.0,
        area => total_room_area(layout) as f64 / area as f64,
    }
}

/// Mean room area relative to the largest area a room may have.
pub fn average_room_size(layout: &LevelLayout, max_room_area: u64) -> f64 {
    let denom = layout.rooms.len() as u64 * max_room_area;
    if denom == 0 {
        return 0.0;
    }
    total_room_area(layout) as f64 / denom as f64
}

fn total_room_area(layout: &LevelLayout) -> u64 {
    layout.rooms.iter().map(|r| r.area()).sum()
}

// ── Connection graph ────────────────────────────────────────────────────

/// Rooms a player can stand in. Breaches are hazards, not rooms.
fn is_walkable(layout: &LevelLayout, id: RoomId) -> bool {
    layout
        .room(id)
        .map_or(true, |r| r.kind != RoomKind::AlienBreach)
}

fn walkable_room_count(layout: &LevelLayout) -> usize {
    layout
        .rooms
        .iter()
        .filter(|r| r.kind != RoomKind::AlienBreach)
        .count()
}

/// Doors and portals, both directions.
///
/// A door and a portal between the same two rooms are two connections.
fn connection_graph(layout: &LevelLayout) -> BTreeMap<RoomId, Vec<RoomId>> {
    let portals: BTreeSet<(RoomId, RoomId)> = layout
        .portals
        .iter()
        .flat_map(|(&a, ends)| ends.iter().map(move |&b| (a.min(b), a.max(b))))
        .filter(|&(a, b)| a != b)
        .collect();

    let mut adj: BTreeMap<RoomId, Vec<RoomId>> = BTreeMap::new();
    for (a, b) in layout.adjacency_edges().into_iter().chain(portals) {
        if is_walkable(layout, a) && is_walkable(layout, b) {
            adj.entry(a).or_default().push(b);
            adj.entry(b).or_default().push(a);
        }
    }
    adj
}

/// Hop counts from the nearest of `sources` to every reachable room.
fn distances_from(
    adj: &BTreeMap<RoomId, Vec<RoomId>>,
    sources: impl IntoIterator<Item = RoomId>,
) -> HashMap<RoomId, u32> {
    let mut dist = HashMap::new();
    let mut queue = VecDeque::new();
    for source in sources {
        if dist.insert(source, 0).is_none() {
            queue.push_back(source);
        }
    }
    while let Some(current) = queue.pop_front() {
        let hops = dist[&current] + 1;
        for &next in adj.get(&current).map_or(&[][..], Vec::as_slice) {
            if let Entry::Vacant(slot) = dist.entry(next) {
                slot.insert(hops);
                queue.push_back(next);
            }
        }
    }
    dist
}

/// Rooms on a shortest start → finish route, both ends included.
fn optimal_path(
    layout: &LevelLayout,
    adj: &BTreeMap<RoomId, Vec<RoomId>>,
) -> Option<Vec<RoomId>> {
    let (from, to) = (layout.start_room_id, layout.finish_room_id);
    layout.room(from)?;
    let mut previous: HashMap<RoomId, RoomId> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        if current == to {
            let mut path = vec![to];
            let mut at = to;
            while let Some(&prev) = previous.get(&at) {
                path.push(prev);
                at = prev;
            }
            path.reverse();
            return Some(path);
        }
        for &next in adj.get(&current).map_or(&[][..], Vec::as_slice) {
            if next != from && !previous.contains_key(&next) {
                previous.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    None
}

// ── Graph metrics ───────────────────────────────────────────────────────

/// Fewest connections between start and finish, or `None` if they are not
/// linked. Portals count as one hop.
pub fn start_finish_distance(layout: &LevelLayout) -> Option<u32> {
    let path = optimal_path(layout, &connection_graph(layout))?;
    u32::try_from(path.len() - 1).ok()
}

/// Average branching, with dead ends ignored.
///
/// A room with `n >= 2` connections (doors and portals) scores `1 / (n - 1)`,
/// so a pure chain scores 1.0 and hubs pull it down.
pub fn map_linearity(layout: &LevelLayout) -> Option<f64> {
    let adj = connection_graph(layout);
    let scores: Vec<f64> = adj
        .values()
        .filter(|exits| exits.len() >= 2)
        .map(|exits| 1.0 / (exits.len() - 1) as f64)
        .collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Share of rooms the shortest start → finish route does not visit.
pub fn path_redundancy(layout: &LevelLayout) -> Option<f64> {
    let rooms = walkable_room_count(layout);
    let path = optimal_path(layout, &connection_graph(layout))?;
    if rooms == 0 {
        return None;
    }
    Some(rooms.saturating_sub(path.len()) as f64 / rooms as f64)
}

/// How far off-route rooms sit from the route, on average.
///
/// Normalised by `rooms / 2`, the largest possible average. Rooms that cannot
/// reach the route count as `rooms` away. 0.0 when every room is on the route.
pub fn exploration(layout: &LevelLayout) -> Option<f64> {
    let adj = connection_graph(layout);
    let path = optimal_path(layout, &adj)?;
    let rooms = walkable_room_count(layout) as u32;
    let on_path: HashSet<RoomId> = path.iter().copied().collect();
    let dist = distances_from(&adj, path);

    let off_path: Vec<u32> = layout
        .rooms
        .iter()
        .filter(|r| r.kind != RoomKind::AlienBreach && !on_path.contains(&r.id))
        .map(|r| dist.get(&r.id).map_or(rooms, |&d| d.min(rooms)))
        .collect();
    if off_path.is_empty() {
        return Some(0.0);
    }
    let mean = off_path.iter().sum::<u32>() as f64 / off_path.len() as f64;
    Some(mean / (rooms as f64 / 2.0))
}

/// Rooms a breach opens into.
pub fn dangerous_rooms(layout: &LevelLayout) -> BTreeSet<RoomId> {
    layout
        .rooms
        .iter()
        .filter(|r| r.kind == RoomKind::AlienBreach)
        .filter_map(|r| layout.doors.get(&r.id))
        .flatten()
        .copied()
        .filter(|&id| is_walkable(layout, id))
        .collect()
}

/// How far the route keeps the player from danger, normalised by room count.
///
/// Higher is safer; 1.0 when nothing is breached.
pub fn proximity_to_danger(layout: &LevelLayout) -> Option<f64> {
    let adj = connection_graph(layout);
    let path = optimal_path(layout, &adj)?;
    let danger = dangerous_rooms(layout);
    if danger.is_empty() {
        return Some(1.0);
    }
    let rooms = walkable_room_count(layout) as u32;
    if rooms == 0 {
        return None;
    }
    let dist = distances_from(&adj, danger);
    let total: u32 = path
        .iter()
        .map(|id| dist.get(id).map_or(rooms, |&d| d.min(rooms)))
        .sum();
    Some(total as f64 / (path.len() as f64 * rooms as f64))
}

/// All metrics for one layout, as reported by the harness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelMetrics {
    pub rooms: usize,
    pub room_count_ratio: f64,
    pub density: f64,
    pub average_room_size: f64,
    pub start_finish_distance: Option<u32>,
    pub map_linearity: Option<f64>,
    pub path_redundancy: Option<f64>,
    pub exploration: Option<f64>,
    pub proximity_to_danger: Option<f64>,
}

impl LevelMetrics {
    pub fn measure(layout: &LevelLayout, max_room_area: u64) -> Self {
        Self {
            rooms: layout.rooms.len(),
            room_count_ratio: room_count_ratio(layout),
            density: density(layout),
            average_room_size: average_room_size(layout, max_room_area),
            start_finish_distance: start_finish_distance(layout),
            map_linearity: map_linearity(layout),
            path_redundancy: path_redundancy(layout),
            exploration: exploration(layout),
            proximity_to_danger: proximity_to_danger(layout),
        }
    }
}
