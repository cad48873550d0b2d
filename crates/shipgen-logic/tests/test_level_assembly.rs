//! Integration tests for the layout → placement plan pipeline.
//!
//! Exercises: LevelLayout → validation → assemble → door opening → metrics
//!
//! All tests are pure logic: no threads, no solver.

use shipgen_logic::assembler::assemble;
use shipgen_logic::boundary::TileLibrary;
use shipgen_logic::direction::CardinalDirection;
use shipgen_logic::layout::{LevelLayout, RoomId, RoomKind, RoomSpec, SquareKind, SquareSpec};
use shipgen_logic::metrics::LevelMetrics;
use shipgen_logic::validation::{validate_layout, Severity};

// ── Helpers ────────────────────────────────────────────────────────────

/// A 10×7 ship: hull ring, breach room, two rooms joined through a corridor.
///
/// ```text
/// ##########
/// #AAACBBBB#
/// #AAACBBBB#
/// #AAACBBBB#
/// #XXX.....#
/// #XXX.....#
/// ##########
/// ```
fn ship_layout(seed: u64) -> LevelLayout {
    let rooms = vec![
        room(1, 1, 1, 3, 3, RoomKind::Room),
        room(2, 5, 1, 4, 3, RoomKind::Room),
        room(3, 4, 1, 1, 3, RoomKind::Corridor),
        room(4, 1, 4, 3, 2, RoomKind::AlienBreach),
    ];
    let mut layout = LevelLayout {
        seed,
        width: 10,
        height: 7,
        start_room_id: 1,
        finish_room_id: 2,
        levels_enumerated: 1,
        ..Default::default()
    };
    for y in 0..7 {
        for x in 0..10 {
            let kind = if x == 0 || y == 0 || x == 9 || y == 6 {
                SquareKind::Hull
            } else if let Some(r) = rooms.iter().find(|r| r.contains(x, y)) {
                r.kind.square_kind()
            } else {
                SquareKind::Ship
            };
            layout.squares.push(SquareSpec { x, y, kind });
        }
    }
    layout.rooms = rooms;
    link(&mut layout, 1, 3);
    link(&mut layout, 3, 2);
    link(&mut layout, 1, 4);
    layout
}

fn room(id: RoomId, x: u32, y: u32, width: u32, height: u32, kind: RoomKind) -> RoomSpec {
    RoomSpec {
        id,
        x,
        y,
        width,
        height,
        kind,
    }
}

fn link(layout: &mut LevelLayout, a: RoomId, b: RoomId) {
    layout.doors.entry(a).or_default().insert(b);
    layout.doors.entry(b).or_default().insert(a);
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn test_ship_layout_is_valid() {
    let errors: Vec<_> = validate_layout(&ship_layout(1))
        .into_iter()
        .filter(|e| e.severity == Severity::Error)
        .collect();
    assert!(errors.is_empty(), "unexpected findings: {:?}", errors);
}

#[test]
fn test_every_edge_gets_an_opposed_door_pair() {
    let layout = ship_layout(7);
    let plan = assemble(&layout, &TileLibrary::standard()).unwrap();
    assert_eq!(plan.door_spec_count(), 2 * layout.adjacency_edges().len());

    for (a, b) in layout.adjacency_edges() {
        let da = plan
            .doors_of(a)
            .iter()
            .find(|d| d.connects_to == b)
            .unwrap();
        let db = plan
            .doors_of(b)
            .iter()
            .find(|d| d.connects_to == a)
            .unwrap();
        assert_eq!(da.direction.opposite(), db.direction);

        // Both halves name the same world cell pair across the wall.
        let ra = layout.room(a).unwrap();
        let rb = layout.room(b).unwrap();
        let wa = (ra.x + da.local_x - 1, ra.y + da.local_y - 1);
        let wb = (rb.x + db.local_x - 1, rb.y + db.local_y - 1);
        let (dx, dy) = da.direction.offset();
        assert_eq!(
            (wa.0 as i64 + dx as i64, wa.1 as i64 + dy as i64),
            (wb.0 as i64, wb.1 as i64)
        );
    }
}

#[test]
fn test_breach_door_is_on_south_wall_of_room() {
    let plan = assemble(&ship_layout(3), &TileLibrary::standard()).unwrap();
    let to_breach = plan
        .doors_of(1)
        .iter()
        .find(|d| d.connects_to == 4)
        .unwrap();
    assert_eq!(to_breach.direction, CardinalDirection::South);
    assert_eq!(to_breach.connects_to_kind, RoomKind::AlienBreach);
    assert_eq!(to_breach.local_y, 3);
}

#[test]
fn test_corridor_opens_both_ways() {
    let plan = assemble(&ship_layout(3), &TileLibrary::standard()).unwrap();
    let open = plan.corridor_openings[&3];
    assert!(open.contains(CardinalDirection::West.as_flag()));
    assert!(open.contains(CardinalDirection::East.as_flag()));
    assert!(!open.contains(CardinalDirection::North.as_flag()));
}

#[test]
fn test_opening_doors_links_start_to_finish() {
    let mut plan = assemble(&ship_layout(9), &TileLibrary::standard()).unwrap();
    assert!(plan.connected_rooms(plan.start_room).unwrap().is_empty());

    plan.open_door(1, 3).unwrap();
    assert!(plan.connected_rooms(1).unwrap().is_empty());

    plan.open_door(3, 2).unwrap();
    assert_eq!(plan.connected_rooms(1).unwrap(), vec![2]);
    assert_eq!(plan.connected_rooms(2).unwrap(), vec![1]);

    // Breach is reachable but never a destination.
    plan.open_door(1, 4).unwrap();
    assert_eq!(plan.connected_rooms(1).unwrap(), vec![2]);
    assert!(plan.connectivity.is_connected(2, 4));
}

#[test]
fn test_hull_ring_is_fully_tiled() {
    let plan = assemble(&ship_layout(5), &TileLibrary::standard()).unwrap();
    let ring = 2 * 10 + 2 * 5;
    assert_eq!(plan.boundary_matches.len(), ring);
    // Top edge above room 2 is a plain wall facing north.
    assert_eq!(plan.boundary_matches[&(6, 0)].tile_id, "hull_straight");
    // Ship filler (row 4 east of the breach) is listed for the builder.
    assert!(plan.ship_squares.contains(&(6, 4)));
}

#[test]
fn test_same_seed_same_doors_different_seed_may_differ() {
    let lib = TileLibrary::standard();
    let a = assemble(&ship_layout(11), &lib).unwrap();
    let b = assemble(&ship_layout(11), &lib).unwrap();
    assert_eq!(a.doors_by_room, b.doors_by_room);

    let any_differs = (0..32u64).any(|seed| {
        assemble(&ship_layout(seed), &lib).unwrap().doors_by_room != a.doors_by_room
    });
    assert!(any_differs);
}

#[test]
fn test_metrics_for_ship_layout() {
    let m = LevelMetrics::measure(&ship_layout(1), 16);
    assert_eq!(m.rooms, 4);
    assert_eq!(m.start_finish_distance, Some(2));
    // Only the corridor branches; the breach is not an exit.
    assert_eq!(m.map_linearity, Some(1.0));
    assert_eq!(m.path_redundancy, Some(0.0));
    // Route 1-3-2 sits 0, 1 and 2 hops from breached room 1.
    assert!((m.proximity_to_danger.unwrap() - 3.0 / 9.0).abs() < 1e-9);
    assert!(m.density > 0.0 && m.density < 1.0);
}
