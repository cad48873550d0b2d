//! Property tests for connectivity, door placement and tile matching.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use shipgen_logic::boundary::{pattern_matches, MatchKind, TilePattern, WindowSize};
use shipgen_logic::connectivity::ConnectivityTracker;
use shipgen_logic::direction::{CardinalDirection, Rotation};
use shipgen_logic::doors::place_door;
use shipgen_logic::layout::{GridPos, RoomId, RoomKind, RoomSpec, SquareKind};

// ── Connectivity ───────────────────────────────────────────────────────

const ROOMS: u64 = 12;

fn tracker() -> ConnectivityTracker {
    let mut t = ConnectivityTracker::new();
    for id in 0..ROOMS {
        t.add_room(id, id % 3 != 0).unwrap();
    }
    t
}

fn merges() -> impl Strategy<Value = Vec<(RoomId, RoomId)>> {
    prop::collection::vec((0..ROOMS, 0..ROOMS), 0..40)
}

fn partition(t: &ConnectivityTracker) -> BTreeSet<BTreeSet<RoomId>> {
    t.groups().iter().cloned().collect()
}

proptest! {
    #[test]
    fn groups_always_partition_registered_rooms(ops in merges()) {
        let mut t = tracker();
        for (a, b) in ops {
            t.connect(a, b).unwrap();
            let mut seen = BTreeSet::new();
            for group in t.groups() {
                prop_assert!(!group.is_empty());
                for &id in group {
                    prop_assert!(seen.insert(id), "room {} is in two groups", id);
                }
            }
            prop_assert_eq!(seen, (0..ROOMS).collect::<BTreeSet<_>>());
        }
    }

    #[test]
    fn reachability_never_shrinks(ops in merges()) {
        let mut t = tracker();
        let mut before: Vec<Vec<RoomId>> =
            (0..ROOMS).map(|id| t.connected_to(id).unwrap()).collect();
        for (a, b) in ops {
            t.connect(a, b).unwrap();
            prop_assert!(t.is_connected(a, b));
            for id in 0..ROOMS {
                let after = t.connected_to(id).unwrap();
                for other in &before[id as usize] {
                    prop_assert!(after.contains(other));
                }
                before[id as usize] = after;
            }
        }
    }

    #[test]
    fn merge_order_does_not_matter(ops in merges()) {
        let mut forward = tracker();
        for &(a, b) in &ops {
            forward.connect(a, b).unwrap();
        }
        let mut backward = tracker();
        for &(a, b) in ops.iter().rev() {
            backward.connect(b, a).unwrap();
        }
        prop_assert_eq!(partition(&forward), partition(&backward));
    }

    #[test]
    fn connected_to_lists_only_primary_rooms(ops in merges(), probe in 0..ROOMS) {
        let mut t = tracker();
        for (a, b) in ops {
            t.connect(a, b).unwrap();
        }
        let listed = t.connected_to(probe).unwrap();
        prop_assert!(!listed.contains(&probe));
        prop_assert!(listed.windows(2).all(|w| w[0] < w[1]));
        for id in listed {
            prop_assert!(t.is_primary(id));
            prop_assert!(t.is_connected(probe, id));
        }
    }
}

// ── Door placement ─────────────────────────────────────────────────────

fn room(id: RoomId, x: u32, y: u32, width: u32, height: u32) -> RoomSpec {
    RoomSpec {
        id,
        x,
        y,
        width,
        height,
        kind: RoomKind::Room,
    }
}

/// Two rooms sharing a vertical wall: `b` starts where `a` ends.
fn side_by_side() -> impl Strategy<Value = (RoomSpec, RoomSpec)> {
    (1u32..6, 1u32..6, 1u32..6, 1u32..6).prop_flat_map(|(wa, ha, wb, hb)| {
        // Keep at least one shared row.
        let lo = 10 - (hb - 1);
        (Just((wa, ha, wb, hb)), lo..10 + ha)
    })
    .prop_map(|((wa, ha, wb, hb), yb)| (room(1, 5, 10, wa, ha), room(2, 5 + wa, yb, wb, hb)))
}

proptest! {
    #[test]
    fn door_lies_on_the_shared_wall((a, b) in side_by_side(), seed in any::<u64>(), swap in any::<bool>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (west, east) = if swap {
            let (de, dw) = place_door(&b, &a, &mut rng);
            (dw, de)
        } else {
            place_door(&a, &b, &mut rng)
        };

        prop_assert_eq!(west.direction, CardinalDirection::East);
        prop_assert_eq!(east.direction, CardinalDirection::West);
        prop_assert_eq!(west.local_x, a.width);
        prop_assert_eq!(east.local_x, 1);
        prop_assert!((1..=a.height).contains(&west.local_y));
        prop_assert!((1..=b.height).contains(&east.local_y));

        let world_y = a.y + west.local_y - 1;
        prop_assert_eq!(world_y, b.y + east.local_y - 1);
        prop_assert!(world_y >= a.y.max(b.y));
        prop_assert!(world_y < a.bottom().min(b.bottom()));
    }

    #[test]
    fn transposed_rooms_get_the_same_draw((a, b) in side_by_side(), seed in any::<u64>()) {
        // Mirror the pair across the diagonal: vertical contact becomes horizontal.
        let t = |r: &RoomSpec| room(r.id, r.y, r.x, r.height, r.width);
        let (dw, de) = place_door(&a, &b, &mut ChaCha8Rng::seed_from_u64(seed));
        let (dn, ds) = place_door(&t(&a), &t(&b), &mut ChaCha8Rng::seed_from_u64(seed));
        prop_assert_eq!(dn.direction, CardinalDirection::South);
        prop_assert_eq!(ds.direction, CardinalDirection::North);
        prop_assert_eq!((dn.local_x, dn.local_y), (dw.local_y, dw.local_x));
        prop_assert_eq!((ds.local_x, ds.local_y), (de.local_y, de.local_x));
    }
}

// ── Tile matching ──────────────────────────────────────────────────────

const CENTRE: GridPos = (10, 10);

fn square_kind() -> impl Strategy<Value = SquareKind> {
    prop_oneof![
        Just(SquareKind::Hull),
        Just(SquareKind::Space),
        Just(SquareKind::Room),
        Just(SquareKind::Corridor),
        Just(SquareKind::AlienBreach),
    ]
}

fn match_kind() -> impl Strategy<Value = MatchKind> {
    prop_oneof![
        Just(MatchKind::Hull),
        Just(MatchKind::Space),
        Just(MatchKind::Internal),
        Just(MatchKind::AlienBreach),
    ]
}

fn pattern() -> impl Strategy<Value = TilePattern> {
    (
        prop::collection::btree_map((-1i32..=1, -1i32..=1), match_kind(), 0..9),
        any::<bool>(),
    )
        .prop_map(|(reqs, mirrorable): (BTreeMap<(i32, i32), MatchKind>, bool)| {
            TilePattern::new(
                "p",
                WindowSize::Three,
                WindowSize::Three,
                mirrorable,
                reqs.into_iter().collect(),
            )
            .unwrap()
        })
}

/// A full 3×3 neighbourhood around `CENTRE`, keyed by offset.
fn neighbourhood() -> impl Strategy<Value = BTreeMap<(i32, i32), SquareKind>> {
    prop::collection::vec(square_kind(), 9).prop_map(|kinds| {
        let mut cells = BTreeMap::new();
        let mut k = kinds.into_iter();
        for j in -1..=1 {
            for i in -1..=1 {
                if let Some(kind) = k.next() {
                    cells.insert((i, j), kind);
                }
            }
        }
        cells
    })
}

fn place(cells: &BTreeMap<(i32, i32), SquareKind>, rotation: Rotation) -> HashMap<GridPos, SquareKind> {
    cells
        .iter()
        .map(|(&offset, &kind)| {
            let (dx, dy) = rotation.apply(offset);
            ((CENTRE.0.wrapping_add_signed(dx), CENTRE.1.wrapping_add_signed(dy)), kind)
        })
        .collect()
}

fn compose(outer: Rotation, inner: Rotation) -> Rotation {
    let mut r = inner;
    for _ in 0..outer.degrees() / 90 {
        r = r.next();
    }
    r
}

fn rotation() -> impl Strategy<Value = Rotation> {
    prop::sample::select(Rotation::ALL.to_vec())
}

proptest! {
    #[test]
    fn rotating_the_grid_rotates_the_match(
        p in pattern(),
        cells in neighbourhood(),
        turn in rotation(),
        q in rotation(),
        mirrored in any::<bool>(),
    ) {
        let grid = place(&cells, Rotation::Deg0);
        let turned = place(&cells, turn);
        prop_assert_eq!(
            pattern_matches(&p, CENTRE, &grid, q, mirrored),
            pattern_matches(&p, CENTRE, &turned, compose(turn, q), mirrored)
        );
    }

    #[test]
    fn pattern_always_matches_its_own_imprint(p in pattern(), r in rotation()) {
        let imprint: BTreeMap<(i32, i32), SquareKind> = p
            .requirements()
            .iter()
            .map(|&(offset, kind)| {
                let square = match kind {
                    MatchKind::Hull => SquareKind::Hull,
                    MatchKind::Space => SquareKind::Space,
                    MatchKind::Internal => SquareKind::Corridor,
                    MatchKind::AlienBreach => SquareKind::AlienBreach,
                    MatchKind::Unknown => SquareKind::Unknown,
                };
                (offset, square)
            })
            .collect();
        prop_assert!(pattern_matches(&p, CENTRE, &place(&imprint, r), r, false));
    }
}
