//! A stand-in solver that slices the ship interior into vertical strips.
//!
//! Good enough to drive the pipeline end to end without the real constraint
//! solver: a hull ring, `n` strip rooms chained east to west by doors, and an
//! optional alien breach under the first strip.

use shipgen_logic::layout::{
    GenerationParameters, LevelLayout, RoomKind, RoomSpec, SquareKind, SquareSpec,
};
use shipgen_scheduler::SolverClient;
use std::collections::BTreeSet;
use std::time::Duration;

pub struct StripSolver {
    /// Simulated work per room.
    pub step: Duration,
}

impl StripSolver {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl SolverClient for StripSolver {
    fn solve(
        &self,
        params: &GenerationParameters,
        checkpoint: &dyn Fn() -> bool,
    ) -> Option<LevelLayout> {
        let (width, height) = (params.width, params.height);
        if width < 3 || height < 3 || params.min_rooms > params.max_rooms {
            return None;
        }
        let (inner_w, inner_h) = (width - 2, height - 2);
        if inner_w < params.min_rooms.max(1) {
            log::debug!(
                "Seed {}: {} columns cannot hold {} rooms",
                params.seed,
                inner_w,
                params.min_rooms
            );
            return None;
        }

        let span = (params.max_rooms - params.min_rooms + 1) as u64;
        let mixed = params.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 32;
        let count = (params.min_rooms + (mixed % span) as u32).clamp(1, inner_w);
        let breach = params.num_breaches > 0 && inner_h >= 2;

        let mut layout = LevelLayout {
            seed: params.seed,
            width,
            height,
            levels_enumerated: 1,
            ..Default::default()
        };

        let (base, extra) = (inner_w / count, inner_w % count);
        let mut x = 1;
        for i in 0..count {
            if checkpoint() {
                return None;
            }
            std::thread::sleep(self.step);
            let w = base + u32::from(i < extra);
            let h = if i == 0 && breach { inner_h - 1 } else { inner_h };
            let id = i as u64 + 1;
            layout.rooms.push(RoomSpec {
                id,
                x,
                y: 1,
                width: w,
                height: h,
                kind: RoomKind::Room,
            });
            if i > 0 {
                link(&mut layout, id - 1, id);
            }
            x += w;
        }

        if breach {
            let first = layout.rooms[0];
            let id = count as u64 + 1;
            layout.rooms.push(RoomSpec {
                id,
                x: first.x,
                y: first.bottom(),
                width: first.width,
                height: 1,
                kind: RoomKind::AlienBreach,
            });
            link(&mut layout, 1, id);
        }

        if params.num_portals > 0 && count >= 3 {
            layout.portals.insert(1, BTreeSet::from([count as u64]));
            layout.portals.insert(count as u64, BTreeSet::from([1]));
        }

        layout.squares = squares(&layout);
        layout.start_room_id = 1;
        layout.finish_room_id = count as u64;
        Some(layout)
    }
}

fn link(layout: &mut LevelLayout, a: u64, b: u64) {
    layout.doors.entry(a).or_default().insert(b);
    layout.doors.entry(b).or_default().insert(a);
}

fn squares(layout: &LevelLayout) -> Vec<SquareSpec> {
    let mut out = Vec::with_capacity(layout.grid_area() as usize);
    for y in 0..layout.height {
        for x in 0..layout.width {
            let kind = if x == 0 || y == 0 || x == layout.width - 1 || y == layout.height - 1 {
                SquareKind::Hull
            } else {
                layout
                    .rooms
                    .iter()
                    .find(|r| r.contains(x, y))
                    .map_or(SquareKind::Ship, |r| r.kind.square_kind())
            };
            out.push(SquareSpec { x, y, kind });
        }
    }
    out
}
