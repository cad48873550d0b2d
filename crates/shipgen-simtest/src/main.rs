//! Shipgen Headless Harness
//!
//! Runs configuration, tile matching, assembly, background generation and
//! the level loop in-process against a stand-in strip solver. No engine, no
//! rendering.
//!
//! Usage:
//!   cargo run -p shipgen-simtest
//!   cargo run -p shipgen-simtest -- --verbose

mod strip;

use shipgen_logic::assembler::{assemble, PlacementPlan};
use shipgen_logic::boundary::TileLibrary;
use shipgen_logic::layout::{GenerationParameters, SquareKind};
use shipgen_logic::metrics::LevelMetrics;
use shipgen_logic::validation::{validate_layout, Severity};
use shipgen_scheduler::config::SchedulerConfig;
use shipgen_scheduler::{
    AppContext, GenerationScheduler, SchedulerState, ShipgenConfig, SolverClient,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strip::StripSolver;

// ── Data files (same JSON a game build ships) ───────────────────────────
const CONFIG_JSON: &str = include_str!("../../../data/shipgen.json");
const TILES_JSON: &str = include_str!("../../../data/tiles.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "warn" }),
    )
    .init();
    println!("=== Shipgen Harness ===\n");

    let mut results = Vec::new();

    // 1. Config file
    results.extend(validate_config(verbose));

    // 2. Tile library
    results.extend(validate_tiles(verbose));

    // 3. Solve + assemble, no threads
    results.extend(validate_assembly(verbose));

    // 4. Background generation
    results.extend(validate_scheduler(verbose));

    // 5. Level loop
    results.extend(validate_level_loop(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Open every door of the level, in edge order.
fn open_all_doors(plan: &mut PlacementPlan) -> usize {
    let edges = plan.layout.adjacency_edges();
    edges
        .iter()
        .filter(|&&(a, b)| plan.open_door(a, b).is_ok())
        .count()
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_config(verbose: bool) -> Vec<TestResult> {
    println!("--- Config ---");
    let mut results = Vec::new();

    let config = match ShipgenConfig::from_json_str(CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "config_parse".into(),
                passed: false,
                detail: format!("{}", e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "config_matches_defaults".into(),
        passed: config == ShipgenConfig::default(),
        detail: "data/shipgen.json reproduces the built-in defaults".into(),
    });

    let reversed = ShipgenConfig::from_json_str(
        r#"{"scheduler": {"progression": {"width_range": [12, 8]}}}"#,
    );
    results.push(TestResult {
        name: "config_rejects_reversed_range".into(),
        passed: reversed.is_err(),
        detail: match reversed {
            Err(e) => format!("rejected: {}", e),
            Ok(_) => "accepted a reversed width range".into(),
        },
    });

    let zero_depth = ShipgenConfig::from_json_str(r#"{"scheduler": {"queue_depth": 0}}"#);
    results.push(TestResult {
        name: "config_rejects_zero_depth".into(),
        passed: zero_depth.is_err(),
        detail: "queue_depth 0 is refused".into(),
    });

    if verbose {
        let p = &config.scheduler.progression;
        println!(
            "  rooms {}..={}, grid {:?}x{:?}, queue depth {}",
            p.min_rooms, p.max_rooms, p.width_range, p.height_range, config.scheduler.queue_depth
        );
    }

    results
}

// ── 2. Tile Library ─────────────────────────────────────────────────────

fn validate_tiles(verbose: bool) -> Vec<TestResult> {
    println!("--- Tile Library ---");
    let mut results = Vec::new();

    let library = match TileLibrary::from_json_str(TILES_JSON) {
        Ok(l) => l,
        Err(e) => {
            results.push(TestResult {
                name: "tiles_parse".into(),
                passed: false,
                detail: format!("{}", e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "tiles_match_standard_kit".into(),
        passed: library == TileLibrary::standard(),
        detail: format!("{} patterns loaded", library.patterns.len()),
    });

    let mut ids = HashSet::new();
    let dupes: Vec<_> = library
        .patterns
        .iter()
        .filter(|p| !ids.insert(p.id()))
        .map(|p| p.id())
        .collect();
    results.push(TestResult {
        name: "tiles_unique_ids".into(),
        passed: dupes.is_empty() && !ids.contains(library.fallback_tile.as_str()),
        detail: if dupes.is_empty() {
            "pattern ids unique, fallback distinct".into()
        } else {
            format!("duplicate ids: {}", dupes.join(", "))
        },
    });

    let bad = TileLibrary::from_json_str(
        r#"{"fallback_tile": "x", "patterns": [{"id": "p", "window_width": "One",
            "window_height": "One", "requirements": [[[1, 0], "Hull"]]}]}"#,
    );
    results.push(TestResult {
        name: "tiles_reject_offset_outside_window".into(),
        passed: bad.is_err(),
        detail: "offset (1,0) in a 1x1 window is refused".into(),
    });

    if verbose {
        for p in &library.patterns {
            println!(
                "    {:20} {} requirements{}",
                p.id(),
                p.requirements().len(),
                if p.mirrorable() { ", mirrorable" } else { "" }
            );
        }
    }

    results
}

// ── 3. Assembly ─────────────────────────────────────────────────────────

fn validate_assembly(verbose: bool) -> Vec<TestResult> {
    println!("--- Assembly ---");
    let mut results = Vec::new();
    let solver = StripSolver::new(Duration::ZERO);
    let library = TileLibrary::standard();
    let never = || false;

    let mut solved = 0;
    let mut findings = Vec::new();
    let mut door_mismatch = Vec::new();
    let mut hull_gaps = Vec::new();
    let mut unreachable = Vec::new();
    let mut nondeterministic = Vec::new();
    let mut assembly_errors = Vec::new();

    for i in 0..20u64 {
        let params = GenerationParameters {
            seed: i * 100,
            width: 8 + (i % 5) as u32,
            height: 6 + (i % 3) as u32,
            ..Default::default()
        };
        let Some(layout) = solver.solve(&params, &never) else {
            continue;
        };
        solved += 1;

        findings.extend(
            validate_layout(&layout)
                .into_iter()
                .filter(|f| f.severity == Severity::Error)
                .map(|f| format!("seed {} [{}] {}", layout.seed, f.category, f.message)),
        );

        let mut plan = match assemble(&layout, &library) {
            Ok(p) => p,
            Err(e) => {
                assembly_errors.push(format!("seed {}: {}", layout.seed, e));
                continue;
            }
        };

        let edges = layout.adjacency_edges().len();
        if plan.door_spec_count() != 2 * edges {
            door_mismatch.push(layout.seed);
        }

        let hull = layout
            .squares
            .iter()
            .filter(|s| s.kind == SquareKind::Hull)
            .count();
        if plan.boundary_matches.len() != hull {
            hull_gaps.push(layout.seed);
        }

        if let Ok(again) = assemble(&layout, &library) {
            if again.doors_by_room != plan.doors_by_room
                || again.boundary_matches != plan.boundary_matches
            {
                nondeterministic.push(layout.seed);
            }
        }

        open_all_doors(&mut plan);
        let reached = plan
            .connected_rooms(plan.start_room)
            .is_ok_and(|r| plan.start_room == plan.finish_room || r.contains(&plan.finish_room));
        if !reached {
            unreachable.push(layout.seed);
        }

        if verbose {
            let max_area = (layout.width as u64 - 2) * (layout.height as u64 - 2);
            let metrics = LevelMetrics::measure(&layout, max_area);
            println!(
                "    seed {:5}: {}",
                layout.seed,
                serde_json::to_string(&metrics).unwrap_or_default()
            );
        }
    }

    results.push(TestResult {
        name: "assembly_layouts_solved".into(),
        passed: solved == 20,
        detail: format!("{}/20 parameter sets solved", solved),
    });
    results.push(TestResult {
        name: "assembly_no_validation_errors".into(),
        passed: findings.is_empty(),
        detail: if findings.is_empty() {
            "no error findings".into()
        } else {
            findings.join("; ")
        },
    });
    results.push(TestResult {
        name: "assembly_succeeds".into(),
        passed: assembly_errors.is_empty(),
        detail: if assembly_errors.is_empty() {
            "every layout assembled".into()
        } else {
            assembly_errors.join("; ")
        },
    });
    results.push(TestResult {
        name: "assembly_two_specs_per_door".into(),
        passed: door_mismatch.is_empty(),
        detail: format!("mismatched seeds: {:?}", door_mismatch),
    });
    results.push(TestResult {
        name: "assembly_every_hull_cell_tiled".into(),
        passed: hull_gaps.is_empty(),
        detail: format!("seeds with untiled hull: {:?}", hull_gaps),
    });
    results.push(TestResult {
        name: "assembly_deterministic".into(),
        passed: nondeterministic.is_empty(),
        detail: format!("seeds differing on rerun: {:?}", nondeterministic),
    });
    results.push(TestResult {
        name: "assembly_finish_reachable".into(),
        passed: unreachable.is_empty(),
        detail: format!("seeds with unreachable finish: {:?}", unreachable),
    });

    results
}

// ── 4. Scheduler ────────────────────────────────────────────────────────

fn validate_scheduler(verbose: bool) -> Vec<TestResult> {
    println!("--- Scheduler ---");
    let mut results = Vec::new();

    let config = SchedulerConfig {
        queue_depth: 3,
        cooldown_ms: 10,
        initial_seed: 500,
        ..Default::default()
    };
    let stride = config.progression.seed_stride;
    let solver = Arc::new(StripSolver::new(Duration::from_millis(1)));
    let mut scheduler = GenerationScheduler::new(config, solver);
    scheduler.start();

    let filled = wait_until(Duration::from_secs(5), || scheduler.queued() == 3);
    results.push(TestResult {
        name: "scheduler_fills_queue".into(),
        passed: filled,
        detail: format!("{}/{} queued", scheduler.queued(), scheduler.queue_depth()),
    });

    // Give the worker a few cooldowns to overshoot if it were going to.
    std::thread::sleep(Duration::from_millis(50));
    results.push(TestResult {
        name: "scheduler_respects_depth".into(),
        passed: scheduler.queued() <= scheduler.queue_depth(),
        detail: format!("{} queued after idling", scheduler.queued()),
    });

    let seeds: Vec<u64> = std::iter::from_fn(|| scheduler.try_dequeue())
        .map(|l| l.seed)
        .collect();
    let expected: Vec<u64> = (0..seeds.len() as u64).map(|i| 500 + i * stride).collect();
    results.push(TestResult {
        name: "scheduler_seed_order".into(),
        passed: !seeds.is_empty() && seeds == expected,
        detail: format!("seeds {:?}", seeds),
    });

    scheduler.cancel();
    let queued_at_cancel = scheduler.queued();
    std::thread::sleep(Duration::from_millis(50));
    results.push(TestResult {
        name: "scheduler_cancel_stops_enqueueing".into(),
        passed: scheduler.queued() == queued_at_cancel
            && scheduler.state() == SchedulerState::Cancelled,
        detail: format!("{} queued before, {} after", queued_at_cancel, scheduler.queued()),
    });

    scheduler.reset_after_cancel();
    let idle = scheduler.state() == SchedulerState::Idle;
    scheduler.start();
    let resumed = wait_until(Duration::from_secs(5), || scheduler.queued() >= 1);
    let next_seed = scheduler.try_dequeue().map(|l| l.seed);
    results.push(TestResult {
        name: "scheduler_resumes_after_reset".into(),
        passed: idle && resumed && next_seed.is_some_and(|s| s > *seeds.last().unwrap_or(&0)),
        detail: format!("first seed after restart: {:?}", next_seed),
    });

    if verbose {
        println!("  {:?}", scheduler.stats());
    }

    results
}

// ── 5. Level Loop ───────────────────────────────────────────────────────

fn validate_level_loop(verbose: bool) -> Vec<TestResult> {
    println!("--- Level Loop ---");
    let mut results = Vec::new();

    let mut config = ShipgenConfig::default();
    config.scheduler.queue_depth = 2;
    config.scheduler.cooldown_ms = 10;
    config.context.poll_interval_ms = 5;
    config.scheduler.progression.width_range = (8, 14);
    config.scheduler.progression.height_range = (6, 9);

    let solver = Arc::new(StripSolver::new(Duration::from_millis(1)));
    let mut ctx = AppContext::new(&config, solver, TileLibrary::standard());

    const LEVELS: usize = 5;
    let mut played = 0;
    let mut closed_at_start = true;
    let mut finish_reached = true;
    let mut sizes = Vec::new();

    for _ in 0..LEVELS {
        let (start, finish, edges, size) = match ctx.advance_level() {
            Ok(plan) => (
                plan.start_room,
                plan.finish_room,
                plan.layout.adjacency_edges(),
                (plan.layout.width, plan.layout.height),
            ),
            Err(e) => {
                results.push(TestResult {
                    name: "level_loop_advance".into(),
                    passed: false,
                    detail: format!("{}", e),
                });
                break;
            }
        };
        played += 1;
        sizes.push(size);

        if ctx.connected_rooms(start).map_or(true, |r| !r.is_empty()) {
            closed_at_start = false;
        }
        for (a, b) in edges {
            if let Err(e) = ctx.open_door(a, b) {
                log::warn!("open_door({}, {}) failed: {}", a, b, e);
            }
        }
        let reached = start == finish
            || ctx
                .connected_rooms(start)
                .is_ok_and(|r| r.contains(&finish));
        finish_reached &= reached;
    }

    results.push(TestResult {
        name: "level_loop_plays_levels".into(),
        passed: played == LEVELS && ctx.levels_completed() == LEVELS as u64 - 1,
        detail: format!("{} played, {} completed", played, ctx.levels_completed()),
    });
    results.push(TestResult {
        name: "level_loop_doors_start_closed".into(),
        passed: closed_at_start,
        detail: "start room reaches nothing before any door opens".into(),
    });
    results.push(TestResult {
        name: "level_loop_finish_reachable".into(),
        passed: finish_reached,
        detail: "opening every door connects start to finish".into(),
    });

    let in_range = sizes
        .iter()
        .all(|&(w, h)| (8..=14).contains(&w) && (6..=9).contains(&h));
    results.push(TestResult {
        name: "level_loop_sizes_in_range".into(),
        passed: in_range,
        detail: format!("grid sizes {:?}", sizes),
    });

    ctx.shutdown();
    results.push(TestResult {
        name: "level_loop_shutdown".into(),
        passed: ctx.scheduler().state() == SchedulerState::Idle && ctx.current_level().is_some(),
        detail: "worker joined, last level still loaded".into(),
    });

    if verbose {
        println!(
            "  {} layouts rejected, {:?}",
            ctx.layouts_rejected(),
            ctx.scheduler().stats()
        );
    }

    results
}
