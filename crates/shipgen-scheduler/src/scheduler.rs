//! Background level generation.
//!
//! A [`GenerationScheduler`] owns one worker thread that keeps the look-ahead
//! queue topped up: it derives a batch of parameters big enough to refill the
//! queue, solves them one by one, then cools down before the next batch.
//!
//! ```text
//!   Idle ──start()──▶ Generating ──cancel()──▶ Cancelled
//!    ▲                                             │
//!    └──────────── reset_after_cancel() ───────────┘
//! ```

use shipgen_logic::layout::{GenerationParameters, LevelLayout};
use shipgen_logic::validation::{validate_layout, Severity};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::cancel::CancellationContext;
use crate::config::SchedulerConfig;
use crate::lock;
use crate::progression::Progression;
use crate::queue::LookaheadQueue;
use crate::solver::SolverClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Generating,
    Cancelled,
}

/// Running totals since the scheduler was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub batches: u64,
    pub solved: u64,
    pub unsolved: u64,
    /// Solved after cancellation and thrown away.
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct Counters {
    batches: AtomicU64,
    solved: AtomicU64,
    unsolved: AtomicU64,
    discarded: AtomicU64,
}

struct Shared {
    queue: LookaheadQueue,
    state: Mutex<SchedulerState>,
    cancel: CancellationContext,
    counters: Counters,
}

pub struct GenerationScheduler {
    shared: Arc<Shared>,
    solver: Arc<dyn SolverClient>,
    cooldown: Duration,
    /// `None` while the worker owns it.
    progression: Option<Progression>,
    config: SchedulerConfig,
    worker: Option<JoinHandle<Progression>>,
}

impl GenerationScheduler {
    pub fn new(config: SchedulerConfig, solver: Arc<dyn SolverClient>) -> Self {
        let shared = Arc::new(Shared {
            queue: LookaheadQueue::new(config.queue_depth.max(1)),
            state: Mutex::new(SchedulerState::Idle),
            cancel: CancellationContext::new(),
            counters: Counters::default(),
        });
        Self {
            shared,
            solver,
            cooldown: config.cooldown(),
            progression: Some(Progression::new(
                config.progression.clone(),
                config.initial_seed,
            )),
            config,
            worker: None,
        }
    }

    /// Begin (or resume) background generation. No-op while already running.
    pub fn start(&mut self) {
        let shared = Arc::clone(&self.shared);
        let mut state = lock(&shared.state);
        match *state {
            SchedulerState::Cancelled => {
                log::warn!(
                    "Ignoring start(): cancellation pending, call reset_after_cancel() first"
                );
                return;
            }
            SchedulerState::Generating if self.worker_alive() => return,
            SchedulerState::Generating => {
                log::warn!("Generation worker exited unexpectedly, restarting");
            }
            SchedulerState::Idle => {}
        }
        self.reclaim_worker();

        let progression = self.take_progression();
        let worker_shared = Arc::clone(&shared);
        let solver = Arc::clone(&self.solver);
        let cooldown = self.cooldown;
        match std::thread::Builder::new()
            .name("shipgen-generation".into())
            .spawn(move || run_worker(worker_shared, solver, progression, cooldown))
        {
            Ok(handle) => {
                self.worker = Some(handle);
                *state = SchedulerState::Generating;
                log::info!("Generation started (queue depth {})", shared.queue.depth());
            }
            Err(e) => {
                // The progression moved into the failed closure; continue from config.
                log::error!("Failed to spawn generation worker: {e}. Generation stays idle.");
                self.progression = None;
                *state = SchedulerState::Idle;
            }
        }
    }

    /// Ask the worker to stop. The in-flight solve sees it at its next
    /// checkpoint; nothing is queued after this returns.
    pub fn cancel(&self) {
        self.shared.queue.fenced(|| self.shared.cancel.request());
        *lock(&self.shared.state) = SchedulerState::Cancelled;
        log::info!("Generation cancelled");
    }

    /// Wait for a cancelled worker to exit, then allow `start()` again.
    ///
    /// Does nothing if no cancellation is pending.
    pub fn reset_after_cancel(&mut self) {
        if !self.shared.cancel.is_requested() {
            return;
        }
        self.reclaim_worker();
        self.shared.cancel.reset();
        *lock(&self.shared.state) = SchedulerState::Idle;
        log::debug!("Cancellation cleared");
    }

    pub fn try_dequeue(&self) -> Option<LevelLayout> {
        self.shared.queue.pop()
    }

    /// Ask the in-flight solve to settle for the candidate it already has.
    pub fn interrupt_current_if_feasible(&self) -> bool {
        if self.state() != SchedulerState::Generating {
            return false;
        }
        let accepted = self.solver.interrupt_if_feasible();
        log::debug!("Interrupt requested, solver accepted: {}", accepted);
        accepted
    }

    pub fn state(&self) -> SchedulerState {
        *lock(&self.shared.state)
    }

    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn queue_depth(&self) -> usize {
        self.shared.queue.depth()
    }

    pub fn cancellation(&self) -> CancellationContext {
        self.shared.cancel.clone()
    }

    pub fn stats(&self) -> SchedulerStats {
        let c = &self.shared.counters;
        SchedulerStats {
            batches: c.batches.load(Ordering::Relaxed),
            solved: c.solved.load(Ordering::Relaxed),
            unsolved: c.unsolved.load(Ordering::Relaxed),
            discarded: c.discarded.load(Ordering::Relaxed),
        }
    }

    fn worker_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Join the worker, if any, and take back its progression state.
    fn reclaim_worker(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        match handle.join() {
            Ok(progression) => self.progression = Some(progression),
            Err(_) => {
                log::error!("Generation worker panicked; progression restarts from config");
                self.progression = None;
            }
        }
    }

    fn take_progression(&mut self) -> Progression {
        self.progression.take().unwrap_or_else(|| {
            Progression::new(self.config.progression.clone(), self.config.initial_seed)
        })
    }
}

impl Drop for GenerationScheduler {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shared.cancel.request();
            self.reclaim_worker();
        }
    }
}

fn run_worker(
    shared: Arc<Shared>,
    solver: Arc<dyn SolverClient>,
    mut progression: Progression,
    cooldown: Duration,
) -> Progression {
    let cancel = &shared.cancel;
    let checkpoint = || cancel.is_requested();

    while !cancel.is_requested() {
        let deficit = shared.queue.deficit();
        if deficit > 0 {
            let batch = progression.next_batch(deficit);
            shared.counters.batches.fetch_add(1, Ordering::Relaxed);
            log::info!("Dispatching batch of {} levels", batch.len());

            for params in batch {
                if cancel.is_requested() {
                    break;
                }
                let Some(mut layout) = solver.solve(&params, &checkpoint) else {
                    shared.counters.unsolved.fetch_add(1, Ordering::Relaxed);
                    log::info!("Solver found no layout for seed {}", params.seed);
                    continue;
                };
                stamp_parameters(&mut layout, &params);
                report_findings(&layout);
                let seed = layout.seed;
                if shared.queue.push_unless(layout, checkpoint) {
                    shared.counters.solved.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Queued layout seed {} ({} ready)", seed, shared.queue.len());
                } else {
                    shared.counters.discarded.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Discarded layout seed {}", seed);
                }
            }
        }
        if cancel.wait_for(cooldown) {
            break;
        }
    }
    log::info!("Generation worker stopped");
    progression
}

/// Assembly seeds its door stream from `layout.seed`; it must be the
/// parameter seed even if the solver leaves it unset.
fn stamp_parameters(layout: &mut LevelLayout, params: &GenerationParameters) {
    if layout.seed != params.seed && layout.seed != 0 {
        log::warn!(
            "Solver reported seed {} for parameters with seed {}",
            layout.seed,
            params.seed
        );
    }
    layout.seed = params.seed;
    layout.width = params.width;
    layout.height = params.height;
}

fn report_findings(layout: &LevelLayout) {
    for finding in validate_layout(layout) {
        match finding.severity {
            Severity::Error => log::warn!(
                "Layout seed {} [{}]: {}",
                layout.seed,
                finding.category,
                finding.message
            ),
            Severity::Warning => log::debug!(
                "Layout seed {} [{}]: {}",
                layout.seed,
                finding.category,
                finding.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct Stamp;

    impl SolverClient for Stamp {
        fn solve(
            &self,
            params: &GenerationParameters,
            _checkpoint: &dyn Fn() -> bool,
        ) -> Option<LevelLayout> {
            Some(LevelLayout {
                seed: params.seed,
                ..Default::default()
            })
        }
    }

    /// Leaves every metadata field at its default.
    struct Bare;

    impl SolverClient for Bare {
        fn solve(
            &self,
            _params: &GenerationParameters,
            _checkpoint: &dyn Fn() -> bool,
        ) -> Option<LevelLayout> {
            Some(LevelLayout::default())
        }
    }

    fn config(depth: usize) -> SchedulerConfig {
        SchedulerConfig {
            queue_depth: depth,
            cooldown_ms: 5,
            initial_seed: 1000,
            ..Default::default()
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn starts_idle() {
        let s = GenerationScheduler::new(config(3), Arc::new(Stamp));
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(s.queued(), 0);
        assert!(s.try_dequeue().is_none());
        assert!(!s.interrupt_current_if_feasible());
    }

    #[test]
    fn fills_queue_in_seed_order() {
        let mut s = GenerationScheduler::new(config(3), Arc::new(Stamp));
        s.start();
        assert_eq!(s.state(), SchedulerState::Generating);
        assert!(wait_until(|| s.queued() == 3));
        let seeds: Vec<u64> = (0..3).filter_map(|_| s.try_dequeue()).map(|l| l.seed).collect();
        assert_eq!(seeds, vec![1000, 1100, 1200]);
    }

    #[test]
    fn start_is_idempotent() {
        let mut s = GenerationScheduler::new(config(2), Arc::new(Stamp));
        s.start();
        s.start();
        assert!(wait_until(|| s.queued() == 2));
        assert_eq!(s.state(), SchedulerState::Generating);
    }

    #[test]
    fn start_while_cancelled_is_ignored() {
        let mut s = GenerationScheduler::new(config(2), Arc::new(Stamp));
        s.cancel();
        s.start();
        assert_eq!(s.state(), SchedulerState::Cancelled);
        s.reset_after_cancel();
        assert_eq!(s.state(), SchedulerState::Idle);
        s.start();
        assert!(wait_until(|| s.queued() == 2));
    }

    #[test]
    fn reset_without_cancel_is_harmless() {
        let mut s = GenerationScheduler::new(config(2), Arc::new(Stamp));
        s.reset_after_cancel();
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn seeds_continue_across_restart() {
        let mut s = GenerationScheduler::new(config(1), Arc::new(Stamp));
        s.start();
        assert!(wait_until(|| s.queued() == 1));
        s.cancel();
        s.reset_after_cancel();
        assert_eq!(s.try_dequeue().map(|l| l.seed), Some(1000));
        s.start();
        assert!(wait_until(|| s.queued() == 1));
        assert_eq!(s.try_dequeue().map(|l| l.seed), Some(1100));
    }

    #[test]
    fn queued_layouts_carry_their_parameters() {
        let mut s = GenerationScheduler::new(config(2), Arc::new(Bare));
        s.start();
        assert!(wait_until(|| s.queued() == 2));
        let layouts: Vec<LevelLayout> = (0..2).filter_map(|_| s.try_dequeue()).collect();
        let seeds: Vec<u64> = layouts.iter().map(|l| l.seed).collect();
        assert_eq!(seeds, vec![1000, 1100]);
        for l in &layouts {
            assert_eq!((l.width, l.height), (10, 8));
        }
    }
}
