//! Background level generation for shipgen.
//!
//! Drives an external layout solver ahead of demand on a worker thread,
//! keeps a bounded queue of solved layouts, and hands them to the consumer
//! for assembly. Everything stops cooperatively through a shared
//! cancellation flag.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cancel`] | Shared cancellation flag with an interruptible sleep |
//! | [`config`] | Progression/scheduler/context settings, JSON loading |
//! | [`context`] | Level loop owning the scheduler and the current level |
//! | [`progression`] | Per-level parameter derivation |
//! | [`queue`] | Bounded look-ahead FIFO |
//! | [`scheduler`] | Worker thread lifecycle and batch dispatch |
//! | [`solver`] | Solver client contract |

pub mod cancel;
pub mod config;
pub mod context;
pub mod progression;
pub mod queue;
pub mod scheduler;
pub mod solver;

pub use cancel::CancellationContext;
pub use config::{ConfigError, ShipgenConfig};
pub use context::{AdvanceError, AppContext};
pub use scheduler::{GenerationScheduler, SchedulerState, SchedulerStats};
pub use solver::SolverClient;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, recovering from poisoning. Guarded data here is never left
/// half-updated across a panic point.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
