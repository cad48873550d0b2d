//! Contract with the external layout solver.

use shipgen_logic::layout::{GenerationParameters, LevelLayout};
use std::sync::Arc;

/// A synchronous layout solver.
///
/// `solve` is called from the scheduler's worker thread, one call at a time.
/// It must poll `checkpoint` regularly; once it returns `true` the solver
/// should stop and return its best candidate so far, or `None`.
///
/// The scheduler overwrites `seed`, `width` and `height` of the returned
/// layout with the values from `params`.
pub trait SolverClient: Send + Sync {
    fn solve(
        &self,
        params: &GenerationParameters,
        checkpoint: &dyn Fn() -> bool,
    ) -> Option<LevelLayout>;

    /// Ask an in-flight `solve` to finish early if it already holds a
    /// feasible layout. Returns whether the request was accepted.
    fn interrupt_if_feasible(&self) -> bool {
        false
    }
}

impl<S: SolverClient + ?Sized> SolverClient for Arc<S> {
    fn solve(
        &self,
        params: &GenerationParameters,
        checkpoint: &dyn Fn() -> bool,
    ) -> Option<LevelLayout> {
        (**self).solve(params, checkpoint)
    }

    fn interrupt_if_feasible(&self) -> bool {
        (**self).interrupt_if_feasible()
    }
}

impl<S: SolverClient + ?Sized> SolverClient for Box<S> {
    fn solve(
        &self,
        params: &GenerationParameters,
        checkpoint: &dyn Fn() -> bool,
    ) -> Option<LevelLayout> {
        (**self).solve(params, checkpoint)
    }

    fn interrupt_if_feasible(&self) -> bool {
        (**self).interrupt_if_feasible()
    }
}
