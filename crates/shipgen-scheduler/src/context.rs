//! The level loop: one explicitly owned context instead of global managers.
//!
//! [`AppContext`] ties the scheduler to assembly. The consumer thread calls
//! [`advance_level`](AppContext::advance_level) whenever the player finishes a
//! level, and forwards door events with [`open_door`](AppContext::open_door).

use shipgen_logic::assembler::{assemble, PlacementPlan};
use shipgen_logic::boundary::TileLibrary;
use shipgen_logic::connectivity::ConnectivityError;
use shipgen_logic::layout::RoomId;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::config::{ContextConfig, ShipgenConfig};
use crate::scheduler::{GenerationScheduler, SchedulerState};
use crate::solver::SolverClient;

#[derive(Debug, Error)]
pub enum AdvanceError {
    #[error("generation was cancelled")]
    Cancelled,
    #[error("generation worker is not running")]
    NotRunning,
    #[error("no level is loaded")]
    NoLevel,
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
}

pub struct AppContext {
    scheduler: GenerationScheduler,
    library: TileLibrary,
    config: ContextConfig,
    current: Option<PlacementPlan>,
    levels_completed: u64,
    layouts_rejected: u64,
}

impl AppContext {
    pub fn new(
        config: &ShipgenConfig,
        solver: Arc<dyn SolverClient>,
        library: TileLibrary,
    ) -> Self {
        Self {
            scheduler: GenerationScheduler::new(config.scheduler.clone(), solver),
            library,
            config: config.context.clone(),
            current: None,
            levels_completed: 0,
            layouts_rejected: 0,
        }
    }

    /// Finish the current level (if any) and load the next one.
    ///
    /// Blocks until a layout is ready. Once the starvation deadline passes,
    /// the solver is asked to settle for its best feasible candidate.
    /// Layouts that fail assembly are skipped.
    pub fn advance_level(&mut self) -> Result<&PlacementPlan, AdvanceError> {
        if self.current.take().is_some() {
            self.levels_completed += 1;
        }
        match self.scheduler.state() {
            SchedulerState::Cancelled => return Err(AdvanceError::Cancelled),
            SchedulerState::Idle => self.scheduler.start(),
            SchedulerState::Generating => {}
        }
        if self.scheduler.state() == SchedulerState::Idle {
            return Err(AdvanceError::NotRunning);
        }

        let cancel = self.scheduler.cancellation();
        let started = Instant::now();
        let mut interrupted = false;
        loop {
            if let Some(layout) = self.scheduler.try_dequeue() {
                match assemble(&layout, &self.library) {
                    Ok(plan) => {
                        log::info!(
                            "Level {} ready (seed {}) after {:?}",
                            self.levels_completed + 1,
                            layout.seed,
                            started.elapsed()
                        );
                        return Ok(self.current.insert(plan));
                    }
                    Err(e) => {
                        self.layouts_rejected += 1;
                        log::warn!("Skipping layout seed {}: {}", layout.seed, e);
                        continue;
                    }
                }
            }
            if cancel.is_requested() {
                return Err(AdvanceError::Cancelled);
            }
            if !interrupted && started.elapsed() >= self.config.starvation_deadline() {
                // Retried every poll until the solver has something to settle for.
                interrupted = self.scheduler.interrupt_current_if_feasible();
                if interrupted {
                    log::info!("No level after {:?}, solver interrupted", started.elapsed());
                }
            }
            if cancel.wait_for(self.config.poll_interval()) {
                return Err(AdvanceError::Cancelled);
            }
        }
    }

    /// Forward a door-open event to the current level's connectivity.
    pub fn open_door(&mut self, a: RoomId, b: RoomId) -> Result<(), AdvanceError> {
        let plan = self.current.as_mut().ok_or(AdvanceError::NoLevel)?;
        plan.open_door(a, b)?;
        Ok(())
    }

    pub fn connected_rooms(&self, id: RoomId) -> Result<Vec<RoomId>, AdvanceError> {
        let plan = self.current.as_ref().ok_or(AdvanceError::NoLevel)?;
        Ok(plan.connected_rooms(id)?)
    }

    pub fn current_level(&self) -> Option<&PlacementPlan> {
        self.current.as_ref()
    }

    pub fn levels_completed(&self) -> u64 {
        self.levels_completed
    }

    /// Layouts dropped because they could not be assembled.
    pub fn layouts_rejected(&self) -> u64 {
        self.layouts_rejected
    }

    pub fn scheduler(&self) -> &GenerationScheduler {
        &self.scheduler
    }

    /// Stop generation and wait for the worker to exit. The current level
    /// stays loaded.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel();
        self.scheduler.reset_after_cancel();
        log::info!(
            "Shut down after {} levels ({} layouts rejected)",
            self.levels_completed,
            self.layouts_rejected
        );
    }
}
