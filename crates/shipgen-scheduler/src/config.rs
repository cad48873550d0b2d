//! Configuration for generation, progression and the level loop.
//!
//! Every struct has a `Default` that reproduces the stock game settings, so a
//! config file only needs to name the fields it changes.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// PROGRESSION
// ============================================================================

/// How generation parameters evolve from one level to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub min_rooms: u32,
    pub max_rooms: u32,
    /// Grid width, drawn uniformly per level (inclusive).
    pub width_range: (u32, u32),
    /// Grid height, drawn uniformly per level (inclusive).
    pub height_range: (u32, u32),
    pub breaches_start: u32,
    /// Extra breaches added per generated level.
    pub breaches_per_level: u32,
    pub breaches_cap: u32,
    pub portals_start: u32,
    pub portals_per_level: u32,
    pub portals_cap: u32,
    /// Solver seed increment between consecutive levels.
    pub seed_stride: u64,
    /// Candidate levels the solver may enumerate for the very first batch.
    pub first_batch_candidate_levels: u32,
    /// Candidate levels per solve once the queue has been primed.
    pub max_candidate_levels: u32,
    pub worker_threads: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            min_rooms: 2,
            max_rooms: 6,
            width_range: (10, 10),
            height_range: (8, 8),
            breaches_start: 1,
            breaches_per_level: 0,
            breaches_cap: 1,
            portals_start: 0,
            portals_per_level: 0,
            portals_cap: 0,
            seed_stride: 100,
            first_batch_candidate_levels: 1,
            max_candidate_levels: 1,
            worker_threads: 1,
        }
    }
}

impl ProgressionConfig {
    pub fn widths(&self) -> RangeInclusive<u32> {
        self.width_range.0..=self.width_range.1
    }

    pub fn heights(&self) -> RangeInclusive<u32> {
        self.height_range.0..=self.height_range.1
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.min_rooms <= self.max_rooms, "min_rooms exceeds max_rooms"),
            (self.width_range.0 <= self.width_range.1, "width_range is reversed"),
            (self.height_range.0 <= self.height_range.1, "height_range is reversed"),
            (self.width_range.0 >= 1 && self.height_range.0 >= 1, "grid must be at least 1×1"),
            (self.breaches_start <= self.breaches_cap, "breaches_start exceeds breaches_cap"),
            (self.portals_start <= self.portals_cap, "portals_start exceeds portals_cap"),
            (self.worker_threads >= 1, "worker_threads must be at least 1"),
            (
                self.first_batch_candidate_levels >= 1 && self.max_candidate_levels >= 1,
                "candidate level counts must be at least 1",
            ),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, problem)) => Err(ConfigError::Invalid(format!("progression: {problem}"))),
            None => Ok(()),
        }
    }
}

// ============================================================================
// SCHEDULER / CONTEXT
// ============================================================================

/// Background generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Target number of solved layouts kept ready.
    pub queue_depth: usize,
    /// Pause after each batch, in milliseconds.
    pub cooldown_ms: u64,
    /// Seed of the first level; the progression RNG is seeded from it too.
    pub initial_seed: u64,
    pub progression: ProgressionConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue_depth: 5,
            cooldown_ms: 250,
            initial_seed: 0,
            progression: ProgressionConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Level loop settings for [`AppContext`](crate::context::AppContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// How often to poll the queue while waiting for a level.
    pub poll_interval_ms: u64,
    /// How long to wait before asking the solver to settle for what it has.
    pub starvation_deadline_ms: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
            starvation_deadline_ms: 5_000,
        }
    }
}

impl ContextConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn starvation_deadline(&self) -> Duration {
        Duration::from_millis(self.starvation_deadline_ms)
    }
}

// ============================================================================
// TOP LEVEL
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipgenConfig {
    pub scheduler: SchedulerConfig,
    pub context: ContextConfig,
}

impl ShipgenConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ShipgenConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.queue_depth == 0 {
            return Err(ConfigError::Invalid(
                "scheduler: queue_depth must be at least 1".to_string(),
            ));
        }
        if self.context.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "context: poll_interval_ms must be at least 1".to_string(),
            ));
        }
        self.scheduler.progression.validate()
    }
}
