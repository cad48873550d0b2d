//! Difficulty progression: derives the parameters for each upcoming level.
//!
//! Derivation is strictly sequential. The same config and initial seed
//! always produce the same sequence of parameters.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shipgen_logic::layout::GenerationParameters;

use crate::config::ProgressionConfig;

#[derive(Debug, Clone)]
pub struct Progression {
    config: ProgressionConfig,
    rng: ChaCha8Rng,
    next_seed: u64,
    levels_issued: u64,
    batches_issued: u64,
}

impl Progression {
    pub fn new(config: ProgressionConfig, initial_seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(initial_seed),
            next_seed: initial_seed,
            levels_issued: 0,
            batches_issued: 0,
        }
    }

    /// Parameters for the next `count` levels.
    pub fn next_batch(&mut self, count: usize) -> Vec<GenerationParameters> {
        let candidate_levels = if self.batches_issued == 0 {
            self.config.first_batch_candidate_levels
        } else {
            self.config.max_candidate_levels
        };
        self.batches_issued += 1;
        (0..count).map(|_| self.next_level(candidate_levels)).collect()
    }

    fn next_level(&mut self, max_candidate_levels: u32) -> GenerationParameters {
        let c = &self.config;
        let level = u32::try_from(self.levels_issued).unwrap_or(u32::MAX);
        let grow = |start: u32, per_level: u32, cap: u32| {
            start
                .saturating_add(per_level.saturating_mul(level))
                .min(cap)
        };
        let params = GenerationParameters {
            seed: self.next_seed,
            width: self.rng.gen_range(c.widths()),
            height: self.rng.gen_range(c.heights()),
            min_rooms: c.min_rooms,
            max_rooms: c.max_rooms,
            num_breaches: grow(c.breaches_start, c.breaches_per_level, c.breaches_cap),
            num_portals: grow(c.portals_start, c.portals_per_level, c.portals_cap),
            max_candidate_levels,
            worker_threads: c.worker_threads,
        };
        self.next_seed = self.next_seed.wrapping_add(c.seed_stride);
        self.levels_issued += 1;
        log::debug!(
            "Level {} params: seed={} {}x{} rooms={}..={} breaches={} portals={}",
            self.levels_issued,
            params.seed,
            params.width,
            params.height,
            params.min_rooms,
            params.max_rooms,
            params.num_breaches,
            params.num_portals
        );
        params
    }

    pub fn levels_issued(&self) -> u64 {
        self.levels_issued
    }

    pub fn batches_issued(&self) -> u64 {
        self.batches_issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn growing() -> ProgressionConfig {
        ProgressionConfig {
            width_range: (8, 12),
            height_range: (6, 9),
            breaches_start: 1,
            breaches_per_level: 1,
            breaches_cap: 3,
            portals_start: 0,
            portals_per_level: 2,
            portals_cap: 5,
            first_batch_candidate_levels: 1,
            max_candidate_levels: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_seed_advances_by_stride() {
        let mut p = Progression::new(ProgressionConfig::default(), 1234);
        let seeds: Vec<u64> = p.next_batch(3).iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![1234, 1334, 1434]);
        assert_eq!(p.next_batch(1)[0].seed, 1534);
        assert_eq!(p.levels_issued(), 4);
    }

    #[test]
    fn test_counts_grow_and_cap() {
        let mut p = Progression::new(growing(), 0);
        let batch = p.next_batch(5);
        let breaches: Vec<u32> = batch.iter().map(|g| g.num_breaches).collect();
        let portals: Vec<u32> = batch.iter().map(|g| g.num_portals).collect();
        assert_eq!(breaches, vec![1, 2, 3, 3, 3]);
        assert_eq!(portals, vec![0, 2, 4, 5, 5]);
    }

    #[test]
    fn test_dimensions_stay_in_range() {
        let mut p = Progression::new(growing(), 99);
        for g in p.next_batch(200) {
            assert!((8..=12).contains(&g.width));
            assert!((6..=9).contains(&g.height));
        }
    }

    #[test]
    fn test_first_batch_uses_first_batch_candidates() {
        let mut p = Progression::new(growing(), 0);
        assert!(p.next_batch(2).iter().all(|g| g.max_candidate_levels == 1));
        assert!(p.next_batch(2).iter().all(|g| g.max_candidate_levels == 4));
        assert_eq!(p.batches_issued(), 2);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = Progression::new(growing(), 7).next_batch(10);
        let b = Progression::new(growing(), 7).next_batch(10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fixed_ranges_are_exact() {
        let mut p = Progression::new(ProgressionConfig::default(), 0);
        let batch = p.next_batch(1);
        let g = &batch[0];
        assert_eq!((g.width, g.height), (10, 8));
        assert_eq!((g.min_rooms, g.max_rooms), (2, 6));
        assert_eq!((g.num_breaches, g.num_portals), (1, 0));
    }
}
