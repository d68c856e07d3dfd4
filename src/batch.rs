//! Batch simulation: many independent matches run in parallel with rayon
//!
//! Every match owns its state and RNG; match `i` is seeded with
//! `base_seed.wrapping_add(i)`, so a batch is reproducible regardless of how
//! rayon schedules it.

use crate::config::SimConfig;
use crate::game::{simulate, MatchResult};
use crate::loader::Deck;
use crate::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Aggregated results of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub matches: u64,
    pub wins: u64,
    pub stalls: u64,
    pub losses: u64,
    pub total_score: u64,
}

impl BatchSummary {
    pub fn record(&mut self, result: &MatchResult) {
        self.matches += 1;
        if result.won {
            self.wins += 1;
        } else if result.stalled {
            self.stalls += 1;
        } else {
            self.losses += 1;
        }
        self.total_score += result.score;
    }

    /// Combine two partial summaries
    pub fn merge(mut self, other: BatchSummary) -> BatchSummary {
        self.matches += other.matches;
        self.wins += other.wins;
        self.stalls += other.stalls;
        self.losses += other.losses;
        self.total_score += other.total_score;
        self
    }

    pub fn win_rate(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.wins as f64 / self.matches as f64
        }
    }

    pub fn average_score(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.total_score as f64 / self.matches as f64
        }
    }
}

/// Run `matches` games of `player` against `enemy`
///
/// Stops at the first match that fails with a data error.
pub fn simulate_batch(
    config: Arc<SimConfig>,
    player: &Deck,
    enemy: &Deck,
    base_seed: u64,
    matches: u64,
) -> Result<BatchSummary> {
    config.validate()?;
    (0..matches)
        .into_par_iter()
        .map(|i| {
            let seed = base_seed.wrapping_add(i);
            let result = simulate(Arc::clone(&config), player.clone(), enemy.clone(), seed)?;
            let mut summary = BatchSummary::default();
            summary.record(&result);
            Ok(summary)
        })
        .try_reduce(BatchSummary::default, |a, b| Ok(a.merge(b)))
}
