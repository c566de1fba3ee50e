//! Diagnostics and statistics
//!
//! This module provides statistics collection for exploration runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::distribution::SupportValue;
use crate::error::InferResult;
use crate::exploration::Outcome;
use crate::posterior::{aggregate, Posterior};

/// Counters collected over one exploration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorationStats {
    /// Paths that ended, pruned paths included
    pub paths: usize,
    /// Paths abandoned by an impossible factor
    pub pruned_paths: usize,
    /// Effect invocations
    pub steps: usize,
    /// `sample` calls with more than one value in the support
    pub forks: usize,
    /// Branches pushed onto the worklist
    pub branches_pushed: usize,
    /// Branches popped from the worklist
    pub branches_resumed: usize,
    /// Largest worklist size observed
    pub max_pending: usize,
    /// Longest path, in samples
    pub max_depth: usize,
    /// Branches left on the worklist when the run ended
    pub final_pending: usize,
    /// Wall-clock time of the run (ms)
    pub runtime_ms: f64,
}

impl ExplorationStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths that reached the exit continuation
    pub fn outcomes(&self) -> usize {
        self.paths - self.pruned_paths
    }

    /// Set the run time
    pub fn set_runtime(&mut self, duration: Duration) {
        self.runtime_ms = duration.as_secs_f64() * 1000.0;
    }

    /// True when every pushed branch was resumed and none is left
    pub fn is_balanced(&self) -> bool {
        self.branches_pushed == self.branches_resumed && self.final_pending == 0
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "Exploration Summary:\n\
             - Paths: {} ({} pruned)\n\
             - Steps: {}\n\
             - Forks: {}\n\
             - Max pending: {}\n\
             - Max depth: {}\n\
             - Runtime: {:.2}ms",
            self.paths,
            self.pruned_paths,
            self.steps,
            self.forks,
            self.max_pending,
            self.max_depth,
            self.runtime_ms
        )
    }
}

/// Result of an exploration run
#[derive(Clone, Debug)]
pub struct Exploration<T> {
    /// Every recorded outcome, in exploration order
    pub outcomes: Vec<Outcome<T>>,
    /// Run statistics
    pub stats: ExplorationStats,
}

impl<T> Exploration<T> {
    /// Create a new exploration result
    pub fn new(outcomes: Vec<Outcome<T>>, stats: ExplorationStats) -> Self {
        Self { outcomes, stats }
    }

    /// Drop the statistics
    pub fn into_outcomes(self) -> Vec<Outcome<T>> {
        self.outcomes
    }
}

impl<T: SupportValue> Exploration<T> {
    /// Aggregate the outcomes into a posterior
    pub fn posterior(&self) -> InferResult<Posterior<T>> {
        aggregate(&self.outcomes)
    }
}

pub mod prelude {
    pub use super::{Exploration, ExplorationStats};
}
