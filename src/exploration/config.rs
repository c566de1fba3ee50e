//! Exploration configuration

use serde::{Deserialize, Serialize};

use crate::budget::{AnyOf, MaxDepth, MaxPaths, MaxPending, MaxSteps};
use crate::error::{InferResult, InferenceError};

/// What happens to a path once a factor drives its weight to `-inf`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpossiblePathPolicy {
    /// Abandon the path immediately and resume the next pending branch
    #[default]
    Prune,
    /// Run the path to completion and record its outcome with weight `-inf`
    Record,
}

/// Configuration for an exhaustive exploration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    /// Ceiling on completed paths, pruned paths included
    pub max_paths: Option<usize>,
    /// Ceiling on effect invocations
    pub max_steps: Option<usize>,
    /// Ceiling on branches waiting on the worklist
    pub max_pending: Option<usize>,
    /// Ceiling on samples along a single path
    pub max_depth: Option<usize>,
    /// Handling of paths with weight `-inf`
    pub impossible_paths: ImpossiblePathPolicy,
    /// Attach a choice trace to every outcome
    pub record_traces: bool,
}

impl ExploreConfig {
    /// Create a configuration with no ceilings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of paths
    pub fn max_paths(mut self, max: usize) -> Self {
        self.max_paths = Some(max);
        self
    }

    /// Set the maximum number of effect invocations
    pub fn max_steps(mut self, max: usize) -> Self {
        self.max_steps = Some(max);
        self
    }

    /// Set the maximum worklist size
    pub fn max_pending(mut self, max: usize) -> Self {
        self.max_pending = Some(max);
        self
    }

    /// Set the maximum path depth
    pub fn max_depth(mut self, max: usize) -> Self {
        self.max_depth = Some(max);
        self
    }

    /// Set the impossible path policy
    pub fn impossible_paths(mut self, policy: ImpossiblePathPolicy) -> Self {
        self.impossible_paths = policy;
        self
    }

    /// Enable or disable trace recording
    pub fn record_traces(mut self, enabled: bool) -> Self {
        self.record_traces = enabled;
        self
    }

    /// Reject ceilings that no program could satisfy.
    ///
    /// Zero steps, pending branches or depth are legal: they admit exactly
    /// the programs that never sample or never fork.
    pub fn validate(&self) -> InferResult<()> {
        if self.max_paths == Some(0) {
            return Err(InferenceError::Configuration(
                "max_paths must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The ceilings as a budget criterion
    pub fn budget(&self) -> AnyOf {
        let mut budget = AnyOf::default();
        if let Some(max) = self.max_paths {
            budget.push(MaxPaths::new(max));
        }
        if let Some(max) = self.max_steps {
            budget.push(MaxSteps::new(max));
        }
        if let Some(max) = self.max_pending {
            budget.push(MaxPending::new(max));
        }
        if let Some(max) = self.max_depth {
            budget.push(MaxDepth::new(max));
        }
        budget
    }
}
