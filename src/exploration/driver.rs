//! Exploration driver
//!
//! The driver seeds a runtime with the program's first path, then pops
//! pending branches until the worklist is empty. Each path runs on the host
//! stack only until it halts; the loop here is the trampoline that keeps the
//! total number of paths off the stack.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use super::config::{ExploreConfig, ImpossiblePathPolicy};
use super::runtime::{Exit, Outcome, Runtime, Step};
use crate::budget::{AnyOf, BudgetCriterion};
use crate::diagnostics::Exploration;
use crate::distribution::SupportValue;
use crate::error::{InferResult, InferenceError};
use crate::posterior::Posterior;

/// Builder for [`Enumerate`]
#[derive(Default)]
pub struct EnumerateBuilder {
    config: ExploreConfig,
    criteria: Vec<Box<dyn BudgetCriterion>>,
}

impl EnumerateBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ExploreConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of paths
    pub fn max_paths(mut self, max: usize) -> Self {
        self.config.max_paths = Some(max);
        self
    }

    /// Set the maximum number of effect invocations
    pub fn max_steps(mut self, max: usize) -> Self {
        self.config.max_steps = Some(max);
        self
    }

    /// Set the maximum worklist size
    pub fn max_pending(mut self, max: usize) -> Self {
        self.config.max_pending = Some(max);
        self
    }

    /// Set the maximum path depth
    pub fn max_depth(mut self, max: usize) -> Self {
        self.config.max_depth = Some(max);
        self
    }

    /// Set the impossible path policy
    pub fn impossible_paths(mut self, policy: ImpossiblePathPolicy) -> Self {
        self.config.impossible_paths = policy;
        self
    }

    /// Enable or disable trace recording
    pub fn record_traces(mut self, enabled: bool) -> Self {
        self.config.record_traces = enabled;
        self
    }

    /// Add a custom budget criterion
    pub fn budget<C: BudgetCriterion + 'static>(mut self, criterion: C) -> Self {
        self.criteria.push(Box::new(criterion));
        self
    }

    /// Build the Enumerate instance
    pub fn build(self) -> InferResult<Enumerate> {
        self.config.validate()?;

        // Config ceilings report first, then custom criteria in insertion order
        let mut budget = self.config.budget();
        for criterion in self.criteria {
            budget.push_boxed(criterion);
        }

        Ok(Enumerate {
            config: self.config,
            budget: Arc::new(budget),
        })
    }
}

/// Exhaustive enumeration of a CPS program's execution paths
#[derive(Clone)]
pub struct Enumerate {
    config: ExploreConfig,
    budget: Arc<dyn BudgetCriterion>,
}

impl Enumerate {
    /// Enumerate with default configuration: no ceilings, prune impossible paths
    pub fn new() -> Self {
        Self {
            config: ExploreConfig::default(),
            budget: Arc::new(AnyOf::default()),
        }
    }

    /// Create a builder for Enumerate
    pub fn builder() -> EnumerateBuilder {
        EnumerateBuilder::new()
    }

    /// Create from a configuration
    pub fn from_config(config: ExploreConfig) -> InferResult<Self> {
        EnumerateBuilder::new().config(config).build()
    }

    /// The active configuration
    pub fn config(&self) -> &ExploreConfig {
        &self.config
    }

    /// Run `program` on every combination of choices.
    ///
    /// Outcomes come back in depth-first order with sibling order reversed:
    /// the last support value of each `sample` is explored first.
    #[instrument(skip_all, name = "explore")]
    pub fn run<'a, R, P>(&self, program: P) -> InferResult<Exploration<R>>
    where
        P: FnOnce(&mut Runtime<'a, R>, Exit<R>) -> Step,
    {
        let start = Instant::now();
        let mut rt = Runtime::new(&self.config, Arc::clone(&self.budget));
        debug!(config = ?self.config, "exploration starting");

        let halt = program(&mut rt, Exit::new())?;
        rt.settle(halt)?;

        while let Some(branch) = rt.resume_next() {
            let halt = rt.resume(branch)?;
            rt.settle(halt)?;
        }

        let (outcomes, mut stats) = rt.finish();
        if stats.final_pending != 0 || stats.branches_pushed != stats.branches_resumed {
            return Err(InferenceError::ProtocolViolation(format!(
                "exploration ended with {} pending branches ({} pushed, {} resumed)",
                stats.final_pending, stats.branches_pushed, stats.branches_resumed
            )));
        }
        stats.set_runtime(start.elapsed());

        debug!(
            paths = stats.paths,
            outcomes = outcomes.len(),
            pruned = stats.pruned_paths,
            max_pending = stats.max_pending,
            "exploration exhausted"
        );
        Ok(Exploration::new(outcomes, stats))
    }

    /// Run `program` and aggregate its outcomes into a posterior
    pub fn posterior<'a, R, P>(&self, program: P) -> InferResult<Posterior<R>>
    where
        R: SupportValue,
        P: FnOnce(&mut Runtime<'a, R>, Exit<R>) -> Step,
    {
        self.run(program)?.posterior()
    }
}

impl Default for Enumerate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Enumerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Explore every execution path of `program` with the default configuration.
///
/// Returns one outcome per path that reached the exit continuation, in
/// depth-first order with sibling order reversed.
pub fn explore<'a, R, P>(program: P) -> InferResult<Vec<Outcome<R>>>
where
    P: FnOnce(&mut Runtime<'a, R>, Exit<R>) -> Step,
{
    Ok(Enumerate::new().run(program)?.into_outcomes())
}

/// Explore `program` and aggregate the outcomes into a posterior
pub fn infer<'a, R, P>(program: P) -> InferResult<Posterior<R>>
where
    R: SupportValue,
    P: FnOnce(&mut Runtime<'a, R>, Exit<R>) -> Step,
{
    Enumerate::new().posterior(program)
}
