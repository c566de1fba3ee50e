//! Per-exploration runtime state and the continuation protocol
//!
//! A program in continuation-passing style never returns a value. Every
//! effectful step hands the rest of the computation to an effect primitive,
//! and the only way a path ends is by producing a [`Halt`] token, which the
//! primitives and the [`Exit`] continuation alone can construct.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use fugue::{addr, ChoiceValue, Trace};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::config::{ExploreConfig, ImpossiblePathPolicy};
use crate::budget::{BudgetCriterion, ExplorationState};
use crate::diagnostics::ExplorationStats;
use crate::error::{InferResult, InferenceError};
use crate::scheduler::{PendingBranch, Scheduler, Thunk};

/// Proof that the current path handed control back to the scheduler.
///
/// Only the effect primitives and the exit continuation can build one, so a
/// continuation that tries to return a plain value does not type-check.
#[must_use = "a continuation must return its Halt to the scheduler"]
#[derive(Debug)]
pub struct Halt {
    _private: (),
}

impl Halt {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// What every continuation returns
pub type Step = Result<Halt, InferenceError>;

/// Driver state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// One path's continuation chain is executing
    Running,
    /// The current path ended; the driver is about to pop the next branch
    Resuming,
    /// The worklist drained; exploration is over
    Exhausted,
}

/// A completed execution path: its return value and accumulated log-weight
#[derive(Clone, Debug)]
pub struct Outcome<T> {
    /// The value passed to the exit continuation
    pub value: T,
    /// Sum of every score and factor along the path
    pub log_weight: f64,
    /// Choices made along the path, when trace recording is enabled
    pub trace: Option<Trace>,
}

impl<T> Outcome<T> {
    /// Create an outcome without a trace
    pub fn new(value: T, log_weight: f64) -> Self {
        Self {
            value,
            log_weight,
            trace: None,
        }
    }

    /// Unnormalized probability of the path
    pub fn weight(&self) -> f64 {
        self.log_weight.exp()
    }

    /// True if a factor of `-inf` excluded the path
    pub fn is_impossible(&self) -> bool {
        self.log_weight == f64::NEG_INFINITY
    }
}

/// The distinguished exit continuation handed to every program.
///
/// Resuming it records the program's return value as an outcome and ends the
/// current path.
pub struct Exit<R> {
    _marker: PhantomData<fn(R)>,
}

impl<R> Exit<R> {
    pub(crate) fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Finish the current path with `value`
    pub fn resume(self, rt: &mut Runtime<'_, R>, value: R) -> Step {
        rt.complete(value)
    }
}

impl<R> Clone for Exit<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Exit<R> {}

impl<R> fmt::Debug for Exit<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Exit")
    }
}

/// State of one `explore` call, threaded through every continuation.
///
/// Nothing here is global: two explorations never share a runtime, and the
/// path weight belongs to whichever path is currently running.
pub struct Runtime<'a, R> {
    scheduler: Scheduler<'a, R>,
    budget: Arc<dyn BudgetCriterion>,
    policy: ImpossiblePathPolicy,
    phase: Phase,
    log_weight: f64,
    depth: usize,
    trace: Option<Trace>,
    outcomes: Vec<Outcome<R>>,
    stats: ExplorationStats,
}

impl<'a, R> Runtime<'a, R> {
    pub(crate) fn new(config: &ExploreConfig, budget: Arc<dyn BudgetCriterion>) -> Self {
        Self {
            scheduler: Scheduler::new(),
            budget,
            policy: config.impossible_paths,
            phase: Phase::Running,
            log_weight: 0.0,
            depth: 0,
            trace: config.record_traces.then(Trace::default),
            outcomes: Vec::new(),
            stats: ExplorationStats::new(),
        }
    }

    /// Log-weight accumulated by the current path
    pub fn log_weight(&self) -> f64 {
        self.log_weight
    }

    /// Number of samples taken along the current path
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Branches waiting on the worklist
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    /// Current driver phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Outcomes recorded so far
    pub fn outcomes(&self) -> &[Outcome<R>] {
        &self.outcomes
    }

    /// Counters checked against the budget
    pub fn state(&self) -> ExplorationState {
        ExplorationState {
            paths: self.stats.paths,
            steps: self.stats.steps,
            pending: self.scheduler.pending(),
            depth: self.depth,
        }
    }

    fn ensure_running(&self, what: &str) -> InferResult<()> {
        match self.phase {
            Phase::Running => Ok(()),
            phase => Err(InferenceError::ProtocolViolation(format!(
                "{what} invoked while the exploration is {phase:?}; \
                 the current path already reached its exit"
            ))),
        }
    }

    fn check_budget(&self) -> InferResult<()> {
        let state = self.state();
        match self.budget.check(&state) {
            Some(reason) => {
                warn!(reason, %state, "exploration budget exceeded");
                Err(InferenceError::BudgetExceeded { reason, state })
            }
            None => Ok(()),
        }
    }

    /// Entry point of every effect primitive
    pub(crate) fn begin_effect(&mut self, effect: &str) -> InferResult<()> {
        self.ensure_running(effect)?;
        self.stats.steps += 1;
        self.check_budget()
    }

    fn record_choice(trace: &mut Trace, site: usize, index: usize, log_prob: f64) {
        trace.insert_choice(addr!("sample", site), ChoiceValue::Usize(index), log_prob);
    }

    /// Suspend a sibling of the current path that chose support `index`
    pub(crate) fn branch(
        &self,
        index: usize,
        log_prob: f64,
        resume: Thunk<'a, R>,
    ) -> PendingBranch<'a, R> {
        let trace = self.trace.as_ref().map(|trace| {
            let mut trace = trace.clone();
            Self::record_choice(&mut trace, self.depth, index, log_prob);
            trace
        });
        PendingBranch::new(resume, self.log_weight + log_prob, self.depth + 1, trace)
    }

    pub(crate) fn fork(&mut self, branches: Vec<PendingBranch<'a, R>>) -> InferResult<()> {
        if !branches.is_empty() {
            self.stats.forks += 1;
            trace!(
                alternatives = branches.len(),
                depth = self.depth,
                pending = self.scheduler.pending() + branches.len(),
                "fork"
            );
        }
        self.scheduler.fork(branches);
        self.check_budget()
    }

    /// Continue the current path with support `index`
    pub(crate) fn advance(&mut self, index: usize, log_prob: f64) -> InferResult<()> {
        if let Some(trace) = self.trace.as_mut() {
            Self::record_choice(trace, self.depth, index, log_prob);
        }
        self.log_weight += log_prob;
        self.depth += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.depth);
        self.check_budget()
    }

    pub(crate) fn reweight(&mut self, log_weight: f64) {
        self.log_weight += log_weight;
    }

    pub(crate) fn should_prune(&self) -> bool {
        self.log_weight == f64::NEG_INFINITY && self.policy == ImpossiblePathPolicy::Prune
    }

    /// End an impossible path without recording an outcome
    pub(crate) fn abandon(&mut self) -> Step {
        self.stats.paths += 1;
        self.stats.pruned_paths += 1;
        self.phase = Phase::Resuming;
        trace!(depth = self.depth, "path pruned");
        self.check_budget()?;
        Ok(Halt::new())
    }

    pub(crate) fn complete(&mut self, value: R) -> Step {
        self.ensure_running("exit continuation")?;
        self.stats.paths += 1;
        self.check_budget()?;

        trace!(
            log_weight = self.log_weight,
            depth = self.depth,
            "path complete"
        );
        self.outcomes.push(Outcome {
            value,
            log_weight: self.log_weight,
            trace: self.trace.take(),
        });
        self.phase = Phase::Resuming;
        Ok(Halt::new())
    }

    /// Consume the token returned by a finished path
    pub(crate) fn settle(&mut self, halt: Halt) -> InferResult<()> {
        let Halt { _private: () } = halt;
        match self.phase {
            Phase::Resuming => Ok(()),
            phase => Err(InferenceError::ProtocolViolation(format!(
                "path halted while the exploration is {phase:?}"
            ))),
        }
    }

    pub(crate) fn resume_next(&mut self) -> Option<PendingBranch<'a, R>> {
        let branch = self.scheduler.resume_next();
        if branch.is_none() {
            self.phase = Phase::Exhausted;
        }
        branch
    }

    /// Restore a branch's path state and run it
    pub(crate) fn resume(&mut self, branch: PendingBranch<'a, R>) -> Step {
        let (thunk, log_weight, depth, trace) = branch.into_parts();
        trace!(log_weight, depth, pending = self.scheduler.pending(), "resume");

        self.log_weight = log_weight;
        self.depth = depth;
        self.trace = trace;
        self.phase = Phase::Running;
        thunk(self)
    }

    pub(crate) fn finish(mut self) -> (Vec<Outcome<R>>, ExplorationStats) {
        self.stats.branches_pushed = self.scheduler.pushed();
        self.stats.branches_resumed = self.scheduler.resumed();
        self.stats.max_pending = self.scheduler.high_water();
        self.stats.final_pending = self.scheduler.pending();
        (self.outcomes, self.stats)
    }
}

impl<R> fmt::Debug for Runtime<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("phase", &self.phase)
            .field("log_weight", &self.log_weight)
            .field("depth", &self.depth)
            .field("scheduler", &self.scheduler)
            .field("outcomes", &self.outcomes.len())
            .finish_non_exhaustive()
    }
}
