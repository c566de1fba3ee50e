//! Exploration budgets
//!
//! Exhaustive enumeration does not terminate for programs that recurse without
//! bound at a `sample` site, and it is exponential in the number of choices
//! for all others. Budgets put a ceiling on the work a single `explore` call
//! may do. Exceeding one fails the whole call; a truncated enumeration would
//! report a biased posterior as if it were exact.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Exploration counters checked against a budget
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationState {
    /// Paths completed so far, pruned paths included
    pub paths: usize,
    /// Effect invocations (`sample` and `factor`) so far
    pub steps: usize,
    /// Branches currently waiting on the worklist
    pub pending: usize,
    /// Sample calls along the current path
    pub depth: usize,
}

impl fmt::Display for ExplorationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "paths={}, steps={}, pending={}, depth={}",
            self.paths, self.steps, self.pending, self.depth
        )
    }
}

/// Budget criterion trait
pub trait BudgetCriterion: Send + Sync {
    /// Check if the budget has been exceeded
    fn is_exceeded(&self, state: &ExplorationState) -> bool;

    /// Get a description of the exceeded budget
    fn reason(&self) -> &'static str;

    /// The reason of the first exceeded criterion, if any
    fn check(&self, state: &ExplorationState) -> Option<&'static str> {
        self.is_exceeded(state).then(|| self.reason())
    }
}

/// Fail once more than the given number of paths have completed
#[derive(Clone, Debug)]
pub struct MaxPaths(pub usize);

impl MaxPaths {
    /// Create a new max paths criterion
    pub fn new(max: usize) -> Self {
        Self(max)
    }
}

impl BudgetCriterion for MaxPaths {
    fn is_exceeded(&self, state: &ExplorationState) -> bool {
        state.paths > self.0
    }

    fn reason(&self) -> &'static str {
        "Maximum paths exceeded"
    }
}

/// Fail once more than the given number of effects have run
#[derive(Clone, Debug)]
pub struct MaxSteps(pub usize);

impl MaxSteps {
    /// Create a new max steps criterion
    pub fn new(max: usize) -> Self {
        Self(max)
    }
}

impl BudgetCriterion for MaxSteps {
    fn is_exceeded(&self, state: &ExplorationState) -> bool {
        state.steps > self.0
    }

    fn reason(&self) -> &'static str {
        "Maximum steps exceeded"
    }
}

/// Fail once the worklist holds more than the given number of branches
#[derive(Clone, Debug)]
pub struct MaxPending(pub usize);

impl MaxPending {
    /// Create a new max pending criterion
    pub fn new(max: usize) -> Self {
        Self(max)
    }
}

impl BudgetCriterion for MaxPending {
    fn is_exceeded(&self, state: &ExplorationState) -> bool {
        state.pending > self.0
    }

    fn reason(&self) -> &'static str {
        "Maximum pending branches exceeded"
    }
}

/// Fail once a single path has sampled more than the given number of times
#[derive(Clone, Debug)]
pub struct MaxDepth(pub usize);

impl MaxDepth {
    /// Create a new max depth criterion
    pub fn new(max: usize) -> Self {
        Self(max)
    }
}

impl BudgetCriterion for MaxDepth {
    fn is_exceeded(&self, state: &ExplorationState) -> bool {
        state.depth > self.0
    }

    fn reason(&self) -> &'static str {
        "Maximum path depth exceeded"
    }
}

/// Combine criteria with OR logic (any one exceeded fails the run).
///
/// An empty combination is never exceeded.
#[derive(Default)]
pub struct AnyOf {
    criteria: Vec<Box<dyn BudgetCriterion>>,
}

impl AnyOf {
    /// Create a new AnyOf combinator
    pub fn new(criteria: Vec<Box<dyn BudgetCriterion>>) -> Self {
        Self { criteria }
    }

    /// Add a criterion to the combination
    pub fn push<C: BudgetCriterion + 'static>(&mut self, criterion: C) {
        self.criteria.push(Box::new(criterion));
    }

    /// Add an already boxed criterion
    pub fn push_boxed(&mut self, criterion: Box<dyn BudgetCriterion>) {
        self.criteria.push(criterion);
    }

    /// Number of combined criteria
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// True if no criterion has been added
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl BudgetCriterion for AnyOf {
    fn is_exceeded(&self, state: &ExplorationState) -> bool {
        self.criteria.iter().any(|c| c.is_exceeded(state))
    }

    fn reason(&self) -> &'static str {
        "One of multiple budgets exceeded"
    }

    fn check(&self, state: &ExplorationState) -> Option<&'static str> {
        self.criteria.iter().find_map(|c| c.check(state))
    }
}

pub mod prelude {
    pub use super::{
        AnyOf, BudgetCriterion, ExplorationState, MaxDepth, MaxPaths, MaxPending, MaxSteps,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(paths: usize, steps: usize, pending: usize, depth: usize) -> ExplorationState {
        ExplorationState {
            paths,
            steps,
            pending,
            depth,
        }
    }

    #[test]
    fn test_max_paths() {
        let criterion = MaxPaths::new(8);

        assert!(!criterion.is_exceeded(&state(7, 0, 0, 0)));
        assert!(!criterion.is_exceeded(&state(8, 0, 0, 0)));
        assert!(criterion.is_exceeded(&state(9, 0, 0, 0)));
    }

    #[test]
    fn test_max_steps() {
        let criterion = MaxSteps::new(100);

        assert!(!criterion.is_exceeded(&state(0, 100, 0, 0)));
        assert!(criterion.is_exceeded(&state(0, 101, 0, 0)));
    }

    #[test]
    fn test_max_pending_and_depth() {
        assert!(MaxPending::new(4).is_exceeded(&state(0, 0, 5, 0)));
        assert!(!MaxPending::new(4).is_exceeded(&state(0, 0, 4, 0)));
        assert!(MaxDepth::new(2).is_exceeded(&state(0, 0, 0, 3)));
    }

    #[test]
    fn test_check_reports_reason() {
        let criterion = MaxSteps::new(1);
        assert_eq!(criterion.check(&state(0, 1, 0, 0)), None);
        assert_eq!(
            criterion.check(&state(0, 2, 0, 0)),
            Some("Maximum steps exceeded")
        );
    }

    #[test]
    fn test_any_of() {
        let criterion = AnyOf::new(vec![
            Box::new(MaxPaths::new(10)),
            Box::new(MaxSteps::new(50)),
        ]);

        // Neither exceeded
        assert_eq!(criterion.check(&state(5, 20, 0, 0)), None);

        // Second exceeded, its own reason is reported
        assert_eq!(
            criterion.check(&state(5, 60, 0, 0)),
            Some("Maximum steps exceeded")
        );

        // First exceeded
        assert!(criterion.is_exceeded(&state(11, 0, 0, 0)));
    }

    #[test]
    fn test_empty_any_of_is_unlimited() {
        let criterion = AnyOf::default();
        assert!(criterion.is_empty());
        assert!(!criterion.is_exceeded(&state(usize::MAX, usize::MAX, usize::MAX, usize::MAX)));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            state(1, 2, 3, 4).to_string(),
            "paths=1, steps=2, pending=3, depth=4"
        );
    }
}
