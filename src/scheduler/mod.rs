//! Trampoline scheduler
//!
//! The scheduler owns the worklist: a LIFO stack of suspended branches, each
//! one a continuation already paired with the value it will be resumed with.
//! Plain function calls drive a single execution path forward; breadth across
//! the space of paths lives on this heap-resident stack, so the host stack is
//! bounded by the longest path rather than by the number of paths.

use std::fmt;

use fugue::Trace;

use crate::exploration::{Runtime, Step};

/// A suspended computation that resumes one branch of a `sample` fork
pub(crate) type Thunk<'a, R> = Box<dyn FnOnce(&mut Runtime<'a, R>) -> Step + 'a>;

/// A continuation paired with its resume value and the path state at the fork.
///
/// The branch owns a snapshot of the weight accumulated up to its fork point
/// plus the score of its own value, so resuming it never depends on the
/// weight of whichever path happened to run before it.
pub struct PendingBranch<'a, R> {
    resume: Thunk<'a, R>,
    log_weight: f64,
    depth: usize,
    trace: Option<Trace>,
}

impl<'a, R> PendingBranch<'a, R> {
    pub(crate) fn new(
        resume: Thunk<'a, R>,
        log_weight: f64,
        depth: usize,
        trace: Option<Trace>,
    ) -> Self {
        Self {
            resume,
            log_weight,
            depth,
            trace,
        }
    }

    /// Log-weight the path will carry when this branch resumes
    pub fn log_weight(&self) -> f64 {
        self.log_weight
    }

    /// Number of samples taken along the path, this branch's choice included
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn into_parts(self) -> (Thunk<'a, R>, f64, usize, Option<Trace>) {
        (self.resume, self.log_weight, self.depth, self.trace)
    }
}

impl<R> fmt::Debug for PendingBranch<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingBranch")
            .field("log_weight", &self.log_weight)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// The worklist of one exploration, with push/pop accounting.
///
/// Every branch pushed is either popped exactly once or dropped with the
/// scheduler when exploration fails.
pub struct Scheduler<'a, R> {
    worklist: Vec<PendingBranch<'a, R>>,
    pushed: usize,
    resumed: usize,
    high_water: usize,
}

impl<'a, R> Scheduler<'a, R> {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self {
            worklist: Vec::new(),
            pushed: 0,
            resumed: 0,
            high_water: 0,
        }
    }

    /// Push branches in order; the last one pushed resumes first.
    pub fn fork<I>(&mut self, branches: I)
    where
        I: IntoIterator<Item = PendingBranch<'a, R>>,
    {
        let before = self.worklist.len();
        self.worklist.extend(branches);
        self.pushed += self.worklist.len() - before;
        self.high_water = self.high_water.max(self.worklist.len());
    }

    /// Pop the most recently pushed branch
    pub fn resume_next(&mut self) -> Option<PendingBranch<'a, R>> {
        let branch = self.worklist.pop()?;
        self.resumed += 1;
        Some(branch)
    }

    /// Branches currently waiting
    pub fn pending(&self) -> usize {
        self.worklist.len()
    }

    /// True when no branch is waiting
    pub fn is_empty(&self) -> bool {
        self.worklist.is_empty()
    }

    /// Total branches ever pushed
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Total branches ever popped
    pub fn resumed(&self) -> usize {
        self.resumed
    }

    /// Largest worklist size observed
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}

impl<R> Default for Scheduler<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for Scheduler<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.worklist.len())
            .field("pushed", &self.pushed)
            .field("resumed", &self.resumed)
            .field("high_water", &self.high_water)
            .finish()
    }
}

pub mod prelude {
    pub use super::{PendingBranch, Scheduler};
}
