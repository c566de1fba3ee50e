//! # fugue-exact
//!
//! Exact inference for probabilistic programs by exhaustive enumeration.
//!
//! A program is written in continuation-passing style against two effects:
//! `sample`, which branches on every value of a finite distribution, and
//! `factor`, which re-weights the current execution. The engine runs every
//! combination of choices, records one weighted outcome per path, and
//! aggregates the outcomes into an exact posterior over return values.
//!
//! ## Core Concepts
//!
//! - **Continuations as values**: every effect takes the rest of the program as
//!   a closure; a `sample` with `n` values resumes that closure `n` times
//! - **Trampolined exploration**: pending branches live on a heap worklist, so
//!   the host stack grows with the length of a path, not the number of paths
//! - **Log-space weights**: scores and factors are summed as log-probabilities
//!   and merged with log-sum-exp
//!
//! ## Quick Start
//!
//! ```rust
//! use fugue_exact::prelude::*;
//!
//! # fn main() -> Result<(), InferenceError> {
//! let coin = &bernoulli(0.5)?;
//!
//! // Number of heads in three fair flips
//! let posterior = infer(|rt, exit| {
//!     sample(rt, coin, move |rt, a| {
//!         sample(rt, coin, move |rt, b| {
//!             sample(rt, coin, move |rt, c| {
//!                 exit.resume(rt, [a, b, c].iter().filter(|h| **h).count())
//!             })
//!         })
//!     })
//! })?;
//!
//! assert!((posterior.probability(&1) - 0.375).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```

pub mod budget;
pub mod diagnostics;
pub mod distribution;
pub mod effects;
pub mod error;
pub mod exploration;
pub mod posterior;
pub mod scheduler;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::budget::prelude::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::distribution::prelude::*;
    pub use crate::effects::prelude::*;
    pub use crate::error::*;
    pub use crate::exploration::prelude::*;
    pub use crate::posterior::prelude::*;
    pub use crate::scheduler::prelude::*;
}
