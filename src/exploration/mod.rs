//! Exhaustive exploration of CPS programs
//!
//! This module provides:
//! - The continuation protocol: [`Runtime`], [`Exit`], [`Halt`] and [`Step`]
//! - Type-erased continuations for recursive programs: [`Cont`]
//! - Configuration: [`ExploreConfig`] and [`ImpossiblePathPolicy`]
//! - The driver: [`Enumerate`], [`explore`] and [`infer`]

mod config;
mod continuation;
mod driver;
mod runtime;

pub use config::{ExploreConfig, ImpossiblePathPolicy};
pub use continuation::Cont;
pub use driver::{explore, infer, Enumerate, EnumerateBuilder};
pub use runtime::{Exit, Halt, Outcome, Phase, Runtime, Step};

pub mod prelude {
    pub use super::{
        explore, infer, Cont, Enumerate, EnumerateBuilder, Exit, ExploreConfig, Halt,
        ImpossiblePathPolicy, Outcome, Phase, Runtime, Step,
    };
}
