//! Effect primitives
//!
//! `sample` and `factor` are the only operations that touch the scheduler.
//! Both take the rest of the computation as an explicit continuation and hand
//! back the [`Halt`](crate::exploration::Halt) that continuation eventually
//! produces; neither ever returns a value to its caller.
//!
//! The derived effects (`observe`, `condition`, `sample_indexed`) are written
//! in terms of the same runtime hooks and add no scheduler surface.

use tracing::trace;

use crate::distribution::{Distribution, SupportValue};
use crate::error::DomainError;
use crate::exploration::{Runtime, Step};
use crate::scheduler::Thunk;

/// Branch on every value in the support of `dist`.
///
/// The current path continues directly with the last support value; every
/// other value is pushed onto the worklist, paired with its own clone of `k`,
/// and resumed later by the driver. Each branch carries the weight at the fork
/// point plus the score of its value.
pub fn sample<'a, T, R, K>(rt: &mut Runtime<'a, R>, dist: &Distribution<T>, k: K) -> Step
where
    T: SupportValue + 'a,
    R: 'a,
    K: FnOnce(&mut Runtime<'a, R>, T) -> Step + Clone + 'a,
{
    sample_indexed(rt, dist, move |rt: &mut Runtime<'a, R>, _index: usize, value: T| {
        k(rt, value)
    })
}

/// Like [`sample`], but the continuation also receives the support index of
/// the chosen value.
pub fn sample_indexed<'a, T, R, K>(rt: &mut Runtime<'a, R>, dist: &Distribution<T>, k: K) -> Step
where
    T: SupportValue + 'a,
    R: 'a,
    K: FnOnce(&mut Runtime<'a, R>, usize, T) -> Step + Clone + 'a,
{
    rt.begin_effect("sample")?;

    let support = dist.support();
    let log_probs = dist.log_probs();
    let Some(last) = support.len().checked_sub(1) else {
        return Err(DomainError::EmptySupport {
            name: dist.name().to_string(),
        }
        .into());
    };
    trace!(
        distribution = dist.name(),
        alternatives = support.len(),
        depth = rt.depth(),
        "sample"
    );

    let branches = (0..last)
        .map(|index| {
            let k = k.clone();
            let value = support[index].clone();
            let resume: Thunk<'a, R> =
                Box::new(move |rt: &mut Runtime<'a, R>| k(rt, index, value));
            rt.branch(index, log_probs[index], resume)
        })
        .collect();
    rt.fork(branches)?;

    rt.advance(last, log_probs[last])?;
    k(rt, last, support[last].clone())
}

/// Add `log_weight` to the current path's weight, then continue.
///
/// A weight of `-inf` marks the path impossible. Under the default
/// [`ImpossiblePathPolicy::Prune`](crate::exploration::ImpossiblePathPolicy)
/// the path is abandoned on the spot; under `Record` it runs to completion
/// and its outcome carries weight `-inf`. NaN and `+inf` are rejected.
pub fn factor<'a, R, K>(rt: &mut Runtime<'a, R>, log_weight: f64, k: K) -> Step
where
    K: FnOnce(&mut Runtime<'a, R>, ()) -> Step,
{
    rt.begin_effect("factor")?;

    if log_weight.is_nan() || log_weight == f64::INFINITY {
        return Err(DomainError::InvalidWeight {
            name: "factor".to_string(),
            weight: log_weight,
        }
        .into());
    }

    rt.reweight(log_weight);
    if rt.should_prune() {
        return rt.abandon();
    }
    k(rt, ())
}

/// Condition on `value` having been drawn from `dist`.
///
/// Equivalent to `factor(dist.score(value))`. A value outside the support is
/// an impossible observation and contributes `-inf` rather than an error.
pub fn observe<'a, T, R, K>(rt: &mut Runtime<'a, R>, dist: &Distribution<T>, value: &T, k: K) -> Step
where
    T: SupportValue,
    K: FnOnce(&mut Runtime<'a, R>, ()) -> Step,
{
    let log_weight = match dist.score(value) {
        Ok(score) => score,
        Err(err) => {
            trace!(%err, "observation outside support");
            f64::NEG_INFINITY
        }
    };
    factor(rt, log_weight, k)
}

/// Hard conditioning: keep the path only if `holds`
pub fn condition<'a, R, K>(rt: &mut Runtime<'a, R>, holds: bool, k: K) -> Step
where
    K: FnOnce(&mut Runtime<'a, R>, ()) -> Step,
{
    let log_weight = if holds { 0.0 } else { f64::NEG_INFINITY };
    factor(rt, log_weight, k)
}

pub mod prelude {
    pub use super::{condition, factor, observe, sample, sample_indexed};
}
