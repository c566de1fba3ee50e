//! Catalog of named distribution constructors
//!
//! Every constructor validates its parameters and fails with
//! [`DomainError::InvalidParameter`] rather than producing a distribution
//! that would silently drop probability mass.

use std::ops::Range;

use super::{Distribution, SupportValue};
use crate::error::DomainError;

/// Largest support a catalog constructor will enumerate
pub const MAX_SUPPORT: usize = 1 << 24;

fn check_support_size(name: &str, size: Option<usize>) -> Result<usize, DomainError> {
    size.filter(|size| *size <= MAX_SUPPORT).ok_or_else(|| {
        DomainError::invalid_parameter(
            name,
            format!("support would exceed {MAX_SUPPORT} values"),
        )
    })
}

fn check_probability(name: &str, p: f64) -> Result<(), DomainError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(DomainError::invalid_parameter(
            name,
            format!("p must lie in [0, 1], got {p}"),
        ))
    }
}

/// Coin flip with probability `p` of `true`.
///
/// The support is `[false, true]`, minus whichever side has probability zero.
pub fn bernoulli(p: f64) -> Result<Distribution<bool>, DomainError> {
    check_probability("bernoulli", p)?;
    Distribution::from_probabilities("bernoulli", vec![(false, 1.0 - p), (true, p)])
}

/// Alias for [`bernoulli`]
pub fn flip(p: f64) -> Result<Distribution<bool>, DomainError> {
    bernoulli(p)
}

/// Categorical distribution over `values` with the matching `probs`.
///
/// Probabilities are normalized, so relative weights are accepted.
pub fn categorical<T: SupportValue>(
    values: Vec<T>,
    probs: Vec<f64>,
) -> Result<Distribution<T>, DomainError> {
    if values.len() != probs.len() {
        return Err(DomainError::invalid_parameter(
            "categorical",
            format!(
                "{} values but {} probabilities",
                values.len(),
                probs.len()
            ),
        ));
    }
    Distribution::from_probabilities("categorical", values.into_iter().zip(probs).collect())
}

/// Equal probability for every value in `values`
pub fn uniform<T: SupportValue>(values: Vec<T>) -> Result<Distribution<T>, DomainError> {
    if values.is_empty() {
        return Err(DomainError::invalid_parameter(
            "uniform",
            "at least one value is required",
        ));
    }
    Distribution::from_log_weights("uniform", values.into_iter().map(|v| (v, 0.0)).collect())
}

/// Equal probability for every integer in the half-open `range`
pub fn uniform_range(range: Range<i64>) -> Result<Distribution<i64>, DomainError> {
    if range.is_empty() {
        return Err(DomainError::invalid_parameter(
            "uniform_range",
            format!("range {}..{} is empty", range.start, range.end),
        ));
    }
    let width = usize::try_from(range.end.abs_diff(range.start)).ok();
    check_support_size("uniform_range", width)?;
    Distribution::from_log_weights("uniform_range", range.map(|v| (v, 0.0)).collect())
}

/// Number of successes in `n` independent trials with success probability `p`
pub fn binomial(n: u64, p: f64) -> Result<Distribution<u64>, DomainError> {
    check_probability("binomial", p)?;
    let size = check_support_size(
        "binomial",
        usize::try_from(n).ok().and_then(|n| n.checked_add(1)),
    )?;

    let ln_p = p.ln();
    let ln_q = (1.0 - p).ln();
    // k * ln(p) with the convention 0 * ln(0) = 0
    let term = |count: u64, ln: f64| if count == 0 { 0.0 } else { count as f64 * ln };

    let mut ln_choose = 0.0;
    let mut weighted = Vec::with_capacity(size);
    for k in 0..=n {
        if k > 0 {
            ln_choose += ((n - k + 1) as f64).ln() - (k as f64).ln();
        }
        weighted.push((k, ln_choose + term(k, ln_p) + term(n - k, ln_q)));
    }

    Distribution::from_log_weights("binomial", weighted)
}

/// Point mass on a single value
pub fn delta<T: SupportValue>(value: T) -> Distribution<T> {
    Distribution {
        name: "delta".to_string(),
        support: vec![value],
        log_probs: vec![0.0],
    }
}
