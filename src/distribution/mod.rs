//! Discrete distributions with finite support
//!
//! A [`Distribution`] is a named, ordered, finite support together with the
//! log-probability of every value in it. Programs never draw from a
//! distribution directly: every draw goes through [`crate::effects::sample`],
//! which enumerates the support so the scheduler can observe each choice.

pub mod catalog;

use std::fmt::Debug;

use serde::Serialize;

use crate::error::DomainError;
use crate::posterior::log_space::{log_normalize, log_sum_exp};

/// Bound on values that can appear in a support or as a program result.
///
/// Equality is all the engine needs: supports are scanned in order and
/// posteriors group outcomes by `==`, so floating point results are allowed.
pub trait SupportValue: Clone + PartialEq + Debug {}

impl<T: Clone + PartialEq + Debug> SupportValue for T {}

/// A named discrete probability distribution over a finite support
///
/// Invariants upheld by every constructor:
/// - the support is nonempty and holds no duplicate values
/// - every score is finite and `<= 0`
/// - the probabilities of the support sum to one
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Distribution<T> {
    name: String,
    support: Vec<T>,
    log_probs: Vec<f64>,
}

impl<T: SupportValue> Distribution<T> {
    /// Build a distribution from unnormalized log-weights.
    ///
    /// Values weighted `-inf` are dropped, repeated values are merged and the
    /// remaining weights are normalized in log-space. The first appearance of
    /// a value fixes its position in the support.
    pub fn from_log_weights(
        name: impl Into<String>,
        weighted: Vec<(T, f64)>,
    ) -> Result<Self, DomainError> {
        let name = name.into();

        let mut support: Vec<T> = Vec::with_capacity(weighted.len());
        let mut log_weights: Vec<f64> = Vec::with_capacity(weighted.len());

        for (value, weight) in weighted {
            if weight.is_nan() || weight == f64::INFINITY {
                return Err(DomainError::InvalidWeight { name, weight });
            }
            if weight == f64::NEG_INFINITY {
                continue;
            }
            match support.iter().position(|v| *v == value) {
                Some(i) => log_weights[i] = log_sum_exp([log_weights[i], weight]),
                None => {
                    support.push(value);
                    log_weights.push(weight);
                }
            }
        }

        let Some((normalized, _)) = log_normalize(&log_weights) else {
            return Err(DomainError::EmptySupport { name });
        };
        let log_probs = normalized.into_iter().map(|lp| lp.min(0.0)).collect();

        Ok(Self {
            name,
            support,
            log_probs,
        })
    }

    /// Build a distribution from unnormalized linear probabilities.
    pub fn from_probabilities(
        name: impl Into<String>,
        weighted: Vec<(T, f64)>,
    ) -> Result<Self, DomainError> {
        let name = name.into();

        if let Some((_, p)) = weighted.iter().find(|(_, p)| !p.is_finite() || *p < 0.0) {
            return Err(DomainError::invalid_parameter(
                &name,
                format!("probabilities must be finite and non-negative, got {p}"),
            ));
        }
        if !weighted.is_empty() && weighted.iter().all(|(_, p)| *p == 0.0) {
            return Err(DomainError::invalid_parameter(
                &name,
                "probabilities sum to zero",
            ));
        }

        let log_weighted = weighted.into_iter().map(|(v, p)| (v, p.ln())).collect();
        Self::from_log_weights(name, log_weighted)
    }

    /// The distribution's name, used in error messages and logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every value with nonzero probability, in declaration order
    pub fn support(&self) -> &[T] {
        &self.support
    }

    pub(crate) fn log_probs(&self) -> &[f64] {
        &self.log_probs
    }

    /// Number of values in the support
    pub fn len(&self) -> usize {
        self.support.len()
    }

    /// Always false for a constructed distribution
    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    /// Log-probability of `value`.
    ///
    /// Fails with [`DomainError::OutsideSupport`] for values the distribution
    /// can never produce.
    pub fn score(&self, value: &T) -> Result<f64, DomainError> {
        self.position(value)
            .map(|i| self.log_probs[i])
            .ok_or_else(|| DomainError::OutsideSupport {
                name: self.name.clone(),
                value: format!("{value:?}"),
            })
    }

    /// Linear probability of `value`, zero outside the support
    pub fn probability(&self, value: &T) -> f64 {
        self.position(value)
            .map_or(0.0, |i| self.log_probs[i].exp())
    }

    /// Iterate over `(value, log_probability)` pairs in support order
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.support.iter().zip(self.log_probs.iter().copied())
    }

    /// Index of `value` within the support
    pub fn position(&self, value: &T) -> Option<usize> {
        self.support.iter().position(|v| v == value)
    }

    /// Push the distribution through `f`, merging values with equal images.
    pub fn map<U, F>(&self, f: F) -> Result<Distribution<U>, DomainError>
    where
        U: SupportValue,
        F: Fn(&T) -> U,
    {
        let weighted = self.iter().map(|(v, lp)| (f(v), lp)).collect();
        Distribution::from_log_weights(self.name.clone(), weighted)
    }
}

pub mod prelude {
    pub use super::catalog::*;
    pub use super::{Distribution, SupportValue};
}
