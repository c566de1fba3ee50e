//! Posterior aggregation
//!
//! Turns the outcome list of an exploration into a normalized probability
//! mass function over return values. Outcomes that compare equal are merged
//! by summing their weights in log-space, then every group is divided by the
//! total mass, the model's evidence.

pub mod log_space;

use rand::Rng;
use rand_distr::{Distribution as _, WeightedIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distribution::{Distribution, SupportValue};
use crate::error::{DomainError, InferResult, InferenceError};
use crate::exploration::Outcome;
use log_space::{log_normalize, log_sum_exp};

/// Normalized distribution over a program's return values
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "PosteriorData<T>",
    bound(deserialize = "T: SupportValue + Deserialize<'de>")
)]
pub struct Posterior<T> {
    /// `(value, log_probability)` in first-appearance order
    entries: Vec<(T, f64)>,
    log_evidence: f64,
}

/// Unchecked wire form of a [`Posterior`]
#[derive(Deserialize)]
struct PosteriorData<T> {
    entries: Vec<(T, f64)>,
    log_evidence: f64,
}

impl<T: SupportValue> TryFrom<PosteriorData<T>> for Posterior<T> {
    type Error = DomainError;

    /// Accept only what `aggregate` could have produced: distinct values,
    /// finite log-probabilities that sum to one, and a finite evidence.
    fn try_from(data: PosteriorData<T>) -> Result<Self, DomainError> {
        let invalid = |reason: String| DomainError::invalid_parameter("posterior", reason);

        if data.entries.is_empty() {
            return Err(DomainError::EmptySupport {
                name: "posterior".to_string(),
            });
        }
        if !data.log_evidence.is_finite() {
            return Err(invalid(format!(
                "log_evidence must be finite, got {}",
                data.log_evidence
            )));
        }
        for (i, (value, lp)) in data.entries.iter().enumerate() {
            if !lp.is_finite() || *lp > 0.0 {
                return Err(DomainError::InvalidWeight {
                    name: "posterior".to_string(),
                    weight: *lp,
                });
            }
            if data.entries[..i].iter().any(|(v, _)| v == value) {
                return Err(invalid(format!("duplicate value {value:?}")));
            }
        }
        let mass: f64 = data.entries.iter().map(|(_, lp)| lp.exp()).sum();
        if (mass - 1.0).abs() > 1e-9 {
            return Err(invalid(format!("probabilities sum to {mass}, not 1")));
        }

        Ok(Self {
            entries: data.entries,
            log_evidence: data.log_evidence,
        })
    }
}

/// Merge outcomes into a posterior.
///
/// Groups are formed by `==` in the order their first outcome appears.
/// Outcomes with weight `-inf` contribute nothing; if no outcome has a
/// finite weight the result is [`InferenceError::EmptyPosterior`].
pub fn aggregate<T: SupportValue>(outcomes: &[Outcome<T>]) -> InferResult<Posterior<T>> {
    let mut values: Vec<T> = Vec::new();
    let mut log_weights: Vec<f64> = Vec::new();

    for outcome in outcomes {
        let weight = outcome.log_weight;
        if weight.is_nan() || weight == f64::INFINITY {
            return Err(DomainError::InvalidWeight {
                name: "outcome".to_string(),
                weight,
            }
            .into());
        }
        if weight == f64::NEG_INFINITY {
            continue;
        }
        match values.iter().position(|v| *v == outcome.value) {
            Some(i) => log_weights[i] = log_sum_exp([log_weights[i], weight]),
            None => {
                values.push(outcome.value.clone());
                log_weights.push(weight);
            }
        }
    }

    let (log_probs, log_evidence) =
        log_normalize(&log_weights).ok_or(InferenceError::EmptyPosterior)?;
    let entries: Vec<(T, f64)> = values.into_iter().zip(log_probs).collect();

    debug!(
        outcomes = outcomes.len(),
        groups = entries.len(),
        log_evidence,
        "posterior aggregated"
    );
    Ok(Posterior {
        entries,
        log_evidence,
    })
}

impl<T: SupportValue> Posterior<T> {
    /// Probability of `value`, zero if no surviving path returned it
    pub fn probability(&self, value: &T) -> f64 {
        self.log_probability(value).exp()
    }

    /// Log-probability of `value`, `-inf` if no surviving path returned it
    pub fn log_probability(&self, value: &T) -> f64 {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map_or(f64::NEG_INFINITY, |(_, lp)| *lp)
    }

    /// Iterate over `(value, probability)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.entries.iter().map(|(v, lp)| (v, lp.exp()))
    }

    /// Distinct values with nonzero probability
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter().map(|(v, _)| v)
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the posterior holds no value
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all probabilities; one up to rounding
    pub fn total_mass(&self) -> f64 {
        self.entries.iter().map(|(_, lp)| lp.exp()).sum()
    }

    /// Log of the total unnormalized mass of every surviving path.
    ///
    /// For a program whose factors are observation likelihoods this is the
    /// log marginal likelihood of the data.
    pub fn log_evidence(&self) -> f64 {
        self.log_evidence
    }

    /// Most probable value; ties go to the value seen first
    pub fn mode(&self) -> Option<&T> {
        self.entries
            .iter()
            .fold(None, |best: Option<&(T, f64)>, entry| match best {
                Some(b) if b.1 >= entry.1 => Some(b),
                _ => Some(entry),
            })
            .map(|(v, _)| v)
    }

    /// Expected value of `f` under the posterior
    pub fn expectation<F>(&self, f: F) -> f64
    where
        F: Fn(&T) -> f64,
    {
        self.entries.iter().map(|(v, lp)| lp.exp() * f(v)).sum()
    }

    /// Shannon entropy in nats
    pub fn entropy(&self) -> f64 {
        -self
            .entries
            .iter()
            .map(|(_, lp)| lp.exp() * lp)
            .sum::<f64>()
    }

    /// Turn the posterior into a distribution that can be sampled by another
    /// program, which makes nested inference possible.
    pub fn to_distribution(&self, name: impl Into<String>) -> Result<Distribution<T>, DomainError> {
        Distribution::from_log_weights(name, self.entries.clone())
    }

    /// Draw a value at random, `None` only for an empty posterior
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        let weights: Vec<f64> = self.entries.iter().map(|(_, lp)| lp.exp()).collect();
        let index = WeightedIndex::new(&weights).ok()?;
        self.entries.get(index.sample(rng)).map(|(v, _)| v)
    }
}

pub mod prelude {
    pub use super::log_space::{log_normalize, log_sum_exp};
    pub use super::{aggregate, Posterior};
}
