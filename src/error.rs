//! Error types for fugue-exact
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

use crate::budget::ExplorationState;

/// Error type for malformed distributions and invalid draws
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A distribution was built with no value of nonzero probability
    #[error("Distribution '{name}' has empty support")]
    EmptySupport { name: String },

    /// A catalog constructor received an invalid parameter
    #[error("Invalid parameter for '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A value was scored that the distribution can never produce
    #[error("Value {value} is outside the support of '{name}'")]
    OutsideSupport { name: String, value: String },

    /// A log-weight was NaN or positive infinity
    #[error("Invalid log-weight {weight} in '{name}'")]
    InvalidWeight { name: String, weight: f64 },
}

impl DomainError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for inference operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    /// Distribution error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// A resource ceiling fired; no partial result is reported
    #[error("Budget exceeded: {reason} ({state})")]
    BudgetExceeded {
        /// Which criterion fired
        reason: &'static str,
        /// Exploration counters at the moment it fired
        state: ExplorationState,
    },

    /// Every execution path was excluded by an impossible factor
    #[error("Empty posterior: no execution path survived with nonzero weight")]
    EmptyPosterior,

    /// A continuation was resumed after its path had already completed
    #[error("Continuation protocol violation: {0}")]
    ProtocolViolation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Result type alias for inference operations
pub type InferResult<T> = Result<T, InferenceError>;
