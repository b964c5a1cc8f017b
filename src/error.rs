//! Error taxonomy for the projection and simulation engine

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single violated scenario constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Field (or field group) the constraint applies to
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by the engine
///
/// Parameter errors are raised before any projection or trial runs. Numeric
/// edge cases inside a single year (e.g. zero expenses) are sentinel values on
/// the year record, never errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Validation failed; lists every violated constraint
    #[error("invalid scenario: {}", join_violations(.violations))]
    InvalidScenario { violations: Vec<Violation> },

    /// Too few Monte Carlo trials for a meaningful estimate
    #[error("insufficient trials: {requested} requested, at least {minimum} required")]
    InsufficientTrials { requested: usize, minimum: usize },

    /// Compounding produced a non-finite value
    #[error("numeric overflow in year {year}: {context}")]
    NumericOverflow { year: u32, context: String },

    /// Capital-market or scoring assumptions are unusable
    #[error("invalid assumptions: {0}")]
    InvalidAssumptions(String),

    /// A stress shock definition has an impossible magnitude
    #[error("invalid shock '{name}': {reason}")]
    InvalidShock { name: String, reason: String },

    /// A per-year return path does not cover the projection horizon
    #[error("return path covers {provided} years but the projection needs {required}")]
    ReturnPathTooShort { required: usize, provided: usize },

    /// Cooperative cancellation observed between trial batches
    #[error("simulation cancelled after {completed_trials} trials")]
    Cancelled { completed_trials: usize },
}

impl EngineError {
    /// Violations carried by an `InvalidScenario` error (empty otherwise)
    pub fn violations(&self) -> &[Violation] {
        match self {
            EngineError::InvalidScenario { violations } => violations,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
