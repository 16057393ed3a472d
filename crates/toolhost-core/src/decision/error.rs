//! Decision parsing errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    /// Completion did not contain exactly one valid decision
    #[error("Malformed decision: {0}")]
    Malformed(String),

    /// Completion had no reasoning marker to split on
    #[error("No final text after '{marker}'")]
    NoFinalText { marker: String },
}

pub type DecisionResult<T> = Result<T, DecisionError>;
