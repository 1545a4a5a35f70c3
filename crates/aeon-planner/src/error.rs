//! Planner error types.

use thiserror::Error;

pub type PlanResult<T> = Result<T, PlanError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Invalid plan input: {0}")]
    InvalidInput(String),

    #[error("Model tier '{0}' has no models")]
    EmptyTier(&'static str),

    #[error("Duplicate model '{0}' in tier '{1}'")]
    DuplicateModel(String, &'static str),
}

impl PlanError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
