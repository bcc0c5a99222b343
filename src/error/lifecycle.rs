//! This module contains the error type for failures while driving a contract
//! through its lifecycle.

use thiserror::Error;

use crate::lifecycle::Stage;

/// Errors that occur while driving a contract through its stage transitions.
///
/// Any of these aborts the remaining sequence, as each step is a precondition
/// for those that follow it.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Lifecycle step `{step}` failed: {message}")]
    StepFailed { step: &'static str, message: String },

    #[error("After `{step}` the contract should be in {expected:?} but is in {actual:?}")]
    UnexpectedStage {
        step:     &'static str,
        expected: Stage,
        actual:   Stage,
    },

    #[error("Lifecycle step `{step}` moved the contract backwards from {from:?} to {to:?}")]
    BackwardsTransition {
        step: &'static str,
        from: Stage,
        to:   Stage,
    },
}

impl Error {
    /// Constructs an error for a failed lifecycle `step` with the provided
    /// `message`, usually the revert reason.
    pub fn step_failed(step: &'static str, message: impl Into<String>) -> Self {
        Self::StepFailed {
            step,
            message: message.into(),
        }
    }
}

/// The result type for functions that may return lifecycle errors.
pub type Result<T> = std::result::Result<T, Error>;
