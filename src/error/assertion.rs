//! This module contains the error type produced when a checkpoint's invariant
//! does not hold.

use thiserror::Error;

use crate::{
    checker::{check::Expectation, Checkpoint},
    snapshot::value::Value,
};

/// A violated invariant, identifying exactly which field of which checkpoint
/// failed and how.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{checkpoint} check failed for `{field}`: expected {expected} but found {actual}")]
pub struct Failure {
    /// The checkpoint whose table contained the failing check.
    pub checkpoint: Checkpoint,

    /// The name of the storage field that was checked.
    pub field: &'static str,

    /// What the check required of the field.
    pub expected: Expectation,

    /// The value actually decoded from storage.
    pub actual: Value,
}
