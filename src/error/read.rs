//! This module contains the error type for failures of the underlying chain
//! queries.

use thiserror::Error;

use crate::{utility::U256W, word::Address};

/// Errors that occur when the chain cannot answer a storage query.
///
/// These are surfaced immediately and never retried, as a retry could mask a
/// real defect in the node or the test environment.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Could not read slot {slot:?} of {address}: {message}")]
    ReadFailure {
        address: Address,
        slot:    U256W,
        message: String,
    },

    #[error("Could not resolve registry entry {name:?}: {message}")]
    RegistryLookup { name: String, message: String },
}

impl Error {
    /// Constructs a read failure for `slot` of `address` with the provided
    /// `message`.
    pub fn read_failure(
        address: Address,
        slot: impl Into<U256W>,
        message: impl Into<String>,
    ) -> Self {
        Self::ReadFailure {
            address,
            slot: slot.into(),
            message: message.into(),
        }
    }
}

/// The result type for functions that may return read errors.
pub type Result<T> = std::result::Result<T, Error>;
