//! This module contains the primary error type for the verifier's interface.
//! It also re-exports the more specific error types that are
//! subsystem-specific.

pub mod assertion;
pub mod container;
pub mod decode;
pub mod lifecycle;
pub mod read;

use thiserror::Error;

/// The interface result type for the library.
///
/// # Usage
///
/// Any function considered to be part of the public interface of the library
/// should return this result type. Subsystems should return the more-specific
/// child error types as appropriate.
pub type Result<T> = std::result::Result<T, Error>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by the
/// clients of the library) should be members of this enum. Every variant is
/// fatal to the verification call that produced it; the verifier never retries.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The chain could not answer a storage query.
    #[error(transparent)]
    Read(#[from] read::Error),

    /// A decoded value fell outside of its expected domain, which indicates
    /// that the layout schema does not match the contract.
    #[error(transparent)]
    Decode(#[from] decode::LocatedError),

    /// A checkpoint's expected-versus-actual comparison failed.
    #[error(transparent)]
    Assertion(#[from] assertion::Failure),

    /// A step that drives the contract through its lifecycle failed.
    #[error(transparent)]
    Lifecycle(#[from] lifecycle::Error),

    /// An unknown error, represented as a string.
    #[error("Unknown Error: {_0:?}")]
    Other(String),
}

impl Error {
    /// Constructs an unknown error with the provided `message`.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Gets the assertion failure if this error is one.
    #[must_use]
    pub fn as_assertion(&self) -> Option<&assertion::Failure> {
        match self {
            Self::Assertion(failure) => Some(failure),
            _ => None,
        }
    }
}
