//! This module contains the error type that pertains to decoding raw storage
//! words into typed values.

use thiserror::Error;

use crate::error::container;

/// Errors that occur when a raw word does not decode to a value in the domain
/// its schema entry claims.
///
/// These always indicate a mismatch between the offset tables and the
/// contract's actual layout, and are hence fatal.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Byte {byte:#04x} at offset {offset} is not ASCII")]
    NonAscii { byte: u8, offset: usize },

    #[error("Expected an address but the high-order bytes were not zero in {word}")]
    DirtyAddress { word: String },

    #[error("Expected a boolean (0 or 1) but found {value}")]
    InvalidBool { value: u8 },

    #[error("Stage code {code} does not name a known stage")]
    UnknownStage { code: u8 },

    #[error("Byte range {start}..{end} is not a valid range within a word")]
    InvalidRange { start: usize, end: usize },

    #[error("A value {width} bytes wide does not fit in the {limit} bytes of a {target}")]
    TooWide {
        width:  usize,
        limit:  usize,
        target: &'static str,
    },

    #[error("The snapshot has no slot {index} (only {available} slots were read)")]
    MissingSlot { index: usize, available: usize },
}

/// A decoding error with an associated storage slot.
pub type LocatedError = container::Located<Error>;

/// The result type for functions that may return decoding errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, slot: impl Into<crate::utility::U256W>) -> Self::Located {
        container::Located {
            location: slot.into(),
            payload:  self,
        }
    }
}
