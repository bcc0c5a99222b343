//! This module contains a container that attaches the storage slot at which a
//! decoding error occurred to the error itself.

use std::fmt::Formatter;

use ethnum::U256;
use thiserror::Error;

use crate::utility::U256W;

/// An error that is localised to a particular storage slot.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub struct Located<E>
where
    E: Clone,
{
    /// The storage slot whose contents caused the error.
    pub location: U256W,

    /// The error data
    pub payload: E,
}

/// Displays the error associated with the slot where the error occurred.
///
/// Small slot indices are printed in decimal, as they are the sequential slots
/// of the layout. Computed (hashed) slots are printed in full as hex.
impl<E> std::fmt::Display for Located<E>
where
    E: std::fmt::Display + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.location.0 <= U256::from(u32::MAX) {
            write!(f, "[slot {}]: {}", self.location.0, self.payload)
        } else {
            write!(
                f,
                "[slot 0x{}]: {}",
                hex::encode(self.location.0.to_be_bytes()),
                self.payload
            )
        }
    }
}

/// A trait for types that can have a storage slot location attached to them.
pub trait Locatable
where
    Self: Sized,
{
    /// The return type with the attached slot location.
    type Located;

    /// Attach the storage slot described by `slot` to the error.
    fn locate(self, slot: impl Into<U256W>) -> Self::Located;
}

/// A blanket implementation that allows for attaching a location to any result.
impl<T, E> Locatable for Result<T, E>
where
    E: std::error::Error + Clone,
{
    type Located = Result<T, Located<E>>;

    fn locate(self, slot: impl Into<U256W>) -> Self::Located {
        self.map_err(|e| Located {
            location: slot.into(),
            payload:  e,
        })
    }
}

#[cfg(test)]
mod test {
    use ethnum::U256;

    use crate::error::{
        container::{Locatable, Located},
        decode,
    };

    #[test]
    fn displays_sequential_slots_in_decimal() {
        let error = decode::Error::InvalidBool { value: 7 }.locate(13usize);
        assert_eq!(
            error.to_string(),
            "[slot 13]: Expected a boolean (0 or 1) but found 7"
        );
    }

    #[test]
    fn displays_hashed_slots_in_hex() {
        let error = Located {
            location: U256::MAX.into(),
            payload:  decode::Error::InvalidBool { value: 2 },
        };
        assert!(error.to_string().starts_with("[slot 0xffff"));
    }

    #[test]
    fn locates_results() {
        let result: Result<(), decode::Error> = Err(decode::Error::UnknownStage { code: 9 });
        let located = result.locate(2usize);
        assert_eq!(located.unwrap_err().location, 2usize.into());
    }
}
