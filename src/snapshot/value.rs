//! This module contains the typed values that storage fields decode to, used
//! when reporting what a check expected and what it found.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

use ethnum::U256;
use serde::Serialize;

use crate::{
    lifecycle::Stage,
    utility::{U256Wrapper, U256W},
    word::{Address, Word},
};

/// A decoded storage value of any of the types that appear in the layout.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Value {
    Address(Address),
    Integer(U256W),
    Ascii(String),
    Bool(bool),
    Stage(Stage),

    /// A word kept in raw form, such as the root slot of a mapping.
    Raw(Word),

    /// Byte data rendered as hex with its trailing zero bytes trimmed.
    Hex(String),
}

impl Value {
    /// Creates an ASCII string value.
    pub fn ascii(text: impl Into<String>) -> Self {
        Self::Ascii(text.into())
    }

    /// Creates a trimmed hex value.
    pub fn hex(text: impl Into<String>) -> Self {
        Self::Hex(text.into())
    }

    /// Creates an integer value.
    pub fn integer(value: impl Into<U256>) -> Self {
        Self::Integer(U256Wrapper(value.into()))
    }

    /// Orders two values of the same numeric kind.
    ///
    /// Returns [`None`] for values that have no natural order, or that are of
    /// different kinds.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Stage(a), Self::Stage(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<Address> for Value {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<U256> for Value {
    fn from(value: U256) -> Self {
        Self::Integer(U256Wrapper(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Stage> for Value {
    fn from(value: Stage) -> Self {
        Self::Stage(value)
    }
}

impl From<Word> for Value {
    fn from(value: Word) -> Self {
        Self::Raw(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Ascii(text) => write!(f, "{text:?}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Stage(stage) => write!(f, "{stage}"),
            Self::Raw(word) => write!(f, "{word}"),
            Self::Hex(text) => write!(f, "{text}"),
        }
    }
}
