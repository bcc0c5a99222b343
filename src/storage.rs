//! This module contains the representation of raw storage as it is read from
//! the chain: individual [`StorageSlot`]s and the ordered [`RawStorage`]
//! sequence that the snapshot parsers operate over.

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::{
    error::{container::Locatable, decode},
    utility::U256W,
    word::Word,
};

/// A representation of a single storage slot and the raw word it held at the
/// time it was read.
///
/// Slots are immutable once fetched. Reading the same slot again produces a
/// new `StorageSlot`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct StorageSlot {
    /// The index of the slot in the contract's storage. For mapping entries
    /// this is the computed (hashed) key.
    pub index: U256W,

    /// The raw 32-byte word stored at the slot.
    #[serde(rename = "data")]
    pub word: Word,
}

impl StorageSlot {
    /// Constructs a new storage slot container for the `word` found at
    /// `index`.
    #[must_use]
    pub fn new(index: impl Into<U256W>, word: Word) -> Self {
        let index = index.into();
        Self { index, word }
    }

    /// Gets the index of the slot as a number.
    #[must_use]
    pub fn index(&self) -> U256 {
        self.index.0
    }
}

/// An ordered sequence of storage slots read from a single contract, where the
/// slot at position `i` is storage slot `i`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RawStorage {
    slots: Vec<StorageSlot>,
}

impl RawStorage {
    /// Wraps the provided words as slots `0..words.len()`.
    #[must_use]
    pub fn from_words(words: impl IntoIterator<Item = Word>) -> Self {
        let slots = words
            .into_iter()
            .enumerate()
            .map(|(ix, word)| StorageSlot::new(ix, word))
            .collect();
        Self { slots }
    }

    /// Gets the slots that make up this storage, in slot order.
    #[must_use]
    pub fn slots(&self) -> &[StorageSlot] {
        self.slots.as_slice()
    }

    /// Gets the word at slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if fewer than `index + 1` slots were read.
    pub fn word(&self, index: usize) -> decode::Result<&Word> {
        match self.slots.get(index) {
            Some(slot) => Ok(&slot.word),
            None => Err(decode::Error::MissingSlot {
                index,
                available: self.slots.len(),
            }
            .locate(index)),
        }
    }

    /// Gets the number of slots in the storage.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Checks if no slots were read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Builds the sequence from slots that are already known to be sequential.
impl From<Vec<StorageSlot>> for RawStorage {
    fn from(slots: Vec<StorageSlot>) -> Self {
        Self { slots }
    }
}
