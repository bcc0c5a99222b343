//! This module contains an in-memory chain, useful for tests and for verifying
//! storage dumps offline.

use std::collections::HashMap;

use ethnum::U256;

use crate::{
    error::read,
    reader::ChainReader,
    storage::StorageSlot,
    word::{Address, Word},
};

/// A chain state held entirely in memory.
///
/// Like a real EVM, every slot that has never been written reads as zero.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemoryChain {
    words: HashMap<(Address, U256), Word>,
}

impl MemoryChain {
    /// Creates a new, empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `word` at `slot` of `address`, overwriting any existing value.
    ///
    /// Storing the zero word clears the slot.
    pub fn set(&mut self, address: Address, slot: impl Into<U256>, word: Word) {
        let key = (address, slot.into());
        if word.is_zero() {
            self.words.remove(&key);
        } else {
            self.words.insert(key, word);
        }
    }

    /// Gets the word at `slot` of `address`, which is zero if never written.
    #[must_use]
    pub fn get(&self, address: Address, slot: impl Into<U256>) -> Word {
        self.words
            .get(&(address, slot.into()))
            .copied()
            .unwrap_or_default()
    }

    /// Loads a dump of `slots` as the storage of `address`.
    pub fn load(&mut self, address: Address, slots: impl IntoIterator<Item = StorageSlot>) {
        for slot in slots {
            self.set(address, slot.index(), slot.word);
        }
    }

    /// Gets the number of non-zero slots across all addresses.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.words.len()
    }
}

impl ChainReader for MemoryChain {
    fn storage_at(&self, address: Address, slot: U256) -> read::Result<Word> {
        Ok(self.get(address, slot))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        reader::memory::MemoryChain,
        storage::StorageSlot,
        word::{Address, Word},
    };

    #[test]
    fn writing_zero_clears_a_slot() {
        let address = Address::repeat_byte(0x42);
        let mut chain = MemoryChain::new();

        chain.set(address, 3u32, Word::from(1u64));
        assert_eq!(chain.entry_count(), 1);

        chain.set(address, 3u32, Word::zero());
        assert_eq!(chain.entry_count(), 0);
        assert!(chain.get(address, 3u32).is_zero());
    }

    #[test]
    fn loads_dumped_slots() {
        let address = Address::repeat_byte(0x42);
        let mut chain = MemoryChain::new();
        chain.load(
            address,
            [
                StorageSlot::new(0usize, Word::from(10u64)),
                StorageSlot::new(4usize, Word::from(14u64)),
            ],
        );

        assert_eq!(chain.get(address, 4u32), Word::from(14u64));
        assert!(chain.get(Address::zero(), 4u32).is_zero());
    }
}
