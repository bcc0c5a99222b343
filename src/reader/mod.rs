//! This module contains the storage reader, which fetches raw words from a
//! contract's sequential and computed storage slots.
//!
//! # Mapping Addressing
//!
//! Solidity places the value for `mapping[key]` declared at slot `p` at:
//!
//! ```text
//! keccak256(pad32(key) ++ pad32(p))
//! ```
//!
//! Nested mappings apply the same rule again, using the outer entry's location
//! as the base slot for the inner key.

pub mod memory;

use ethnum::U256;
use sha3::{Digest, Keccak256};

use crate::{
    constant::SEQUENTIAL_SLOT_COUNT,
    error::read,
    storage::{RawStorage, StorageSlot},
    word::{Address, Word},
};

/// The interface to a chain that can answer raw storage queries.
///
/// This is the only capability the verifier needs from a chain client. It must
/// return the all-zero word for slots that have never been written, including
/// every slot of an address with no deployed code.
pub trait ChainReader {
    /// Gets the raw word stored at `slot` in the storage of `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the underlying node or transport cannot answer.
    fn storage_at(&self, address: Address, slot: U256) -> read::Result<Word>;
}

/// Allow references to readers to be used anywhere a reader is.
impl<C> ChainReader for &C
where
    C: ChainReader + ?Sized,
{
    fn storage_at(&self, address: Address, slot: U256) -> read::Result<Word> {
        (**self).storage_at(address, slot)
    }
}

/// Computes the storage location of the entry for `key` in the mapping rooted
/// at `base_slot`.
#[must_use]
pub fn mapping_slot(base_slot: U256, key: &Word) -> U256 {
    let mut hasher = Keccak256::new();
    hasher.update(key.bytes_be());
    hasher.update(base_slot.to_be_bytes());
    let hash: [u8; 32] = hasher.finalize().into();

    U256::from_be_bytes(hash)
}

/// Computes the storage location of the entry for `[outer_key][inner_key]` in
/// the nested mapping rooted at `base_slot`.
#[must_use]
pub fn nested_mapping_slot(base_slot: U256, outer_key: &Word, inner_key: &Word) -> U256 {
    let outer = mapping_slot(base_slot, outer_key);
    mapping_slot(outer, inner_key)
}

/// Reads raw storage slots through a [`ChainReader`].
///
/// All of its operations are pure reads against the chain state at the time of
/// the call.
#[derive(Clone, Copy, Debug)]
pub struct StorageReader<C> {
    chain: C,
}

impl<C> StorageReader<C>
where
    C: ChainReader,
{
    /// Creates a new reader that queries `chain`.
    #[must_use]
    pub fn new(chain: C) -> Self {
        Self { chain }
    }

    /// Reads slot `index` of `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the chain cannot answer.
    pub fn read_slot(&self, address: Address, index: U256) -> read::Result<StorageSlot> {
        tracing::trace!(%address, slot = %index, "reading storage slot");
        let word = self.chain.storage_at(address, index)?;
        Ok(StorageSlot::new(index, word))
    }

    /// Reads slots `0..count` of `address`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] on the first slot that the chain cannot answer.
    pub fn read_sequential(&self, address: Address, count: usize) -> read::Result<Vec<StorageSlot>> {
        (0..count)
            .map(|ix| self.read_slot(address, U256::from(ix as u128)))
            .collect()
    }

    /// Reads the full sequential layout of a proxied POA token at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] on the first slot that the chain cannot answer.
    pub fn read_snapshot(&self, address: Address) -> read::Result<RawStorage> {
        self.read_snapshot_of(address, SEQUENTIAL_SLOT_COUNT)
    }

    /// Reads the first `count` sequential slots of `address` as raw storage.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] on the first slot that the chain cannot answer.
    pub fn read_snapshot_of(&self, address: Address, count: usize) -> read::Result<RawStorage> {
        let slots = self.read_sequential(address, count)?;
        tracing::debug!(%address, count, "read sequential storage");
        Ok(RawStorage::from(slots))
    }

    /// Reads the entry for `key` in the mapping declared at `slot_index` of
    /// `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the chain cannot answer.
    pub fn read_mapping(
        &self,
        address: Address,
        slot_index: usize,
        key: impl Into<Word>,
    ) -> read::Result<StorageSlot> {
        let slot = mapping_slot(U256::from(slot_index as u128), &key.into());
        self.read_slot(address, slot)
    }

    /// Reads the entry for `[outer_key][inner_key]` in the nested mapping
    /// declared at `slot_index` of `address`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the chain cannot answer.
    pub fn read_nested_mapping(
        &self,
        address: Address,
        slot_index: usize,
        outer_key: impl Into<Word>,
        inner_key: impl Into<Word>,
    ) -> read::Result<StorageSlot> {
        let slot = nested_mapping_slot(
            U256::from(slot_index as u128),
            &outer_key.into(),
            &inner_key.into(),
        );
        self.read_slot(address, slot)
    }
}
