//! This module contains the interface to the contract registry, which maps
//! well-known names to the addresses of deployed contracts.

use std::collections::HashMap;

use crate::{error::read, word::Address};

/// The contract registry that a POA token resolves its master copies through.
pub trait ContractRegistry {
    /// Gets the address of the registry contract itself.
    fn address(&self) -> Address;

    /// Gets the address registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the registry cannot be queried or has no entry for
    /// `name`.
    fn contract_address(&self, name: &str) -> read::Result<Address>;
}

impl<R: ContractRegistry + ?Sized> ContractRegistry for &R {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn contract_address(&self, name: &str) -> read::Result<Address> {
        (**self).contract_address(name)
    }
}

/// A registry with a fixed set of entries, for use where the registered
/// addresses are already known.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StaticRegistry {
    address: Address,
    entries: HashMap<String, Address>,
}

impl StaticRegistry {
    /// Creates an empty registry deployed at `address`.
    #[must_use]
    pub fn new(address: Address) -> Self {
        let entries = HashMap::new();
        Self { address, entries }
    }

    /// Registers `contract` under `name`, replacing any previous entry.
    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, contract: Address) -> Self {
        self.entries.insert(name.into(), contract);
        self
    }
}

impl ContractRegistry for StaticRegistry {
    fn address(&self) -> Address {
        self.address
    }

    fn contract_address(&self, name: &str) -> read::Result<Address> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| read::Error::RegistryLookup {
                name:    name.into(),
                message: format!("no entry in registry at {}", self.address),
            })
    }
}
