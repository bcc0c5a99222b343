//! This library verifies the raw storage of proxied POA (Proof-of-Asset) token
//! contracts on the [EVM](https://ethereum.org/en/developers/docs/evm/). It
//! reads a contract's storage slots directly, bypassing its ABI, reconstructs
//! the typed values packed into them, and checks those values against what is
//! expected at each point in the contract's lifecycle.
//!
//! # How it Works
//!
//! From a very high level, a verification is performed as follows:
//!
//! 1. The [`reader::StorageReader`] fetches the sequential storage slots of the
//!    contract, along with any mapping entries that are needed, through a
//!    [`reader::ChainReader`].
//! 2. The words are interpreted by the [`decoder`] according to the versioned
//!    offset tables in [`decoder::schema`]. The version is chosen explicitly by
//!    whether the contract's stage has been initialized.
//! 3. The [`snapshot`] parsers compose the decoded fields into the three
//!    regions of the contract's storage: proxy-common, common, and token.
//! 4. The [`checker::InvariantChecker`] compares the snapshot against the table
//!    of expectations for the requested [`checker::Checkpoint`], failing on the
//!    first that is violated.
//!
//! Between checkpoints, the [`lifecycle::LifecycleOracle`] drives the contract
//! through its stage transitions using an external
//! [`lifecycle::LifecycleDriver`].
//!
//! # Basic Usage
//!
//! ```
//! use poa_storage_verifier::{
//!     checker::{Checkpoint, InvariantChecker},
//!     config::Config,
//!     constant::{CROWDSALE_MASTER_NAME, TOKEN_MASTER_NAME},
//!     reader::memory::MemoryChain,
//!     registry::StaticRegistry,
//!     word::Address,
//! };
//!
//! let proxy = Address::repeat_byte(0xaa);
//! let registry = StaticRegistry::new(Address::repeat_byte(0x01))
//!     .with_entry(TOKEN_MASTER_NAME, Address::repeat_byte(0x02))
//!     .with_entry(CROWDSALE_MASTER_NAME, Address::repeat_byte(0x03));
//!
//! let mut chain = MemoryChain::new();
//! chain.set(proxy, 0u32, Address::repeat_byte(0x02).into());
//! chain.set(proxy, 1u32, Address::repeat_byte(0x03).into());
//! chain.set(proxy, 2u32, Address::repeat_byte(0x01).into());
//!
//! let config = Config::default();
//! let checker = InvariantChecker::new(&chain, &config);
//!
//! checker
//!     .verify(Checkpoint::PreInitialized, proxy, &registry, Address::zero())
//!     .unwrap();
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod checker;
pub mod config;
pub mod constant;
pub mod decoder;
pub mod error;
pub mod lifecycle;
pub mod reader;
pub mod registry;
pub mod snapshot;
pub mod storage;
pub mod utility;
pub mod word;

// Re-exports to provide the library interface.
pub use checker::{Checkpoint, InvariantChecker};
pub use config::Config;
pub use snapshot::ContractSnapshot;
