//! This module contains constants that are needed throughout the codebase.

/// The width of word on the EVM in bits.
pub const WORD_SIZE_BITS: usize = 256;

/// The width of a byte on the EVM (and most other places) in bits.
pub const BYTE_SIZE_BITS: usize = 8;

/// The width of a word on the EVM in bytes.
pub const WORD_SIZE_BYTES: usize = WORD_SIZE_BITS / BYTE_SIZE_BITS;

/// The bit-width of an address type.
pub const ADDRESS_WIDTH_BITS: usize = 160;

/// The byte-width of an address type.
pub const ADDRESS_WIDTH_BYTES: usize = ADDRESS_WIDTH_BITS / BYTE_SIZE_BITS;

/// The byte offset within a word at which a right-aligned address begins.
pub const ADDRESS_OFFSET_BYTES: usize = WORD_SIZE_BYTES - ADDRESS_WIDTH_BYTES;

/// The number of sequential storage slots that make up the layout of a proxied
/// POA token, covering the proxy, common and token storage regions.
pub const SEQUENTIAL_SLOT_COUNT: usize = 29;

/// The slot holding the root of the `fundedEthAmountPerUserInWei` mapping.
pub const FUNDED_ETH_PER_USER_SLOT: usize = 11;

/// The slot holding the root of the nested `allowed` mapping.
pub const ALLOWED_SLOT: usize = 27;

/// The registry name under which the token master copy is registered.
pub const TOKEN_MASTER_NAME: &str = "PoaTokenMaster";

/// The registry name under which the crowdsale master copy is registered.
pub const CROWDSALE_MASTER_NAME: &str = "PoaCrowdsaleMaster";

/// A lower bound for the start of the ETH funding period (2018-06-29), used as a
/// sanity check that a real timestamp was written.
pub const MINIMUM_FUNDING_START_TIME: u64 = 1_530_280_851;

/// The default token name used by the test fixtures.
pub const DEFAULT_NAME: &str = "TestToken";

/// The default token symbol used by the test fixtures.
pub const DEFAULT_SYMBOL: &str = "TST";

/// The default fiat currency code used by the test fixtures.
pub const DEFAULT_FIAT_CURRENCY: &str = "USD";

/// The default total supply used by the test fixtures.
pub const DEFAULT_TOTAL_SUPPLY: u128 = 1_000_000;

/// The default funding goal in fiat cents.
pub const DEFAULT_FUNDING_GOAL_IN_CENTS: u128 = 500_000;

/// The default duration of the ETH funding period in seconds (one day).
pub const DEFAULT_FUNDING_TIMEOUT: u64 = 60 * 60 * 24;

/// The default duration of the activation period in seconds (one week).
pub const DEFAULT_ACTIVATION_TIMEOUT: u64 = 60 * 60 * 24 * 7;

/// The default fiat exchange rate, in cents per ether.
pub const DEFAULT_FIAT_RATE: u128 = 33_333;

/// The default rate penalty applied to the fiat rate, in permille.
pub const DEFAULT_FIAT_RATE_PENALTY_PERMILLE: u128 = 20;

/// The default amount of wei the buyer would need to invest without the rate
/// penalty in order to reach the funding goal.
pub const DEFAULT_PURCHASE_PRINCIPAL_IN_WEI: u128 = 15_000_150_001_500_015_000;

/// The default allowance granted from the buyer to the spender (3 ether).
pub const DEFAULT_APPROVED_ALLOWANCE: u128 = 3_000_000_000_000_000_000;
