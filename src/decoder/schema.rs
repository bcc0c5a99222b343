//! This module contains the offset tables that describe where each field of a
//! proxied POA token lives in storage.
//!
//! # Storage Regions
//!
//! The proxy delegates to two master copies, and each layer of the contract
//! appends its own fixed region of storage:
//!
//! | region       | slots    |
//! |--------------|----------|
//! | proxy-common | `0..=2`  |
//! | common       | `2..=19` |
//! | token        | `20..=28`|
//!
//! # Schema Versions
//!
//! Slot 2 is interpreted differently depending on whether the crowdsale stage
//! has been initialized. Before, it holds only the registry address. After, the
//! stage enum is packed into the byte directly above the address. The data
//! cannot describe its own version, so callers must select one explicitly.
//!
//! Any change to the contract's layout must be made here, and only here.

use itertools::Itertools;

use crate::constant::{ADDRESS_OFFSET_BYTES, SEQUENTIAL_SLOT_COUNT, WORD_SIZE_BYTES};

/// A named range of bytes within a single storage slot that holds one logical
/// value.
///
/// The range `start..end` uses big-endian byte offsets, so a right-aligned
/// value of width `n` occupies `32 - n..32`.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct PackedField {
    /// The name of the field in the contract source.
    pub name: &'static str,

    /// The storage slot that holds the field.
    pub slot: usize,

    /// The first byte of the field within the slot.
    pub start: usize,

    /// One past the last byte of the field within the slot.
    pub end: usize,
}

impl PackedField {
    /// Describes the field `name` at bytes `start..end` of `slot`.
    #[must_use]
    pub const fn new(name: &'static str, slot: usize, start: usize, end: usize) -> Self {
        Self {
            name,
            slot,
            start,
            end,
        }
    }

    /// Describes a field that fills the whole of `slot`.
    #[must_use]
    pub const fn word(name: &'static str, slot: usize) -> Self {
        Self::new(name, slot, 0, WORD_SIZE_BYTES)
    }

    /// Describes an address that is right-aligned in `slot`.
    #[must_use]
    pub const fn address(name: &'static str, slot: usize) -> Self {
        Self::new(name, slot, ADDRESS_OFFSET_BYTES, WORD_SIZE_BYTES)
    }

    /// Describes a single-byte value (a `bool` or small enum) at byte `offset`
    /// of `slot`.
    #[must_use]
    pub const fn byte(name: &'static str, slot: usize, offset: usize) -> Self {
        Self::new(name, slot, offset, offset + 1)
    }

    /// Gets the width of the field in bytes.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.end - self.start
    }

    /// Checks if this field shares any bytes with `other`.
    #[must_use]
    pub fn overlaps(&self, other: &PackedField) -> bool {
        self.slot == other.slot && self.start < other.end && other.start < self.end
    }
}

/// The two ways in which the layout can be interpreted.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum SchemaVersion {
    /// The crowdsale stage has not been initialized, so slot 2 holds only the
    /// registry address.
    PreStageInit,

    /// The crowdsale stage has been initialized, so slot 2 packs the stage
    /// above the registry address.
    PostStageInit,
}

impl SchemaVersion {
    /// Selects the schema version from the caller's `stage_initialized` flag.
    #[must_use]
    pub fn from_stage_initialized(stage_initialized: bool) -> Self {
        if stage_initialized {
            Self::PostStageInit
        } else {
            Self::PreStageInit
        }
    }

    /// Gets the offset tables for each of the storage regions under this
    /// version, in region order.
    #[must_use]
    pub fn tables(self) -> [&'static [PackedField]; 3] {
        match self {
            Self::PreStageInit => [PROXY_COMMON_PRE_STAGE_INIT, COMMON_PRE_STAGE_INIT, TOKEN],
            Self::PostStageInit => [PROXY_COMMON_POST_STAGE_INIT, COMMON_POST_STAGE_INIT, TOKEN],
        }
    }

    /// Gets every field of the layout under this version.
    pub fn fields(self) -> impl Iterator<Item = &'static PackedField> + Clone {
        self.tables().into_iter().flatten()
    }

    /// Gets the number of sequential slots that must be read to decode every
    /// field under this version.
    #[must_use]
    pub fn required_slots(self) -> usize {
        self.fields().map(|f| f.slot + 1).max().unwrap_or(0)
    }
}

// Proxy-common storage

/// The master copy that token calls are delegated to.
pub const TOKEN_MASTER: PackedField = PackedField::address("poaTokenMaster", 0);

/// The master copy that crowdsale calls are delegated to.
pub const CROWDSALE_MASTER: PackedField = PackedField::address("poaCrowdsaleMaster", 1);

/// The whole of slot 2, as it is before stage initialization.
pub const REGISTRY_WORD: PackedField = PackedField::word("registry", 2);

/// The registry address, once the stage has been packed above it.
pub const REGISTRY: PackedField = PackedField::address("registry", 2);

// Common storage

/// The stage enum, packed directly above the registry address.
pub const STAGE: PackedField = PackedField::byte("stage", 2, ADDRESS_OFFSET_BYTES - 1);

pub const BROKER: PackedField = PackedField::address("broker", 3);
pub const CUSTODIAN: PackedField = PackedField::address("custodian", 4);

/// The first half of the custody proof hash.
pub const PROOF_OF_CUSTODY_0: PackedField = PackedField::word("proofOfCustody32[0]", 5);

/// The second half of the custody proof hash.
pub const PROOF_OF_CUSTODY_1: PackedField = PackedField::word("proofOfCustody32[1]", 6);

pub const TOTAL_SUPPLY: PackedField = PackedField::word("totalSupply", 7);
pub const FUNDED_FIAT_AMOUNT_IN_TOKENS: PackedField =
    PackedField::word("fundedFiatAmountInTokens", 8);
pub const FUNDED_FIAT_AMOUNT_PER_USER_IN_TOKENS: PackedField =
    PackedField::word("fundedFiatAmountPerUserInTokens", 9);
pub const FUNDED_ETH_AMOUNT_IN_WEI: PackedField = PackedField::word("fundedEthAmountInWei", 10);
pub const FUNDED_ETH_AMOUNT_PER_USER_IN_WEI: PackedField =
    PackedField::word("fundedEthAmountPerUserInWei", 11);
pub const UNCLAIMED_PAYOUT_TOTALS: PackedField = PackedField::word("unclaimedPayoutTotals", 12);

// Slot 13 packs four single-byte flags.
pub const CROWDSALE_INITIALIZED: PackedField = PackedField::byte("crowdsaleInitialized", 13, 28);
pub const ACTIVATION_FEE_PAID: PackedField = PackedField::byte("isActivationFeePaid", 13, 29);
pub const TOKEN_INITIALIZED: PackedField = PackedField::byte("tokenInitialized", 13, 30);
pub const PAUSED: PackedField = PackedField::byte("paused", 13, 31);

pub const START_TIME_FOR_ETH_FUNDING_PERIOD: PackedField =
    PackedField::word("startTimeForEthFundingPeriod", 14);
pub const DURATION_FOR_ETH_FUNDING_PERIOD: PackedField =
    PackedField::word("durationForEthFundingPeriod", 15);
pub const DURATION_FOR_ACTIVATION_PERIOD: PackedField =
    PackedField::word("durationForActivationPeriod", 16);
pub const FIAT_CURRENCY: PackedField = PackedField::word("fiatCurrency32", 17);
pub const FUNDING_GOAL_IN_CENTS: PackedField = PackedField::word("fundingGoalInCents", 18);
pub const FUNDED_FIAT_AMOUNT_IN_CENTS: PackedField =
    PackedField::word("fundedFiatAmountInCents", 19);

// Token storage

pub const NAME: PackedField = PackedField::word("name32", 20);
pub const SYMBOL: PackedField = PackedField::word("symbol32", 21);
pub const TOTAL_PER_TOKEN_PAYOUT: PackedField = PackedField::word("totalPerTokenPayout", 22);
pub const OWNER: PackedField = PackedField::address("owner", 23);
pub const CLAIMED_PER_TOKEN_PAYOUTS: PackedField =
    PackedField::word("claimedPerTokenPayouts", 24);
pub const SPENT_BALANCES: PackedField = PackedField::word("spentBalances", 25);
pub const RECEIVED_BALANCES: PackedField = PackedField::word("receivedBalances", 26);
pub const ALLOWED: PackedField = PackedField::word("allowed", 27);

// Slot 28 packs the upgrade flag above the whitelist flag.
pub const IS_UPGRADED: PackedField = PackedField::byte("isUpgraded", 28, 30);
pub const WHITELIST_TRANSFERS: PackedField = PackedField::byte("whitelistTransfers", 28, 31);

/// The proxy-common region before stage initialization.
pub const PROXY_COMMON_PRE_STAGE_INIT: &[PackedField] =
    &[TOKEN_MASTER, CROWDSALE_MASTER, REGISTRY_WORD];

/// The proxy-common region after stage initialization.
pub const PROXY_COMMON_POST_STAGE_INIT: &[PackedField] =
    &[TOKEN_MASTER, CROWDSALE_MASTER, REGISTRY];

/// The common region before stage initialization, where there is no stage.
pub const COMMON_PRE_STAGE_INIT: &[PackedField] = &[
    BROKER,
    CUSTODIAN,
    PROOF_OF_CUSTODY_0,
    PROOF_OF_CUSTODY_1,
    TOTAL_SUPPLY,
    FUNDED_FIAT_AMOUNT_IN_TOKENS,
    FUNDED_FIAT_AMOUNT_PER_USER_IN_TOKENS,
    FUNDED_ETH_AMOUNT_IN_WEI,
    FUNDED_ETH_AMOUNT_PER_USER_IN_WEI,
    UNCLAIMED_PAYOUT_TOTALS,
    CROWDSALE_INITIALIZED,
    ACTIVATION_FEE_PAID,
    TOKEN_INITIALIZED,
    PAUSED,
    START_TIME_FOR_ETH_FUNDING_PERIOD,
    DURATION_FOR_ETH_FUNDING_PERIOD,
    DURATION_FOR_ACTIVATION_PERIOD,
    FIAT_CURRENCY,
    FUNDING_GOAL_IN_CENTS,
    FUNDED_FIAT_AMOUNT_IN_CENTS,
];

/// The common region after stage initialization, with the stage packed into
/// slot 2.
pub const COMMON_POST_STAGE_INIT: &[PackedField] = &[
    STAGE,
    BROKER,
    CUSTODIAN,
    PROOF_OF_CUSTODY_0,
    PROOF_OF_CUSTODY_1,
    TOTAL_SUPPLY,
    FUNDED_FIAT_AMOUNT_IN_TOKENS,
    FUNDED_FIAT_AMOUNT_PER_USER_IN_TOKENS,
    FUNDED_ETH_AMOUNT_IN_WEI,
    FUNDED_ETH_AMOUNT_PER_USER_IN_WEI,
    UNCLAIMED_PAYOUT_TOTALS,
    CROWDSALE_INITIALIZED,
    ACTIVATION_FEE_PAID,
    TOKEN_INITIALIZED,
    PAUSED,
    START_TIME_FOR_ETH_FUNDING_PERIOD,
    DURATION_FOR_ETH_FUNDING_PERIOD,
    DURATION_FOR_ACTIVATION_PERIOD,
    FIAT_CURRENCY,
    FUNDING_GOAL_IN_CENTS,
    FUNDED_FIAT_AMOUNT_IN_CENTS,
];

/// The token region, which is the same under both versions.
pub const TOKEN: &[PackedField] = &[
    NAME,
    SYMBOL,
    TOTAL_PER_TOKEN_PAYOUT,
    OWNER,
    CLAIMED_PER_TOKEN_PAYOUTS,
    SPENT_BALANCES,
    RECEIVED_BALANCES,
    ALLOWED,
    IS_UPGRADED,
    WHITELIST_TRANSFERS,
];

/// Finds every pair of fields in `fields` that share bytes of the same slot.
#[must_use]
pub fn overlapping_fields<'a, I>(fields: I) -> Vec<(&'a PackedField, &'a PackedField)>
where
    I: IntoIterator<Item = &'a PackedField>,
    I::IntoIter: Clone,
{
    fields
        .into_iter()
        .tuple_combinations()
        .filter(|(a, b)| a.overlaps(b))
        .collect()
}

/// Finds the slots below [`SEQUENTIAL_SLOT_COUNT`] that no field of `version`
/// covers.
#[must_use]
pub fn uncovered_slots(version: SchemaVersion) -> Vec<usize> {
    (0..SEQUENTIAL_SLOT_COUNT)
        .filter(|ix| !version.fields().any(|f| f.slot == *ix))
        .collect()
}

#[cfg(test)]
mod test {
    use crate::{
        constant::SEQUENTIAL_SLOT_COUNT,
        decoder::schema::{
            overlapping_fields,
            uncovered_slots,
            PackedField,
            SchemaVersion,
            REGISTRY,
            REGISTRY_WORD,
            STAGE,
        },
    };

    const VERSIONS: [SchemaVersion; 2] = [SchemaVersion::PreStageInit, SchemaVersion::PostStageInit];

    #[test]
    fn no_fields_overlap_within_a_version() {
        for version in VERSIONS {
            let overlaps = overlapping_fields(version.fields());
            assert!(overlaps.is_empty(), "{version:?} has overlaps: {overlaps:?}");
        }
    }

    #[test]
    fn every_sequential_slot_is_covered() {
        for version in VERSIONS {
            assert_eq!(uncovered_slots(version), Vec::<usize>::new());
            assert_eq!(version.required_slots(), SEQUENTIAL_SLOT_COUNT);
        }
    }

    #[test]
    fn every_field_lies_within_a_word() {
        for field in VERSIONS.iter().flat_map(|v| v.fields()) {
            assert!(field.start < field.end, "{field:?}");
            assert!(field.end <= 32, "{field:?}");
        }
    }

    #[test]
    fn slot_two_differs_between_versions() {
        let pre: Vec<_> = SchemaVersion::PreStageInit.fields().filter(|f| f.slot == 2).collect();
        let post: Vec<_> = SchemaVersion::PostStageInit.fields().filter(|f| f.slot == 2).collect();

        assert_eq!(pre, vec![&REGISTRY_WORD]);
        assert_eq!(post, vec![&REGISTRY, &STAGE]);
        assert!(REGISTRY_WORD.overlaps(&STAGE));
        assert!(!REGISTRY.overlaps(&STAGE));
    }

    #[test]
    fn detects_overlaps() {
        let a = PackedField::new("a", 1, 0, 16);
        let b = PackedField::new("b", 1, 15, 32);
        let c = PackedField::new("c", 2, 0, 32);

        assert_eq!(overlapping_fields([&a, &b, &c]), vec![(&a, &b)]);
    }

    #[test]
    fn field_widths() {
        assert_eq!(REGISTRY.width(), 20);
        assert_eq!(STAGE.width(), 1);
        assert_eq!(REGISTRY_WORD.width(), 32);
    }
}
