//! This module contains the snapshot parsers, which compose the slot decoder
//! into the three views of a proxied POA token's storage.
//!
//! The views mirror the contract's delegate-proxy layering, where each layer
//! appends its own region of storage:
//!
//! - [`parse_proxy_common`] reads the master copies and the registry.
//! - [`parse_common`] reads the crowdsale state shared by both master copies.
//! - [`parse_token`] reads the token's own state.
//!
//! Each is a pure function over the same [`RawStorage`], so that each region's
//! offsets can be tested independently.

pub mod value;

use ethnum::U256;
use serde::Serialize;

use crate::{
    decoder::{
        decode_field,
        field_word,
        schema::{self, SchemaVersion},
        to_address,
        to_ascii_string,
        to_big_integer,
        to_bool,
        to_stage,
        trim_trailing_zero_bytes,
        WordResult,
    },
    error::{container::Locatable, decode},
    lifecycle::Stage,
    storage::RawStorage,
    utility::{U256Wrapper, U256W},
    word::{Address, Word},
};

/// The contents of slot 2, whose interpretation depends on whether the stage
/// has been initialized.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrySlot {
    /// Before stage initialization the slot is kept as the raw word, which
    /// should hold nothing but the registry address.
    Unstaged { word: Word },

    /// After stage initialization the stage is packed above the address.
    Staged { registry: Address, stage: Stage },
}

impl RegistrySlot {
    /// Gets the registry address, which occupies the low-order 20 bytes of the
    /// slot in either interpretation.
    #[must_use]
    pub fn registry(&self) -> Address {
        match self {
            Self::Unstaged { word } => Address::from_word_low(word),
            Self::Staged { registry, .. } => *registry,
        }
    }

    /// Gets the stage, if the slot was read as stage-initialized.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Unstaged { .. } => None,
            Self::Staged { stage, .. } => Some(*stage),
        }
    }
}

/// The storage shared by the proxy and both master copies.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyCommonStorage {
    pub token_master:     Address,
    pub crowdsale_master: Address,
    pub registry_slot:    RegistrySlot,
}

impl ProxyCommonStorage {
    /// Gets the registry address.
    #[must_use]
    pub fn registry(&self) -> Address {
        self.registry_slot.registry()
    }
}

/// The crowdsale state common to the token and crowdsale master copies.
///
/// Aggregate amounts are decoded to numbers. The per-user mappings are kept as
/// the raw words of their root slots, which are only meaningful as the base of
/// the mapping's hashed locations.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonStorage {
    pub stage:                                  Stage,
    pub broker:                                 Address,
    pub custodian:                              Address,
    pub proof_of_custody:                       [String; 2],
    pub total_supply:                           U256W,
    pub funded_fiat_amount_in_tokens:           U256W,
    pub funded_fiat_amount_per_user_in_tokens:  Word,
    pub funded_eth_amount_in_wei:               U256W,
    pub funded_eth_amount_per_user_in_wei:      Word,
    pub unclaimed_payout_totals:                Word,
    pub crowdsale_initialized:                  bool,
    pub activation_fee_paid:                    bool,
    pub token_initialized:                      bool,
    pub paused:                                 bool,
    pub start_time_for_eth_funding_period:      U256W,
    pub duration_for_eth_funding_period:        U256W,
    pub duration_for_activation_period:         U256W,
    pub fiat_currency:                          String,
    pub funding_goal_in_cents:                  U256W,
    pub funded_fiat_amount_in_cents:            U256W,
}

/// The token's own storage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStorage {
    pub name:                      String,
    pub symbol:                    String,
    pub total_per_token_payout:    Word,
    pub owner:                     Address,
    pub claimed_per_token_payouts: Word,
    pub spent_balances:            Word,
    pub received_balances:         Word,
    pub allowed:                   Word,
    pub whitelist_transfers:       bool,
    pub upgraded:                  bool,
}

/// The fully decoded view of a contract's storage at the time it was read.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSnapshot {
    pub proxy_common: ProxyCommonStorage,
    pub common:       CommonStorage,
    pub token:        TokenStorage,
}

/// Decodes a whole-word field as a number.
fn integer(storage: &RawStorage, field: schema::PackedField) -> decode::Result<U256W> {
    decode_field(storage, field, |w| Ok(U256Wrapper(to_big_integer(w))))
}

/// Reads a whole-word field without decoding it.
fn raw(storage: &RawStorage, field: schema::PackedField) -> decode::Result<Word> {
    field_word(storage, field)
}

/// Decodes an address that has its slot to itself.
///
/// The whole slot is decoded, so any bytes above the address are rejected.
fn address(storage: &RawStorage, field: schema::PackedField) -> decode::Result<Address> {
    to_address(storage.word(field.slot)?).locate(field.slot)
}

/// Decodes a single-byte boolean.
fn flag(storage: &RawStorage, field: schema::PackedField) -> decode::Result<bool> {
    decode_field(storage, field, to_bool)
}

/// Decodes a `bytes32` text field.
fn ascii(storage: &RawStorage, field: schema::PackedField) -> decode::Result<String> {
    decode_field(storage, field, to_ascii_string)
}

/// Renders a byte-data field as trimmed hex.
fn trimmed_hex(storage: &RawStorage, field: schema::PackedField) -> decode::Result<String> {
    decode_field(storage, field, |w| -> WordResult<String> { Ok(trim_trailing_zero_bytes(w)) })
}

/// Parses the proxy-common region of `storage`.
///
/// Slot 2 is read as a [`RegistrySlot::Staged`] when `stage_initialized` is
/// set, and as a [`RegistrySlot::Unstaged`] raw word otherwise.
///
/// # Errors
///
/// Returns [`Err`] if a slot is missing or a field does not decode.
pub fn parse_proxy_common(
    storage: &RawStorage,
    stage_initialized: bool,
) -> decode::Result<ProxyCommonStorage> {
    let token_master = address(storage, schema::TOKEN_MASTER)?;
    let crowdsale_master = address(storage, schema::CROWDSALE_MASTER)?;
    let registry_slot = match SchemaVersion::from_stage_initialized(stage_initialized) {
        SchemaVersion::PreStageInit => RegistrySlot::Unstaged {
            word: raw(storage, schema::REGISTRY_WORD)?,
        },
        SchemaVersion::PostStageInit => RegistrySlot::Staged {
            registry: Address::from_word_low(&field_word(storage, schema::REGISTRY)?),
            stage:    decode_field(storage, schema::STAGE, to_stage)?,
        },
    };

    Ok(ProxyCommonStorage {
        token_master,
        crowdsale_master,
        registry_slot,
    })
}

/// Parses the common region of `storage`.
///
/// Before stage initialization there is no stage in storage, and the stage is
/// reported as [`Stage::PreFunding`].
///
/// # Errors
///
/// Returns [`Err`] if a slot is missing or a field does not decode.
pub fn parse_common(storage: &RawStorage, stage_initialized: bool) -> decode::Result<CommonStorage> {
    let stage = match SchemaVersion::from_stage_initialized(stage_initialized) {
        SchemaVersion::PreStageInit => Stage::PreFunding,
        SchemaVersion::PostStageInit => decode_field(storage, schema::STAGE, to_stage)?,
    };

    Ok(CommonStorage {
        stage,
        broker: address(storage, schema::BROKER)?,
        custodian: address(storage, schema::CUSTODIAN)?,
        proof_of_custody: [
            trimmed_hex(storage, schema::PROOF_OF_CUSTODY_0)?,
            trimmed_hex(storage, schema::PROOF_OF_CUSTODY_1)?,
        ],
        total_supply: integer(storage, schema::TOTAL_SUPPLY)?,
        funded_fiat_amount_in_tokens: integer(storage, schema::FUNDED_FIAT_AMOUNT_IN_TOKENS)?,
        funded_fiat_amount_per_user_in_tokens: raw(
            storage,
            schema::FUNDED_FIAT_AMOUNT_PER_USER_IN_TOKENS,
        )?,
        funded_eth_amount_in_wei: integer(storage, schema::FUNDED_ETH_AMOUNT_IN_WEI)?,
        funded_eth_amount_per_user_in_wei: raw(storage, schema::FUNDED_ETH_AMOUNT_PER_USER_IN_WEI)?,
        unclaimed_payout_totals: raw(storage, schema::UNCLAIMED_PAYOUT_TOTALS)?,
        crowdsale_initialized: flag(storage, schema::CROWDSALE_INITIALIZED)?,
        activation_fee_paid: flag(storage, schema::ACTIVATION_FEE_PAID)?,
        token_initialized: flag(storage, schema::TOKEN_INITIALIZED)?,
        paused: flag(storage, schema::PAUSED)?,
        start_time_for_eth_funding_period: integer(
            storage,
            schema::START_TIME_FOR_ETH_FUNDING_PERIOD,
        )?,
        duration_for_eth_funding_period: integer(storage, schema::DURATION_FOR_ETH_FUNDING_PERIOD)?,
        duration_for_activation_period: integer(storage, schema::DURATION_FOR_ACTIVATION_PERIOD)?,
        fiat_currency: ascii(storage, schema::FIAT_CURRENCY)?,
        funding_goal_in_cents: integer(storage, schema::FUNDING_GOAL_IN_CENTS)?,
        funded_fiat_amount_in_cents: integer(storage, schema::FUNDED_FIAT_AMOUNT_IN_CENTS)?,
    })
}

/// Parses the token region of `storage`.
///
/// # Errors
///
/// Returns [`Err`] if a slot is missing or a field does not decode.
pub fn parse_token(storage: &RawStorage) -> decode::Result<TokenStorage> {
    Ok(TokenStorage {
        name:                      ascii(storage, schema::NAME)?,
        symbol:                    ascii(storage, schema::SYMBOL)?,
        total_per_token_payout:    raw(storage, schema::TOTAL_PER_TOKEN_PAYOUT)?,
        owner:                     address(storage, schema::OWNER)?,
        claimed_per_token_payouts: raw(storage, schema::CLAIMED_PER_TOKEN_PAYOUTS)?,
        spent_balances:            raw(storage, schema::SPENT_BALANCES)?,
        received_balances:         raw(storage, schema::RECEIVED_BALANCES)?,
        allowed:                   raw(storage, schema::ALLOWED)?,
        whitelist_transfers:       flag(storage, schema::WHITELIST_TRANSFERS)?,
        upgraded:                  flag(storage, schema::IS_UPGRADED)?,
    })
}

/// Parses all three regions of `storage` into a snapshot.
///
/// # Errors
///
/// Returns [`Err`] if `storage` is shorter than the layout requires, or if any
/// field does not decode.
pub fn parse_snapshot(storage: &RawStorage, stage_initialized: bool) -> decode::Result<ContractSnapshot> {
    let version = SchemaVersion::from_stage_initialized(stage_initialized);
    let required = version.required_slots();
    if storage.len() < required {
        let last = required - 1;
        return Err(decode::Error::MissingSlot {
            index:     last,
            available: storage.len(),
        }
        .locate(last));
    }

    let snapshot = ContractSnapshot {
        proxy_common: parse_proxy_common(storage, stage_initialized)?,
        common:       parse_common(storage, stage_initialized)?,
        token:        parse_token(storage)?,
    };
    tracing::debug!(?version, "parsed contract snapshot");

    Ok(snapshot)
}

/// Computes the expected wei investment for a buyer who pays `principal` at the
/// `rate` but is credited at the `penalized_rate`, using integer division as
/// the contract does.
///
/// Returns [`None`] if the computation overflows or `penalized_rate` is zero.
#[must_use]
pub fn penalized_investment(principal: U256, rate: U256, penalized_rate: U256) -> Option<U256> {
    principal.checked_mul(rate)?.checked_div(penalized_rate)
}
