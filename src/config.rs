//! This module contains the configuration of the expected fixture values that a
//! verified contract was deployed and driven with.

use std::path::Path;

use ethnum::U256;
use serde::Deserialize;

use crate::{
    constant::{
        DEFAULT_ACTIVATION_TIMEOUT,
        DEFAULT_APPROVED_ALLOWANCE,
        DEFAULT_FIAT_CURRENCY,
        DEFAULT_FIAT_RATE,
        DEFAULT_FIAT_RATE_PENALTY_PERMILLE,
        DEFAULT_FUNDING_GOAL_IN_CENTS,
        DEFAULT_FUNDING_TIMEOUT,
        DEFAULT_NAME,
        DEFAULT_PURCHASE_PRINCIPAL_IN_WEI,
        DEFAULT_SYMBOL,
        DEFAULT_TOTAL_SUPPLY,
        MINIMUM_FUNDING_START_TIME,
        SEQUENTIAL_SLOT_COUNT,
    },
    error::{Error, Result},
    snapshot::penalized_investment,
    utility::{U256Wrapper, U256W},
    word::{Address, Word},
};

/// The IPFS hash `QmSUfCtXgb59G9tczrz2WuHNAbecV55KRBGXBbZkou5RtE`, split
/// left-aligned across two `bytes32` fragments as the default custody proof.
const DEFAULT_PROOF_OF_CUSTODY: [Word; 2] = [
    Word::from_be_bytes(*b"QmSUfCtXgb59G9tczrz2WuHNAbecV55K"),
    Word::from_be_bytes(*b"RBGXBbZkou5RtE\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0"),
];

/// The expected values for a verified contract.
///
/// These are the values that the contract was initialized and driven with, and
/// against which the checkpoint tables compare what is found in storage.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// The broker that lists the token.
    pub broker: Address,

    /// The custodian of the underlying asset, who submits the custody proof
    /// and activates the token.
    pub custodian: Address,

    /// The buyer who purchases the remaining tokens during the ETH sale.
    pub buyer: Address,

    /// The account that the buyer approves to spend on its behalf.
    pub spender: Address,

    /// The token name.
    ///
    /// Defaults to [`DEFAULT_NAME`].
    pub name: String,

    /// The token symbol.
    ///
    /// Defaults to [`DEFAULT_SYMBOL`].
    pub symbol: String,

    /// The total supply of the token.
    ///
    /// Defaults to [`DEFAULT_TOTAL_SUPPLY`].
    pub total_supply: U256W,

    /// The currency code of the fiat funding goal.
    ///
    /// Defaults to [`DEFAULT_FIAT_CURRENCY`].
    pub fiat_currency: String,

    /// The funding goal in fiat cents.
    ///
    /// Defaults to [`DEFAULT_FUNDING_GOAL_IN_CENTS`].
    pub funding_goal_in_cents: U256W,

    /// The duration of the ETH funding period in seconds.
    ///
    /// Defaults to [`DEFAULT_FUNDING_TIMEOUT`].
    pub funding_timeout: u64,

    /// The duration of the activation period in seconds. This must exceed the
    /// funding timeout.
    ///
    /// Defaults to [`DEFAULT_ACTIVATION_TIMEOUT`].
    pub activation_timeout: u64,

    /// The start time of the ETH funding period must be strictly later than
    /// this timestamp.
    ///
    /// Defaults to [`MINIMUM_FUNDING_START_TIME`].
    pub minimum_start_time: u64,

    /// The fiat rate at the time of purchase.
    ///
    /// Defaults to [`DEFAULT_FIAT_RATE`].
    pub fiat_rate: U256W,

    /// The fiat rate after the rate penalty, which is what purchases are
    /// credited at.
    ///
    /// Defaults to [`DEFAULT_FIAT_RATE`] reduced by
    /// [`DEFAULT_FIAT_RATE_PENALTY_PERMILLE`].
    pub penalized_fiat_rate: U256W,

    /// The wei amount that buys the remaining tokens at the unpenalized rate.
    ///
    /// Defaults to [`DEFAULT_PURCHASE_PRINCIPAL_IN_WEI`].
    pub purchase_principal_in_wei: U256W,

    /// The allowance that the buyer grants to the spender.
    ///
    /// Defaults to [`DEFAULT_APPROVED_ALLOWANCE`].
    pub approved_allowance: U256W,

    /// The two `bytes32` fragments of the custody proof that the custodian
    /// submits.
    pub proof_of_custody: [Word; 2],

    /// The number of sequential slots to read for each snapshot.
    ///
    /// Defaults to [`SEQUENTIAL_SLOT_COUNT`].
    pub sequential_slot_count: usize,
}

impl Config {
    /// Sets the `broker` config parameter to `value`.
    #[must_use]
    pub fn with_broker(mut self, value: Address) -> Self {
        self.broker = value;
        self
    }

    /// Sets the `custodian` config parameter to `value`.
    #[must_use]
    pub fn with_custodian(mut self, value: Address) -> Self {
        self.custodian = value;
        self
    }

    /// Sets the `buyer` config parameter to `value`.
    #[must_use]
    pub fn with_buyer(mut self, value: Address) -> Self {
        self.buyer = value;
        self
    }

    /// Sets the `spender` config parameter to `value`.
    #[must_use]
    pub fn with_spender(mut self, value: Address) -> Self {
        self.spender = value;
        self
    }

    /// Sets the token `name` and `symbol`.
    #[must_use]
    pub fn with_token_names(mut self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.name = name.into();
        self.symbol = symbol.into();
        self
    }

    /// Sets the `total_supply` config parameter to `value`.
    #[must_use]
    pub fn with_total_supply(mut self, value: impl Into<U256>) -> Self {
        self.total_supply = U256Wrapper(value.into());
        self
    }

    /// Sets the `fiat_currency` config parameter to `value`.
    #[must_use]
    pub fn with_fiat_currency(mut self, value: impl Into<String>) -> Self {
        self.fiat_currency = value.into();
        self
    }

    /// Sets the `funding_goal_in_cents` config parameter to `value`.
    #[must_use]
    pub fn with_funding_goal_in_cents(mut self, value: impl Into<U256>) -> Self {
        self.funding_goal_in_cents = U256Wrapper(value.into());
        self
    }

    /// Sets the funding and activation timeouts, in seconds.
    #[must_use]
    pub fn with_timeouts(mut self, funding: u64, activation: u64) -> Self {
        self.funding_timeout = funding;
        self.activation_timeout = activation;
        self
    }

    /// Sets the unpenalized and penalized fiat rates.
    #[must_use]
    pub fn with_fiat_rates(mut self, rate: impl Into<U256>, penalized: impl Into<U256>) -> Self {
        self.fiat_rate = U256Wrapper(rate.into());
        self.penalized_fiat_rate = U256Wrapper(penalized.into());
        self
    }

    /// Sets the `purchase_principal_in_wei` config parameter to `value`.
    #[must_use]
    pub fn with_purchase_principal_in_wei(mut self, value: impl Into<U256>) -> Self {
        self.purchase_principal_in_wei = U256Wrapper(value.into());
        self
    }

    /// Sets the `approved_allowance` config parameter to `value`.
    #[must_use]
    pub fn with_approved_allowance(mut self, value: impl Into<U256>) -> Self {
        self.approved_allowance = U256Wrapper(value.into());
        self
    }

    /// Sets the `proof_of_custody` config parameter to `value`.
    #[must_use]
    pub fn with_proof_of_custody(mut self, value: [Word; 2]) -> Self {
        self.proof_of_custody = value;
        self
    }

    /// Sets the `sequential_slot_count` config parameter to `value`.
    #[must_use]
    pub fn with_sequential_slot_count(mut self, value: usize) -> Self {
        self.sequential_slot_count = value;
        self
    }

    /// Parses a configuration from JSON, taking the default for any field that
    /// is not present.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::other(format!("Invalid config: {e}")))
    }

    /// Reads and parses a JSON configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the file cannot be read or does not parse.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::other(format!("Could not read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Computes the wei amount that the buyer's purchase is recorded as, which
    /// is the principal scaled by the ratio of the fiat rate to the penalized
    /// rate, truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the computation overflows or the penalized rate is
    /// zero.
    pub fn expected_investment_in_wei(&self) -> Result<U256> {
        penalized_investment(
            self.purchase_principal_in_wei.0,
            self.fiat_rate.0,
            self.penalized_fiat_rate.0,
        )
        .ok_or_else(|| {
            Error::other(format!(
                "Expected investment of {} wei at rates {}/{} is not representable",
                self.purchase_principal_in_wei, self.fiat_rate, self.penalized_fiat_rate
            ))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let penalized_fiat_rate =
            DEFAULT_FIAT_RATE * (1000 - DEFAULT_FIAT_RATE_PENALTY_PERMILLE) / 1000;

        Self {
            broker: Address::repeat_byte(0xb0),
            custodian: Address::repeat_byte(0xc0),
            buyer: Address::repeat_byte(0xb1),
            spender: Address::repeat_byte(0xb2),
            name: DEFAULT_NAME.into(),
            symbol: DEFAULT_SYMBOL.into(),
            total_supply: DEFAULT_TOTAL_SUPPLY.into(),
            fiat_currency: DEFAULT_FIAT_CURRENCY.into(),
            funding_goal_in_cents: DEFAULT_FUNDING_GOAL_IN_CENTS.into(),
            funding_timeout: DEFAULT_FUNDING_TIMEOUT,
            activation_timeout: DEFAULT_ACTIVATION_TIMEOUT,
            minimum_start_time: MINIMUM_FUNDING_START_TIME,
            fiat_rate: DEFAULT_FIAT_RATE.into(),
            penalized_fiat_rate: penalized_fiat_rate.into(),
            purchase_principal_in_wei: DEFAULT_PURCHASE_PRINCIPAL_IN_WEI.into(),
            approved_allowance: DEFAULT_APPROVED_ALLOWANCE.into(),
            proof_of_custody: DEFAULT_PROOF_OF_CUSTODY,
            sequential_slot_count: SEQUENTIAL_SLOT_COUNT,
        }
    }
}

#[cfg(test)]
mod test {
    use ethnum::U256;

    use crate::{
        config::Config,
        error::Error,
        word::{Address, Word},
    };

    #[test]
    fn default_penalized_rate_applies_the_penalty() {
        let config = Config::default();
        assert_eq!(config.fiat_rate.0, U256::from(33_333u32));
        assert_eq!(config.penalized_fiat_rate.0, U256::from(32_666u32));
        assert!(config.activation_timeout > config.funding_timeout);
    }

    #[test]
    fn default_custody_proof_is_ascii() -> anyhow::Result<()> {
        let config = Config::default();
        let first = crate::decoder::to_ascii_string(&config.proof_of_custody[0])?;
        let second = crate::decoder::to_ascii_string(&config.proof_of_custody[1])?;

        assert_eq!(format!("{first}{second}"), "QmSUfCtXgb59G9tczrz2WuHNAbecV55KRBGXBbZkou5RtE");
        assert_eq!(config.proof_of_custody[1], Word::from_ascii("RBGXBbZkou5RtE")?);

        Ok(())
    }

    #[test]
    fn expected_investment_truncates() -> anyhow::Result<()> {
        let config = Config::default();
        let expected = U256::from(15_000_150_001_500_015_000u128) * U256::from(33_333u32)
            / U256::from(32_666u32);

        assert_eq!(config.expected_investment_in_wei()?, expected);

        Ok(())
    }

    #[test]
    fn zero_penalized_rate_is_an_error() {
        let config = Config::default().with_fiat_rates(1u32, 0u32);
        assert!(matches!(config.expected_investment_in_wei(), Err(Error::Other(_))));
    }

    #[test]
    fn parses_partial_json_over_defaults() -> anyhow::Result<()> {
        let config = Config::from_json(
            r#"{
                "name": "Penthouse",
                "totalSupply": "2500",
                "broker": "0x0101010101010101010101010101010101010101",
                "fundingTimeout": 3600
            }"#,
        )?;

        assert_eq!(config.name, "Penthouse");
        assert_eq!(config.symbol, "TST");
        assert_eq!(config.total_supply.0, U256::from(2500u32));
        assert_eq!(config.broker, Address::repeat_byte(0x01));
        assert_eq!(config.funding_timeout, 3600);
        assert_eq!(config.sequential_slot_count, 29);

        Ok(())
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(Config::from_json("{\"totalSupply\": true}").is_err());
    }
}
