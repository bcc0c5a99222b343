//! This module contains the invariant checker, which verifies a contract's
//! decoded storage against what is expected at each lifecycle checkpoint.
//!
//! Every verification reads a fresh snapshot of storage, builds the fixed
//! table of [`Check`]s for the checkpoint, and evaluates it in order. The
//! first violated check fails the verification.

pub mod check;

use std::fmt::{Display, Formatter};

use ethnum::U256;

use crate::{
    checker::check::{Check, Expectation},
    config::Config,
    constant::{ALLOWED_SLOT, CROWDSALE_MASTER_NAME, FUNDED_ETH_PER_USER_SLOT, TOKEN_MASTER_NAME},
    decoder::{field_word, schema, trim_trailing_zero_bytes},
    error::Result,
    lifecycle::Stage,
    reader::{ChainReader, StorageReader},
    registry::ContractRegistry,
    snapshot::{parse_proxy_common, parse_snapshot, value::Value, ContractSnapshot},
    storage::RawStorage,
    word::{Address, Word},
};

/// The points in a contract's lifecycle at which its storage is verified.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Checkpoint {
    /// The proxy has been deployed but the contract not yet initialized.
    PreInitialized,

    /// The token and crowdsale have been initialized.
    PostInitialized,

    /// The contract has been funded and activated.
    PostActive,

    /// An active contract has been upgraded to a new token master copy.
    PostUpgraded,
}

impl Checkpoint {
    /// Checks if storage should be decoded as stage-initialized at this
    /// checkpoint.
    #[must_use]
    pub fn stage_initialized(self) -> bool {
        matches!(self, Self::PostActive | Self::PostUpgraded)
    }
}

impl Display for Checkpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Verifies the storage of contracts on a chain against a configuration of
/// expected values.
#[derive(Clone, Debug)]
pub struct InvariantChecker<'a, C: ChainReader> {
    reader: StorageReader<C>,
    config: &'a Config,
}

impl<'a, C: ChainReader> InvariantChecker<'a, C> {
    /// Creates a checker that reads from `chain` and expects the values in
    /// `config`.
    pub fn new(chain: C, config: &'a Config) -> Self {
        let reader = StorageReader::new(chain);
        Self { reader, config }
    }

    /// Verifies that the storage of `contract` is as expected at `checkpoint`.
    ///
    /// The master copies and registry address are resolved through `registry`,
    /// and `manager` is the account expected to own the contract.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if storage cannot be read or decoded, or if any check
    /// for the checkpoint is violated. In the last case the error identifies
    /// the first violated check.
    pub fn verify(
        &self,
        checkpoint: Checkpoint,
        contract: Address,
        registry: &impl ContractRegistry,
        manager: Address,
    ) -> Result<()> {
        let storage = self.reader.read_snapshot_of(contract, self.config.sequential_slot_count)?;
        let checks = self.checks_for(checkpoint, &storage, contract, registry, manager)?;
        let count = checks.len();

        for check in checks {
            check.evaluate(checkpoint).map_err(|failure| {
                tracing::warn!(
                    %checkpoint,
                    %contract,
                    field = failure.field,
                    expected = %failure.expected,
                    actual = %failure.actual,
                    "storage check failed"
                );
                failure
            })?;
        }

        tracing::debug!(%checkpoint, %contract, count, "storage checks passed");
        Ok(())
    }

    /// Builds the table of checks for `checkpoint` over `storage`.
    fn checks_for(
        &self,
        checkpoint: Checkpoint,
        storage: &RawStorage,
        contract: Address,
        registry: &impl ContractRegistry,
        manager: Address,
    ) -> Result<Vec<Check>> {
        if checkpoint == Checkpoint::PreInitialized {
            return pre_initialized_checks(storage, registry);
        }

        let snapshot = parse_snapshot(storage, checkpoint.stage_initialized())?;
        if tracing::enabled!(tracing::Level::TRACE) {
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    tracing::trace!(%checkpoint, %contract, snapshot = %json, "decoded storage");
                }
                Err(error) => {
                    tracing::trace!(%checkpoint, %contract, %error, "could not serialise snapshot");
                }
            }
        }

        let mut checks = self.lifecycle_checks(checkpoint, &snapshot, registry, manager)?;
        match checkpoint {
            Checkpoint::PreInitialized | Checkpoint::PostInitialized => {}
            Checkpoint::PostActive => checks.extend(self.mapping_checks(contract)?),
            Checkpoint::PostUpgraded => {
                checks.extend(self.mapping_checks(contract)?);
                checks.push(Check::new(
                    schema::TOKEN_MASTER.name,
                    snapshot.proxy_common.token_master,
                    Expectation::equals(registry.contract_address(TOKEN_MASTER_NAME)?),
                ));
                checks.push(Check::new(
                    schema::IS_UPGRADED.name,
                    snapshot.token.upgraded,
                    Expectation::IsTrue,
                ));
            }
        }

        Ok(checks)
    }

    /// Builds the checks shared by every checkpoint after initialization.
    ///
    /// Before activation the contract is paused with nothing raised and no
    /// custody proof. After activation it is unpaused, funded, and holds the
    /// configured proof. The token master is only compared before activation,
    /// as an upgrade may be pending after it.
    fn lifecycle_checks(
        &self,
        checkpoint: Checkpoint,
        snapshot: &ContractSnapshot,
        registry: &impl ContractRegistry,
        manager: Address,
    ) -> Result<Vec<Check>> {
        let config = self.config;
        let active = checkpoint.stage_initialized();
        let proxy = &snapshot.proxy_common;
        let common = &snapshot.common;
        let token = &snapshot.token;

        let stage = if active { Stage::Active } else { Stage::PreFunding };
        let proof = if active {
            config.proof_of_custody.map(|w| trim_trailing_zero_bytes(&w))
        } else {
            [trim_trailing_zero_bytes(&Word::zero()), trim_trailing_zero_bytes(&Word::zero())]
        };
        let funded_eth = if active {
            Expectation::greater_than(U256::ZERO)
        } else {
            Expectation::equals(U256::ZERO)
        };

        let mut checks = vec![
            Check::new(schema::STAGE.name, common.stage, Expectation::equals(stage)),
            Check::new(
                schema::CUSTODIAN.name,
                common.custodian,
                Expectation::equals(config.custodian),
            ),
            Check::new(schema::BROKER.name, common.broker, Expectation::equals(config.broker)),
        ];
        for ((field, actual), expected) in [schema::PROOF_OF_CUSTODY_0, schema::PROOF_OF_CUSTODY_1]
            .iter()
            .zip(&common.proof_of_custody)
            .zip(proof)
        {
            checks.push(Check::new(
                field.name,
                Value::hex(actual.as_str()),
                Expectation::Equals(Value::hex(expected)),
            ));
        }
        checks.extend([
            Check::new(
                schema::TOTAL_SUPPLY.name,
                common.total_supply.0,
                Expectation::equals(config.total_supply.0),
            ),
            Check::new(
                schema::FUNDED_FIAT_AMOUNT_IN_TOKENS.name,
                common.funded_fiat_amount_in_tokens.0,
                Expectation::equals(U256::ZERO),
            ),
            Check::new(
                schema::FUNDED_ETH_AMOUNT_IN_WEI.name,
                common.funded_eth_amount_in_wei.0,
                funded_eth,
            ),
            Check::new(
                schema::REGISTRY.name,
                proxy.registry(),
                Expectation::equals(registry.address()),
            ),
            Check::new(schema::PAUSED.name, common.paused, Expectation::is(!active)),
            Check::new(
                schema::TOKEN_INITIALIZED.name,
                common.token_initialized,
                Expectation::IsTrue,
            ),
            Check::new(
                schema::CROWDSALE_INITIALIZED.name,
                common.crowdsale_initialized,
                Expectation::IsTrue,
            ),
        ]);
        if !active {
            checks.push(Check::new(
                schema::TOKEN_MASTER.name,
                proxy.token_master,
                Expectation::equals(registry.contract_address(TOKEN_MASTER_NAME)?),
            ));
        }
        checks.extend([
            Check::new(
                schema::CROWDSALE_MASTER.name,
                proxy.crowdsale_master,
                Expectation::equals(registry.contract_address(CROWDSALE_MASTER_NAME)?),
            ),
            Check::new(
                schema::START_TIME_FOR_ETH_FUNDING_PERIOD.name,
                common.start_time_for_eth_funding_period.0,
                Expectation::greater_than(U256::from(config.minimum_start_time)),
            ),
            Check::new(
                schema::DURATION_FOR_ETH_FUNDING_PERIOD.name,
                common.duration_for_eth_funding_period.0,
                Expectation::equals(U256::from(config.funding_timeout)),
            ),
            Check::new(
                schema::DURATION_FOR_ACTIVATION_PERIOD.name,
                common.duration_for_activation_period.0,
                Expectation::greater_than(common.duration_for_eth_funding_period.0),
            ),
            Check::new(
                schema::FIAT_CURRENCY.name,
                Value::ascii(common.fiat_currency.as_str()),
                Expectation::Equals(Value::ascii(config.fiat_currency.as_str())),
            ),
            Check::new(
                schema::FUNDING_GOAL_IN_CENTS.name,
                common.funding_goal_in_cents.0,
                Expectation::equals(config.funding_goal_in_cents.0),
            ),
            Check::new(
                schema::FUNDED_FIAT_AMOUNT_IN_CENTS.name,
                common.funded_fiat_amount_in_cents.0,
                Expectation::equals(U256::ZERO),
            ),
            Check::new(schema::ALLOWED.name, token.allowed, Expectation::equals(Word::zero())),
            Check::new(schema::OWNER.name, token.owner, Expectation::equals(manager)),
            Check::new(
                schema::NAME.name,
                Value::ascii(token.name.as_str()),
                Expectation::Equals(Value::ascii(config.name.as_str())),
            ),
            Check::new(
                schema::SYMBOL.name,
                Value::ascii(token.symbol.as_str()),
                Expectation::Equals(Value::ascii(config.symbol.as_str())),
            ),
        ]);

        tracing::debug!(%checkpoint, count = checks.len(), "built storage checks");
        Ok(checks)
    }

    /// Builds the checks on mapping entries that are written by the purchase
    /// and approval after activation.
    fn mapping_checks(&self, contract: Address) -> Result<Vec<Check>> {
        let config = self.config;
        let allowed = self.reader.read_nested_mapping(
            contract,
            ALLOWED_SLOT,
            config.buyer,
            config.spender,
        )?;
        let invested =
            self.reader
                .read_mapping(contract, FUNDED_ETH_PER_USER_SLOT, config.buyer)?;

        Ok(vec![
            Check::new(
                "allowed[buyer][spender]",
                allowed.word.value(),
                Expectation::equals(config.approved_allowance.0),
            ),
            Check::new(
                "fundedEthAmountPerUserInWei[buyer]",
                invested.word.value(),
                Expectation::equals(config.expected_investment_in_wei()?),
            ),
        ])
    }
}

/// Builds the checks for a proxy that has not been initialized, where only the
/// proxy-common slots have been written.
fn pre_initialized_checks(
    storage: &RawStorage,
    registry: &impl ContractRegistry,
) -> Result<Vec<Check>> {
    let proxy = parse_proxy_common(storage, false)?;
    let registry_word = field_word(storage, schema::REGISTRY_WORD)?;

    Ok(vec![
        Check::new(
            schema::TOKEN_MASTER.name,
            proxy.token_master,
            Expectation::equals(registry.contract_address(TOKEN_MASTER_NAME)?),
        ),
        Check::new(
            schema::CROWDSALE_MASTER.name,
            proxy.crowdsale_master,
            Expectation::equals(registry.contract_address(CROWDSALE_MASTER_NAME)?),
        ),
        Check::new(
            schema::REGISTRY_WORD.name,
            registry_word,
            Expectation::equals(Word::from(registry.address())),
        ),
    ])
}
