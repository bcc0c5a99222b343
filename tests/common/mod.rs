//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.
//!
//! The centrepiece is [`SimulatedPoa`], an in-memory stand-in for a deployed
//! POA token proxy. It writes its state into a [`MemoryChain`] at the raw byte
//! positions that the real contract uses, so that the verifier reads it
//! exactly as it would read the real thing.

#![cfg(test)]

use ethnum::U256;
use poa_storage_verifier::{
    checker::{Checkpoint, InvariantChecker},
    config::Config,
    constant::{CROWDSALE_MASTER_NAME, TOKEN_MASTER_NAME},
    error::{lifecycle, read},
    lifecycle::{
        CrowdsaleInitialization,
        LifecycleDriver,
        LifecycleOracle,
        Stage,
        TokenInitialization,
    },
    reader::{mapping_slot, memory::MemoryChain, nested_mapping_slot, ChainReader},
    registry::{ContractRegistry, StaticRegistry},
    word::{Address, Word},
};

/// The address of the proxy under test.
pub const PROXY: Address = Address::repeat_byte(0xaa);

/// The address of the contract registry.
pub const REGISTRY: Address = Address::repeat_byte(0x12);

/// The token master copy that the proxy is deployed with.
pub const TOKEN_MASTER: Address = Address::repeat_byte(0x10);

/// The crowdsale master copy that the proxy is deployed with.
pub const CROWDSALE_MASTER: Address = Address::repeat_byte(0x11);

/// The token master copy that the proxy is upgraded to.
pub const UPGRADED_TOKEN_MASTER: Address = Address::repeat_byte(0x13);

/// The account that deploys, and therefore owns, the proxy.
pub const MANAGER: Address = Address::repeat_byte(0x0e);

/// The chain time at deployment.
pub const GENESIS_TIME: u64 = 1_600_000_000;

/// How long after deployment the ETH funding period starts.
pub const FUNDING_DELAY: u64 = 60;

/// A simulated POA token proxy, along with the chain and registry it is
/// deployed on.
#[derive(Clone, Debug)]
pub struct SimulatedPoa {
    pub chain:    MemoryChain,
    pub registry: StaticRegistry,
    config:       Config,
    now:          u64,
    fail_on:      Option<&'static str>,
}

#[allow(unused)] // Not every test uses every helper
impl SimulatedPoa {
    /// Deploys a proxy pointing at the default master copies, which will
    /// behave according to `config`.
    pub fn deploy(config: &Config) -> Self {
        let registry = StaticRegistry::new(REGISTRY)
            .with_entry(TOKEN_MASTER_NAME, TOKEN_MASTER)
            .with_entry(CROWDSALE_MASTER_NAME, CROWDSALE_MASTER);
        let mut poa = Self {
            chain: MemoryChain::new(),
            registry,
            config: config.clone(),
            now: GENESIS_TIME,
            fail_on: None,
        };

        poa.write_word(0, TOKEN_MASTER.into());
        poa.write_word(1, CROWDSALE_MASTER.into());
        poa.write_word(2, REGISTRY.into());

        poa
    }

    /// Makes the lifecycle operation named `step` revert.
    #[must_use]
    pub fn failing_on(mut self, step: &'static str) -> Self {
        self.fail_on = Some(step);
        self
    }

    /// Gets the start time that the crowdsale is initialized with.
    pub fn funding_start_time(&self) -> u64 {
        GENESIS_TIME + FUNDING_DELAY
    }

    /// Gets the word stored at sequential `slot` of the proxy.
    pub fn word(&self, slot: u32) -> Word {
        self.chain.get(PROXY, slot)
    }

    /// Gets the word stored at the computed `slot` of a mapping entry.
    pub fn entry(&self, slot: U256) -> Word {
        self.chain.get(PROXY, slot)
    }

    /// Overwrites sequential `slot` of the proxy with `word`.
    pub fn write_word(&mut self, slot: u32, word: Word) {
        self.chain.set(PROXY, slot, word);
    }

    /// Overwrites the computed `slot` of a mapping entry with `word`.
    pub fn write_entry(&mut self, slot: U256, word: Word) {
        self.chain.set(PROXY, slot, word);
    }

    /// Overwrites the single byte at `offset` of `slot`.
    pub fn write_byte(&mut self, slot: u32, offset: usize, byte: u8) {
        let mut word = self.word(slot);
        word.bytes_mut()[offset] = byte;
        self.write_word(slot, word);
    }

    fn read_byte(&self, slot: u32, offset: usize) -> u8 {
        self.word(slot).bytes_be()[offset]
    }

    fn read_address(&self, slot: u32) -> Address {
        Address::from_word_low(&self.word(slot))
    }

    fn write_stage(&mut self, stage: Stage) {
        self.write_byte(2, 11, stage.code());
    }

    fn guard(&self, step: &'static str, condition: bool, reason: &str) -> lifecycle::Result<()> {
        if self.fail_on == Some(step) {
            Err(lifecycle::Error::step_failed(step, "reverted"))
        } else if condition {
            Ok(())
        } else {
            Err(lifecycle::Error::step_failed(step, reason))
        }
    }

    fn stage_is(&self, stage: Stage) -> bool {
        self.current_stage().map_or(false, |s| s == stage)
    }
}

impl ChainReader for SimulatedPoa {
    fn storage_at(&self, address: Address, slot: U256) -> read::Result<Word> {
        self.chain.storage_at(address, slot)
    }
}

impl ContractRegistry for SimulatedPoa {
    fn address(&self) -> Address {
        self.registry.address()
    }

    fn contract_address(&self, name: &str) -> read::Result<Address> {
        self.registry.contract_address(name)
    }
}

fn ascii_word(step: &'static str, text: &str) -> lifecycle::Result<Word> {
    Word::from_ascii(text).map_err(|e| lifecycle::Error::step_failed(step, e.to_string()))
}

impl LifecycleDriver for SimulatedPoa {
    fn initialize_token(&mut self, init: &TokenInitialization) -> lifecycle::Result<()> {
        let step = "initializeToken";
        self.guard(step, self.read_byte(13, 30) == 0, "already initialized")?;

        let mut registry_slot = Word::from(init.registry);
        registry_slot.bytes_mut()[11] = self.read_byte(2, 11);
        self.write_word(2, registry_slot);
        self.write_word(3, init.broker.into());
        self.write_word(4, init.custodian.into());
        self.write_word(7, init.total_supply.into());
        self.write_word(20, ascii_word(step, &init.name)?);
        self.write_word(21, ascii_word(step, &init.symbol)?);
        self.write_word(23, MANAGER.into());
        self.write_byte(13, 30, 1);
        self.write_byte(13, 31, 1);

        Ok(())
    }

    fn initialize_crowdsale(&mut self, init: &CrowdsaleInitialization) -> lifecycle::Result<()> {
        let step = "initializeCrowdsale";
        self.guard(step, self.read_byte(13, 30) == 1, "token not initialized")?;
        self.guard(step, self.read_byte(13, 28) == 0, "already initialized")?;

        self.write_word(14, init.start_time.into());
        self.write_word(15, init.funding_timeout.into());
        self.write_word(16, init.activation_timeout.into());
        self.write_word(17, ascii_word(step, &init.fiat_currency)?);
        self.write_word(18, init.funding_goal_in_cents.into());
        self.write_byte(13, 28, 1);

        Ok(())
    }

    fn needed_time_travel(&self) -> lifecycle::Result<u64> {
        let start = self.word(14).value();
        let now = U256::from(self.now);
        let needed = if start > now { start - now } else { U256::ZERO };
        if needed > U256::from(u64::MAX) {
            return Err(lifecycle::Error::step_failed("timeTravel", "start time too far ahead"));
        }

        Ok(needed.as_u64())
    }

    fn time_travel(&mut self, seconds: u64) -> lifecycle::Result<()> {
        self.guard("timeTravel", true, "")?;
        self.now += seconds;
        Ok(())
    }

    fn start_eth_sale(&mut self) -> lifecycle::Result<()> {
        let step = "startEthSale";
        let started = U256::from(self.now) >= self.word(14).value();
        self.guard(step, self.stage_is(Stage::PreFunding), "not in pre-funding")?;
        self.guard(step, started, "funding period has not started")?;

        self.write_stage(Stage::EthFunding);
        Ok(())
    }

    fn buy_remaining_tokens(&mut self, buyer: Address) -> lifecycle::Result<()> {
        let step = "buyRemainingTokens";
        self.guard(step, self.stage_is(Stage::EthFunding), "not in ETH funding")?;

        let invested = self
            .config
            .expected_investment_in_wei()
            .map_err(|e| lifecycle::Error::step_failed(step, e.to_string()))?;
        let total = self.word(10).value() + invested;
        self.write_word(10, total.into());
        self.write_entry(mapping_slot(U256::from(11u32), &buyer.into()), invested.into());
        self.write_stage(Stage::FundingSuccessful);

        Ok(())
    }

    fn update_proof_of_custody(
        &mut self,
        fragments: &[Word; 2],
        from: Address,
    ) -> lifecycle::Result<()> {
        let step = "updateProofOfCustody";
        self.guard(step, from == self.read_address(4), "only the custodian")?;
        self.guard(step, self.stage_is(Stage::FundingSuccessful), "funding not successful")?;

        self.write_word(5, fragments[0]);
        self.write_word(6, fragments[1]);
        Ok(())
    }

    fn pay_activation_fee(&mut self) -> lifecycle::Result<()> {
        let step = "payActivationFee";
        self.guard(step, self.stage_is(Stage::FundingSuccessful), "funding not successful")?;

        self.write_byte(13, 29, 1);
        Ok(())
    }

    fn activate(&mut self, from: Address) -> lifecycle::Result<()> {
        let step = "activate";
        self.guard(step, from == self.read_address(4), "only the custodian")?;
        self.guard(step, self.read_byte(13, 29) == 1, "activation fee not paid")?;
        self.guard(step, !self.word(5).is_zero(), "no proof of custody")?;

        self.write_stage(Stage::Active);
        self.write_byte(13, 31, 0);
        Ok(())
    }

    fn broker_claim(&mut self) -> lifecycle::Result<()> {
        self.guard("brokerClaim", self.stage_is(Stage::Active), "not active")
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> lifecycle::Result<()> {
        self.guard("approve", self.stage_is(Stage::Active), "not active")?;

        let slot = nested_mapping_slot(U256::from(27u32), &owner.into(), &spender.into());
        self.write_entry(slot, amount.into());
        Ok(())
    }

    fn upgrade(&mut self) -> lifecycle::Result<()> {
        self.guard("upgrade", self.stage_is(Stage::Active), "not active")?;

        self.registry = self
            .registry
            .clone()
            .with_entry(TOKEN_MASTER_NAME, UPGRADED_TOKEN_MASTER);
        self.write_word(0, UPGRADED_TOKEN_MASTER.into());
        self.write_byte(28, 30, 1);
        Ok(())
    }

    fn current_stage(&self) -> lifecycle::Result<Stage> {
        Stage::try_from(self.read_byte(2, 11))
            .map_err(|e| lifecycle::Error::step_failed("currentStage", e.to_string()))
    }
}

/// Verifies the storage of the simulated proxy at `checkpoint`.
#[allow(unused)] // It is actually
pub fn verify(
    poa: &SimulatedPoa,
    config: &Config,
    checkpoint: Checkpoint,
) -> poa_storage_verifier::error::Result<()> {
    InvariantChecker::new(poa, config).verify(checkpoint, PROXY, poa, MANAGER)
}

/// Deploys and initializes a simulated proxy.
#[allow(unused)] // It is actually
pub fn initialized(config: &Config) -> anyhow::Result<SimulatedPoa> {
    let mut poa = SimulatedPoa::deploy(config);
    let start = poa.funding_start_time();
    LifecycleOracle::new(&mut poa, config).initialize_contract(REGISTRY, start)?;

    Ok(poa)
}

/// Deploys a simulated proxy and drives it into the active stage, approving
/// the configured spender along the way.
#[allow(unused)] // It is actually
pub fn activated(config: &Config) -> anyhow::Result<SimulatedPoa> {
    let mut poa = initialized(config)?;
    let mut oracle = LifecycleOracle::new(&mut poa, config);
    oracle.enter_active_stage()?;
    oracle.approve_spender()?;

    Ok(poa)
}
