//! This module contains the lifecycle oracle, which drives a POA token through
//! its stage transitions so that its storage can be checked at each
//! checkpoint.
//!
//! The operations themselves are external to the library, and are consumed
//! through the [`LifecycleDriver`] trait. The oracle only knows the order in
//! which they must happen, and which stage each should leave the contract in.

pub mod stage;

use ethnum::U256;

use crate::{
    config::Config,
    error::lifecycle::{Error, Result},
    word::{Address, Word},
};
pub use stage::Stage;

/// The arguments with which the token is initialized.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenInitialization {
    pub name:         String,
    pub symbol:       String,
    pub broker:       Address,
    pub custodian:    Address,
    pub registry:     Address,
    pub total_supply: U256,
}

/// The arguments with which the crowdsale is initialized.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CrowdsaleInitialization {
    pub fiat_currency:         String,
    pub start_time:            u64,
    pub funding_timeout:       u64,
    pub activation_timeout:    u64,
    pub funding_goal_in_cents: U256,
}

/// The external operations that move a POA token through its lifecycle.
///
/// Each call blocks until the operation has taken effect on chain, and returns
/// [`Error::StepFailed`] if it was rejected.
pub trait LifecycleDriver {
    /// Initializes the token portion of the contract.
    fn initialize_token(&mut self, init: &TokenInitialization) -> Result<()>;

    /// Initializes the crowdsale portion of the contract.
    fn initialize_crowdsale(&mut self, init: &CrowdsaleInitialization) -> Result<()>;

    /// Gets the number of seconds until the ETH funding period may start.
    fn needed_time_travel(&self) -> Result<u64>;

    /// Advances chain time by `seconds`.
    fn time_travel(&mut self, seconds: u64) -> Result<()>;

    /// Starts the ETH funding period.
    fn start_eth_sale(&mut self) -> Result<()>;

    /// Buys every remaining token as `buyer`, which completes the funding.
    fn buy_remaining_tokens(&mut self, buyer: Address) -> Result<()>;

    /// Submits the custody proof `fragments` as `from`.
    fn update_proof_of_custody(&mut self, fragments: &[Word; 2], from: Address) -> Result<()>;

    /// Pays the fee required for activation.
    fn pay_activation_fee(&mut self) -> Result<()>;

    /// Activates the token as `from`.
    fn activate(&mut self, from: Address) -> Result<()>;

    /// Claims the broker's proceeds.
    fn broker_claim(&mut self) -> Result<()>;

    /// Approves `spender` to transfer `amount` of `owner`'s tokens.
    fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> Result<()>;

    /// Upgrades the proxy to a new token master copy.
    fn upgrade(&mut self) -> Result<()>;

    /// Gets the stage that the contract is currently in.
    fn current_stage(&self) -> Result<Stage>;
}

/// Drives a contract through the lifecycle sequences that precede each storage
/// checkpoint.
///
/// The oracle holds the driver mutably for its lifetime, so no snapshot can be
/// read while a step is in progress.
pub struct LifecycleOracle<'a, D: LifecycleDriver> {
    driver: &'a mut D,
    config: &'a Config,
}

impl<'a, D: LifecycleDriver> LifecycleOracle<'a, D> {
    /// Creates an oracle that drives `driver` with the values in `config`.
    pub fn new(driver: &'a mut D, config: &'a Config) -> Self {
        Self { driver, config }
    }

    /// Initializes the token and then its crowdsale, with the funding period
    /// starting at `start_time`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if either initialization fails, or the contract does not
    /// remain in [`Stage::PreFunding`].
    pub fn initialize_contract(&mut self, registry: Address, start_time: u64) -> Result<()> {
        let config = self.config;
        let token = TokenInitialization {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            broker: config.broker,
            custodian: config.custodian,
            registry,
            total_supply: config.total_supply.0,
        };
        let crowdsale = CrowdsaleInitialization {
            fiat_currency: config.fiat_currency.clone(),
            start_time,
            funding_timeout: config.funding_timeout,
            activation_timeout: config.activation_timeout,
            funding_goal_in_cents: config.funding_goal_in_cents.0,
        };

        self.step("initializeToken", Some(Stage::PreFunding), |d| d.initialize_token(&token))?;
        self.step("initializeCrowdsale", Some(Stage::PreFunding), |d| {
            d.initialize_crowdsale(&crowdsale)
        })
    }

    /// Takes an initialized contract through its ETH sale and activation,
    /// leaving it in [`Stage::Active`].
    ///
    /// # Errors
    ///
    /// Returns [`Err`] as soon as any step fails or leaves the contract in an
    /// unexpected stage. The remaining steps are not attempted.
    pub fn enter_active_stage(&mut self) -> Result<()> {
        let config = self.config;

        let seconds = self.driver.needed_time_travel()?;
        self.step("timeTravel", None, |d| d.time_travel(seconds))?;
        self.step("startEthSale", Some(Stage::EthFunding), D::start_eth_sale)?;
        self.step("buyRemainingTokens", Some(Stage::FundingSuccessful), |d| {
            d.buy_remaining_tokens(config.buyer)
        })?;
        self.step("updateProofOfCustody", Some(Stage::FundingSuccessful), |d| {
            d.update_proof_of_custody(&config.proof_of_custody, config.custodian)
        })?;
        self.step(
            "payActivationFee",
            Some(Stage::FundingSuccessful),
            D::pay_activation_fee,
        )?;
        self.step("activate", Some(Stage::Active), |d| d.activate(config.custodian))?;
        self.step("brokerClaim", Some(Stage::Active), D::broker_claim)
    }

    /// Grants the configured allowance from the buyer to the spender.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the approval fails or changes the stage.
    pub fn approve_spender(&mut self) -> Result<()> {
        let config = self.config;
        let stage = self.driver.current_stage()?;
        self.step("approve", Some(stage), |d| {
            d.approve(config.buyer, config.spender, config.approved_allowance.0)
        })
    }

    /// Upgrades the proxy's token master copy.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the upgrade fails or changes the stage.
    pub fn upgrade(&mut self) -> Result<()> {
        let stage = self.driver.current_stage()?;
        self.step("upgrade", Some(stage), D::upgrade)
    }

    /// Runs `action` as the lifecycle `step`, requiring that it does not move
    /// the contract backwards and, if given, that it leaves the contract in the
    /// `expected` stage.
    fn step(
        &mut self,
        step: &'static str,
        expected: Option<Stage>,
        action: impl FnOnce(&mut D) -> Result<()>,
    ) -> Result<()> {
        tracing::info!(step, "running lifecycle step");

        let before = self.driver.current_stage()?;
        action(&mut *self.driver)?;
        let after = self.driver.current_stage()?;

        if after < before {
            return Err(Error::BackwardsTransition {
                step,
                from: before,
                to: after,
            });
        }
        match expected {
            Some(expected) if expected != after => Err(Error::UnexpectedStage {
                step,
                expected,
                actual: after,
            }),
            _ => Ok(()),
        }
    }
}
