//! This module contains the representation of the crowdsale stage enum as it is
//! stored on chain.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::decode;

/// The stage of a POA token's crowdsale.
///
/// The discriminants are the codes stored in the contract, and increase along
/// every permitted transition.
#[derive(Copy, Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[repr(u8)]
pub enum Stage {
    PreFunding        = 0,
    FiatFunding       = 1,
    EthFunding        = 2,
    FundingSuccessful = 3,
    FundingCancelled  = 4,
    TimedOut          = 5,
    Active            = 6,
    Terminated        = 7,
}

impl Stage {
    /// Gets the code that the contract stores for this stage.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Stage {
    type Error = decode::Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let stage = match code {
            0 => Self::PreFunding,
            1 => Self::FiatFunding,
            2 => Self::EthFunding,
            3 => Self::FundingSuccessful,
            4 => Self::FundingCancelled,
            5 => Self::TimedOut,
            6 => Self::Active,
            7 => Self::Terminated,
            code => return Err(decode::Error::UnknownStage { code }),
        };

        Ok(stage)
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({})", self.code())
    }
}
