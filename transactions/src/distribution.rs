//! Distribution module withdrawals.

use serde::{Deserialize, Serialize};

/// Withdraw the rewards of `delegator_address`'s delegation to
/// `validator_address`. For a validator's self-delegation the delegator is
/// the validator's own account address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawDelegatorReward {
    pub delegator_address: String,
    pub validator_address: String,
}

/// Withdraw the accumulated commission of an operator address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgWithdrawValidatorCommission {
    pub validator_address: String,
}
