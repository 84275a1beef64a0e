//! Messages executed on a validator's behalf through authz.
//!
//! Message types:
//! - **VoteV1Beta1 / VoteV1**: governance vote, one per gov API version
//! - **WithdrawDelegatorReward**: withdraw the validator's self-delegation rewards
//! - **WithdrawValidatorCommission**: withdraw accumulated commission
//!
//! Inner messages are wrapped in a single [`MsgExec`] envelope signed by the
//! grantee key and handed to a [`ChainClient`].

pub mod client;
pub mod distribution;
pub mod error;
pub mod events;
pub mod exec;
pub mod result;
pub mod vote;

pub use client::{BroadcastRequest, ChainClient};
pub use distribution::{MsgWithdrawDelegatorReward, MsgWithdrawValidatorCommission};
pub use error::TransactionError;
pub use events::{
    sum_event_amounts, WithdrawTotals, WITHDRAW_COMMISSION_EVENT, WITHDRAW_REWARDS_EVENT,
};
pub use exec::MsgExec;
pub use result::{Attribute, Event, TxResult};
pub use vote::{MsgVote, MsgVoteV1};

use serde::{Deserialize, Serialize};
use vigil_types::{GovApiVersion, VoteOption};

/// Any message the agent executes under a grant, in proto-JSON form with
/// its `@type` URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Msg {
    #[serde(rename = "/cosmos.gov.v1beta1.MsgVote")]
    VoteV1Beta1(MsgVote),
    #[serde(rename = "/cosmos.gov.v1.MsgVote")]
    VoteV1(MsgVoteV1),
    #[serde(rename = "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward")]
    WithdrawDelegatorReward(MsgWithdrawDelegatorReward),
    #[serde(rename = "/cosmos.distribution.v1beta1.MsgWithdrawValidatorCommission")]
    WithdrawValidatorCommission(MsgWithdrawValidatorCommission),
}

impl Msg {
    pub const WITHDRAW_DELEGATOR_REWARD_URL: &'static str =
        "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward";
    pub const WITHDRAW_VALIDATOR_COMMISSION_URL: &'static str =
        "/cosmos.distribution.v1beta1.MsgWithdrawValidatorCommission";

    /// Type URL, which is also the `msg_type_url` a grant is issued for.
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::VoteV1Beta1(_) => GovApiVersion::V1Beta1.vote_type_url(),
            Self::VoteV1(_) => GovApiVersion::V1.vote_type_url(),
            Self::WithdrawDelegatorReward(_) => Self::WITHDRAW_DELEGATOR_REWARD_URL,
            Self::WithdrawValidatorCommission(_) => Self::WITHDRAW_VALIDATOR_COMMISSION_URL,
        }
    }

    /// Vote message in the shape of the network's governance API.
    pub fn vote(
        version: GovApiVersion,
        proposal_id: u64,
        voter: &str,
        option: VoteOption,
        metadata: &str,
    ) -> Self {
        match version {
            GovApiVersion::V1Beta1 => Self::VoteV1Beta1(MsgVote::new(proposal_id, voter, option)),
            GovApiVersion::V1 => {
                Self::VoteV1(MsgVoteV1::new(proposal_id, voter, option, metadata))
            }
        }
    }

    pub fn withdraw_rewards(delegator: &str, validator: &str) -> Self {
        Self::WithdrawDelegatorReward(MsgWithdrawDelegatorReward {
            delegator_address: delegator.to_string(),
            validator_address: validator.to_string(),
        })
    }

    pub fn withdraw_commission(validator: &str) -> Self {
        Self::WithdrawValidatorCommission(MsgWithdrawValidatorCommission {
            validator_address: validator.to_string(),
        })
    }
}
