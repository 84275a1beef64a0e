//! Reward withdrawal ledger.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Coins, Timestamp, TypesError};

/// Granularity of the duplicate-sweep guard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardPeriod {
    Daily,
    #[default]
    Monthly,
}

impl RewardPeriod {
    /// Key identifying the period containing `date`, formatted `YYYY-MM-DD`.
    ///
    /// Monthly periods are keyed by their first day.
    pub fn period_key(&self, date: NaiveDate) -> String {
        let start = match self {
            Self::Daily => date,
            Self::Monthly => date.with_day(1).unwrap_or(date),
        };
        start.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for RewardPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("daily"),
            Self::Monthly => f.write_str("monthly"),
        }
    }
}

impl FromStr for RewardPeriod {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            other => Err(TypesError::InvalidRewardPeriod(other.to_string())),
        }
    }
}

/// Where a withdrawal stands.
///
/// A record is written as `Pending` before anything is broadcast, so any
/// record for a period blocks further sweeps of it whatever its status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawStatus {
    /// Claimed; the broadcast outcome is unknown.
    Pending,
    /// Accepted by the chain, not yet seen committed.
    Submitted,
    /// Committed with code 0; totals are final.
    #[default]
    Confirmed,
    /// Committed with a non-zero code.
    Failed,
}

impl WithdrawStatus {
    /// Whether the transaction may still show up on chain.
    pub fn is_unsettled(&self) -> bool {
        matches!(self, Self::Pending | Self::Submitted)
    }
}

impl fmt::Display for WithdrawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        })
    }
}

/// One withdrawal per (chain, period, validator).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub chain_id: String,
    pub network: String,
    /// Native denom of the network.
    pub denom: String,
    pub validator_address: String,
    pub rewards: Coins,
    pub commission: Coins,
    /// Period key the withdrawal belongs to.
    pub period: String,
    /// Empty until the chain returns a hash.
    pub txhash: String,
    pub status: WithdrawStatus,
    pub recorded_at: Timestamp,
}
