//! Fundamental types for the vigil governance agent.
//!
//! This crate defines the domain model shared across every other crate in the
//! workspace: networks and their denominations, validators, delegated keys,
//! proposal logs, reward records, coin amounts, and timestamps.

pub mod coin;
pub mod error;
pub mod explorer;
pub mod key;
pub mod network;
pub mod proposal;
pub mod reward;
pub mod time;
pub mod validator;

pub use coin::{Coin, Coins};
pub use error::TypesError;
pub use explorer::ExplorerLinks;
pub use key::{DelegatedKey, GrantStatus, KeyPurpose};
pub use network::{builtin_denom, DenomInfo, GovApiVersion, NetworkMetadata};
pub use proposal::{MissedProposal, ProposalLog, VoteOption};
pub use reward::{RewardPeriod, RewardRecord, WithdrawStatus};
pub use time::{Clock, SystemClock, Timestamp};
pub use validator::Validator;
