//! Parse and validation errors for domain types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid coin amount: {0}")]
    InvalidCoin(String),

    #[error("coin amount overflow for denom {0}")]
    CoinOverflow(String),

    #[error("invalid vote option: {0}")]
    InvalidVoteOption(String),

    #[error("invalid governance API version: {0}")]
    InvalidApiVersion(String),

    #[error("invalid key purpose: {0}")]
    InvalidKeyPurpose(String),

    #[error("invalid reward period: {0}")]
    InvalidRewardPeriod(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
