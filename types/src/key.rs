//! Locally held signing keys that act on a validator's behalf through authz.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{Timestamp, TypesError};

/// What a delegated key is allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPurpose {
    Voting,
    Rewards,
}

impl KeyPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Voting => "voting",
            Self::Rewards => "rewards",
        }
    }
}

impl fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyPurpose {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voting" | "vote" => Ok(Self::Voting),
            "rewards" | "reward" => Ok(Self::Rewards),
            other => Err(TypesError::InvalidKeyPurpose(other.to_string())),
        }
    }
}

/// Cached on-chain authorization state of a delegated key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    #[default]
    Unknown,
    NotGranted,
    Granted,
}

impl GrantStatus {
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::NotGranted
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// A signing key registered for one (network, purpose) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedKey {
    pub network: String,
    pub purpose: KeyPurpose,
    /// Name of the key in the local keyring.
    pub key_name: String,
    /// On-chain account address of the key (the authz grantee).
    pub grantee_address: String,
    pub grant_status: GrantStatus,
    /// When `grant_status` was last refreshed from chain.
    pub checked_at: Option<Timestamp>,
    /// Last known grant state per message type URL.
    pub action_grants: BTreeMap<String, GrantStatus>,
}

impl DelegatedKey {
    pub fn new(
        network: impl Into<String>,
        purpose: KeyPurpose,
        key_name: impl Into<String>,
        grantee_address: impl Into<String>,
    ) -> Self {
        Self {
            network: network.into(),
            purpose,
            key_name: key_name.into(),
            grantee_address: grantee_address.into(),
            grant_status: GrantStatus::Unknown,
            checked_at: None,
            action_grants: BTreeMap::new(),
        }
    }

    /// Cached grant state for one message type.
    pub fn action_status(&self, type_url: &str) -> GrantStatus {
        self.action_grants
            .get(type_url)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purpose_parses_aliases() {
        assert_eq!("Vote".parse::<KeyPurpose>().unwrap(), KeyPurpose::Voting);
        assert_eq!("rewards".parse::<KeyPurpose>().unwrap(), KeyPurpose::Rewards);
        assert!("staking".parse::<KeyPurpose>().is_err());
    }

    #[test]
    fn new_key_starts_unknown() {
        let key = DelegatedKey::new("cosmoshub", KeyPurpose::Voting, "gov", "cosmos1grantee");
        assert_eq!(key.grant_status, GrantStatus::Unknown);
        assert!(!key.grant_status.is_granted());
        assert_eq!(key.action_status("/cosmos.gov.v1.MsgVote"), GrantStatus::Unknown);
    }
}
