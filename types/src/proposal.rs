//! Governance proposal records kept by the agent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Timestamp, TypesError};

/// A single-choice governance vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteOption {
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

impl VoteOption {
    /// Protobuf enum value (`cosmos.gov.v1.VoteOption`).
    pub fn proto_value(&self) -> i32 {
        match self {
            Self::Yes => 1,
            Self::Abstain => 2,
            Self::No => 3,
            Self::NoWithVeto => 4,
        }
    }

    /// Enum name as rendered in REST/JSON (`VOTE_OPTION_YES`).
    pub fn proto_name(&self) -> &'static str {
        match self {
            Self::Yes => "VOTE_OPTION_YES",
            Self::Abstain => "VOTE_OPTION_ABSTAIN",
            Self::No => "VOTE_OPTION_NO",
            Self::NoWithVeto => "VOTE_OPTION_NO_WITH_VETO",
        }
    }

    /// Short label stored in proposal logs (`YES`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::Abstain => "ABSTAIN",
            Self::No => "NO",
            Self::NoWithVeto => "NO_WITH_VETO",
        }
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteOption {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let label = upper.strip_prefix("VOTE_OPTION_").unwrap_or(&upper);
        match label {
            "YES" | "1" => Ok(Self::Yes),
            "ABSTAIN" | "2" => Ok(Self::Abstain),
            "NO" | "3" => Ok(Self::No),
            "NO_WITH_VETO" | "NOWITHVETO" | "VETO" | "4" => Ok(Self::NoWithVeto),
            _ => Err(TypesError::InvalidVoteOption(s.to_string())),
        }
    }
}

/// One row per (network, proposal id). Re-polling updates in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalLog {
    pub network: String,
    pub proposal_id: u64,
    pub title: String,
    /// Last-seen vote of the tracked validator; empty until a vote is seen.
    pub vote_option: String,
    pub updated_at: Timestamp,
}

impl ProposalLog {
    pub fn new(
        network: impl Into<String>,
        proposal_id: u64,
        title: impl Into<String>,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            network: network.into(),
            proposal_id,
            title: title.into(),
            vote_option: String::new(),
            updated_at,
        }
    }

    pub fn has_vote(&self) -> bool {
        !self.vote_option.is_empty()
    }
}

/// An active proposal the tracked validator has not voted on yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedProposal {
    pub network: String,
    pub proposal_id: u64,
    pub title: String,
    pub voting_end_time: Option<Timestamp>,
    pub validator_address: String,
}
