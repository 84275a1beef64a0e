//! Governance vote messages.

use serde::{Deserialize, Serialize};
use vigil_types::VoteOption;

/// `cosmos.gov.v1beta1.MsgVote`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    /// uint64 rendered as a string, as proto-JSON does.
    pub proposal_id: String,
    pub voter: String,
    /// Enum name, e.g. `VOTE_OPTION_YES`.
    pub option: String,
}

impl MsgVote {
    pub fn new(proposal_id: u64, voter: &str, option: VoteOption) -> Self {
        Self {
            proposal_id: proposal_id.to_string(),
            voter: voter.to_string(),
            option: option.proto_name().to_string(),
        }
    }
}

/// `cosmos.gov.v1.MsgVote`, which adds free-form metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteV1 {
    pub proposal_id: String,
    pub voter: String,
    pub option: String,
    #[serde(default)]
    pub metadata: String,
}

impl MsgVoteV1 {
    pub fn new(proposal_id: u64, voter: &str, option: VoteOption, metadata: &str) -> Self {
        Self {
            proposal_id: proposal_id.to_string(),
            voter: voter.to_string(),
            option: option.proto_name().to_string(),
            metadata: metadata.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_uses_proto_enum_name() {
        let msg = MsgVote::new(42, "cosmos1voter", VoteOption::NoWithVeto);
        assert_eq!(msg.option, "VOTE_OPTION_NO_WITH_VETO");
        assert_eq!(msg.proposal_id, "42");
    }
}
