//! Proposal log storage.

use crate::StoreError;
use vigil_types::{ProposalLog, Timestamp};

/// One row per (network, proposal id); rows are never deleted.
pub trait ProposalLogStore: Send + Sync {
    /// Ensure a row exists for the proposal.
    ///
    /// A new row starts with an empty vote option and `now` as its update
    /// time. An existing row keeps its vote option and timestamp; only a
    /// changed title is written back. Returns the stored row.
    fn upsert_proposal_log(
        &self,
        network: &str,
        proposal_id: u64,
        title: &str,
        now: Timestamp,
    ) -> Result<ProposalLog, StoreError>;

    /// Set the vote option of an existing row and bump its timestamp.
    fn update_vote_option(
        &self,
        network: &str,
        proposal_id: u64,
        vote_option: &str,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    fn get_proposal_log(
        &self,
        network: &str,
        proposal_id: u64,
    ) -> Result<Option<ProposalLog>, StoreError>;

    /// Rows updated within `[from, to]`, optionally limited to one network,
    /// ordered by network then proposal id.
    fn list_proposal_logs(
        &self,
        network: Option<&str>,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<ProposalLog>, StoreError>;
}
