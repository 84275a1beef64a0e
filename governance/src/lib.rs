//! Governance monitoring for registered validators.
//!
//! The [`ProposalPoller`] lists proposals in their voting period on one
//! network, keeps a [`ProposalLog`](vigil_types::ProposalLog) row per
//! proposal, and reports the proposals the validator has not voted on.
//! Proposal payloads differ between the `v1beta1` and `v1` APIs; both are
//! normalised into [`ActiveProposal`] first.

pub mod error;
pub mod metadata;
pub mod poller;
pub mod proposal;
pub mod vote;

pub use error::GovernanceError;
pub use metadata::{Metadata, ProposalMetadata};
pub use poller::{PollReport, ProposalPoller};
pub use proposal::{ActiveProposal, UNKNOWN_TITLE};
pub use vote::{compose_vote_option, normalize_option};
