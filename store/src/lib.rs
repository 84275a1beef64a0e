//! Abstract storage traits for the vigil agent.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits, usually
//! through the [`Stores`] bundle.
//!
//! Each method is its own short transaction; nothing spans several
//! proposals or validators, so an interrupted pass leaves completed writes
//! in place and the next pass picks up the rest.

pub mod error;
pub mod key;
pub mod meta;
pub mod proposal;
pub mod reward;
pub mod validator;

use std::sync::Arc;

pub use error::StoreError;
pub use key::KeyStore;
pub use meta::MetaStore;
pub use proposal::ProposalLogStore;
pub use reward::RewardStore;
pub use validator::ValidatorStore;

/// Handles to every store the engine uses.
#[derive(Clone)]
pub struct Stores {
    pub validators: Arc<dyn ValidatorStore>,
    pub keys: Arc<dyn KeyStore>,
    pub proposals: Arc<dyn ProposalLogStore>,
    pub rewards: Arc<dyn RewardStore>,
}

impl Stores {
    /// Bundle a single backend that implements every store trait.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: ValidatorStore + KeyStore + ProposalLogStore + RewardStore + 'static,
    {
        Self {
            validators: store.clone(),
            keys: store.clone(),
            proposals: store.clone(),
            rewards: store,
        }
    }
}
