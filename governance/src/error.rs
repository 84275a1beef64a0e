use thiserror::Error;

use vigil_crypto::AddressError;
use vigil_network::NetworkError;
use vigil_store::StoreError;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GovernanceError {
    /// Whether the next scheduled poll may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            Self::Address(_) | Self::Store(_) => false,
        }
    }
}
