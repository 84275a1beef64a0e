use thiserror::Error;

use vigil_types::KeyPurpose;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] vigil_governance::GovernanceError),

    #[error("network error: {0}")]
    Network(#[from] vigil_network::NetworkError),

    #[error("address error: {0}")]
    Address(#[from] vigil_crypto::AddressError),

    #[error("store error: {0}")]
    Store(#[from] vigil_store::StoreError),

    #[error("storage backend error: {0}")]
    Lmdb(#[from] vigil_store_lmdb::LmdbError),

    #[error("transaction error: {0}")]
    Transaction(#[from] vigil_transactions::TransactionError),

    #[error("alert error: {0}")]
    Alert(#[from] vigil_alerts::AlertError),

    #[error("no validator registered on {0}")]
    UnknownValidator(String),

    #[error("no {purpose} key registered on {network}")]
    MissingKey { network: String, purpose: KeyPurpose },

    #[error("{type_url} is not granted to {grantee} on {network}")]
    NotGranted {
        network: String,
        grantee: String,
        type_url: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API server error: {0}")]
    Api(String),

    #[error("pass timed out after {0}s")]
    PassTimeout(u64),

    #[error("{0}")]
    Other(String),
}

impl NodeError {
    /// Whether the next scheduled pass may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Governance(e) => e.is_retryable(),
            Self::Network(e) => e.is_retryable(),
            Self::Transaction(e) => e.is_retryable(),
            Self::Alert(_) | Self::PassTimeout(_) => true,
            _ => false,
        }
    }
}

impl From<vigil_types::TypesError> for NodeError {
    fn from(e: vigil_types::TypesError) -> Self {
        NodeError::InvalidInput(e.to_string())
    }
}
