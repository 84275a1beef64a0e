use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    /// The chain accepted the request but the transaction failed.
    #[error("transaction {txhash} failed with code {code}: {raw_log}")]
    LogicalTxFailure {
        code: u32,
        raw_log: String,
        txhash: String,
    },

    /// Nothing reached the chain.
    #[error("broadcast failed: {0}")]
    Broadcast(String),

    /// Accepted with code 0 but not seen committed in time.
    #[error("transaction {0} was not committed in time")]
    NotCommitted(String),

    /// The signer exited successfully but its output could not be read,
    /// so whether the transaction went out is unknown.
    #[error("unreadable broadcast response: {0}")]
    UnreadableResponse(String),

    #[error("no signing key for {network}/{purpose}")]
    MissingKey { network: String, purpose: String },

    #[error("envelope must carry at least one message")]
    EmptyEnvelope,

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TransactionError {
    /// Only a broadcast that never reached the chain may be repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Broadcast(_))
    }

    /// Whether the transaction may be on chain despite the error.
    pub fn may_be_on_chain(&self) -> bool {
        matches!(self, Self::NotCommitted(_) | Self::UnreadableResponse(_))
    }

    /// Hash of a transaction the chain accepted.
    pub fn submitted_txhash(&self) -> Option<&str> {
        match self {
            Self::NotCommitted(txhash) => Some(txhash),
            _ => None,
        }
    }
}
