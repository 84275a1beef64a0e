//! Chain client seam: signs and broadcasts an envelope.

use async_trait::async_trait;

use crate::{MsgExec, TransactionError, TxResult};

/// Everything a signer needs to broadcast one envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastRequest {
    pub network: String,
    pub chain_id: String,
    /// Keyring name of the grantee key.
    pub key_name: String,
    /// REST endpoint the transaction was resolved against.
    pub rest_endpoint: String,
    pub envelope: MsgExec,
    pub memo: String,
}

/// Signs with a locally held key and broadcasts.
///
/// Implementations manage their own keyring, gas estimation and fees. A
/// committed transaction with a non-zero code is returned as `Ok`; callers
/// decide how to treat it.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn sign_and_broadcast(&self, request: &BroadcastRequest)
        -> Result<TxResult, TransactionError>;
}
