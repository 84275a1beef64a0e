//! Nullable chain client: records broadcasts instead of signing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use vigil_transactions::{BroadcastRequest, ChainClient, TransactionError, TxResult};

/// Returns queued results in order, then a default successful result.
#[derive(Default)]
pub struct NullChainClient {
    results: Mutex<VecDeque<Result<TxResult, TransactionError>>>,
    broadcasts: Mutex<Vec<BroadcastRequest>>,
}

impl NullChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next broadcast.
    pub fn push_result(&self, result: TxResult) {
        self.results.lock().unwrap().push_back(Ok(result));
    }

    /// Queue a broadcast-level failure.
    pub fn push_failure(&self, message: &str) {
        self.results
            .lock()
            .unwrap()
            .push_back(Err(TransactionError::Broadcast(message.to_string())));
    }

    /// Queue an accepted transaction that is never seen committed.
    pub fn push_unconfirmed(&self, txhash: &str) {
        self.results
            .lock()
            .unwrap()
            .push_back(Err(TransactionError::NotCommitted(txhash.to_string())));
    }

    /// Every request received, in order.
    pub fn broadcasts(&self) -> Vec<BroadcastRequest> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainClient for NullChainClient {
    async fn sign_and_broadcast(
        &self,
        request: &BroadcastRequest,
    ) -> Result<TxResult, TransactionError> {
        self.broadcasts.lock().unwrap().push(request.clone());
        let next = self.results.lock().unwrap().pop_front();
        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(e)) => Err(e),
            None => Ok(TxResult {
                code: 0,
                raw_log: String::new(),
                txhash: format!("NULLTX{}", self.broadcast_count()),
                events: Vec::new(),
            }),
        }
    }
}
