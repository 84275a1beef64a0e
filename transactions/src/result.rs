//! Committed transaction results.

use serde::{Deserialize, Serialize};

use crate::TransactionError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<Attribute>,
}

impl Event {
    pub fn new(kind: &str, attributes: &[(&str, &str)]) -> Self {
        Self {
            kind: kind.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| Attribute {
                    key: k.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    pub fn attribute(&self, key: &str) -> impl Iterator<Item = &str> + '_ {
        let key = key.to_string();
        self.attributes
            .iter()
            .filter(move |a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// What the chain client reports for a broadcast transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    /// ABCI result code; zero is success.
    pub code: u32,
    pub raw_log: String,
    pub txhash: String,
    pub events: Vec<Event>,
}

impl TxResult {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Turn a non-zero result code into [`TransactionError::LogicalTxFailure`].
    pub fn into_success(self) -> Result<Self, TransactionError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransactionError::LogicalTxFailure {
                code: self.code,
                raw_log: self.raw_log,
                txhash: self.txhash,
            })
        }
    }
}
