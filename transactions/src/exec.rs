//! `cosmos.authz.v1beta1.MsgExec` envelope.

use serde_json::{json, Value};

use crate::{Msg, TransactionError};

/// Inner messages executed under `grantee`'s authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgExec {
    pub grantee: String,
    pub msgs: Vec<Msg>,
}

impl MsgExec {
    pub const TYPE_URL: &'static str = "/cosmos.authz.v1beta1.MsgExec";

    /// Fails on an empty batch; an envelope without messages is rejected on
    /// chain anyway.
    pub fn new(grantee: &str, msgs: Vec<Msg>) -> Result<Self, TransactionError> {
        if msgs.is_empty() {
            return Err(TransactionError::EmptyEnvelope);
        }
        Ok(Self {
            grantee: grantee.to_string(),
            msgs,
        })
    }

    pub fn type_urls(&self) -> Vec<&'static str> {
        self.msgs.iter().map(Msg::type_url).collect()
    }

    /// Proto-JSON of the envelope.
    pub fn to_json(&self) -> Result<Value, TransactionError> {
        Ok(json!({
            "@type": Self::TYPE_URL,
            "grantee": self.grantee,
            "msgs": self.inner_json()?,
        }))
    }

    /// Unsigned transaction carrying the inner messages, the input format of
    /// `<chain binary> tx authz exec <file>`.
    pub fn unsigned_tx(&self, memo: &str) -> Result<Value, TransactionError> {
        Ok(json!({
            "body": {
                "messages": self.inner_json()?,
                "memo": memo,
                "timeout_height": "0",
                "extension_options": [],
                "non_critical_extension_options": []
            },
            "auth_info": {
                "signer_infos": [],
                "fee": {"amount": [], "gas_limit": "200000", "payer": "", "granter": ""}
            },
            "signatures": []
        }))
    }

    fn inner_json(&self) -> Result<Vec<Value>, TransactionError> {
        self.msgs
            .iter()
            .map(|m| {
                serde_json::to_value(m).map_err(|e| TransactionError::Serialization(e.to_string()))
            })
            .collect()
    }
}
