//! JSON shapes of the chain REST API.
//!
//! Only the fields the agent reads are modelled. Chains omit fields or send
//! `null` for empty lists depending on SDK version, so most fields default.

use serde::{Deserialize, Deserializer};

use vigil_types::Timestamp;

use crate::NetworkError;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Governance ─────────────────────────────────────────────────────────

/// Proposal as served by `cosmos/gov/v1`.
#[derive(Clone, Debug, Deserialize)]
pub struct ProposalV1 {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<serde_json::Value>,
    /// A string on most chains; some return an inline JSON object.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Present from SDK 0.47 on.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub voting_end_time: Option<String>,
}

/// Proposal as served by `cosmos/gov/v1beta1`.
#[derive(Clone, Debug, Deserialize)]
pub struct ProposalV1Beta1 {
    pub proposal_id: String,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub voting_end_time: Option<String>,
}

/// A proposal in whichever shape the endpoint's API version returned.
#[derive(Clone, Debug)]
pub enum RawProposal {
    V1(ProposalV1),
    V1Beta1(ProposalV1Beta1),
}

impl RawProposal {
    pub fn id(&self) -> Result<u64, NetworkError> {
        let raw = match self {
            Self::V1(p) => &p.id,
            Self::V1Beta1(p) => &p.proposal_id,
        };
        raw.parse()
            .map_err(|_| NetworkError::MalformedPayload(format!("invalid proposal id {raw:?}")))
    }

    /// End of the voting period, if present and parseable.
    pub fn voting_end_time(&self) -> Option<Timestamp> {
        let raw = match self {
            Self::V1(p) => p.voting_end_time.as_deref(),
            Self::V1Beta1(p) => p.voting_end_time.as_deref(),
        };
        raw.and_then(|s| Timestamp::parse_rfc3339(s).ok())
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ProposalsPage<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub proposals: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Pagination {
    #[serde(default)]
    pub next_key: Option<String>,
}

/// One option of a (possibly split) vote, with the weight as the chain
/// renders it (`"1.000000000000000000"`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WeightedVote {
    pub option: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoteResponse {
    #[serde(default)]
    pub vote: Option<VoteBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoteBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<WeightedVote>,
    /// Deprecated single option still sent by `v1beta1`.
    #[serde(default)]
    pub option: Option<String>,
}

// ── Authz / bank / node ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct GrantsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub grants: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalanceResponse {
    #[serde(default)]
    pub balance: Option<CoinJson>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoinJson {
    #[serde(default)]
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncingResponse {
    pub syncing: bool,
}

// ── Transactions ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct TxEnvelope {
    pub tx_response: TxResponse,
}

/// Committed transaction as returned by `cosmos/tx/v1beta1/txs/{hash}` and
/// by the chain CLI's JSON output.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TxResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub codespace: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub raw_log: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<AbciLog>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<EventJson>,
}

impl TxResponse {
    /// Events with plain-text attributes.
    ///
    /// Older SDKs base64-encode the top-level `events` but log plain events
    /// per message, so per-message logs win when present.
    pub fn plain_events(&self) -> Vec<EventJson> {
        let from_logs: Vec<EventJson> = self
            .logs
            .iter()
            .flat_map(|log| log.events.iter().cloned())
            .collect();
        if from_logs.is_empty() {
            self.events.clone()
        } else {
            from_logs
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AbciLog {
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<EventJson>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EventJson {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<AttributeJson>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AttributeJson {
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_proposal_with_null_messages() {
        let p: ProposalV1 = serde_json::from_str(
            r#"{"id":"42","messages":null,"metadata":null,
                "voting_end_time":"2024-05-10T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(p.messages.is_empty());
        assert!(p.metadata.is_null());
        let raw = RawProposal::V1(p);
        assert_eq!(raw.id().unwrap(), 42);
        assert_eq!(raw.voting_end_time(), Some(Timestamp::new(1_715_299_200)));
    }

    #[test]
    fn non_numeric_id_is_malformed() {
        let raw = RawProposal::V1Beta1(ProposalV1Beta1 {
            proposal_id: "abc".into(),
            content: None,
            voting_end_time: None,
        });
        assert!(matches!(raw.id(), Err(NetworkError::MalformedPayload(_))));
    }

    #[test]
    fn tx_prefers_per_message_logs() {
        let tx: TxResponse = serde_json::from_str(
            r#"{
                "txhash":"AB","code":0,"raw_log":"",
                "logs":[{"events":[{"type":"withdraw_rewards",
                    "attributes":[{"key":"amount","value":"10uatom"}]}]}],
                "events":[{"type":"d2l0aGRyYXc=","attributes":[]}]
            }"#,
        )
        .unwrap();
        let events = tx.plain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "withdraw_rewards");
    }

    #[test]
    fn tx_falls_back_to_top_level_events() {
        let tx: TxResponse = serde_json::from_str(
            r#"{"txhash":"AB","code":0,"logs":null,
                "events":[{"type":"withdraw_commission",
                    "attributes":[{"key":"amount","value":"5uatom"}]}]}"#,
        )
        .unwrap();
        assert_eq!(tx.plain_events()[0].kind, "withdraw_commission");
    }
}
