//! Version-independent view of a proposal in its voting period.

use serde_json::Value;

use vigil_network::models::{ProposalV1, ProposalV1Beta1};
use vigil_network::{IpfsGateway, NetworkError, RawProposal};
use vigil_types::Timestamp;

use crate::ProposalMetadata;

/// Placeholder stored when no title can be extracted.
pub const UNKNOWN_TITLE: &str = "Unknown title";

const LEGACY_CONTENT_TYPE: &str = "/cosmos.gov.v1.MsgExecLegacyContent";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveProposal {
    pub id: u64,
    pub title: String,
    pub voting_end_time: Option<Timestamp>,
}

impl ActiveProposal {
    /// Normalise a raw proposal. Only a malformed id is an error; title
    /// problems degrade to [`UNKNOWN_TITLE`].
    pub async fn from_raw(raw: &RawProposal, ipfs: &IpfsGateway) -> Result<Self, NetworkError> {
        let id = raw.id()?;
        let title = match raw {
            RawProposal::V1(p) => v1_title(p, ipfs).await,
            RawProposal::V1Beta1(p) => v1beta1_title(p),
        };
        Ok(Self {
            id,
            title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            voting_end_time: raw.voting_end_time(),
        })
    }
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn v1beta1_title(proposal: &ProposalV1Beta1) -> Option<String> {
    non_empty(proposal.content.as_ref().and_then(|c| c.get("title")))
}

/// Title without remote fetches: legacy content, then a message title, then
/// the proposal's own title.
fn v1_inline_title(proposal: &ProposalV1) -> Option<String> {
    let legacy = proposal
        .messages
        .iter()
        .find(|m| m.get("@type").and_then(Value::as_str) == Some(LEGACY_CONTENT_TYPE))
        .and_then(|m| non_empty(m.get("content").and_then(|c| c.get("title"))));
    if legacy.is_some() {
        return legacy;
    }

    let message_title = proposal
        .messages
        .iter()
        .find_map(|m| non_empty(m.get("title")));
    if message_title.is_some() {
        return message_title;
    }

    proposal
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

async fn v1_title(proposal: &ProposalV1, ipfs: &IpfsGateway) -> Option<String> {
    if let Some(title) = v1_inline_title(proposal) {
        return Some(title);
    }
    match ProposalMetadata::from_value(&proposal.metadata)? {
        ProposalMetadata::IpfsPointer(hash) => match ipfs.fetch_json(&hash).await {
            Ok(doc) => non_empty(doc.get("title")),
            Err(e) => {
                tracing::warn!(
                    proposal_id = %proposal.id,
                    %hash,
                    error = %e,
                    "metadata fetch failed"
                );
                None
            }
        },
        other => other.inline_title().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use vigil_nullables::NullTransport;

    fn v1(body: Value) -> RawProposal {
        RawProposal::V1(serde_json::from_value(body).unwrap())
    }

    fn gateway(transport: &Arc<NullTransport>) -> IpfsGateway {
        IpfsGateway::with_base_url(transport.clone(), "https://gw.test/ipfs")
    }

    async fn title_of(raw: RawProposal, transport: &Arc<NullTransport>) -> String {
        ActiveProposal::from_raw(&raw, &gateway(transport))
            .await
            .unwrap()
            .title
    }

    #[tokio::test]
    async fn legacy_content_wins() {
        let transport = Arc::new(NullTransport::new());
        let raw = v1(json!({
            "id": "10",
            "title": "proposal level",
            "messages": [
                {"@type": "/cosmos.bank.v1beta1.MsgSend", "title": "not this"},
                {"@type": "/cosmos.gov.v1.MsgExecLegacyContent",
                 "content": {
                     "@type": "/cosmos.params.v1beta1.ParameterChangeProposal",
                     "title": "Raise gas cap"
                 }}
            ],
            "metadata": "ignored"
        }));
        assert_eq!(title_of(raw, &transport).await, "Raise gas cap");
    }

    #[tokio::test]
    async fn message_title_then_proposal_title() {
        let transport = Arc::new(NullTransport::new());
        let with_message = v1(json!({
            "id": "11",
            "title": "proposal level",
            "messages": [
                {"@type": "/cosmos.upgrade.v1beta1.MsgSoftwareUpgrade", "title": "v15 upgrade"}
            ]
        }));
        assert_eq!(title_of(with_message, &transport).await, "v15 upgrade");

        let proposal_level = v1(json!({
            "id": "12",
            "title": "Adjust community tax",
            "messages": [{"@type": "/cosmos.distribution.v1beta1.MsgUpdateParams"}],
            "metadata": "{\"title\":\"from metadata\"}"
        }));
        assert_eq!(title_of(proposal_level, &transport).await, "Adjust community tax");
    }

    #[tokio::test]
    async fn metadata_json_and_plain() {
        let transport = Arc::new(NullTransport::new());
        let json_meta = v1(json!({
            "id": "13",
            "messages": [],
            "metadata": "{\"title\":\"Text proposal\",\"summary\":\"s\"}"
        }));
        assert_eq!(title_of(json_meta, &transport).await, "Text proposal");

        let plain = v1(json!({"id": "14", "messages": [], "metadata": "Signal support"}));
        assert_eq!(title_of(plain, &transport).await, "Signal support");
    }

    #[tokio::test]
    async fn ipfs_metadata_is_fetched() {
        let transport = Arc::new(NullTransport::new());
        transport.ok("https://gw.test/ipfs/QmMeta", r#"{"title":"Stored on IPFS"}"#);
        let raw = v1(json!({"id": "15", "messages": [], "metadata": "ipfs://QmMeta"}));
        assert_eq!(title_of(raw, &transport).await, "Stored on IPFS");
        assert_eq!(transport.calls(), vec!["https://gw.test/ipfs/QmMeta".to_string()]);
    }

    #[tokio::test]
    async fn failures_fall_back_to_unknown_title() {
        let transport = Arc::new(NullTransport::new());
        transport.respond("https://gw.test/ipfs/QmGone", 504, "");
        let gone = v1(json!({"id": "16", "messages": [], "metadata": "ipfs://QmGone"}));
        assert_eq!(title_of(gone, &transport).await, UNKNOWN_TITLE);

        let broken = v1(json!({"id": "17", "messages": null, "metadata": "{\"title\":"}));
        assert_eq!(title_of(broken, &transport).await, UNKNOWN_TITLE);

        let empty = v1(json!({"id": "18", "messages": [], "metadata": ""}));
        assert_eq!(title_of(empty, &transport).await, UNKNOWN_TITLE);
    }

    #[tokio::test]
    async fn v1beta1_uses_content_title() {
        let transport = Arc::new(NullTransport::new());
        let raw = RawProposal::V1Beta1(
            serde_json::from_value(json!({
                "proposal_id": "88",
                "content": {"@type": "/cosmos.gov.v1beta1.TextProposal", "title": "Legacy text"},
                "voting_end_time": "2024-05-10T00:00:00Z"
            }))
            .unwrap(),
        );
        let proposal = ActiveProposal::from_raw(&raw, &gateway(&transport)).await.unwrap();
        assert_eq!(proposal.id, 88);
        assert_eq!(proposal.title, "Legacy text");
        assert_eq!(proposal.voting_end_time, Some(Timestamp::new(1_715_299_200)));
    }

    #[tokio::test]
    async fn malformed_id_is_error() {
        let transport = Arc::new(NullTransport::new());
        let raw = v1(json!({"id": "x", "messages": []}));
        assert!(ActiveProposal::from_raw(&raw, &gateway(&transport)).await.is_err());
    }
}
