//! Proposal `metadata` field.
//!
//! Chains put one of three things here: a plain title string, a JSON
//! document (inline, or JSON-encoded into the string), or an `ipfs://`
//! pointer to such a document.

use serde::Deserialize;
use serde_json::Value;

const IPFS_SCHEME: &str = "ipfs://";

/// JSON metadata document as described by the gov module conventions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: String,
    /// A string or a list of strings depending on the proposer's tooling.
    pub authors: Value,
    pub summary: String,
    pub details: String,
    pub proposal_forum_url: String,
    pub vote_option_context: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProposalMetadata {
    PlainTitle(String),
    StructuredMeta(Metadata),
    /// Content hash, without the `ipfs://` scheme.
    IpfsPointer(String),
}

impl ProposalMetadata {
    /// Classify a raw `metadata` value. Returns `None` when it is empty or
    /// unusable (malformed JSON, numbers, lists).
    pub fn from_value(raw: &Value) -> Option<Self> {
        match raw {
            Value::String(s) => Self::from_str_value(s),
            Value::Object(_) => serde_json::from_value::<Metadata>(raw.clone())
                .ok()
                .map(Self::from_document),
            _ => None,
        }
    }

    fn from_str_value(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(idx) = raw.find(IPFS_SCHEME) {
            return ipfs_pointer(&raw[idx + IPFS_SCHEME.len()..]);
        }
        if raw.starts_with('{') {
            return serde_json::from_str::<Metadata>(raw)
                .ok()
                .map(Self::from_document);
        }
        Some(Self::PlainTitle(raw.to_string()))
    }

    /// A document whose title is itself a pointer defers to that pointer.
    fn from_document(meta: Metadata) -> Self {
        let pointer = meta
            .title
            .trim()
            .strip_prefix(IPFS_SCHEME)
            .and_then(ipfs_pointer);
        pointer.unwrap_or(Self::StructuredMeta(meta))
    }

    /// Title available without a remote fetch.
    pub fn inline_title(&self) -> Option<&str> {
        let title = match self {
            Self::PlainTitle(title) => title.as_str(),
            Self::StructuredMeta(meta) => meta.title.trim(),
            Self::IpfsPointer(_) => return None,
        };
        (!title.is_empty()).then_some(title)
    }
}

fn ipfs_pointer(hash: &str) -> Option<ProposalMetadata> {
    let hash = hash.trim().trim_start_matches('/');
    (!hash.is_empty()).then(|| ProposalMetadata::IpfsPointer(hash.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_is_title() {
        assert_eq!(
            ProposalMetadata::from_value(&json!("Increase max validators")),
            Some(ProposalMetadata::PlainTitle("Increase max validators".into()))
        );
    }

    #[test]
    fn json_string_is_structured() {
        let raw = json!(r#"{"title":"Community pool spend","summary":"Fund relayers"}"#);
        match ProposalMetadata::from_value(&raw) {
            Some(ProposalMetadata::StructuredMeta(meta)) => {
                assert_eq!(meta.title, "Community pool spend");
                assert_eq!(meta.summary, "Fund relayers");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inline_object_is_structured() {
        let raw = json!({"title": "Enable IBC hooks", "authors": ["alice", "bob"]});
        let meta = ProposalMetadata::from_value(&raw).unwrap();
        assert_eq!(meta.inline_title(), Some("Enable IBC hooks"));
    }

    #[test]
    fn ipfs_uri_is_pointer() {
        assert_eq!(
            ProposalMetadata::from_value(&json!(
                "ipfs://QmZ4tDuvesekSs4qM5ZBKpXiZGun7S2CYtEZRB3DYXkjGx"
            )),
            Some(ProposalMetadata::IpfsPointer(
                "QmZ4tDuvesekSs4qM5ZBKpXiZGun7S2CYtEZRB3DYXkjGx".into()
            ))
        );
    }

    #[test]
    fn document_title_pointing_at_ipfs_is_pointer() {
        let raw = json!({"title": "ipfs://QmDoc"});
        assert_eq!(
            ProposalMetadata::from_value(&raw),
            Some(ProposalMetadata::IpfsPointer("QmDoc".into()))
        );
    }

    #[test]
    fn unusable_values_yield_none() {
        assert_eq!(ProposalMetadata::from_value(&json!("")), None);
        assert_eq!(ProposalMetadata::from_value(&json!("{not json")), None);
        assert_eq!(ProposalMetadata::from_value(&Value::Null), None);
        assert_eq!(ProposalMetadata::from_value(&json!(12)), None);
        assert_eq!(ProposalMetadata::from_value(&json!("ipfs://")), None);
    }

    #[test]
    fn structured_without_title_has_no_inline_title() {
        let meta = ProposalMetadata::from_value(&json!({"summary": "s"})).unwrap();
        assert_eq!(meta.inline_title(), None);
    }
}
