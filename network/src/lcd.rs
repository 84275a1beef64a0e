//! Typed REST (LCD) queries against one chain endpoint.

use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

use vigil_types::GovApiVersion;

use crate::models::{
    BalanceResponse, GrantsResponse, ProposalV1, ProposalV1Beta1, ProposalsPage, SyncingResponse,
    TxEnvelope, VoteResponse,
};
use crate::{NetworkError, RawProposal, RestTransport, TxResponse, WeightedVote};

/// `PROPOSAL_STATUS_VOTING_PERIOD`
const VOTING_PERIOD_STATUS: &str = "2";

const PAGE_LIMIT: &str = "100";

/// Upper bound on pages followed for one listing.
const MAX_PAGES: usize = 50;

/// Option sent by chains for "no option" on the deprecated single field.
const UNSPECIFIED_OPTION: &str = "VOTE_OPTION_UNSPECIFIED";

/// Weight reported for a non-split vote.
const FULL_WEIGHT: &str = "1.000000000000000000";

/// Query client bound to one REST endpoint.
#[derive(Clone)]
pub struct LcdClient {
    transport: Arc<dyn RestTransport>,
    base_url: String,
    timeout: Duration,
}

/// Whether an error body means "no such record" rather than a failure.
fn is_not_found(body: &str) -> bool {
    body.to_ascii_lowercase().contains("not found")
}

impl LcdClient {
    pub fn new(transport: Arc<dyn RestTransport>, base_url: &str, timeout: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<String, NetworkError> {
        let raw = format!("{}{}", self.base_url, path);
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        url.map(String::from)
            .map_err(|e| NetworkError::Transport(format!("invalid URL {raw}: {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, NetworkError> {
        self.transport
            .get(url, self.timeout)
            .await?
            .error_for_status(url)?
            .json()
    }

    /// Sync status of the node (`true` while catching up).
    pub async fn syncing(&self) -> Result<bool, NetworkError> {
        let url = self.url("/cosmos/base/tendermint/v1beta1/syncing", &[])?;
        let resp: SyncingResponse = self.get_json(&url).await?;
        Ok(resp.syncing)
    }

    /// Whether the endpoint serves the governance API of `version`.
    pub async fn supports_gov_api(&self, version: GovApiVersion) -> bool {
        let path = format!("/cosmos/gov/{}/params/voting", version.path_segment());
        let Ok(url) = self.url(&path, &[]) else {
            return false;
        };
        matches!(self.transport.get(&url, self.timeout).await, Ok(resp) if resp.is_success())
    }

    /// Proposals currently in their voting period, following pagination.
    pub async fn active_proposals(
        &self,
        version: GovApiVersion,
    ) -> Result<Vec<RawProposal>, NetworkError> {
        let path = format!("/cosmos/gov/{}/proposals", version.path_segment());
        let mut proposals = Vec::new();
        let mut next_key: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut params = vec![
                ("proposal_status", VOTING_PERIOD_STATUS),
                ("pagination.limit", PAGE_LIMIT),
            ];
            if let Some(key) = next_key.as_deref() {
                params.push(("pagination.key", key));
            }
            let url = self.url(&path, &params)?;

            let pagination = match version {
                GovApiVersion::V1 => {
                    let page: ProposalsPage<ProposalV1> = self.get_json(&url).await?;
                    proposals.extend(page.proposals.into_iter().map(RawProposal::V1));
                    page.pagination
                }
                GovApiVersion::V1Beta1 => {
                    let page: ProposalsPage<ProposalV1Beta1> = self.get_json(&url).await?;
                    proposals.extend(page.proposals.into_iter().map(RawProposal::V1Beta1));
                    page.pagination
                }
            };

            next_key = pagination
                .and_then(|p| p.next_key)
                .filter(|k| !k.is_empty());
            if next_key.is_none() {
                return Ok(proposals);
            }
        }

        tracing::warn!(
            endpoint = %self.base_url,
            pages = MAX_PAGES,
            "proposal listing truncated"
        );
        Ok(proposals)
    }

    /// Options of `voter`'s vote on a proposal; empty when no vote exists.
    pub async fn vote(
        &self,
        version: GovApiVersion,
        proposal_id: u64,
        voter: &str,
    ) -> Result<Vec<WeightedVote>, NetworkError> {
        let path = format!(
            "/cosmos/gov/{}/proposals/{}/votes/{}",
            version.path_segment(),
            proposal_id,
            voter
        );
        let url = self.url(&path, &[])?;
        let response = self.transport.get(&url, self.timeout).await?;
        if !response.is_success() && is_not_found(&response.text()) {
            return Ok(Vec::new());
        }
        let resp: VoteResponse = response.error_for_status(&url)?.json()?;
        let Some(vote) = resp.vote else {
            return Ok(Vec::new());
        };
        if !vote.options.is_empty() {
            return Ok(vote.options);
        }
        Ok(vote
            .option
            .filter(|o| !o.is_empty() && o != UNSPECIFIED_OPTION)
            .map(|option| {
                vec![WeightedVote {
                    option,
                    weight: FULL_WEIGHT.to_string(),
                }]
            })
            .unwrap_or_default())
    }

    /// Whether `granter` has granted `grantee` authority for `msg_type_url`.
    ///
    /// A missing, null or empty grant list, or a "not found" error from the
    /// authz module, is a valid negative answer.
    pub async fn has_grant(
        &self,
        granter: &str,
        grantee: &str,
        msg_type_url: &str,
    ) -> Result<bool, NetworkError> {
        let url = self.url(
            "/cosmos/authz/v1beta1/grants",
            &[
                ("granter", granter),
                ("grantee", grantee),
                ("msg_type_url", msg_type_url),
            ],
        )?;
        let response = self.transport.get(&url, self.timeout).await?;
        if !response.is_success() && is_not_found(&response.text()) {
            return Ok(false);
        }
        let resp: GrantsResponse = response.error_for_status(&url)?.json()?;
        Ok(!resp.grants.is_empty())
    }

    /// Balance of one denom, in base units.
    pub async fn balance(&self, address: &str, denom: &str) -> Result<u128, NetworkError> {
        let path = format!("/cosmos/bank/v1beta1/balances/{address}/by_denom");
        let url = self.url(&path, &[("denom", denom)])?;
        let resp: BalanceResponse = self.get_json(&url).await?;
        match resp.balance {
            Some(coin) if !coin.amount.is_empty() => coin.amount.parse().map_err(|_| {
                NetworkError::MalformedPayload(format!("invalid balance amount {:?}", coin.amount))
            }),
            _ => Ok(0),
        }
    }

    /// Committed transaction by hash; `None` while it is not yet indexed.
    pub async fn tx(&self, txhash: &str) -> Result<Option<TxResponse>, NetworkError> {
        let url = self.url(&format!("/cosmos/tx/v1beta1/txs/{txhash}"), &[])?;
        let response = self.transport.get(&url, self.timeout).await?;
        if response.status == 404 || (!response.is_success() && is_not_found(&response.text())) {
            return Ok(None);
        }
        let envelope: TxEnvelope = response.error_for_status(&url)?.json()?;
        Ok(Some(envelope.tx_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;

    const LCD: &str = "https://lcd.test";

    fn client(transport: &Arc<ScriptedTransport>) -> LcdClient {
        LcdClient::new(transport.clone(), LCD, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn lists_v1_proposals_across_pages() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            "https://lcd.test/cosmos/gov/v1/proposals?proposal_status=2&pagination.limit=100",
            r#"{"proposals":[{"id":"1","messages":[],"metadata":""}],
                "pagination":{"next_key":"AAE="}}"#,
        );
        transport.ok(
            concat!(
                "https://lcd.test/cosmos/gov/v1/proposals",
                "?proposal_status=2&pagination.limit=100&pagination.key=AAE%3D"
            ),
            r#"{"proposals":[{"id":"2","messages":[],"metadata":""}],
                "pagination":{"next_key":null}}"#,
        );
        let proposals = client(&transport)
            .active_proposals(GovApiVersion::V1)
            .await
            .unwrap();
        let ids: Vec<u64> = proposals.iter().map(|p| p.id().unwrap()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn lists_v1beta1_proposals() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            "https://lcd.test/cosmos/gov/v1beta1/proposals",
            r#"{"proposals":[{"proposal_id":"77","content":{"title":"Old style"}}],
                "pagination":{}}"#,
        );
        let proposals = client(&transport)
            .active_proposals(GovApiVersion::V1Beta1)
            .await
            .unwrap();
        assert_eq!(proposals.len(), 1);
        assert!(matches!(proposals[0], RawProposal::V1Beta1(_)));
    }

    #[tokio::test]
    async fn missing_vote_is_empty() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://lcd.test/cosmos/gov/v1/proposals/9/votes/cosmos1voter",
            400,
            r#"{"code":3,"message":"voter: cosmos1voter not found for proposal: 9","details":[]}"#,
        );
        let votes = client(&transport)
            .vote(GovApiVersion::V1, 9, "cosmos1voter")
            .await
            .unwrap();
        assert!(votes.is_empty());
    }

    #[tokio::test]
    async fn split_vote_returns_every_option() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            "https://lcd.test/cosmos/gov/v1/proposals/9/votes/cosmos1voter",
            r#"{"vote":{"proposal_id":"9","voter":"cosmos1voter","options":[
                {"option":"VOTE_OPTION_YES","weight":"0.700000000000000000"},
                {"option":"VOTE_OPTION_NO","weight":"0.300000000000000000"}]}}"#,
        );
        let votes = client(&transport)
            .vote(GovApiVersion::V1, 9, "cosmos1voter")
            .await
            .unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[1].option, "VOTE_OPTION_NO");
    }

    #[tokio::test]
    async fn legacy_single_option_is_promoted() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            "https://lcd.test/cosmos/gov/v1beta1/proposals/3/votes/juno1v",
            r#"{"vote":{"proposal_id":"3","voter":"juno1v",
                "option":"VOTE_OPTION_ABSTAIN","options":[]}}"#,
        );
        let votes = client(&transport)
            .vote(GovApiVersion::V1Beta1, 3, "juno1v")
            .await
            .unwrap();
        assert_eq!(
            votes,
            vec![WeightedVote {
                option: "VOTE_OPTION_ABSTAIN".into(),
                weight: FULL_WEIGHT.into()
            }]
        );
    }

    #[tokio::test]
    async fn vote_server_error_propagates() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://lcd.test/cosmos/gov/v1/proposals/9/votes/cosmos1voter",
            503,
            "upstream unavailable",
        );
        let err = client(&transport)
            .vote(GovApiVersion::V1, 9, "cosmos1voter")
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn grant_present_null_and_not_found() {
        let transport = Arc::new(ScriptedTransport::new());
        let base = concat!(
            "https://lcd.test/cosmos/authz/v1beta1/grants",
            "?granter=cosmos1g&grantee=cosmos1e&msg_type_url="
        );
        transport.ok(
            &format!("{base}%2Fcosmos.gov.v1.MsgVote"),
            r#"{"grants":[{"authorization":
                {"@type":"/cosmos.authz.v1beta1.GenericAuthorization"}}]}"#,
        );
        transport.ok(&format!("{base}%2Fcosmos.gov.v1beta1.MsgVote"), r#"{"grants":null}"#);
        transport.respond(
            &format!("{base}%2Fcosmos.distribution.v1beta1.MsgWithdrawValidatorCommission"),
            404,
            concat!(
                r#"{"code":5,"message":"no authorization found for "#,
                r#"/cosmos.distribution.v1beta1.MsgWithdrawValidatorCommission type: not found"}"#
            ),
        );
        let lcd = client(&transport);
        assert!(lcd
            .has_grant("cosmos1g", "cosmos1e", "/cosmos.gov.v1.MsgVote")
            .await
            .unwrap());
        assert!(!lcd
            .has_grant("cosmos1g", "cosmos1e", "/cosmos.gov.v1beta1.MsgVote")
            .await
            .unwrap());
        assert!(!lcd
            .has_grant(
                "cosmos1g",
                "cosmos1e",
                "/cosmos.distribution.v1beta1.MsgWithdrawValidatorCommission"
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn grant_transport_error_propagates() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail("https://lcd.test/cosmos/authz/v1beta1/grants");
        assert!(client(&transport)
            .has_grant("a", "b", "/x")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn balance_by_denom() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            "https://lcd.test/cosmos/bank/v1beta1/balances/cosmos1a/by_denom?denom=uatom",
            r#"{"balance":{"denom":"uatom","amount":"1500000"}}"#,
        );
        transport.ok(
            "https://lcd.test/cosmos/bank/v1beta1/balances/cosmos1b/by_denom?denom=uatom",
            r#"{"balance":null}"#,
        );
        let lcd = client(&transport);
        assert_eq!(lcd.balance("cosmos1a", "uatom").await.unwrap(), 1_500_000);
        assert_eq!(lcd.balance("cosmos1b", "uatom").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn syncing_and_gov_support() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            "https://lcd.test/cosmos/base/tendermint/v1beta1/syncing",
            r#"{"syncing":true}"#,
        );
        transport.respond("https://lcd.test/cosmos/gov/v1/params/voting", 501, "Not Implemented");
        transport.ok("https://lcd.test/cosmos/gov/v1beta1/params/voting", "{}");
        let lcd = client(&transport);
        assert!(lcd.syncing().await.unwrap());
        assert!(!lcd.supports_gov_api(GovApiVersion::V1).await);
        assert!(lcd.supports_gov_api(GovApiVersion::V1Beta1).await);
    }

    #[tokio::test]
    async fn pending_tx_is_none() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "https://lcd.test/cosmos/tx/v1beta1/txs/ABC",
            404,
            r#"{"code":5,"message":"tx not found: ABC"}"#,
        );
        transport.ok(
            "https://lcd.test/cosmos/tx/v1beta1/txs/DEF",
            r#"{"tx_response":{"txhash":"DEF","code":0,"raw_log":"","events":[]}}"#,
        );
        let lcd = client(&transport);
        assert!(lcd.tx("ABC").await.unwrap().is_none());
        assert_eq!(lcd.tx("DEF").await.unwrap().unwrap().txhash, "DEF");
    }
}
