//! Per-network proposal polling and vote reconciliation.

use std::sync::Arc;

use vigil_crypto::AddressCodec;
use vigil_network::{ChainDirectory, EndpointResolver, IpfsGateway};
use vigil_store::ProposalLogStore;
use vigil_types::{Clock, GovApiVersion, MissedProposal, Validator};

use crate::{compose_vote_option, ActiveProposal, GovernanceError};

/// Outcome of polling one network for one validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollReport {
    pub network: String,
    pub endpoint: String,
    pub gov_api: GovApiVersion,
    /// Proposals in their voting period that were logged.
    pub proposals_seen: usize,
    /// Proposals whose vote option was refreshed from chain.
    pub voted: usize,
    /// Proposals the validator has not voted on, in listing order.
    pub missed: Vec<MissedProposal>,
}

pub struct ProposalPoller {
    resolver: Arc<EndpointResolver>,
    directory: Arc<dyn ChainDirectory>,
    ipfs: IpfsGateway,
    proposals: Arc<dyn ProposalLogStore>,
    clock: Arc<dyn Clock>,
}

impl ProposalPoller {
    pub fn new(
        resolver: Arc<EndpointResolver>,
        ipfs: IpfsGateway,
        proposals: Arc<dyn ProposalLogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let directory = resolver.directory();
        Self {
            resolver,
            directory,
            ipfs,
            proposals,
            clock,
        }
    }

    /// Poll the validator's network.
    ///
    /// Every proposal in its voting period gets a log row before any vote
    /// is queried. A proposal with an unparseable id is skipped; any other
    /// failure aborts this network only.
    pub async fn poll_network(&self, validator: &Validator) -> Result<PollReport, GovernanceError> {
        let network = validator.network.as_str();
        let endpoint = self.resolver.resolve(network).await?;
        let lcd = self.resolver.client(&endpoint);

        let raw = lcd.active_proposals(endpoint.gov_api).await?;
        let mut active = Vec::with_capacity(raw.len());
        for proposal in &raw {
            match ActiveProposal::from_raw(proposal, &self.ipfs).await {
                Ok(p) => active.push(p),
                Err(e) => tracing::warn!(network, error = %e, "skipping malformed proposal"),
            }
        }

        for proposal in &active {
            self.proposals
                .upsert_proposal_log(network, proposal.id, &proposal.title, self.clock.now())?;
        }

        let meta = self.directory.network_metadata(network).await?;
        let codec = AddressCodec::for_network(&meta)?;
        let voter = codec.to_account_address(&validator.operator_address)?;

        let mut voted = 0;
        let mut missed = Vec::new();
        for proposal in &active {
            let votes = lcd.vote(endpoint.gov_api, proposal.id, &voter).await?;
            if votes.is_empty() {
                missed.push(MissedProposal {
                    network: network.to_string(),
                    proposal_id: proposal.id,
                    title: proposal.title.clone(),
                    voting_end_time: proposal.voting_end_time,
                    validator_address: voter.clone(),
                });
                continue;
            }
            let option = compose_vote_option(&votes);
            self.proposals
                .update_vote_option(network, proposal.id, &option, self.clock.now())?;
            voted += 1;
            tracing::debug!(network, proposal_id = proposal.id, %option, "vote recorded");
        }

        tracing::info!(
            network,
            endpoint = %endpoint.url,
            active = active.len(),
            missed = missed.len(),
            "network polled"
        );

        Ok(PollReport {
            network: network.to_string(),
            endpoint: endpoint.url,
            gov_api: endpoint.gov_api,
            proposals_seen: active.len(),
            voted,
            missed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_nullables::{NullClock, NullDirectory, NullStore, NullTransport};
    use vigil_types::{NetworkMetadata, Timestamp};

    const LCD: &str = "https://lcd.test";
    const OPERATOR: &str = "cosmosvaloper1sjllsnramtg3ewxqwwrwjxfgc4n4ef9u2lcnj0";
    const ACCOUNT: &str = "cosmos1sjllsnramtg3ewxqwwrwjxfgc4n4ef9u0tvx7u";

    struct Harness {
        transport: Arc<NullTransport>,
        store: Arc<NullStore>,
        clock: Arc<NullClock>,
        poller: ProposalPoller,
    }

    fn cosmoshub() -> NetworkMetadata {
        NetworkMetadata {
            name: "cosmoshub".into(),
            chain_id: "cosmoshub-4".into(),
            bech32_prefix: "cosmos".into(),
            slip44: 118,
            denom: None,
        }
    }

    fn harness() -> Harness {
        let transport = Arc::new(NullTransport::new());
        transport.ok(
            &format!("{LCD}/cosmos/base/tendermint/v1beta1/syncing"),
            r#"{"syncing":false}"#,
        );
        transport.ok(&format!("{LCD}/cosmos/gov/v1/params/voting"), "{}");
        let directory = Arc::new(NullDirectory::new().with_network(cosmoshub(), vec![LCD.into()]));
        let resolver = Arc::new(
            EndpointResolver::new(directory, transport.clone()).with_shuffle(false),
        );
        let store = Arc::new(NullStore::new());
        let clock = Arc::new(NullClock::new(1_714_521_600));
        let poller = ProposalPoller::new(
            resolver,
            IpfsGateway::new(transport.clone()),
            store.clone(),
            clock.clone(),
        );
        Harness {
            transport,
            store,
            clock,
            poller,
        }
    }

    fn list_proposals(transport: &NullTransport, ids: &[u64]) {
        let proposals: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"id":"{id}","messages":[],"metadata":"Proposal {id}",
                        "voting_end_time":"2024-05-10T00:00:00Z"}}"#
                )
            })
            .collect();
        transport.ok(
            &format!("{LCD}/cosmos/gov/v1/proposals"),
            &format!(r#"{{"proposals":[{}],"pagination":{{}}}}"#, proposals.join(",")),
        );
    }

    fn vote_url(id: u64) -> String {
        format!("{LCD}/cosmos/gov/v1/proposals/{id}/votes/{ACCOUNT}")
    }

    fn no_vote(transport: &NullTransport, id: u64) {
        transport.respond(
            &vote_url(id),
            400,
            &format!(r#"{{"code":3,"message":"voter: {ACCOUNT} not found for proposal: {id}"}}"#),
        );
    }

    fn validator() -> Validator {
        Validator::new("cosmoshub", OPERATOR, Timestamp::EPOCH)
    }

    #[tokio::test]
    async fn repeated_poll_keeps_one_unvoted_row() {
        let h = harness();
        list_proposals(&h.transport, &[901]);
        no_vote(&h.transport, 901);

        let first = h.poller.poll_network(&validator()).await.unwrap();
        h.clock.advance(3600);
        let second = h.poller.poll_network(&validator()).await.unwrap();

        assert_eq!(first.missed.len(), 1);
        assert_eq!(second.missed.len(), 1);
        let rows = h
            .store
            .list_proposal_logs(Some("cosmoshub"), Timestamp::EPOCH, Timestamp::new(u64::MAX))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].vote_option, "");
        assert_eq!(rows[0].title, "Proposal 901");
    }

    #[tokio::test]
    async fn vote_cast_between_polls_updates_the_row() {
        let h = harness();
        list_proposals(&h.transport, &[902]);
        no_vote(&h.transport, 902);
        h.poller.poll_network(&validator()).await.unwrap();
        let before = h.store.get_proposal_log("cosmoshub", 902).unwrap().unwrap();

        h.clock.advance(600);
        h.transport.ok(
            &vote_url(902),
            r#"{"vote":{"options":[
                {"option":"VOTE_OPTION_YES","weight":"1.000000000000000000"}
            ]}}"#,
        );
        let report = h.poller.poll_network(&validator()).await.unwrap();
        let after = h.store.get_proposal_log("cosmoshub", 902).unwrap().unwrap();

        assert!(report.missed.is_empty());
        assert_eq!(report.voted, 1);
        assert_eq!(before.vote_option, "");
        assert_eq!(after.vote_option, "YES");
        assert!(after.updated_at > before.updated_at);
        let rows = h
            .store
            .list_proposal_logs(None, Timestamp::EPOCH, Timestamp::new(u64::MAX))
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn reports_every_missed_proposal() {
        let h = harness();
        list_proposals(&h.transport, &[1, 2, 3]);
        for id in 1..=3 {
            no_vote(&h.transport, id);
        }
        let report = h.poller.poll_network(&validator()).await.unwrap();
        let ids: Vec<u64> = report.missed.iter().map(|m| m.proposal_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(report.missed.iter().all(|m| m.validator_address == ACCOUNT));
        assert_eq!(report.proposals_seen, 3);
    }

    #[tokio::test]
    async fn invalid_operator_address_still_logs_proposals() {
        let h = harness();
        list_proposals(&h.transport, &[5]);
        let bad = Validator::new(
            "cosmoshub",
            "osmovaloper1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5dwhd8f",
            Timestamp::EPOCH,
        );
        let err = h.poller.poll_network(&bad).await.unwrap_err();
        assert!(matches!(err, GovernanceError::Address(_)));
        assert!(h.store.get_proposal_log("cosmoshub", 5).unwrap().is_some());
    }

    #[tokio::test]
    async fn unresolvable_network_is_error() {
        let h = harness();
        let err = h
            .poller
            .poll_network(&Validator::new("unknown", OPERATOR, Timestamp::EPOCH))
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Network(_)));
    }
}
