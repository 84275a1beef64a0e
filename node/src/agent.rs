//! The agent: every component wired over a set of collaborators, and the
//! periodic passes that drive them.
//!
//! Each pass walks the registered validators (or keys) and isolates
//! failures per network: a network that fails produces exactly one failure
//! alert and the pass moves on to the next.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

use vigil_alerts::{AlertDispatcher, AlertError, AlertMessage, AlertSink};
use vigil_crypto::AddressCodec;
use vigil_governance::ProposalPoller;
use vigil_network::{ChainDirectory, EndpointResolver, IpfsGateway, RestTransport};
use vigil_store::Stores;
use vigil_transactions::ChainClient;
use vigil_types::{Clock, DelegatedKey, KeyPurpose, Validator, VoteOption};

use crate::admin::Registrar;
use crate::balance::BalanceMonitor;
use crate::executor::{DelegatedExecutor, SweepOutcome, VoteReceipt};
use crate::scheduler::JobKind;
use crate::{GrantChecker, NetworkProfiles, NodeConfig, NodeError, NodeMetrics};

/// The outside world as the agent sees it.
pub struct Collaborators {
    pub stores: Stores,
    pub directory: Arc<dyn ChainDirectory>,
    pub transport: Arc<dyn RestTransport>,
    pub chain: Arc<dyn ChainClient>,
    pub alert_sink: Arc<dyn AlertSink>,
    pub clock: Arc<dyn Clock>,
}

/// Counts of one pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassSummary {
    pub job: JobKind,
    /// Networks (or keys) handled without error.
    pub succeeded: usize,
    /// Networks (or keys) that failed and were reported.
    pub failed: usize,
}

impl PassSummary {
    fn new(job: JobKind) -> Self {
        Self {
            job,
            succeeded: 0,
            failed: 0,
        }
    }
}

/// Counts delivered and failed alerts.
struct MeteredSink {
    inner: Arc<dyn AlertSink>,
    metrics: NodeMetrics,
}

#[async_trait]
impl AlertSink for MeteredSink {
    async fn post_message(&self, channel: &str, message: &AlertMessage) -> Result<(), AlertError> {
        let result = self.inner.post_message(channel, message).await;
        match &result {
            Ok(()) => self.metrics.alerts_sent.inc(),
            Err(_) => self.metrics.alerts_failed.inc(),
        }
        result
    }
}

/// Alerts go to the log only.
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn post_message(&self, channel: &str, message: &AlertMessage) -> Result<(), AlertError> {
        tracing::info!(channel, text = %message.text, "alert (slack disabled)");
        Ok(())
    }
}

pub struct Agent {
    stores: Stores,
    resolver: Arc<EndpointResolver>,
    poller: ProposalPoller,
    grants: Arc<GrantChecker>,
    executor: DelegatedExecutor,
    balances: BalanceMonitor,
    registrar: Registrar,
    alerts: AlertDispatcher,
    profiles: NetworkProfiles,
    clock: Arc<dyn Clock>,
    metrics: NodeMetrics,
}

impl Agent {
    pub fn new(config: &NodeConfig, parts: Collaborators, metrics: NodeMetrics) -> Self {
        let Collaborators {
            stores,
            directory,
            transport,
            chain,
            alert_sink,
            clock,
        } = parts;

        let mut resolver = EndpointResolver::new(directory.clone(), transport.clone())
            .with_timeouts(config.health_check_timeout(), config.http_timeout())
            .with_shuffle(config.shuffle_endpoints);
        for (network, settings) in &config.networks {
            if !settings.endpoints.is_empty() {
                resolver = resolver.with_static_endpoints(network, settings.endpoints.clone());
            }
            if let Some(version) = settings.gov_api {
                resolver = resolver.with_pinned_version(network, version);
            }
        }
        let resolver = Arc::new(resolver);

        let profiles = NetworkProfiles::new(config.networks.clone());
        let sink: Arc<dyn AlertSink> = Arc::new(MeteredSink {
            inner: alert_sink,
            metrics: metrics.clone(),
        });
        let alerts = AlertDispatcher::new(sink, config.slack.channel_id.clone());

        let ipfs = IpfsGateway::with_base_url(transport, &config.ipfs_gateway)
            .with_timeout(config.http_timeout());
        let poller = ProposalPoller::new(
            resolver.clone(),
            ipfs,
            stores.proposals.clone(),
            clock.clone(),
        );
        let grants = Arc::new(
            GrantChecker::new(stores.keys.clone(), clock.clone()).with_metrics(metrics.clone()),
        );
        let executor = DelegatedExecutor::new(
            resolver.clone(),
            stores.clone(),
            grants.clone(),
            chain,
            alerts.clone(),
            clock.clone(),
            profiles.clone(),
            config.schedule.reward_period,
        )
        .with_memo(config.chain_client.memo.clone())
        .with_metrics(metrics.clone());
        let balances = BalanceMonitor::new(resolver.clone(), profiles.clone(), alerts.clone());
        let registrar = Registrar::new(stores.clone(), directory, clock.clone());

        Self {
            stores,
            resolver,
            poller,
            grants,
            executor,
            balances,
            registrar,
            alerts,
            profiles,
            clock,
            metrics,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn resolver(&self) -> &Arc<EndpointResolver> {
        &self.resolver
    }

    pub async fn run_job(&self, job: JobKind) -> Result<PassSummary, NodeError> {
        match job {
            JobKind::Proposals => self.poll_proposals().await,
            JobKind::Balances => self.check_balances().await,
            JobKind::AuthzSync => self.sync_grants().await,
            JobKind::RewardSweep => self.sweep_rewards().await,
        }
    }

    /// Poll every validator's network and send one missed-proposal alert
    /// per network that has any.
    pub async fn poll_proposals(&self) -> Result<PassSummary, NodeError> {
        let mut summary = PassSummary::new(JobKind::Proposals);
        let mut active = 0usize;
        for validator in self.stores.validators.list_validators()? {
            let network = validator.network.as_str();
            let report = match self.poller.poll_network(&validator).await {
                Ok(report) => report,
                Err(e) => {
                    self.network_failed(&mut summary, network, &NodeError::from(e)).await;
                    continue;
                }
            };
            summary.succeeded += 1;
            active += report.proposals_seen;
            self.metrics
                .proposals_seen
                .inc_by(report.proposals_seen as u64);
            self.metrics
                .missed_proposals
                .inc_by(report.missed.len() as u64);
            tracing::info!(
                network,
                endpoint = %report.endpoint,
                gov_api = %report.gov_api,
                seen = report.proposals_seen,
                voted = report.voted,
                missed = report.missed.len(),
                "proposals polled"
            );

            let links = self.profiles.explorer(network);
            if let Err(e) = self
                .alerts
                .missed_proposals(network, &report.missed, &links, self.clock.now())
                .await
            {
                tracing::warn!(network, error = %e, "missed-proposal alert not delivered");
            }
        }
        self.metrics.active_proposals.set(active as i64);
        Ok(summary)
    }

    /// Check the balance of every registered grantee address once.
    pub async fn check_balances(&self) -> Result<PassSummary, NodeError> {
        let mut summary = PassSummary::new(JobKind::Balances);
        let targets: BTreeSet<(String, String)> = self
            .stores
            .keys
            .list_keys()?
            .into_iter()
            .map(|k| (k.network, k.grantee_address))
            .collect();
        for (network, address) in targets {
            match self.balances.check_balance(&network, &address).await {
                Ok(report) => {
                    summary.succeeded += 1;
                    if report.low {
                        self.metrics.low_balances.inc();
                    }
                }
                Err(e) => self.network_failed(&mut summary, &network, &e).await,
            }
        }
        Ok(summary)
    }

    /// Refresh the cached grant state of every key whose network has a
    /// registered validator.
    pub async fn sync_grants(&self) -> Result<PassSummary, NodeError> {
        let mut summary = PassSummary::new(JobKind::AuthzSync);
        let keys = self.stores.keys.list_keys()?;
        for validator in self.stores.validators.list_validators()? {
            let network = validator.network.as_str();
            let network_keys: Vec<&DelegatedKey> =
                keys.iter().filter(|k| k.network == network).collect();
            if network_keys.is_empty() {
                continue;
            }
            match self.sync_network(&validator, &network_keys).await {
                Ok(()) => summary.succeeded += 1,
                Err(e) => self.network_failed(&mut summary, network, &e).await,
            }
        }
        Ok(summary)
    }

    async fn sync_network(
        &self,
        validator: &Validator,
        keys: &[&DelegatedKey],
    ) -> Result<(), NodeError> {
        let meta = self
            .resolver
            .directory()
            .network_metadata(&validator.network)
            .await?;
        let granter = AddressCodec::for_network(&meta)?
            .to_account_address(&validator.operator_address)?;
        let endpoint = self.resolver.resolve(&validator.network).await?;
        let lcd = self.resolver.client(&endpoint);
        for key in keys {
            self.grants
                .sync_key(&lcd, key, &granter, endpoint.gov_api)
                .await?;
        }
        Ok(())
    }

    /// Sweep rewards for every validator with a rewards key.
    pub async fn sweep_rewards(&self) -> Result<PassSummary, NodeError> {
        let mut summary = PassSummary::new(JobKind::RewardSweep);
        for validator in self.stores.validators.list_validators()? {
            let network = validator.network.as_str();
            if self
                .stores
                .keys
                .get_key(network, KeyPurpose::Rewards)?
                .is_none()
            {
                tracing::debug!(network, "no rewards key, sweep skipped");
                continue;
            }
            match self.executor.sweep(&validator).await {
                Ok(SweepOutcome::Executed { .. }) => {
                    summary.succeeded += 1;
                    self.metrics.sweeps_executed.inc();
                }
                Ok(_) => {
                    summary.succeeded += 1;
                    self.metrics.sweeps_skipped.inc();
                }
                Err(e) => self.network_failed(&mut summary, network, &e).await,
            }
        }
        Ok(summary)
    }

    /// Sweep one network on demand.
    pub async fn sweep_network(&self, network: &str) -> Result<SweepOutcome, NodeError> {
        let validator = self
            .stores
            .validators
            .get_validator(network)?
            .ok_or_else(|| NodeError::UnknownValidator(network.to_string()))?;
        self.executor.sweep(&validator).await
    }

    pub async fn cast_vote(
        &self,
        network: &str,
        proposal_id: u64,
        option: VoteOption,
        memo: Option<&str>,
    ) -> Result<VoteReceipt, NodeError> {
        self.executor
            .cast_vote(network, proposal_id, option, memo)
            .await
    }

    /// Report a failure that is not tied to one network.
    pub async fn report_failure(&self, scope: &str, error: &NodeError) {
        if let Err(e) = self.alerts.failure(scope, error).await {
            tracing::warn!(scope, error = %e, "failure alert not delivered");
        }
    }

    async fn network_failed(&self, summary: &mut PassSummary, network: &str, error: &NodeError) {
        summary.failed += 1;
        let job = summary.job;
        self.metrics
            .network_failures
            .with_label_values(&[job.as_str()])
            .inc();
        tracing::error!(%job, network, error = %error, "network failed");
        self.resolver.invalidate(network);
        self.report_failure(&format!("{} on {network}", job.description()), error)
            .await;
    }
}
