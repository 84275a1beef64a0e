//! Delegated actions: reward/commission sweeps and votes executed through
//! `MsgExec` with a locally held grantee key.

use std::sync::Arc;

use vigil_alerts::AlertDispatcher;
use vigil_crypto::AddressCodec;
use vigil_governance::UNKNOWN_TITLE;
use vigil_network::{EndpointResolver, LcdClient, ResolvedEndpoint};
use vigil_store::Stores;
use vigil_transactions::{
    BroadcastRequest, ChainClient, Msg, MsgExec, TransactionError, TxResult, WithdrawTotals,
};
use vigil_types::{
    Clock, Coins, DelegatedKey, KeyPurpose, NetworkMetadata, RewardPeriod, RewardRecord, Validator,
    VoteOption, WithdrawStatus,
};

use crate::signer::tx_result;
use crate::{GrantChecker, NetworkProfiles, NodeError, NodeMetrics};

/// What a reward sweep did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SweepOutcome {
    /// A withdrawal is already on record for this chain and period.
    AlreadyRecorded { period: String },
    /// Neither withdrawal message is granted; nothing was broadcast.
    NoGrants,
    Executed {
        txhash: String,
        tx_url: String,
        totals: WithdrawTotals,
        /// Type URLs inside the envelope.
        actions: Vec<&'static str>,
    },
}

/// A vote broadcast on the validator's behalf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteReceipt {
    pub network: String,
    pub proposal_id: u64,
    pub option: VoteOption,
    pub txhash: String,
    pub tx_url: String,
}

/// Everything resolved before acting on one network.
struct ActionContext {
    meta: NetworkMetadata,
    endpoint: ResolvedEndpoint,
    lcd: LcdClient,
    /// The validator's account address, which is the authz granter.
    granter: String,
}

pub struct DelegatedExecutor {
    resolver: Arc<EndpointResolver>,
    stores: Stores,
    grants: Arc<GrantChecker>,
    chain: Arc<dyn ChainClient>,
    alerts: AlertDispatcher,
    clock: Arc<dyn Clock>,
    profiles: NetworkProfiles,
    period: RewardPeriod,
    memo: String,
    metrics: Option<NodeMetrics>,
}

impl DelegatedExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: Arc<EndpointResolver>,
        stores: Stores,
        grants: Arc<GrantChecker>,
        chain: Arc<dyn ChainClient>,
        alerts: AlertDispatcher,
        clock: Arc<dyn Clock>,
        profiles: NetworkProfiles,
        period: RewardPeriod,
    ) -> Self {
        Self {
            resolver,
            stores,
            grants,
            chain,
            alerts,
            clock,
            profiles,
            period,
            memo: String::new(),
            metrics: None,
        }
    }

    /// Memo attached to every broadcast.
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_metrics(mut self, metrics: NodeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn key_for(&self, network: &str, purpose: KeyPurpose) -> Result<DelegatedKey, NodeError> {
        self.stores
            .keys
            .get_key(network, purpose)?
            .ok_or_else(|| NodeError::MissingKey {
                network: network.to_string(),
                purpose,
            })
    }

    async fn context(
        &self,
        validator: &Validator,
        meta: NetworkMetadata,
    ) -> Result<ActionContext, NodeError> {
        let endpoint = self.resolver.resolve(&validator.network).await?;
        let lcd = self.resolver.client(&endpoint);
        let granter = AddressCodec::for_network(&meta)?
            .to_account_address(&validator.operator_address)?;
        Ok(ActionContext {
            meta,
            endpoint,
            lcd,
            granter,
        })
    }

    async fn broadcast(
        &self,
        ctx: &ActionContext,
        key: &DelegatedKey,
        msgs: Vec<Msg>,
        memo: &str,
    ) -> Result<TxResult, NodeError> {
        let envelope = MsgExec::new(&key.grantee_address, msgs)?;
        let request = BroadcastRequest {
            network: key.network.clone(),
            chain_id: ctx.meta.chain_id.clone(),
            key_name: key.key_name.clone(),
            rest_endpoint: ctx.endpoint.url.clone(),
            envelope,
            memo: memo.to_string(),
        };
        let result = self
            .chain
            .sign_and_broadcast(&request)
            .await
            .and_then(TxResult::into_success);
        match result {
            Ok(tx) => Ok(tx),
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.broadcasts_failed.inc();
                }
                if let TransactionError::LogicalTxFailure { code, txhash, .. } = &e {
                    tracing::error!(
                        network = %key.network,
                        code,
                        %txhash,
                        "transaction failed on chain"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Withdraw the validator's rewards and commission once per period.
    ///
    /// Each withdrawal is included only if its grant is in place; a failed
    /// grant check drops that withdrawal and is reported, the other still
    /// goes ahead.
    ///
    /// The period is claimed in the store before broadcasting. The claim is
    /// released only when the transaction certainly did not reach the chain;
    /// an accepted but unconfirmed transaction keeps it, and a later sweep
    /// of the same period settles it from the chain instead of sending again.
    pub async fn sweep(&self, validator: &Validator) -> Result<SweepOutcome, NodeError> {
        let network = validator.network.as_str();
        let key = self.key_for(network, KeyPurpose::Rewards)?;
        let meta = self.resolver.directory().network_metadata(network).await?;

        let period = self.period.period_key(self.clock.now().date());
        if self
            .stores
            .rewards
            .reward_already_recorded(&meta.chain_id, &period)?
        {
            tracing::info!(
                network,
                chain_id = %meta.chain_id,
                %period,
                "sweep already recorded, skipping"
            );
            if let Err(e) = self.settle_submitted(validator, &meta.chain_id, &period).await {
                tracing::warn!(network, %period, error = %e, "submitted withdrawal not settled");
            }
            return Ok(SweepOutcome::AlreadyRecorded { period });
        }

        let ctx = self.context(validator, meta).await?;
        let candidates = [
            (
                Msg::WITHDRAW_DELEGATOR_REWARD_URL,
                Msg::withdraw_rewards(&ctx.granter, &validator.operator_address),
            ),
            (
                Msg::WITHDRAW_VALIDATOR_COMMISSION_URL,
                Msg::withdraw_commission(&validator.operator_address),
            ),
        ];
        let mut msgs = Vec::new();
        for (type_url, msg) in candidates {
            match self.grants.check(&ctx.lcd, &key, &ctx.granter, type_url).await {
                Ok(true) => msgs.push(msg),
                Ok(false) => tracing::debug!(network, type_url, "not granted, skipping action"),
                Err(e) => {
                    tracing::warn!(
                        network,
                        type_url,
                        error = %e,
                        "grant check failed, skipping action"
                    );
                    let scope = format!("grant check for {type_url} on {network}");
                    if let Err(alert_err) = self.alerts.failure(&scope, &e).await {
                        tracing::warn!(error = %alert_err, "failure alert not delivered");
                    }
                }
            }
        }
        if msgs.is_empty() {
            tracing::info!(network, "no withdrawal grants, nothing to sweep");
            return Ok(SweepOutcome::NoGrants);
        }

        let denom = self
            .profiles
            .denom(network, Some(&ctx.meta))
            .map(|d| d.base)
            .unwrap_or_default();
        let mut record = RewardRecord {
            chain_id: ctx.meta.chain_id.clone(),
            network: network.to_string(),
            denom,
            validator_address: validator.operator_address.clone(),
            rewards: Coins::new(),
            commission: Coins::new(),
            period: period.clone(),
            txhash: String::new(),
            status: WithdrawStatus::Pending,
            recorded_at: self.clock.now(),
        };
        self.stores.rewards.record_reward(&record)?;

        let actions: Vec<&'static str> = msgs.iter().map(Msg::type_url).collect();
        let tx = match self.broadcast(&ctx, &key, msgs, &self.memo).await {
            Ok(tx) => tx,
            Err(NodeError::Transaction(e)) if e.may_be_on_chain() => {
                if let Some(txhash) = e.submitted_txhash() {
                    record.txhash = txhash.to_string();
                    record.status = WithdrawStatus::Submitted;
                    self.stores.rewards.update_reward(&record)?;
                }
                tracing::warn!(
                    network,
                    %period,
                    error = %e,
                    "withdrawal unconfirmed, period stays claimed"
                );
                return Err(NodeError::Transaction(e));
            }
            Err(e) => {
                if let Err(release_err) = self.stores.rewards.release_reward(
                    &record.chain_id,
                    &period,
                    &record.validator_address,
                ) {
                    tracing::warn!(network, %period, error = %release_err, "claim not released");
                }
                return Err(e);
            }
        };

        let totals = WithdrawTotals::from_events(&tx.events);
        record.rewards = totals.rewards.clone();
        record.commission = totals.commission.clone();
        record.txhash = tx.txhash.clone();
        record.status = WithdrawStatus::Confirmed;
        self.stores.rewards.update_reward(&record)?;

        let tx_url = self.profiles.explorer(network).tx_url(&tx.txhash);
        tracing::info!(
            network,
            txhash = %tx.txhash,
            rewards = %totals.rewards,
            commission = %totals.commission,
            %period,
            "rewards withdrawn"
        );
        self.notify_withdrawn(validator, &totals, &tx_url).await;

        Ok(SweepOutcome::Executed {
            txhash: tx.txhash,
            tx_url,
            totals,
            actions,
        })
    }

    /// Look up a submitted withdrawal of this period and record how it ended.
    async fn settle_submitted(
        &self,
        validator: &Validator,
        chain_id: &str,
        period: &str,
    ) -> Result<(), NodeError> {
        let network = validator.network.as_str();
        let submitted = self
            .stores
            .rewards
            .list_rewards(chain_id, Some(period))?
            .into_iter()
            .find(|r| {
                r.validator_address == validator.operator_address
                    && r.status.is_unsettled()
                    && !r.txhash.is_empty()
            });
        let Some(mut record) = submitted else {
            return Ok(());
        };

        let endpoint = self.resolver.resolve(network).await?;
        let Some(committed) = self.resolver.client(&endpoint).tx(&record.txhash).await? else {
            tracing::info!(
                network,
                txhash = %record.txhash,
                "submitted withdrawal not indexed yet"
            );
            return Ok(());
        };
        let tx_url = self.profiles.explorer(network).tx_url(&record.txhash);
        match tx_result(&committed).into_success() {
            Ok(tx) => {
                let totals = WithdrawTotals::from_events(&tx.events);
                record.rewards = totals.rewards.clone();
                record.commission = totals.commission.clone();
                record.status = WithdrawStatus::Confirmed;
                self.stores.rewards.update_reward(&record)?;
                tracing::info!(
                    network,
                    txhash = %record.txhash,
                    %period,
                    "submitted withdrawal confirmed"
                );
                self.notify_withdrawn(validator, &totals, &tx_url).await;
            }
            Err(e) => {
                record.status = WithdrawStatus::Failed;
                self.stores.rewards.update_reward(&record)?;
                tracing::error!(
                    network,
                    txhash = %record.txhash,
                    error = %e,
                    "submitted withdrawal failed"
                );
                let scope = format!("reward sweep on {network}");
                if let Err(alert_err) = self.alerts.failure(&scope, &e).await {
                    tracing::warn!(error = %alert_err, "failure alert not delivered");
                }
            }
        }
        Ok(())
    }

    async fn notify_withdrawn(&self, validator: &Validator, totals: &WithdrawTotals, tx_url: &str) {
        if let Err(e) = self
            .alerts
            .withdraw_complete(
                &validator.network,
                &validator.operator_address,
                &totals.rewards,
                &totals.commission,
                tx_url,
            )
            .await
        {
            tracing::warn!(
                network = %validator.network,
                error = %e,
                "withdraw alert not delivered"
            );
        }
    }

    /// Vote on `proposal_id` with the network's voting key.
    ///
    /// Requires the vote message of the network's governance API to be
    /// granted; the proposal log row is updated with the cast option.
    pub async fn cast_vote(
        &self,
        network: &str,
        proposal_id: u64,
        option: VoteOption,
        memo: Option<&str>,
    ) -> Result<VoteReceipt, NodeError> {
        let validator = self
            .stores
            .validators
            .get_validator(network)?
            .ok_or_else(|| NodeError::UnknownValidator(network.to_string()))?;
        let key = self.key_for(network, KeyPurpose::Voting)?;
        let meta = self.resolver.directory().network_metadata(network).await?;
        let ctx = self.context(&validator, meta).await?;

        let gov_api = ctx.endpoint.gov_api;
        let type_url = gov_api.vote_type_url();
        if !self.grants.check(&ctx.lcd, &key, &ctx.granter, type_url).await? {
            return Err(NodeError::NotGranted {
                network: network.to_string(),
                grantee: key.grantee_address.clone(),
                type_url: type_url.to_string(),
            });
        }

        let memo = memo.unwrap_or(&self.memo);
        let msg = Msg::vote(gov_api, proposal_id, &ctx.granter, option, "");
        let tx = self.broadcast(&ctx, &key, vec![msg], memo).await?;
        if let Some(m) = &self.metrics {
            m.votes_cast.inc();
        }

        let now = self.clock.now();
        if self
            .stores
            .proposals
            .get_proposal_log(network, proposal_id)?
            .is_none()
        {
            self.stores
                .proposals
                .upsert_proposal_log(network, proposal_id, UNKNOWN_TITLE, now)?;
        }
        self.stores
            .proposals
            .update_vote_option(network, proposal_id, option.as_str(), now)?;

        let tx_url = self.profiles.explorer(network).tx_url(&tx.txhash);
        tracing::info!(network, proposal_id, %option, txhash = %tx.txhash, "vote cast");
        if let Err(e) = self
            .alerts
            .vote_cast(network, proposal_id, option.as_str(), &tx_url)
            .await
        {
            tracing::warn!(network, error = %e, "vote alert not delivered");
        }

        Ok(VoteReceipt {
            network: network.to_string(),
            proposal_id,
            option,
            txhash: tx.txhash,
            tx_url,
        })
    }
}
