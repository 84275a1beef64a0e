//! Authorization-grant checks and the cached grant state of delegated keys.

use std::sync::Arc;

use vigil_network::LcdClient;
use vigil_store::KeyStore;
use vigil_transactions::Msg;
use vigil_types::{Clock, DelegatedKey, GovApiVersion, GrantStatus, KeyPurpose};

use crate::{NodeError, NodeMetrics};

/// Message types a key of `purpose` acts with.
///
/// A voting key is checked for both governance versions; chains move from
/// `v1beta1` to `v1` on upgrade and the grant for the other one goes stale.
pub fn required_type_urls(purpose: KeyPurpose) -> Vec<&'static str> {
    match purpose {
        KeyPurpose::Voting => vec![
            GovApiVersion::V1.vote_type_url(),
            GovApiVersion::V1Beta1.vote_type_url(),
        ],
        KeyPurpose::Rewards => vec![
            Msg::WITHDRAW_DELEGATOR_REWARD_URL,
            Msg::WITHDRAW_VALIDATOR_COMMISSION_URL,
        ],
    }
}

/// Queries authz grants and writes every answer back to the key cache, so a
/// revoked grant stops showing as granted after the next check.
pub struct GrantChecker {
    keys: Arc<dyn KeyStore>,
    clock: Arc<dyn Clock>,
    metrics: Option<NodeMetrics>,
}

impl GrantChecker {
    pub fn new(keys: Arc<dyn KeyStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys,
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: NodeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether `granter` has granted `type_url` to the key's grantee address.
    ///
    /// Transport and parse failures propagate and leave the cache untouched.
    pub async fn check(
        &self,
        lcd: &LcdClient,
        key: &DelegatedKey,
        granter: &str,
        type_url: &str,
    ) -> Result<bool, NodeError> {
        if let Some(m) = &self.metrics {
            m.grant_checks.inc();
        }
        let granted = lcd
            .has_grant(granter, &key.grantee_address, type_url)
            .await?;
        self.keys.set_action_grant(
            &key.network,
            key.purpose,
            type_url,
            GrantStatus::from_granted(granted),
            self.clock.now(),
        )?;
        tracing::debug!(
            network = %key.network,
            grantee = %key.grantee_address,
            type_url,
            granted,
            "grant checked"
        );
        Ok(granted)
    }

    /// Refresh every grant the key needs and store its overall status.
    ///
    /// A voting key is granted when the vote message of the network's
    /// governance API is granted; a rewards key when at least one withdrawal
    /// message is.
    pub async fn sync_key(
        &self,
        lcd: &LcdClient,
        key: &DelegatedKey,
        granter: &str,
        gov_api: GovApiVersion,
    ) -> Result<GrantStatus, NodeError> {
        let mut answers = Vec::new();
        for type_url in required_type_urls(key.purpose) {
            answers.push((type_url, self.check(lcd, key, granter, type_url).await?));
        }
        let granted = match key.purpose {
            KeyPurpose::Voting => answers
                .iter()
                .any(|(url, g)| *g && *url == gov_api.vote_type_url()),
            KeyPurpose::Rewards => answers.iter().any(|(_, g)| *g),
        };
        let status = GrantStatus::from_granted(granted);
        self.keys
            .set_grant_status(&key.network, key.purpose, status, self.clock.now())?;
        tracing::info!(
            network = %key.network,
            purpose = %key.purpose,
            ?status,
            "grant status synced"
        );
        Ok(status)
    }
}
