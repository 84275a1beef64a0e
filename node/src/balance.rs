//! Low-balance monitoring of delegated (grantee) accounts.

use std::sync::Arc;

use vigil_alerts::AlertDispatcher;
use vigil_network::{ChainDirectory, EndpointResolver};
use vigil_types::DenomInfo;

use crate::{NetworkProfiles, NodeError};

/// Result of one balance check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceReport {
    pub network: String,
    pub address: String,
    pub denom: DenomInfo,
    /// Balance in base units.
    pub amount: u128,
    /// Whether the balance was at or below one whole token.
    pub low: bool,
}

pub struct BalanceMonitor {
    resolver: Arc<EndpointResolver>,
    directory: Arc<dyn ChainDirectory>,
    profiles: NetworkProfiles,
    alerts: AlertDispatcher,
}

impl BalanceMonitor {
    pub fn new(
        resolver: Arc<EndpointResolver>,
        profiles: NetworkProfiles,
        alerts: AlertDispatcher,
    ) -> Self {
        let directory = resolver.directory();
        Self {
            resolver,
            directory,
            profiles,
            alerts,
        }
    }

    /// Denom metadata for `network`. Directory failures only cost the asset
    /// list; configuration and the built-in table still apply.
    async fn denom_for(&self, network: &str) -> Result<DenomInfo, NodeError> {
        let meta = match self.directory.network_metadata(network).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::debug!(network, error = %e, "no directory metadata for denom lookup");
                None
            }
        };
        self.profiles
            .denom(network, meta.as_ref())
            .ok_or_else(|| NodeError::Config(format!("no denom configured for network {network}")))
    }

    /// Query the native-token balance of `address` and alert when it is at
    /// or below `10^decimals` base units.
    pub async fn check_balance(
        &self,
        network: &str,
        address: &str,
    ) -> Result<BalanceReport, NodeError> {
        let denom = self.denom_for(network).await?;
        let one_unit = denom.one_unit().ok_or_else(|| {
            NodeError::Config(format!(
                "decimals {} of {} are out of range",
                denom.decimals, denom.base
            ))
        })?;

        let endpoint = self.resolver.resolve(network).await?;
        let amount = self
            .resolver
            .client(&endpoint)
            .balance(address, &denom.base)
            .await?;

        let low = amount <= one_unit;
        if low {
            tracing::warn!(network, address, amount, denom = %denom.base, "balance is low");
            self.alerts
                .low_balance(network, address, &denom.display)
                .await?;
        } else {
            tracing::debug!(network, address, amount, denom = %denom.base, "balance ok");
        }

        Ok(BalanceReport {
            network: network.to_string(),
            address: address.to_string(),
            denom,
            amount,
            low,
        })
    }
}
