//! Channel-bound alert delivery.

use std::fmt::Display;
use std::sync::Arc;

use vigil_types::{Coins, ExplorerLinks, MissedProposal, Timestamp};

use crate::{messages, AlertError, AlertMessage, AlertSink};

/// Sends every alert kind to one channel.
#[derive(Clone)]
pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
    channel: String,
}

impl AlertDispatcher {
    pub fn new(sink: Arc<dyn AlertSink>, channel: impl Into<String>) -> Self {
        Self {
            sink,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub async fn send(&self, message: &AlertMessage) -> Result<(), AlertError> {
        match self.sink.post_message(&self.channel, message).await {
            Ok(()) => {
                tracing::debug!(channel = %self.channel, text = %message.text, "alert sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    channel = %self.channel,
                    error = %e,
                    text = %message.text,
                    "alert delivery failed"
                );
                Err(e)
            }
        }
    }

    /// One alert for all of a network's missed proposals. Nothing is sent
    /// for an empty list.
    pub async fn missed_proposals(
        &self,
        network: &str,
        missed: &[MissedProposal],
        links: &ExplorerLinks,
        now: Timestamp,
    ) -> Result<bool, AlertError> {
        if missed.is_empty() {
            return Ok(false);
        }
        self.send(&messages::missed_proposals(network, missed, links, now))
            .await?;
        Ok(true)
    }

    pub async fn low_balance(
        &self,
        network: &str,
        address: &str,
        display_denom: &str,
    ) -> Result<(), AlertError> {
        self.send(&messages::low_balance(network, address, display_denom))
            .await
    }

    pub async fn withdraw_complete(
        &self,
        network: &str,
        validator: &str,
        rewards: &Coins,
        commission: &Coins,
        tx_url: &str,
    ) -> Result<(), AlertError> {
        self.send(&messages::withdraw_complete(
            network, validator, rewards, commission, tx_url,
        ))
        .await
    }

    pub async fn vote_cast(
        &self,
        network: &str,
        proposal_id: u64,
        option: &str,
        tx_url: &str,
    ) -> Result<(), AlertError> {
        self.send(&messages::vote_cast(network, proposal_id, option, tx_url))
            .await
    }

    pub async fn failure(
        &self,
        scope: &str,
        error: &(dyn Display + Sync),
    ) -> Result<(), AlertError> {
        self.send(&messages::failure(scope, error)).await
    }
}
