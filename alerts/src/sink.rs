//! Alert channel seam and the Slack Web API client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::{AlertError, AlertMessage};

pub const DEFAULT_SLACK_API: &str = "https://slack.com/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivers structured messages to a channel.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn post_message(&self, channel: &str, message: &AlertMessage) -> Result<(), AlertError>;
}

/// `chat.postMessage` with a bot token.
pub struct SlackClient {
    http_client: reqwest::Client,
    api_base_url: String,
    bot_token: String,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self::with_base_url(bot_token, DEFAULT_SLACK_API)
    }

    pub fn with_base_url(bot_token: impl Into<String>, api_base_url: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }
}

#[async_trait]
impl AlertSink for SlackClient {
    async fn post_message(&self, channel: &str, message: &AlertMessage) -> Result<(), AlertError> {
        let url = format!("{}/chat.postMessage", self.api_base_url);
        let body = json!({
            "channel": channel,
            "text": message.text,
            "blocks": message.blocks,
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AlertError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    AlertError::Unreachable(format!("connection failed: {e}"))
                } else {
                    AlertError::Unreachable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(AlertError::Rejected(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let parsed: SlackResponse = response
            .json()
            .await
            .map_err(|e| AlertError::InvalidResponse(e.to_string()))?;
        if parsed.ok {
            Ok(())
        } else {
            Err(AlertError::Rejected(
                parsed.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}
