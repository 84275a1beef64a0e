//! IPFS gateway fetches.

use std::sync::Arc;
use std::time::Duration;

use crate::{NetworkError, RestTransport};

pub const DEFAULT_GATEWAY: &str = "https://ipfs.io/ipfs";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Reads JSON documents by content hash through an HTTP gateway.
#[derive(Clone)]
pub struct IpfsGateway {
    transport: Arc<dyn RestTransport>,
    base_url: String,
    timeout: Duration,
}

impl IpfsGateway {
    pub fn new(transport: Arc<dyn RestTransport>) -> Self {
        Self::with_base_url(transport, DEFAULT_GATEWAY)
    }

    pub fn with_base_url(transport: Arc<dyn RestTransport>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Gateway URL for a hash, with or without the `ipfs://` scheme.
    pub fn url_for(&self, hash: &str) -> String {
        let hash = hash.strip_prefix("ipfs://").unwrap_or(hash);
        format!("{}/{}", self.base_url, hash.trim_start_matches('/'))
    }

    pub async fn fetch_json(&self, hash: &str) -> Result<serde_json::Value, NetworkError> {
        let url = self.url_for(hash);
        self.transport
            .get(&url, self.timeout)
            .await?
            .error_for_status(&url)?
            .json()
    }
}
