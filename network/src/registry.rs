//! Chain directory: candidate endpoints and static metadata per network.
//!
//! [`ChainRegistryClient`] reads the public Cosmos chain registry
//! (`<name>/chain.json` and `<name>/assetlist.json`).

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vigil_types::{DenomInfo, NetworkMetadata};

use crate::{NetworkError, RestTransport};

/// Default chain registry mirror.
pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/cosmos/chain-registry/master";

/// Default request timeout for registry documents.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Source of endpoints and identity for networks.
#[async_trait]
pub trait ChainDirectory: Send + Sync {
    /// Candidate REST endpoints, normalised and de-duplicated.
    async fn list_endpoints(&self, network: &str) -> Result<Vec<String>, NetworkError>;

    async fn network_metadata(&self, network: &str) -> Result<NetworkMetadata, NetworkError>;
}

#[derive(Debug, Deserialize)]
struct ChainJson {
    #[serde(default)]
    chain_id: String,
    #[serde(default)]
    bech32_prefix: String,
    #[serde(default)]
    slip44: Option<u32>,
    #[serde(default)]
    apis: Option<Apis>,
}

#[derive(Debug, Default, Deserialize)]
struct Apis {
    #[serde(default)]
    rest: Vec<ApiEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiEntry {
    address: String,
}

#[derive(Debug, Deserialize)]
struct AssetList {
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    base: String,
    #[serde(default)]
    display: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    denom_units: Vec<DenomUnit>,
}

#[derive(Debug, Deserialize)]
struct DenomUnit {
    denom: String,
    #[serde(default)]
    exponent: u32,
}

impl Asset {
    fn to_denom_info(&self) -> DenomInfo {
        let decimals = self
            .denom_units
            .iter()
            .find(|u| u.denom == self.display)
            .map(|u| u.exponent)
            .unwrap_or(0);
        let display = if self.symbol.is_empty() {
            self.display.to_ascii_uppercase()
        } else {
            self.symbol.clone()
        };
        DenomInfo::new(self.base.clone(), display, decimals)
    }
}

/// Trim whitespace and trailing slashes, drop empties and duplicates while
/// keeping the first occurrence's position.
pub fn normalize_endpoints<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for entry in raw {
        let url = entry.as_ref().trim().trim_end_matches('/').to_string();
        if url.is_empty() || out.contains(&url) {
            continue;
        }
        out.push(url);
    }
    out
}

/// Chain-registry backed [`ChainDirectory`].
pub struct ChainRegistryClient {
    transport: Arc<dyn RestTransport>,
    base_url: String,
    timeout: Duration,
}

impl ChainRegistryClient {
    pub fn new(transport: Arc<dyn RestTransport>) -> Self {
        Self::with_base_url(transport, DEFAULT_REGISTRY_URL)
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

    async fn chain_json(&self, network: &str) -> Result<ChainJson, NetworkError> {
        let url = format!("{}/{}/chain.json", self.base_url, network);
        let response = self.transport.get(&url, self.timeout).await?;
        if response.status == 404 {
            return Err(NetworkError::UnknownNetwork(network.to_string()));
        }
        response.error_for_status(&url)?.json()
    }

    async fn asset_list(&self, network: &str) -> Result<AssetList, NetworkError> {
        let url = format!("{}/{}/assetlist.json", self.base_url, network);
        self.transport
            .get(&url, self.timeout)
            .await?
            .error_for_status(&url)?
            .json()
    }
}

#[async_trait]
impl ChainDirectory for ChainRegistryClient {
    async fn list_endpoints(&self, network: &str) -> Result<Vec<String>, NetworkError> {
        let chain = self.chain_json(network).await?;
        let rest = chain.apis.unwrap_or_default().rest;
        Ok(normalize_endpoints(rest.iter().map(|e| e.address.as_str())))
    }

    async fn network_metadata(&self, network: &str) -> Result<NetworkMetadata, NetworkError> {
        let chain = self.chain_json(network).await?;
        if chain.chain_id.is_empty() || chain.bech32_prefix.is_empty() {
            return Err(NetworkError::MalformedPayload(format!(
                "chain.json for {network} lacks chain_id or bech32_prefix"
            )));
        }

        let denom = match self.asset_list(network).await {
            Ok(list) => list.assets.first().map(Asset::to_denom_info),
            Err(e) => {
                tracing::warn!(network, error = %e, "asset list unavailable");
                None
            }
        };

        Ok(NetworkMetadata {
            name: network.to_string(),
            chain_id: chain.chain_id,
            bech32_prefix: chain.bech32_prefix,
            slip44: chain.slip44.unwrap_or(118),
            denom,
        })
    }
}

/// Memoises [`ChainDirectory::network_metadata`] for the process lifetime.
///
/// Endpoint lists pass through uncached so providers dropped from the
/// directory stop being tried.
pub struct CachedDirectory {
    inner: Arc<dyn ChainDirectory>,
    metadata: Mutex<HashMap<String, NetworkMetadata>>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn ChainDirectory>) -> Self {
        Self {
            inner,
            metadata: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ChainDirectory for CachedDirectory {
    async fn list_endpoints(&self, network: &str) -> Result<Vec<String>, NetworkError> {
        self.inner.list_endpoints(network).await
    }

    async fn network_metadata(&self, network: &str) -> Result<NetworkMetadata, NetworkError> {
        let cached = self
            .metadata
            .lock()
            .ok()
            .and_then(|cache| cache.get(network).cloned());
        if let Some(meta) = cached {
            return Ok(meta);
        }
        let meta = self.inner.network_metadata(network).await?;
        if let Ok(mut cache) = self.metadata.lock() {
            cache.insert(network.to_string(), meta.clone());
        }
        Ok(meta)
    }
}
