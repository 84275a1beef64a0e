//! Endpoint resolution with failover and governance API detection.

use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vigil_types::GovApiVersion;

use crate::models::SyncingResponse;
use crate::{ChainDirectory, LcdClient, NetworkError, RestTransport};

const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYNCING_PATH: &str = "/cosmos/base/tendermint/v1beta1/syncing";

/// A live endpoint and the governance API it serves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub network: String,
    pub url: String,
    pub gov_api: GovApiVersion,
}

/// Picks a healthy REST endpoint for a network.
///
/// Candidates come from static configuration when present, otherwise from
/// the [`ChainDirectory`]. They are tried in random order; the first that
/// answers the sync check with 200 and does not report catching up wins.
/// Detected API versions are cached per network for the process lifetime.
pub struct EndpointResolver {
    directory: Arc<dyn ChainDirectory>,
    transport: Arc<dyn RestTransport>,
    health_timeout: Duration,
    request_timeout: Duration,
    static_endpoints: HashMap<String, Vec<String>>,
    pinned_versions: HashMap<String, GovApiVersion>,
    version_cache: Mutex<HashMap<String, GovApiVersion>>,
    shuffle: bool,
}

impl EndpointResolver {
    pub fn new(directory: Arc<dyn ChainDirectory>, transport: Arc<dyn RestTransport>) -> Self {
        Self {
            directory,
            transport,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            static_endpoints: HashMap::new(),
            pinned_versions: HashMap::new(),
            version_cache: Mutex::new(HashMap::new()),
            shuffle: true,
        }
    }

    pub fn with_timeouts(mut self, health: Duration, request: Duration) -> Self {
        self.health_timeout = health;
        self.request_timeout = request;
        self
    }

    /// Use a fixed candidate list for `network` instead of the directory.
    pub fn with_static_endpoints(mut self, network: &str, endpoints: Vec<String>) -> Self {
        let endpoints = crate::registry::normalize_endpoints(endpoints);
        if !endpoints.is_empty() {
            self.static_endpoints.insert(network.to_string(), endpoints);
        }
        self
    }

    /// Skip version detection for `network`.
    pub fn with_pinned_version(mut self, network: &str, version: GovApiVersion) -> Self {
        self.pinned_versions.insert(network.to_string(), version);
        self
    }

    /// Try candidates in list order.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn transport(&self) -> Arc<dyn RestTransport> {
        self.transport.clone()
    }

    pub fn directory(&self) -> Arc<dyn ChainDirectory> {
        self.directory.clone()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Query client for a resolved endpoint.
    pub fn client(&self, endpoint: &ResolvedEndpoint) -> LcdClient {
        LcdClient::new(self.transport.clone(), &endpoint.url, self.request_timeout)
    }

    /// Resolve a live endpoint and its governance API version.
    pub async fn resolve(&self, network: &str) -> Result<ResolvedEndpoint, NetworkError> {
        let mut candidates = match self.static_endpoints.get(network) {
            Some(list) => list.clone(),
            None => self.directory.list_endpoints(network).await?,
        };
        if candidates.is_empty() {
            return Err(NetworkError::NoProviderAvailable(network.to_string()));
        }
        if self.shuffle {
            let mut rng = rand::thread_rng();
            candidates.shuffle(&mut rng);
        }

        for url in candidates {
            if self.is_healthy(&url).await {
                let gov_api = self.gov_api_version(network, &url).await;
                tracing::debug!(network, endpoint = %url, %gov_api, "endpoint selected");
                return Ok(ResolvedEndpoint {
                    network: network.to_string(),
                    url,
                    gov_api,
                });
            }
        }

        tracing::warn!(network, "no healthy endpoint");
        Err(NetworkError::NoActiveEndpoint(network.to_string()))
    }

    /// Forget the cached API version of `network`.
    pub fn invalidate(&self, network: &str) {
        if let Ok(mut cache) = self.version_cache.lock() {
            cache.remove(network);
        }
    }

    async fn is_healthy(&self, base_url: &str) -> bool {
        let url = format!("{base_url}{SYNCING_PATH}");
        match self.transport.get(&url, self.health_timeout).await {
            Ok(resp) if resp.status == 200 => match resp.json::<SyncingResponse>() {
                Ok(status) if status.syncing => {
                    tracing::debug!(endpoint = %base_url, "endpoint is catching up");
                    false
                }
                // Unparseable sync status counts as live.
                _ => true,
            },
            Ok(resp) => {
                tracing::debug!(
                    endpoint = %base_url,
                    status = resp.status,
                    "health check rejected"
                );
                false
            }
            Err(e) => {
                tracing::debug!(endpoint = %base_url, error = %e, "health check failed");
                false
            }
        }
    }

    async fn gov_api_version(&self, network: &str, base_url: &str) -> GovApiVersion {
        if let Some(version) = self.pinned_versions.get(network) {
            return *version;
        }
        let cached = self
            .version_cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(network).copied());
        if let Some(version) = cached {
            return version;
        }

        let lcd = LcdClient::new(self.transport.clone(), base_url, self.health_timeout);
        let detected = if lcd.supports_gov_api(GovApiVersion::V1).await {
            Some(GovApiVersion::V1)
        } else if lcd.supports_gov_api(GovApiVersion::V1Beta1).await {
            Some(GovApiVersion::V1Beta1)
        } else {
            None
        };

        match detected {
            Some(version) => {
                if let Ok(mut cache) = self.version_cache.lock() {
                    cache.insert(network.to_string(), version);
                }
                version
            }
            None => {
                tracing::warn!(
                    network,
                    endpoint = %base_url,
                    "no governance API answered; assuming v1beta1"
                );
                GovApiVersion::V1Beta1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use async_trait::async_trait;
    use vigil_types::NetworkMetadata;

    struct FixedDirectory(Vec<String>);

    #[async_trait]
    impl ChainDirectory for FixedDirectory {
        async fn list_endpoints(&self, _network: &str) -> Result<Vec<String>, NetworkError> {
            Ok(self.0.clone())
        }

        async fn network_metadata(&self, network: &str) -> Result<NetworkMetadata, NetworkError> {
            Err(NetworkError::UnknownNetwork(network.to_string()))
        }
    }

    fn resolver(endpoints: &[&str], transport: &Arc<ScriptedTransport>) -> EndpointResolver {
        let directory = FixedDirectory(endpoints.iter().map(|s| s.to_string()).collect());
        EndpointResolver::new(Arc::new(directory), transport.clone()).with_shuffle(false)
    }

    fn health_calls(transport: &ScriptedTransport) -> usize {
        transport
            .calls()
            .iter()
            .filter(|c| c.ends_with(SYNCING_PATH))
            .count()
    }

    #[tokio::test]
    async fn fails_over_to_third_endpoint() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail("https://a.test/cosmos/base/tendermint/v1beta1/syncing");
        transport.respond("https://b.test/cosmos/base/tendermint/v1beta1/syncing", 502, "");
        transport.ok(
            "https://c.test/cosmos/base/tendermint/v1beta1/syncing",
            r#"{"syncing":false}"#,
        );
        transport.ok(
            "https://d.test/cosmos/base/tendermint/v1beta1/syncing",
            r#"{"syncing":false}"#,
        );
        transport.ok("https://c.test/cosmos/gov/v1/params/voting", "{}");

        let resolved = resolver(
            &["https://a.test", "https://b.test", "https://c.test", "https://d.test"],
            &transport,
        )
        .resolve("cosmoshub")
        .await
        .unwrap();

        assert_eq!(resolved.url, "https://c.test");
        assert_eq!(resolved.gov_api, GovApiVersion::V1);
        assert_eq!(health_calls(&transport), 3);
    }

    #[tokio::test]
    async fn syncing_node_is_skipped() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            "https://a.test/cosmos/base/tendermint/v1beta1/syncing",
            r#"{"syncing":true}"#,
        );
        transport.ok(
            "https://b.test/cosmos/base/tendermint/v1beta1/syncing",
            r#"{"syncing":false}"#,
        );
        transport.ok("https://b.test/cosmos/gov/v1/params/voting", "{}");
        let resolved = resolver(&["https://a.test", "https://b.test"], &transport)
            .resolve("juno")
            .await
            .unwrap();
        assert_eq!(resolved.url, "https://b.test");
    }

    #[tokio::test]
    async fn unparseable_health_body_counts_as_healthy() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok("https://a.test/cosmos/base/tendermint/v1beta1/syncing", "<html>ok</html>");
        transport.respond("https://a.test/cosmos/gov/v1/params/voting", 501, "");
        transport.ok("https://a.test/cosmos/gov/v1beta1/params/voting", "{}");
        let resolved = resolver(&["https://a.test"], &transport)
            .resolve("regen")
            .await
            .unwrap();
        assert_eq!(resolved.url, "https://a.test");
        assert_eq!(resolved.gov_api, GovApiVersion::V1Beta1);
    }

    #[tokio::test]
    async fn empty_directory_is_no_provider() {
        let transport = Arc::new(ScriptedTransport::new());
        let err = resolver(&[], &transport).resolve("ghost").await.unwrap_err();
        assert!(matches!(err, NetworkError::NoProviderAvailable(_)));
    }

    #[tokio::test]
    async fn all_unhealthy_is_no_active_endpoint() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail("https://a.test/cosmos/base/tendermint/v1beta1/syncing");
        let err = resolver(&["https://a.test"], &transport)
            .resolve("akash")
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::NoActiveEndpoint(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn static_endpoints_take_precedence() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            "https://mine.test/cosmos/base/tendermint/v1beta1/syncing",
            r#"{"syncing":false}"#,
        );
        let resolved = resolver(&["https://registry.test"], &transport)
            .with_static_endpoints("osmosis", vec!["https://mine.test/".into()])
            .with_pinned_version("osmosis", GovApiVersion::V1Beta1)
            .resolve("osmosis")
            .await
            .unwrap();
        assert_eq!(resolved.url, "https://mine.test");
        assert_eq!(resolved.gov_api, GovApiVersion::V1Beta1);
        assert!(transport.calls().iter().all(|c| !c.contains("/cosmos/gov/")));
    }

    #[tokio::test]
    async fn version_is_detected_once_per_network() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.ok(
            "https://a.test/cosmos/base/tendermint/v1beta1/syncing",
            r#"{"syncing":false}"#,
        );
        transport.ok("https://a.test/cosmos/gov/v1/params/voting", "{}");
        let resolver = resolver(&["https://a.test"], &transport);
        resolver.resolve("stride").await.unwrap();
        resolver.resolve("stride").await.unwrap();
        let detections = transport
            .calls()
            .iter()
            .filter(|c| c.contains("/params/voting"))
            .count();
        assert_eq!(detections, 1);

        resolver.invalidate("stride");
        resolver.resolve("stride").await.unwrap();
        let detections = transport
            .calls()
            .iter()
            .filter(|c| c.contains("/params/voting"))
            .count();
        assert_eq!(detections, 2);
    }
}
