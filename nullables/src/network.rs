//! Nullable HTTP transport and chain directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use vigil_network::{ChainDirectory, HttpResponse, NetworkError, RestTransport};
use vigil_types::NetworkMetadata;

/// Answers GET requests from a route table instead of the network.
///
/// Lookup is by exact URL, then by URL without its query string. Unrouted
/// URLs fail with a transport error. Every request is recorded.
#[derive(Default)]
pub struct NullTransport {
    routes: Mutex<HashMap<String, Result<HttpResponse, String>>>,
    calls: Mutex<Vec<String>>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `url` to a response, replacing any earlier route.
    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(HttpResponse::new(status, body)));
    }

    pub fn ok(&self, url: &str, body: &str) {
        self.respond(url, 200, body);
    }

    /// Route `url` to a connection failure.
    pub fn fail(&self, url: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Err("connection refused".to_string()));
    }

    /// All requested URLs, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests whose URL contains `fragment`.
    pub fn count_calls(&self, fragment: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(fragment))
            .count()
    }
}

#[async_trait]
impl RestTransport for NullTransport {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, NetworkError> {
        self.calls.lock().unwrap().push(url.to_string());
        let routes = self.routes.lock().unwrap();
        let path = url.split('?').next().unwrap_or(url);
        match routes.get(url).or_else(|| routes.get(path)) {
            Some(Ok(resp)) => Ok(resp.clone()),
            Some(Err(msg)) => Err(NetworkError::Transport(msg.clone())),
            None => Err(NetworkError::Transport(format!("unrouted: {url}"))),
        }
    }
}

/// In-memory chain directory.
#[derive(Default)]
pub struct NullDirectory {
    networks: Mutex<HashMap<String, (NetworkMetadata, Vec<String>)>>,
}

impl NullDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network(self, meta: NetworkMetadata, endpoints: Vec<String>) -> Self {
        self.add_network(meta, endpoints);
        self
    }

    pub fn add_network(&self, meta: NetworkMetadata, endpoints: Vec<String>) {
        self.networks
            .lock()
            .unwrap()
            .insert(meta.name.clone(), (meta, endpoints));
    }
}

#[async_trait]
impl ChainDirectory for NullDirectory {
    async fn list_endpoints(&self, network: &str) -> Result<Vec<String>, NetworkError> {
        self.networks
            .lock()
            .unwrap()
            .get(network)
            .map(|(_, endpoints)| endpoints.clone())
            .ok_or_else(|| NetworkError::UnknownNetwork(network.to_string()))
    }

    async fn network_metadata(&self, network: &str) -> Result<NetworkMetadata, NetworkError> {
        self.networks
            .lock()
            .unwrap()
            .get(network)
            .map(|(meta, _)| meta.clone())
            .ok_or_else(|| NetworkError::UnknownNetwork(network.to_string()))
    }
}
