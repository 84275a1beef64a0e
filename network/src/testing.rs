//! Scripted transport for unit tests in this crate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::{HttpResponse, NetworkError, RestTransport};

/// Answers by exact URL, then by URL without its query string.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, Result<HttpResponse, String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(HttpResponse::new(status, body)));
    }

    pub(crate) fn ok(&self, url: &str, body: &str) {
        self.respond(url, 200, body);
    }

    pub(crate) fn fail(&self, url: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Err("connection refused".to_string()));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RestTransport for ScriptedTransport {
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
