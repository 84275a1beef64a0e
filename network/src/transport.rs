//! HTTP transport seam.
//!
//! All REST traffic (chain endpoints, chain directory, IPFS gateway) goes
//! through [`RestTransport`]. Production uses [`ReqwestTransport`]; tests
//! substitute a scripted implementation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::NetworkError;

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Status and body of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NetworkError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| NetworkError::MalformedPayload(format!("invalid JSON body: {e}")))
    }

    /// Turn a non-2xx response into [`NetworkError::HttpStatus`].
    pub fn error_for_status(self, url: &str) -> Result<Self, NetworkError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(NetworkError::HttpStatus {
                url: url.to_string(),
                status: self.status,
                body: truncate(&self.text(), 512),
            })
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

/// Performs GET requests with a per-request deadline.
#[async_trait]
pub trait RestTransport: Send + Sync {
    /// GET `url`. A response with any status code is `Ok`; only transport
    /// failures (DNS, connect, timeout, body read) are errors.
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, NetworkError>;
}

/// `reqwest`-backed transport with a shared connection pool.
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { http_client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(url: &str, e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout(format!("{url}: {e}"))
    } else if e.is_connect() {
        NetworkError::Transport(format!("connection to {url} failed: {e}"))
    } else {
        NetworkError::Transport(format!("{url}: {e}"))
    }
}

#[async_trait]
impl RestTransport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, NetworkError> {
        let response = self
            .http_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| classify(url, e))?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn error_for_status_keeps_body() {
        let err = HttpResponse::new(500, "boom")
            .error_for_status("http://x")
            .unwrap_err();
        match err {
            NetworkError::HttpStatus { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_json_is_malformed_payload() {
        let resp = HttpResponse::new(200, "<html>");
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, NetworkError::MalformedPayload(_)));
    }

    #[test]
    fn truncate_long_bodies() {
        let long = "a".repeat(600);
        assert_eq!(truncate(&long, 512).chars().count(), 513);
        assert_eq!(truncate("short", 512), "short");
    }
}
