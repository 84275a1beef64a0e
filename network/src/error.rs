use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no REST provider is available for network {0}")]
    NoProviderAvailable(String),

    #[error("no active REST endpoint for network {0}")]
    NoActiveEndpoint(String),

    #[error("network {0} is not known to the chain directory")]
    UnknownNetwork(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status} from {url}: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl NetworkError {
    /// Whether the failed operation may succeed on the next cycle.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) | Self::NoActiveEndpoint(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(NetworkError::Timeout("x".into()).is_retryable());
        assert!(NetworkError::NoActiveEndpoint("juno".into()).is_retryable());
        assert!(!NetworkError::MalformedPayload("x".into()).is_retryable());
        assert!(!NetworkError::NoProviderAvailable("juno".into()).is_retryable());
        let status = |status| NetworkError::HttpStatus {
            url: String::new(),
            status,
            body: String::new(),
        };
        assert!(status(503).is_retryable());
        assert!(!status(400).is_retryable());
    }
}
