use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert channel unreachable: {0}")]
    Unreachable(String),

    #[error("alert rejected by channel: {0}")]
    Rejected(String),

    #[error("invalid response from alert channel: {0}")]
    InvalidResponse(String),
}
