//! Errors shared by every store backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The row is unique and already present, e.g. a second validator for a
    /// network or a second reward record for a period.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("backend: {0}")]
    Backend(String),

    #[error("encoding: {0}")]
    Serialization(String),

    #[error("corrupt record: {0}")]
    Corruption(String),
}
