//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("store error: {0}")]
    Store(String),
}

impl RpcError {
    fn status(&self) -> StatusCode {
        match self {
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::NotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Server(_) | RpcError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<vigil_store::StoreError> for RpcError {
    fn from(e: vigil_store::StoreError) -> Self {
        match e {
            vigil_store::StoreError::NotFound(ref key) => RpcError::NotFound(key.clone()),
            other => RpcError::Store(other.to_string()),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "API request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
