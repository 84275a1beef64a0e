//! Read-only HTTP API for the vigil agent.
//!
//! Serves the history the agent keeps, for dashboards:
//! - Proposal logs across all networks or for one, by date range
//! - Reward withdrawals by chain id and period
//! - Liveness and, when enabled, Prometheus metrics

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer, RpcState};
