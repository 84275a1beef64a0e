//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the agent (clock, HTTP, chain directory,
//! storage, signer, alert channel) sits behind a trait. This crate provides
//! test implementations that:
//! - Return scripted, deterministic values
//! - Record what was asked of them for assertions
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod alerts;
pub mod chain;
pub mod clock;
pub mod network;
pub mod store;

pub use alerts::NullAlertSink;
pub use chain::NullChainClient;
pub use clock::NullClock;
pub use network::{NullDirectory, NullTransport};
pub use store::NullStore;
