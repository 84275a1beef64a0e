//! Address handling for Cosmos-style networks.
//!
//! Validator operator addresses (`cosmosvaloper1...`) and account addresses
//! (`cosmos1...`) share the same 20-byte payload and differ only in their
//! bech32 human-readable prefix. [`AddressCodec`] carries the prefixes for
//! one network as a plain value, so conversions for different networks can
//! run concurrently without any shared codec state.

pub mod address;
pub mod error;

pub use address::AddressCodec;
pub use error::AddressError;
