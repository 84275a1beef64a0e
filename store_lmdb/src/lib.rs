//! LMDB storage backend for the vigil agent.
//!
//! Implements the storage traits from `vigil-store` using the `heed` LMDB
//! bindings. Each logical store maps to one LMDB database within a single
//! environment; values are bincode-encoded domain types.

mod codec;
pub mod environment;
pub mod error;
pub mod key;
pub mod meta;
pub mod migration;
pub mod proposal;
pub mod reward;
pub mod validator;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use key::LmdbKeyStore;
pub use meta::LmdbMetaStore;
pub use proposal::LmdbProposalLogStore;
pub use reward::LmdbRewardStore;
pub use validator::LmdbValidatorStore;
