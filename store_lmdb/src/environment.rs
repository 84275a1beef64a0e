//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use vigil_store::Stores;

use crate::migration::Migrator;
use crate::{
    LmdbError, LmdbKeyStore, LmdbMetaStore, LmdbProposalLogStore, LmdbRewardStore,
    LmdbValidatorStore,
};

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    validators_db: Database<Bytes, Bytes>,
    keys_db: Database<Bytes, Bytes>,
    proposals_db: Database<Bytes, Bytes>,
    rewards_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Number of named databases the agent creates.
    pub const DATABASES: u32 = 5;

    /// Default map size (1 GiB); the agent's data is small.
    pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

    /// Open or create an LMDB environment at the given path and bring its
    /// schema up to date.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path in this process and
        // never concurrently from another process with different options.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(Self::DATABASES))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let validators_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("validators"))?;
        let keys_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("keys"))?;
        let proposals_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("proposal_logs"))?;
        let rewards_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("rewards"))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            validators_db,
            keys_db,
            proposals_db,
            rewards_db,
            meta_db,
        };

        Migrator::run(&environment.meta_store())?;
        tracing::info!(path = %path.display(), "opened LMDB store");
        Ok(environment)
    }

    /// Open with default limits.
    pub fn open_default(path: &Path) -> Result<Self, LmdbError> {
        Self::open(path, Self::DATABASES, Self::DEFAULT_MAP_SIZE)
    }

    pub fn validator_store(&self) -> LmdbValidatorStore {
        LmdbValidatorStore {
            env: self.env.clone(),
            validators_db: self.validators_db,
        }
    }

    pub fn key_store(&self) -> LmdbKeyStore {
        LmdbKeyStore {
            env: self.env.clone(),
            keys_db: self.keys_db,
        }
    }

    pub fn proposal_log_store(&self) -> LmdbProposalLogStore {
        LmdbProposalLogStore {
            env: self.env.clone(),
            proposals_db: self.proposals_db,
        }
    }

    pub fn reward_store(&self) -> LmdbRewardStore {
        LmdbRewardStore {
            env: self.env.clone(),
            rewards_db: self.rewards_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: self.env.clone(),
            meta_db: self.meta_db,
        }
    }

    /// Trait-object handles to every store, as consumed by the engine.
    pub fn stores(&self) -> Stores {
        Stores {
            validators: Arc::new(self.validator_store()),
            keys: Arc::new(self.key_store()),
            proposals: Arc::new(self.proposal_log_store()),
            rewards: Arc::new(self.reward_store()),
        }
    }
}
