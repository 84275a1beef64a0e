//! LMDB implementation of KeyStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use vigil_store::{KeyStore, StoreError};
use vigil_types::{DelegatedKey, GrantStatus, KeyPurpose, Timestamp};

use crate::codec::{composite_key, decode, encode};
use crate::LmdbError;

pub struct LmdbKeyStore {
    pub(crate) env: Arc<Env>,
    pub(crate) keys_db: Database<Bytes, Bytes>,
}

fn key_of(network: &str, purpose: KeyPurpose) -> Vec<u8> {
    composite_key(&[network.as_bytes(), purpose.as_str().as_bytes()])
}

impl KeyStore for LmdbKeyStore {
    fn put_key(&self, key: &DelegatedKey) -> Result<(), StoreError> {
        let db_key = key_of(&key.network, key.purpose);
        let val = encode(key)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.keys_db
            .put(&mut wtxn, &db_key, &val)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_key(
        &self,
        network: &str,
        purpose: KeyPurpose,
    ) -> Result<Option<DelegatedKey>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .keys_db
            .get(&rtxn, &key_of(network, purpose))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn remove_key(&self, network: &str, purpose: KeyPurpose) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let deleted = self
            .keys_db
            .delete(&mut wtxn, &key_of(network, purpose))
            .map_err(LmdbError::from)?;
        if !deleted {
            return Err(StoreError::NotFound(format!("{purpose} key for {network}")));
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<DelegatedKey>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.keys_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_, val) = entry.map_err(LmdbError::from)?;
            results.push(decode(val)?);
        }
        Ok(results)
    }

    fn set_grant_status(
        &self,
        network: &str,
        purpose: KeyPurpose,
        status: GrantStatus,
        checked_at: Timestamp,
    ) -> Result<(), StoreError> {
        self.update_key(network, purpose, |key| {
            key.grant_status = status;
            key.checked_at = Some(checked_at);
        })
    }

    fn set_action_grant(
        &self,
        network: &str,
        purpose: KeyPurpose,
        type_url: &str,
        status: GrantStatus,
        checked_at: Timestamp,
    ) -> Result<(), StoreError> {
        self.update_key(network, purpose, |key| {
            key.action_grants.insert(type_url.to_string(), status);
            key.checked_at = Some(checked_at);
        })
    }
}

impl LmdbKeyStore {
    /// Read-modify-write of one key inside a single write transaction.
    fn update_key(
        &self,
        network: &str,
        purpose: KeyPurpose,
        apply: impl FnOnce(&mut DelegatedKey),
    ) -> Result<(), StoreError> {
        let db_key = key_of(network, purpose);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = self
            .keys_db
            .get(&wtxn, &db_key)
            .map_err(LmdbError::from)?
            .map(|b| b.to_vec())
            .ok_or_else(|| StoreError::NotFound(format!("{purpose} key for {network}")))?;
        let mut key: DelegatedKey = decode(&existing)?;
        apply(&mut key);
        let val = encode(&key)?;
        self.keys_db
            .put(&mut wtxn, &db_key, &val)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
