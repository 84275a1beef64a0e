//! LMDB implementation of ValidatorStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use vigil_store::{StoreError, ValidatorStore};
use vigil_types::Validator;

use crate::codec::{decode, encode};
use crate::LmdbError;

pub struct LmdbValidatorStore {
    pub(crate) env: Arc<Env>,
    pub(crate) validators_db: Database<Bytes, Bytes>,
}

impl ValidatorStore for LmdbValidatorStore {
    fn insert_validator(&self, validator: &Validator) -> Result<(), StoreError> {
        let key = validator.network.as_bytes();
        let val = encode(validator)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .validators_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::AlreadyExists(format!(
                "validator for network {}",
                validator.network
            )));
        }
        self.validators_db
            .put(&mut wtxn, key, &val)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_validator(&self, network: &str) -> Result<Option<Validator>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .validators_db
            .get(&rtxn, network.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn remove_validator(&self, network: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let deleted = self
            .validators_db
            .delete(&mut wtxn, network.as_bytes())
            .map_err(LmdbError::from)?;
        if !deleted {
            return Err(StoreError::NotFound(format!("validator for network {network}")));
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn list_validators(&self) -> Result<Vec<Validator>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.validators_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_, val) = entry.map_err(LmdbError::from)?;
            results.push(decode(val)?);
        }
        Ok(results)
    }
}
