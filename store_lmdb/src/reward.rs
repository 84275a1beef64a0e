//! LMDB implementation of RewardStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use vigil_store::{RewardStore, StoreError};
use vigil_types::RewardRecord;

use crate::codec::{composite_key, decode, encode, prefix_key};
use crate::LmdbError;

pub struct LmdbRewardStore {
    pub(crate) env: Arc<Env>,
    pub(crate) rewards_db: Database<Bytes, Bytes>,
}

/// `chain_id\0period\0validator`
fn reward_key(record: &RewardRecord) -> Vec<u8> {
    composite_key(&[
        record.chain_id.as_bytes(),
        record.period.as_bytes(),
        record.validator_address.as_bytes(),
    ])
}

impl LmdbRewardStore {
    fn scan(&self, prefix: &[u8]) -> Result<Vec<RewardRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .rewards_db
            .prefix_iter(&rtxn, prefix)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_, val) = entry.map_err(LmdbError::from)?;
            results.push(decode(val)?);
        }
        Ok(results)
    }
}

impl RewardStore for LmdbRewardStore {
    fn record_reward(&self, record: &RewardRecord) -> Result<(), StoreError> {
        let key = reward_key(record);
        let val = encode(record)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .rewards_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::AlreadyExists(format!(
                "reward for {} in {} ({})",
                record.chain_id, record.period, record.validator_address
            )));
        }
        self.rewards_db
            .put(&mut wtxn, &key, &val)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn update_reward(&self, record: &RewardRecord) -> Result<(), StoreError> {
        let key = reward_key(record);
        let val = encode(record)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .rewards_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_none()
        {
            return Err(StoreError::NotFound(format!(
                "reward for {} in {} ({})",
                record.chain_id, record.period, record.validator_address
            )));
        }
        self.rewards_db
            .put(&mut wtxn, &key, &val)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn release_reward(
        &self,
        chain_id: &str,
        period: &str,
        validator_address: &str,
    ) -> Result<(), StoreError> {
        let key = composite_key(&[
            chain_id.as_bytes(),
            period.as_bytes(),
            validator_address.as_bytes(),
        ]);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.rewards_db
            .delete(&mut wtxn, &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn reward_already_recorded(&self, chain_id: &str, period: &str) -> Result<bool, StoreError> {
        let prefix = prefix_key(&[chain_id.as_bytes(), period.as_bytes()]);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut iter = self
            .rewards_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        match iter.next() {
            Some(entry) => {
                entry.map_err(LmdbError::from)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn list_rewards(
        &self,
        chain_id: &str,
        period: Option<&str>,
    ) -> Result<Vec<RewardRecord>, StoreError> {
        let prefix = match period {
            Some(period) => prefix_key(&[chain_id.as_bytes(), period.as_bytes()]),
            None => prefix_key(&[chain_id.as_bytes()]),
        };
        self.scan(&prefix)
    }
}
