//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use vigil_store::{KeyStore, ProposalLogStore, RewardStore, StoreError, ValidatorStore};
use vigil_types::{
    DelegatedKey, GrantStatus, KeyPurpose, ProposalLog, RewardRecord, Timestamp, Validator,
};

/// An in-memory implementation of every store trait.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    validators: Mutex<BTreeMap<String, Validator>>,
    keys: Mutex<BTreeMap<(String, KeyPurpose), DelegatedKey>>,
    proposals: Mutex<BTreeMap<(String, u64), ProposalLog>>,
    rewards: Mutex<Vec<RewardRecord>>,
    failing: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("null store set to fail".to_string()))
        } else {
            Ok(())
        }
    }

    /// Number of proposal log rows, across networks.
    pub fn proposal_count(&self) -> usize {
        self.proposals.lock().unwrap().len()
    }

    pub fn reward_count(&self) -> usize {
        self.rewards.lock().unwrap().len()
    }
}

impl ValidatorStore for NullStore {
    fn insert_validator(&self, validator: &Validator) -> Result<(), StoreError> {
        self.check()?;
        let mut validators = self.validators.lock().unwrap();
        if validators.contains_key(&validator.network) {
            return Err(StoreError::AlreadyExists(validator.network.clone()));
        }
        validators.insert(validator.network.clone(), validator.clone());
        Ok(())
    }

    fn get_validator(&self, network: &str) -> Result<Option<Validator>, StoreError> {
        self.check()?;
        Ok(self.validators.lock().unwrap().get(network).cloned())
    }

    fn remove_validator(&self, network: &str) -> Result<(), StoreError> {
        self.check()?;
        self.validators
            .lock()
            .unwrap()
            .remove(network)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(network.to_string()))
    }

    fn list_validators(&self) -> Result<Vec<Validator>, StoreError> {
        self.check()?;
        Ok(self.validators.lock().unwrap().values().cloned().collect())
    }
}

impl KeyStore for NullStore {
    fn put_key(&self, key: &DelegatedKey) -> Result<(), StoreError> {
        self.check()?;
        self.keys
            .lock()
            .unwrap()
            .insert((key.network.clone(), key.purpose), key.clone());
        Ok(())
    }

    fn get_key(
        &self,
        network: &str,
        purpose: KeyPurpose,
    ) -> Result<Option<DelegatedKey>, StoreError> {
        self.check()?;
        Ok(self
            .keys
            .lock()
            .unwrap()
            .get(&(network.to_string(), purpose))
            .cloned())
    }

    fn remove_key(&self, network: &str, purpose: KeyPurpose) -> Result<(), StoreError> {
        self.check()?;
        self.keys
            .lock()
            .unwrap()
            .remove(&(network.to_string(), purpose))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("{network}/{purpose}")))
    }

    fn list_keys(&self) -> Result<Vec<DelegatedKey>, StoreError> {
        self.check()?;
        Ok(self.keys.lock().unwrap().values().cloned().collect())
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

impl NullStore {
    fn update_key(
        &self,
        network: &str,
        purpose: KeyPurpose,
        apply: impl FnOnce(&mut DelegatedKey),
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut keys = self.keys.lock().unwrap();
        let key = keys
            .get_mut(&(network.to_string(), purpose))
            .ok_or_else(|| StoreError::NotFound(format!("{network}/{purpose}")))?;
        apply(key);
        Ok(())
    }
}

impl ProposalLogStore for NullStore {
    fn upsert_proposal_log(
        &self,
        network: &str,
        proposal_id: u64,
        title: &str,
        now: Timestamp,
    ) -> Result<ProposalLog, StoreError> {
        self.check()?;
        let mut proposals = self.proposals.lock().unwrap();
        let row = proposals
            .entry((network.to_string(), proposal_id))
            .or_insert_with(|| ProposalLog::new(network, proposal_id, title, now));
        if row.title != title {
            row.title = title.to_string();
        }
        Ok(row.clone())
    }

    fn update_vote_option(
        &self,
        network: &str,
        proposal_id: u64,
        vote_option: &str,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut proposals = self.proposals.lock().unwrap();
        let row = proposals
            .get_mut(&(network.to_string(), proposal_id))
            .ok_or_else(|| StoreError::NotFound(format!("{network}/{proposal_id}")))?;
        row.vote_option = vote_option.to_string();
        row.updated_at = now;
        Ok(())
    }

    fn get_proposal_log(
        &self,
        network: &str,
        proposal_id: u64,
    ) -> Result<Option<ProposalLog>, StoreError> {
        self.check()?;
        Ok(self
            .proposals
            .lock()
            .unwrap()
            .get(&(network.to_string(), proposal_id))
            .cloned())
    }

    fn list_proposal_logs(
        &self,
        network: Option<&str>,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<ProposalLog>, StoreError> {
        self.check()?;
        Ok(self
            .proposals
            .lock()
            .unwrap()
            .values()
            .filter(|row| network.map_or(true, |n| row.network == n))
            .filter(|row| row.updated_at >= from && row.updated_at <= to)
            .cloned()
            .collect())
    }
}

impl RewardStore for NullStore {
    fn record_reward(&self, record: &RewardRecord) -> Result<(), StoreError> {
        self.check()?;
        let mut rewards = self.rewards.lock().unwrap();
        let duplicate = rewards.iter().any(|r| {
            r.chain_id == record.chain_id
                && r.period == record.period
                && r.validator_address == record.validator_address
        });
        if duplicate {
            return Err(StoreError::AlreadyExists(format!(
                "{}/{}/{}",
                record.chain_id, record.period, record.validator_address
            )));
        }
        rewards.push(record.clone());
        Ok(())
    }

    fn update_reward(&self, record: &RewardRecord) -> Result<(), StoreError> {
        self.check()?;
        let mut rewards = self.rewards.lock().unwrap();
        let existing = rewards.iter_mut().find(|r| {
            r.chain_id == record.chain_id
                && r.period == record.period
                && r.validator_address == record.validator_address
        });
        match existing {
            Some(row) => {
                *row = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "{}/{}/{}",
                record.chain_id, record.period, record.validator_address
            ))),
        }
    }

    fn release_reward(
        &self,
        chain_id: &str,
        period: &str,
        validator_address: &str,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.rewards.lock().unwrap().retain(|r| {
            !(r.chain_id == chain_id
                && r.period == period
                && r.validator_address == validator_address)
        });
        Ok(())
    }

    fn reward_already_recorded(&self, chain_id: &str, period: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self
            .rewards
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.chain_id == chain_id && r.period == period))
    }

    fn list_rewards(
        &self,
        chain_id: &str,
        period: Option<&str>,
    ) -> Result<Vec<RewardRecord>, StoreError> {
        self.check()?;
        Ok(self
            .rewards
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.chain_id == chain_id && period.map_or(true, |p| r.period == p))
            .cloned()
            .collect())
    }
}
