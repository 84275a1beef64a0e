//! Reward ledger storage.

use crate::StoreError;
use vigil_types::RewardRecord;

/// Record of withdrawals, one per (chain id, period, validator).
pub trait RewardStore: Send + Sync {
    /// Insert a record. Fails with `AlreadyExists` if the same
    /// (chain id, period, validator) is already present.
    fn record_reward(&self, record: &RewardRecord) -> Result<(), StoreError>;

    /// Replace an existing record, e.g. to fill in totals once the
    /// transaction is seen committed. Fails with `NotFound` otherwise.
    fn update_reward(&self, record: &RewardRecord) -> Result<(), StoreError>;

    /// Drop a claim whose transaction never reached the chain.
    fn release_reward(
        &self,
        chain_id: &str,
        period: &str,
        validator_address: &str,
    ) -> Result<(), StoreError>;

    /// Whether any withdrawal was recorded for the chain in `period`.
    fn reward_already_recorded(&self, chain_id: &str, period: &str) -> Result<bool, StoreError>;

    /// Records of a chain, optionally limited to one period.
    fn list_rewards(
        &self,
        chain_id: &str,
        period: Option<&str>,
    ) -> Result<Vec<RewardRecord>, StoreError>;
}
