//! Delegated key storage.

use crate::StoreError;
use vigil_types::{DelegatedKey, GrantStatus, KeyPurpose, Timestamp};

/// One key per (network, purpose).
pub trait KeyStore: Send + Sync {
    /// Insert or replace the key for `(key.network, key.purpose)`.
    fn put_key(&self, key: &DelegatedKey) -> Result<(), StoreError>;

    fn get_key(&self, network: &str, purpose: KeyPurpose)
        -> Result<Option<DelegatedKey>, StoreError>;

    fn remove_key(&self, network: &str, purpose: KeyPurpose) -> Result<(), StoreError>;

    /// All keys, ordered by network then purpose.
    fn list_keys(&self) -> Result<Vec<DelegatedKey>, StoreError>;

    /// Record the result of a grant check. Fails with `NotFound` if no key
    /// is registered for the pair.
    fn set_grant_status(
        &self,
        network: &str,
        purpose: KeyPurpose,
        status: GrantStatus,
        checked_at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Record the grant state of one message type for the key. Fails with
    /// `NotFound` if no key is registered for the pair.
    fn set_action_grant(
        &self,
        network: &str,
        purpose: KeyPurpose,
        type_url: &str,
        status: GrantStatus,
        checked_at: Timestamp,
    ) -> Result<(), StoreError>;
}
