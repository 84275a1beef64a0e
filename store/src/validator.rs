//! Validator registration storage.

use crate::StoreError;
use vigil_types::Validator;

/// One validator per network.
pub trait ValidatorStore: Send + Sync {
    /// Register a validator. Fails with `AlreadyExists` if the network already
    /// has one.
    fn insert_validator(&self, validator: &Validator) -> Result<(), StoreError>;

    fn get_validator(&self, network: &str) -> Result<Option<Validator>, StoreError>;

    /// Deregister the validator of a network. Fails with `NotFound` if none.
    fn remove_validator(&self, network: &str) -> Result<(), StoreError>;

    /// All registered validators, ordered by network name.
    fn list_validators(&self) -> Result<Vec<Validator>, StoreError>;
}
