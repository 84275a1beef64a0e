//! Registration of validators and delegated keys.

use serde::Serialize;
use std::sync::Arc;

use vigil_crypto::AddressCodec;
use vigil_network::ChainDirectory;
use vigil_store::Stores;
use vigil_types::{Clock, DelegatedKey, KeyPurpose, Validator};

use crate::NodeError;

/// Everything currently registered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Registrations {
    pub validators: Vec<Validator>,
    pub keys: Vec<DelegatedKey>,
}

/// Validates addresses against the network's bech32 prefixes before
/// writing to the store.
pub struct Registrar {
    stores: Stores,
    directory: Arc<dyn ChainDirectory>,
    clock: Arc<dyn Clock>,
}

impl Registrar {
    pub fn new(stores: Stores, directory: Arc<dyn ChainDirectory>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            directory,
            clock,
        }
    }

    async fn codec(&self, network: &str) -> Result<AddressCodec, NodeError> {
        let meta = self.directory.network_metadata(network).await?;
        Ok(AddressCodec::for_network(&meta)?)
    }

    /// Track `operator_address` on `network`. One validator per network.
    pub async fn register_validator(
        &self,
        network: &str,
        operator_address: &str,
    ) -> Result<Validator, NodeError> {
        let operator_address = operator_address.trim();
        self.codec(network)
            .await?
            .validate_operator_address(operator_address)?;
        let validator = Validator::new(network, operator_address, self.clock.now());
        self.stores.validators.insert_validator(&validator)?;
        tracing::info!(network, operator = operator_address, "validator registered");
        Ok(validator)
    }

    pub fn remove_validator(&self, network: &str) -> Result<(), NodeError> {
        self.stores.validators.remove_validator(network)?;
        tracing::info!(network, "validator removed");
        Ok(())
    }

    /// Register (or replace) the key used for `purpose` on `network`.
    pub async fn add_key(
        &self,
        network: &str,
        purpose: KeyPurpose,
        key_name: &str,
        grantee_address: &str,
    ) -> Result<DelegatedKey, NodeError> {
        let key_name = key_name.trim();
        if key_name.is_empty() {
            return Err(NodeError::InvalidInput("key name is empty".to_string()));
        }
        let grantee_address = grantee_address.trim();
        self.codec(network)
            .await?
            .validate_account_address(grantee_address)?;
        let key = DelegatedKey::new(network, purpose, key_name, grantee_address);
        self.stores.keys.put_key(&key)?;
        tracing::info!(network, %purpose, key_name, grantee = grantee_address, "key registered");
        Ok(key)
    }

    pub fn remove_key(&self, network: &str, purpose: KeyPurpose) -> Result<(), NodeError> {
        self.stores.keys.remove_key(network, purpose)?;
        tracing::info!(network, %purpose, "key removed");
        Ok(())
    }

    pub fn list(&self) -> Result<Registrations, NodeError> {
        Ok(Registrations {
            validators: self.stores.validators.list_validators()?,
            keys: self.stores.keys.list_keys()?,
        })
    }
}
