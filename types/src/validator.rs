//! Registered validators.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// A validator tracked on one network. At most one per network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Chain-registry network name.
    pub network: String,
    /// Bech32 validator operator address (`<prefix>valoper1...`).
    pub operator_address: String,
    pub registered_at: Timestamp,
}

impl Validator {
    pub fn new(
        network: impl Into<String>,
        operator_address: impl Into<String>,
        registered_at: Timestamp,
    ) -> Self {
        Self {
            network: network.into(),
            operator_address: operator_address.into(),
            registered_at,
        }
    }
}
