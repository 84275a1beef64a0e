//! Bech32 conversion between validator operator and account addresses.

use bech32::{Bech32, Hrp};

use vigil_types::NetworkMetadata;

use crate::AddressError;

/// Suffix appended to the account prefix to form the operator prefix.
const VALOPER_SUFFIX: &str = "valoper";

/// Bech32 prefixes of one network.
#[derive(Clone, Debug)]
pub struct AddressCodec {
    account_hrp: Hrp,
    validator_hrp: Hrp,
}

impl AddressCodec {
    /// Codec for an account prefix such as `cosmos`; the operator prefix is
    /// derived as `<prefix>valoper`.
    pub fn new(account_prefix: &str) -> Result<Self, AddressError> {
        let account_hrp = Hrp::parse(account_prefix)
            .map_err(|e| AddressError::InvalidPrefix(format!("{account_prefix}: {e}")))?;
        let validator_prefix = format!("{account_prefix}{VALOPER_SUFFIX}");
        let validator_hrp = Hrp::parse(&validator_prefix)
            .map_err(|e| AddressError::InvalidPrefix(format!("{validator_prefix}: {e}")))?;
        Ok(Self {
            account_hrp,
            validator_hrp,
        })
    }

    /// Codec for a network described by the chain directory.
    pub fn for_network(meta: &NetworkMetadata) -> Result<Self, AddressError> {
        if meta.bech32_prefix.is_empty() {
            return Err(AddressError::UnknownNetwork(meta.name.clone()));
        }
        Self::new(&meta.bech32_prefix)
    }

    pub fn account_prefix(&self) -> &str {
        self.account_hrp.as_str()
    }

    pub fn validator_prefix(&self) -> &str {
        self.validator_hrp.as_str()
    }

    /// Convert an operator address into the account address that owns it.
    pub fn to_account_address(&self, operator_address: &str) -> Result<String, AddressError> {
        let payload = decode_with(operator_address, &self.validator_hrp)?;
        encode_with(&self.account_hrp, &payload)
    }

    /// Convert an account address into its operator address.
    pub fn to_operator_address(&self, account_address: &str) -> Result<String, AddressError> {
        let payload = decode_with(account_address, &self.account_hrp)?;
        encode_with(&self.validator_hrp, &payload)
    }

    /// Check that `address` is a well-formed operator address of this network.
    pub fn validate_operator_address(&self, address: &str) -> Result<(), AddressError> {
        decode_with(address, &self.validator_hrp).map(|_| ())
    }

    /// Check that `address` is a well-formed account address of this network.
    pub fn validate_account_address(&self, address: &str) -> Result<(), AddressError> {
        decode_with(address, &self.account_hrp).map(|_| ())
    }

    /// Raw payload bytes of an address carrying either prefix.
    pub fn payload(&self, address: &str) -> Result<Vec<u8>, AddressError> {
        let (hrp, payload) = decode_any(address)?;
        if hrp != self.account_hrp && hrp != self.validator_hrp {
            return Err(invalid(
                address,
                format!(
                    "expected prefix {} or {}, found {}",
                    self.account_hrp, self.validator_hrp, hrp
                ),
            ));
        }
        Ok(payload)
    }
}

fn decode_any(address: &str) -> Result<(Hrp, Vec<u8>), AddressError> {
    bech32::decode(address).map_err(|e| invalid(address, e.to_string()))
}

fn decode_with(address: &str, expected: &Hrp) -> Result<Vec<u8>, AddressError> {
    let (hrp, payload) = decode_any(address)?;
    if hrp != *expected {
        return Err(invalid(
            address,
            format!("expected prefix {expected}, found {hrp}"),
        ));
    }
    if payload.is_empty() {
        return Err(invalid(address, "empty payload".to_string()));
    }
    Ok(payload)
}

fn encode_with(hrp: &Hrp, payload: &[u8]) -> Result<String, AddressError> {
    bech32::encode::<Bech32>(*hrp, payload).map_err(|e| AddressError::InvalidAddress {
        address: hrp.to_string(),
        reason: e.to_string(),
    })
}

fn invalid(address: &str, reason: String) -> AddressError {
    AddressError::InvalidAddress {
        address: address.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COSMOS_VALOPER: &str = "cosmosvaloper1sjllsnramtg3ewxqwwrwjxfgc4n4ef9u2lcnj0";
    const COSMOS_ACCOUNT: &str = "cosmos1sjllsnramtg3ewxqwwrwjxfgc4n4ef9u0tvx7u";
    const COSMOS_PAYLOAD_HEX: &str = "84bff84c7ddad11cb8c07386e91928c5675ca4bc";

    const OSMO_VALOPER: &str = "osmovaloper1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5dwhd8f";
    const OSMO_ACCOUNT: &str = "osmo1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5helwsw";

    #[test]
    fn operator_converts_to_known_account() {
        let codec = AddressCodec::new("cosmos").unwrap();
        assert_eq!(codec.to_account_address(COSMOS_VALOPER).unwrap(), COSMOS_ACCOUNT);
    }

    #[test]
    fn converted_address_keeps_raw_bytes() {
        let codec = AddressCodec::new("cosmos").unwrap();
        let account = codec.to_account_address(COSMOS_VALOPER).unwrap();
        let from_operator = codec.payload(COSMOS_VALOPER).unwrap();
        let from_account = codec.payload(&account).unwrap();
        assert_eq!(hex::encode(&from_operator), COSMOS_PAYLOAD_HEX);
        assert_eq!(from_operator, from_account);
    }

    #[test]
    fn account_converts_back_to_operator() {
        let codec = AddressCodec::new("cosmos").unwrap();
        assert_eq!(codec.to_operator_address(COSMOS_ACCOUNT).unwrap(), COSMOS_VALOPER);
    }

    #[test]
    fn codecs_for_different_networks_are_independent() {
        let cosmos = AddressCodec::new("cosmos").unwrap();
        let osmo = AddressCodec::new("osmo").unwrap();
        assert_eq!(osmo.to_account_address(OSMO_VALOPER).unwrap(), OSMO_ACCOUNT);
        assert_eq!(cosmos.to_account_address(COSMOS_VALOPER).unwrap(), COSMOS_ACCOUNT);
    }

    #[test]
    fn concurrent_conversions_do_not_interfere() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        let codec = AddressCodec::new("cosmos").unwrap();
                        (0..100)
                            .map(|_| codec.to_account_address(COSMOS_VALOPER).unwrap())
                            .all(|a| a == COSMOS_ACCOUNT)
                    } else {
                        let codec = AddressCodec::new("osmo").unwrap();
                        (0..100)
                            .map(|_| codec.to_account_address(OSMO_VALOPER).unwrap())
                            .all(|a| a == OSMO_ACCOUNT)
                    }
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn wrong_prefix_is_invalid_address() {
        let codec = AddressCodec::new("osmo").unwrap();
        let err = codec.to_account_address(COSMOS_VALOPER).unwrap_err();
        assert!(matches!(err, AddressError::InvalidAddress { .. }));
    }

    #[test]
    fn account_address_is_not_an_operator_address() {
        let codec = AddressCodec::new("cosmos").unwrap();
        assert!(codec.validate_operator_address(COSMOS_ACCOUNT).is_err());
        assert!(codec.validate_account_address(COSMOS_ACCOUNT).is_ok());
    }

    #[test]
    fn bad_checksum_is_invalid_address() {
        let codec = AddressCodec::new("cosmos").unwrap();
        let corrupted = "cosmosvaloper1sjllsnramtg3ewxqwwrwjxfgc4n4ef9u2lcnj1";
        assert!(matches!(
            codec.to_account_address(corrupted),
            Err(AddressError::InvalidAddress { .. })
        ));
        assert!(codec.to_account_address("not-an-address").is_err());
    }

    #[test]
    fn empty_network_prefix_is_unknown_network() {
        let meta = NetworkMetadata {
            name: "mystery".into(),
            chain_id: "mystery-1".into(),
            bech32_prefix: String::new(),
            slip44: 118,
            denom: None,
        };
        assert_eq!(
            AddressCodec::for_network(&meta).unwrap_err(),
            AddressError::UnknownNetwork("mystery".into())
        );
    }

    #[test]
    fn prefixes_are_exposed() {
        let codec = AddressCodec::new("juno").unwrap();
        assert_eq!(codec.account_prefix(), "juno");
        assert_eq!(codec.validator_prefix(), "junovaloper");
    }
}
