use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid bech32 prefix: {0}")]
    InvalidPrefix(String),

    #[error("no address prefix known for network {0}")]
    UnknownNetwork(String),
}
