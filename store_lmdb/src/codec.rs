//! Value encoding and composite key layout.
//!
//! Composite keys join their parts with a NUL byte so that a prefix scan on
//! `network\0` never matches a longer network name sharing the same start.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::LmdbError;

const SEPARATOR: u8 = 0;

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

/// `part\0part\0...` with a trailing separator after every part but the last.
pub(crate) fn composite_key(parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.len() + 1).sum();
    let mut key = Vec::with_capacity(len);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.extend_from_slice(part);
    }
    key
}

/// Prefix matching every composite key whose first parts equal `parts`.
pub(crate) fn prefix_key(parts: &[&[u8]]) -> Vec<u8> {
    let mut key = composite_key(parts);
    key.push(SEPARATOR);
    key
}

/// `network\0<proposal id big-endian>`; sorts by network then id.
pub(crate) fn proposal_key(network: &str, proposal_id: u64) -> Vec<u8> {
    composite_key(&[network.as_bytes(), &proposal_id.to_be_bytes()])
}
