//! Network identity, denomination metadata, and governance API versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Which governance module query surface a network serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovApiVersion {
    /// Legacy `cosmos.gov.v1beta1` with nested `content` objects.
    V1Beta1,
    /// Current `cosmos.gov.v1` with `messages` and `metadata`.
    V1,
}

impl GovApiVersion {
    /// Path segment used in REST routes (`/cosmos/gov/{segment}/...`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::V1Beta1 => "v1beta1",
            Self::V1 => "v1",
        }
    }

    /// Type URL of the vote message for this version.
    pub fn vote_type_url(&self) -> &'static str {
        match self {
            Self::V1Beta1 => "/cosmos.gov.v1beta1.MsgVote",
            Self::V1 => "/cosmos.gov.v1.MsgVote",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.path_segment()
    }
}

impl fmt::Display for GovApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GovApiVersion {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1beta1" | "legacy" => Ok(Self::V1Beta1),
            "v1" => Ok(Self::V1),
            other => Err(TypesError::InvalidApiVersion(other.to_string())),
        }
    }
}

/// Native token metadata for a network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomInfo {
    /// Base (smallest unit) denom, e.g. `uatom`.
    pub base: String,
    /// Human display denom, e.g. `ATOM`.
    pub display: String,
    /// Exponent between `base` and `display`.
    pub decimals: u32,
}

impl DenomInfo {
    pub fn new(base: impl Into<String>, display: impl Into<String>, decimals: u32) -> Self {
        Self {
            base: base.into(),
            display: display.into(),
            decimals,
        }
    }

    /// One whole display unit expressed in base units (`10^decimals`).
    ///
    /// Returns `None` if the exponent does not fit in a u128.
    pub fn one_unit(&self) -> Option<u128> {
        10u128.checked_pow(self.decimals)
    }
}

/// Static denomination table for networks commonly tracked by operators.
pub fn builtin_denom(network: &str) -> Option<DenomInfo> {
    let (base, display, decimals) = match network {
        "cosmos" | "cosmoshub" => ("uatom", "ATOM", 6),
        "osmosis" => ("uosmo", "OSMO", 6),
        "regen" => ("uregen", "REGEN", 6),
        "akash" => ("uakt", "AKT", 6),
        "stride" => ("ustrd", "STRD", 6),
        "juno" => ("ujuno", "JUNO", 6),
        "umee" => ("uumee", "UMEE", 6),
        "omniflixhub" => ("uflix", "FLIX", 6),
        "axelar" => ("uaxl", "AXL", 6),
        "bandchain" => ("uband", "BAND", 6),
        "comdex" => ("ucmdx", "CMDX", 6),
        "desmos" => ("udsm", "DSM", 6),
        "emoney" => ("ungm", "NGM", 6),
        "evmos" => ("aevmos", "EVMOS", 18),
        "gravitybridge" => ("ugraviton", "GRAV", 6),
        "tgrade" => ("utgd", "TGD", 6),
        "stargaze" => ("ustars", "STARS", 6),
        "sentinel" => ("udvpn", "DVPN", 6),
        "quicksilver" => ("uqck", "QCK", 6),
        "persistence" => ("uxprt", "XPRT", 6),
        "passage" => ("upasg", "PASG", 6),
        _ => return None,
    };
    Some(DenomInfo::new(base, display, decimals))
}

/// Identity of one tracked blockchain as published by the chain directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMetadata {
    /// Registry name, e.g. `cosmoshub`.
    pub name: String,
    /// Chain id, e.g. `cosmoshub-4`.
    pub chain_id: String,
    /// Account address prefix, e.g. `cosmos`.
    pub bech32_prefix: String,
    /// BIP-44 coin type.
    pub slip44: u32,
    /// Native token, when the asset list or static table knows it.
    pub denom: Option<DenomInfo>,
}

impl NetworkMetadata {
    /// Prefix of validator operator addresses (`<prefix>valoper`).
    pub fn validator_prefix(&self) -> String {
        format!("{}valoper", self.bech32_prefix)
    }
}
