//! Per-network settings merged from configuration, the chain directory, and
//! the built-in tables.

use std::collections::BTreeMap;

use vigil_types::{builtin_denom, DenomInfo, ExplorerLinks, NetworkMetadata};

use crate::config::NetworkOverride;

#[derive(Clone, Debug, Default)]
pub struct NetworkProfiles {
    overrides: BTreeMap<String, NetworkOverride>,
}

impl NetworkProfiles {
    pub fn new(overrides: BTreeMap<String, NetworkOverride>) -> Self {
        Self { overrides }
    }

    pub fn get(&self, network: &str) -> Option<&NetworkOverride> {
        self.overrides.get(network)
    }

    pub fn explorer(&self, network: &str) -> ExplorerLinks {
        let slug = self.get(network).and_then(|o| o.explorer_name.as_deref());
        ExplorerLinks::for_network(network, slug)
    }

    /// Native denom: configuration, then the directory's asset list, then
    /// the built-in table.
    pub fn denom(&self, network: &str, meta: Option<&NetworkMetadata>) -> Option<DenomInfo> {
        self.get(network)
            .and_then(NetworkOverride::denom_info)
            .or_else(|| meta.and_then(|m| m.denom.clone()))
            .or_else(|| builtin_denom(network))
    }
}
