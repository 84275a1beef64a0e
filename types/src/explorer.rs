//! Block explorer links.

/// Explorer (Mintscan) slug for a chain-registry network name, falling back
/// to the registry name itself.
pub fn explorer_name(network: &str) -> &str {
    match network {
        "cosmos" | "cosmoshub" => "cosmos",
        "omniflixhub" => "omniflix",
        "gravitybridge" => "gravity-bridge",
        other => other,
    }
}

/// Builds explorer URLs for one network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplorerLinks {
    base_url: String,
    slug: String,
}

impl ExplorerLinks {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.mintscan.io";

    /// Links for `network`, with an optional slug override from configuration.
    pub fn for_network(network: &str, slug_override: Option<&str>) -> Self {
        let slug = slug_override
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| explorer_name(network));
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            slug: slug.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn proposal_url(&self, proposal_id: u64) -> String {
        format!("{}/{}/proposals/{}", self.base_url, self.slug, proposal_id)
    }

    pub fn tx_url(&self, txhash: &str) -> String {
        format!("{}/{}/tx/{}", self.base_url, self.slug, txhash)
    }
}
