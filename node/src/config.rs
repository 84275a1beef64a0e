//! Agent configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use vigil_types::{DenomInfo, GovApiVersion, RewardPeriod};

use crate::NodeError;

/// Configuration for a vigil agent.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to serve the read-only HTTP API.
    #[serde(default = "default_true")]
    pub enable_api: bool,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Whether the API exposes `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// IPFS gateway used for proposal metadata documents.
    #[serde(default = "default_ipfs_gateway")]
    pub ipfs_gateway: String,

    /// Raw-content base URL of the chain registry.
    #[serde(default = "default_registry_base_url")]
    pub registry_base_url: String,

    /// Deadline of every chain query.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Deadline of the endpoint sync check.
    #[serde(default = "default_health_check_timeout_secs")]
    pub health_check_timeout_secs: u64,

    /// Try endpoint candidates in random order.
    #[serde(default = "default_true")]
    pub shuffle_endpoints: bool,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub slack: SlackConfig,

    #[serde(default)]
    pub chain_client: ChainClientConfig,

    /// Per-network overrides keyed by chain-registry name.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkOverride>,
}

/// Cadence of the periodic jobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_proposals_interval_secs")]
    pub proposals_interval_secs: u64,

    #[serde(default = "default_balances_interval_secs")]
    pub balances_interval_secs: u64,

    #[serde(default = "default_authz_interval_secs")]
    pub authz_interval_secs: u64,

    /// How often the reward sweep checks for an unswept period.
    #[serde(default = "default_rewards_interval_secs")]
    pub rewards_interval_secs: u64,

    /// At most one sweep per validator per period.
    #[serde(default)]
    pub reward_period: RewardPeriod,

    /// Upper bound on one pass of any job.
    #[serde(default = "default_pass_timeout_secs")]
    pub pass_timeout_secs: u64,
}

/// Slack bot credentials. Alerts are only logged when `bot_token` is empty.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub bot_token: String,

    #[serde(default)]
    pub channel_id: String,

    #[serde(default = "default_slack_api_base_url")]
    pub api_base_url: String,
}

/// How the external chain binary is invoked for signing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainClientConfig {
    /// Directory holding chain binaries; `PATH` lookup when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_dir: Option<PathBuf>,

    #[serde(default = "default_keyring_backend")]
    pub keyring_backend: String,

    /// `--home` of the keyring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,

    #[serde(default = "default_gas_adjustment")]
    pub gas_adjustment: f64,

    /// Flat fee, e.g. `5000uatom`. Takes precedence over gas prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<String>,

    #[serde(default = "default_memo")]
    pub memo: String,

    #[serde(default = "default_tx_poll_interval_secs")]
    pub tx_poll_interval_secs: u64,

    #[serde(default = "default_tx_poll_attempts")]
    pub tx_poll_attempts: u32,
}

/// Static settings for one network, all optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkOverride {
    /// REST endpoints used instead of the registry list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<String>,

    /// Skip governance API detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gov_api: Option<GovApiVersion>,

    /// Mintscan slug when it differs from the registry name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_name: Option<String>,

    /// Base denom, e.g. `uatom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denom: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_denom: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,

    /// Name of the chain binary, e.g. `gaiad`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_binary: Option<String>,

    /// Tendermint RPC endpoint handed to the chain binary as `--node`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_endpoint: Option<String>,

    /// Gas prices, e.g. `0.025uatom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_prices: Option<String>,
}

impl NetworkOverride {
    /// Denom metadata when the override names a base denom and decimals.
    ///
    /// The display denom defaults to the base denom without its `u`/`a`
    /// scale prefix, upper-cased.
    pub fn denom_info(&self) -> Option<DenomInfo> {
        let base = self.denom.as_deref()?;
        let decimals = self.decimals?;
        let display = match &self.display_denom {
            Some(display) => display.clone(),
            None => base
                .strip_prefix('u')
                .or_else(|| base.strip_prefix('a'))
                .unwrap_or(base)
                .to_ascii_uppercase(),
        };
        Some(DenomInfo::new(base, display, decimals))
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./vigil_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_port() -> u16 {
    7070
}

fn default_ipfs_gateway() -> String {
    vigil_network::ipfs::DEFAULT_GATEWAY.to_string()
}

fn default_registry_base_url() -> String {
    vigil_network::registry::DEFAULT_REGISTRY_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_health_check_timeout_secs() -> u64 {
    10
}

fn default_proposals_interval_secs() -> u64 {
    12 * 3600
}

fn default_balances_interval_secs() -> u64 {
    12 * 3600
}

fn default_authz_interval_secs() -> u64 {
    24 * 3600
}

fn default_rewards_interval_secs() -> u64 {
    2 * 3600
}

fn default_pass_timeout_secs() -> u64 {
    30 * 60
}

fn default_slack_api_base_url() -> String {
    vigil_alerts::sink::DEFAULT_SLACK_API.to_string()
}

fn default_keyring_backend() -> String {
    "test".to_string()
}

fn default_gas_adjustment() -> f64 {
    1.5
}

fn default_memo() -> String {
    "vigil".to_string()
}

fn default_tx_poll_interval_secs() -> u64 {
    3
}

fn default_tx_poll_attempts() -> u32 {
    20
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout_secs)
    }

    pub fn network(&self, name: &str) -> Option<&NetworkOverride> {
        self.networks.get(name)
    }

    /// Configured explorer slug for `network`.
    pub fn explorer_name(&self, network: &str) -> Option<&str> {
        self.network(network)?.explorer_name.as_deref()
    }

    /// Reject values that would make the agent misbehave silently.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.log_format.parse::<crate::LogFormat>().is_err() {
            return Err(NodeError::Config(format!(
                "log_format must be \"human\" or \"json\", got {:?}",
                self.log_format
            )));
        }
        if self.http_timeout_secs == 0 || self.health_check_timeout_secs == 0 {
            return Err(NodeError::Config("timeouts must be non-zero".to_string()));
        }
        let s = &self.schedule;
        let intervals = [
            ("proposals_interval_secs", s.proposals_interval_secs),
            ("balances_interval_secs", s.balances_interval_secs),
            ("authz_interval_secs", s.authz_interval_secs),
            ("rewards_interval_secs", s.rewards_interval_secs),
            ("pass_timeout_secs", s.pass_timeout_secs),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(NodeError::Config(format!("schedule.{name} must be non-zero")));
        }
        if !self.slack.bot_token.is_empty() && self.slack.channel_id.is_empty() {
            return Err(NodeError::Config(
                "slack.channel_id is required when slack.bot_token is set".to_string(),
            ));
        }
        if self.chain_client.gas_adjustment <= 0.0 {
            return Err(NodeError::Config(
                "chain_client.gas_adjustment must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_api: default_true(),
            api_port: default_api_port(),
            enable_metrics: false,
            ipfs_gateway: default_ipfs_gateway(),
            registry_base_url: default_registry_base_url(),
            http_timeout_secs: default_http_timeout_secs(),
            health_check_timeout_secs: default_health_check_timeout_secs(),
            shuffle_endpoints: default_true(),
            schedule: ScheduleConfig::default(),
            slack: SlackConfig::default(),
            chain_client: ChainClientConfig::default(),
            networks: BTreeMap::new(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            proposals_interval_secs: default_proposals_interval_secs(),
            balances_interval_secs: default_balances_interval_secs(),
            authz_interval_secs: default_authz_interval_secs(),
            rewards_interval_secs: default_rewards_interval_secs(),
            reward_period: RewardPeriod::default(),
            pass_timeout_secs: default_pass_timeout_secs(),
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            api_base_url: default_slack_api_base_url(),
        }
    }
}

impl Default for ChainClientConfig {
    fn default() -> Self {
        Self {
            binary_dir: None,
            keyring_backend: default_keyring_backend(),
            home: None,
            gas_adjustment: default_gas_adjustment(),
            fees: None,
            memo: default_memo(),
            tx_poll_interval_secs: default_tx_poll_interval_secs(),
            tx_poll_attempts: default_tx_poll_attempts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.api_port, config.api_port);
        assert_eq!(
            parsed.schedule.proposals_interval_secs,
            config.schedule.proposals_interval_secs
        );
        assert_eq!(parsed.schedule.reward_period, RewardPeriod::Monthly);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.api_port, 7070);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.health_check_timeout_secs, 10);
        assert_eq!(config.ipfs_gateway, "https://ipfs.io/ipfs");
        assert_eq!(config.schedule.proposals_interval_secs, 43_200);
        assert_eq!(config.schedule.authz_interval_secs, 86_400);
        assert_eq!(config.schedule.rewards_interval_secs, 7_200);
        assert_eq!(config.log_format, "human");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            api_port = 9999
            log_format = "json"

            [schedule]
            reward_period = "daily"

            [slack]
            bot_token = "xoxb-1"
            channel_id = "C0123"

            [networks.evmos]
            denom = "aevmos"
            decimals = 18
            gov_api = "v1beta1"
            endpoints = ["https://rest.evmos.test/"]
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.api_port, 9999);
        assert_eq!(config.log_format, "json");
        assert_eq!(config.schedule.reward_period, RewardPeriod::Daily);
        assert_eq!(config.schedule.balances_interval_secs, 43_200); // default
        assert_eq!(config.slack.api_base_url, "https://slack.com/api");
        let evmos = config.network("evmos").unwrap();
        assert_eq!(evmos.gov_api, Some(GovApiVersion::V1Beta1));
        assert_eq!(
            evmos.denom_info(),
            Some(DenomInfo::new("aevmos", "EVMOS", 18))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/vigil.toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn denom_override_needs_decimals() {
        let partial = NetworkOverride {
            denom: Some("ujuno".into()),
            ..Default::default()
        };
        assert_eq!(partial.denom_info(), None);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = NodeConfig::default();
        config.log_format = "xml".into();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.schedule.pass_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.slack.bot_token = "xoxb-1".into();
        assert!(config.validate().is_err());
    }
}
