//! vigil agent: watches governance and delegated keys of the registered
//! validators and acts through authz grants.
//!
//! The agent:
//! - Polls active proposals and reports the ones its validators have not voted on
//! - Keeps the cached authz grant state of every delegated key current
//! - Sweeps rewards and commission once per period through `MsgExec`
//! - Casts votes on request through the voting key
//! - Alerts when a grantee account runs low on fees

pub mod admin;
pub mod agent;
pub mod balance;
pub mod config;
pub mod error;
pub mod executor;
pub mod grants;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod profile;
pub mod scheduler;
pub mod shutdown;
pub mod signer;

pub use admin::{Registrar, Registrations};
pub use agent::{Agent, Collaborators, LogSink, PassSummary};
pub use balance::{BalanceMonitor, BalanceReport};
pub use config::{ChainClientConfig, NetworkOverride, NodeConfig, ScheduleConfig, SlackConfig};
pub use error::NodeError;
pub use executor::{DelegatedExecutor, SweepOutcome, VoteReceipt};
pub use grants::{required_type_urls, GrantChecker};
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::VigilNode;
pub use profile::NetworkProfiles;
pub use scheduler::{JobGuard, JobKind, JobLease, Scheduler};
pub use shutdown::ShutdownController;
pub use signer::CliChainClient;
