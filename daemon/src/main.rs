//! vigil daemon: runs the governance agent and its administrative commands.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use vigil_node::{init_logging, JobKind, LogFormat, NodeConfig, SweepOutcome, VigilNode};
use vigil_types::{KeyPurpose, VoteOption};

#[derive(Parser)]
#[command(name = "vigil", about = "Cosmos validator governance agent", version)]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "VIGIL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VIGIL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VIGIL_LOG_FORMAT")]
    log_format: Option<String>,

    /// API server port.
    #[arg(long, env = "VIGIL_API_PORT")]
    api_port: Option<u16>,

    /// Do not serve the HTTP API.
    #[arg(long, env = "VIGIL_DISABLE_API")]
    disable_api: bool,

    /// Expose Prometheus metrics on the API.
    #[arg(long, env = "VIGIL_ENABLE_METRICS")]
    metrics: bool,

    /// Slack bot token; alerts are only logged without one.
    #[arg(long, env = "VIGIL_SLACK_BOT_TOKEN", hide_env_values = true)]
    slack_token: Option<String>,

    /// Slack channel id alerts are posted to.
    #[arg(long, env = "VIGIL_SLACK_CHANNEL")]
    slack_channel: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the scheduler and the API until SIGINT/SIGTERM.
    Run,
    /// Run one pass of a job (or all of them) and exit.
    PollOnce {
        /// proposals, balances, authz_sync or reward_sweep.
        job: Option<JobKind>,
    },
    /// Track a validator on a network.
    RegisterValidator { network: String, operator_address: String },
    /// Stop tracking the validator of a network.
    RemoveValidator { network: String },
    /// Register the delegated key used for `purpose` on a network.
    AddKey {
        network: String,
        /// voting or rewards.
        purpose: KeyPurpose,
        /// Name of the key in the chain binary's keyring.
        key_name: String,
        grantee_address: String,
    },
    RemoveKey { network: String, purpose: KeyPurpose },
    /// Print registered validators and keys as JSON.
    List,
    /// Vote on a proposal through the voting key.
    Vote {
        network: String,
        proposal_id: u64,
        /// yes, no, abstain or no_with_veto.
        option: VoteOption,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Withdraw rewards and commission on one network now.
    Sweep { network: String },
    /// Print the effective configuration.
    PrintConfig,
}

impl Cli {
    /// File configuration (or defaults) with flags applied on top.
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::from_toml_file(&path.to_string_lossy())
                .with_context(|| format!("loading {}", path.display()))?,
            None => NodeConfig::default(),
        };
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        if let Some(port) = self.api_port {
            config.api_port = port;
        }
        if self.disable_api {
            config.enable_api = false;
        }
        config.enable_metrics |= self.metrics;
        if let Some(token) = &self.slack_token {
            config.slack.bot_token = token.clone();
        }
        if let Some(channel) = &self.slack_channel {
            config.slack.channel_id = channel.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.node_config()?;
    init_logging(config.log_format.parse::<LogFormat>()?, &config.log_level)?;

    if let Command::PrintConfig = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let mut node = VigilNode::new(config)?;
    match cli.command {
        Command::Run => {
            node.run().await?;
            tracing::info!("vigil daemon exited cleanly");
        }
        Command::PollOnce { job } => {
            let jobs = match job {
                Some(job) => vec![job],
                None => JobKind::ALL.to_vec(),
            };
            for job in jobs {
                let summary = node.poll_once(job).await?;
                println!(
                    "{job}: {} succeeded, {} failed",
                    summary.succeeded, summary.failed
                );
            }
        }
        Command::RegisterValidator {
            network,
            operator_address,
        } => {
            let validator = node
                .agent()
                .registrar()
                .register_validator(&network, &operator_address)
                .await?;
            println!("registered {} on {}", validator.operator_address, validator.network);
        }
        Command::RemoveValidator { network } => {
            node.agent().registrar().remove_validator(&network)?;
            println!("removed validator on {network}");
        }
        Command::AddKey {
            network,
            purpose,
            key_name,
            grantee_address,
        } => {
            let key = node
                .agent()
                .registrar()
                .add_key(&network, purpose, &key_name, &grantee_address)
                .await?;
            println!("registered {} key {} ({})", key.purpose, key.key_name, key.grantee_address);
        }
        Command::RemoveKey { network, purpose } => {
            node.agent().registrar().remove_key(&network, purpose)?;
            println!("removed {purpose} key on {network}");
        }
        Command::List => {
            let all = node.agent().registrar().list()?;
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        Command::Vote {
            network,
            proposal_id,
            option,
            memo,
        } => {
            let receipt = node
                .agent()
                .cast_vote(&network, proposal_id, option, memo.as_deref())
                .await?;
            println!(
                "voted {} on proposal {} ({}): {}",
                receipt.option, receipt.proposal_id, receipt.network, receipt.tx_url
            );
        }
        Command::Sweep { network } => match node.agent().sweep_network(&network).await? {
            SweepOutcome::AlreadyRecorded { period } => {
                println!("already swept for period {period}");
            }
            SweepOutcome::NoGrants => println!("no withdrawal is granted on {network}"),
            SweepOutcome::Executed {
                totals, tx_url, ..
            } => println!(
                "withdrew rewards {} and commission {}: {tx_url}",
                totals.rewards, totals.commission
            ),
        },
        Command::PrintConfig => {}
    }

    Ok(())
}
