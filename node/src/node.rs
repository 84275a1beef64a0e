//! The vigil node: opens storage, builds the production collaborators and
//! runs the scheduler and the read-only API until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use vigil_alerts::{AlertSink, SlackClient};
use vigil_network::{
    CachedDirectory, ChainDirectory, ChainRegistryClient, ReqwestTransport, RestTransport,
};
use vigil_rpc::{RpcServer, RpcState};
use vigil_store_lmdb::LmdbEnvironment;
use vigil_types::SystemClock;

use crate::agent::{Agent, Collaborators, LogSink, PassSummary};
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::scheduler::{JobKind, Scheduler};
use crate::shutdown::ShutdownController;
use crate::signer::CliChainClient;
use crate::NetworkProfiles;

/// Time allowed for background tasks to finish after the shutdown signal.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct VigilNode {
    config: NodeConfig,
    agent: Arc<Agent>,
    scheduler: Arc<Scheduler>,
    metrics: NodeMetrics,
    shutdown: ShutdownController,
    task_handles: Vec<JoinHandle<()>>,
}

impl VigilNode {
    /// Open the data directory and build the production collaborators.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)?;
        let env = LmdbEnvironment::open_default(&config.data_dir)?;

        let transport: Arc<dyn RestTransport> = Arc::new(ReqwestTransport::new());
        let registry =
            ChainRegistryClient::with_base_url(transport.clone(), &config.registry_base_url)
                .with_timeout(config.http_timeout());
        let directory: Arc<dyn ChainDirectory> = Arc::new(CachedDirectory::new(Arc::new(registry)));
        let chain = Arc::new(CliChainClient::new(
            config.chain_client.clone(),
            NetworkProfiles::new(config.networks.clone()),
            transport.clone(),
            config.http_timeout(),
        ));
        let alert_sink: Arc<dyn AlertSink> = if config.slack.bot_token.is_empty() {
            tracing::warn!("no slack bot token configured, alerts are only logged");
            Arc::new(LogSink)
        } else {
            Arc::new(SlackClient::with_base_url(
                config.slack.bot_token.clone(),
                &config.slack.api_base_url,
            ))
        };

        Self::with_collaborators(
            config,
            Collaborators {
                stores: env.stores(),
                directory,
                transport,
                chain,
                alert_sink,
                clock: Arc::new(SystemClock),
            },
        )
    }

    /// Build a node over caller-supplied collaborators.
    pub fn with_collaborators(config: NodeConfig, parts: Collaborators) -> Result<Self, NodeError> {
        let metrics = NodeMetrics::new().map_err(|e| NodeError::Other(e.to_string()))?;
        let agent = Arc::new(Agent::new(&config, parts, metrics.clone()));
        let scheduler = Arc::new(Scheduler::new(agent.clone(), &config.schedule));
        Ok(Self {
            config,
            agent,
            scheduler,
            metrics,
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
        })
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Run one pass of `job` outside the schedule.
    pub async fn poll_once(&self, job: JobKind) -> Result<PassSummary, NodeError> {
        self.scheduler
            .run_once(job)
            .await
            .ok_or_else(|| NodeError::Other(format!("a {job} pass is already running")))?
    }

    /// Start the job loops and, when enabled, the HTTP API.
    pub fn start(&mut self) {
        let handles = self.scheduler.clone().spawn(&self.shutdown);
        self.task_handles.extend(handles);

        if self.config.enable_api {
            let state = RpcState {
                stores: self.agent.stores().clone(),
                metrics: self
                    .config
                    .enable_metrics
                    .then(|| self.metrics.registry.clone()),
            };
            let server = RpcServer::new(self.config.api_port, state);
            let mut shutdown_rx = self.shutdown.subscribe();
            let handle = tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::info!("API server shutting down");
                    }
                    result = server.start() => {
                        match result {
                            Ok(()) => tracing::info!("API server exited"),
                            Err(e) => tracing::error!("API server error: {e}"),
                        }
                    }
                }
            });
            self.task_handles.push(handle);
        }

        tracing::info!(
            api = self.config.enable_api,
            port = self.config.api_port,
            "vigil node started"
        );
    }

    /// Start, wait for SIGINT/SIGTERM, then stop.
    pub async fn run(&mut self) -> Result<(), NodeError> {
        self.start();
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    /// Signal every task and wait for them to finish.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("vigil node stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all)
            .await
            .is_err()
        {
            tracing::warn!(
                "shutdown timeout ({:?}), some tasks may still be running",
                SHUTDOWN_TIMEOUT
            );
        }

        tracing::info!("vigil node stopped");
        Ok(())
    }
}
