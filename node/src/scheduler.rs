//! Periodic job scheduling with single-flight guards.
//!
//! Every job runs on its own interval. A tick that arrives while the
//! previous pass of the same job is still running is skipped, so two passes
//! of one job never overlap.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::agent::{Agent, PassSummary};
use crate::config::ScheduleConfig;
use crate::shutdown::ShutdownController;
use crate::{NodeError, NodeMetrics};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobKind {
    Proposals,
    Balances,
    AuthzSync,
    RewardSweep,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::Proposals,
        JobKind::Balances,
        JobKind::AuthzSync,
        JobKind::RewardSweep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Proposals => "proposals",
            JobKind::Balances => "balances",
            JobKind::AuthzSync => "authz_sync",
            JobKind::RewardSweep => "reward_sweep",
        }
    }

    /// Human wording used in failure alerts.
    pub fn description(&self) -> &'static str {
        match self {
            JobKind::Proposals => "proposal poll",
            JobKind::Balances => "balance check",
            JobKind::AuthzSync => "grant sync",
            JobKind::RewardSweep => "reward sweep",
        }
    }

    pub fn interval(&self, schedule: &ScheduleConfig) -> Duration {
        let secs = match self {
            JobKind::Proposals => schedule.proposals_interval_secs,
            JobKind::Balances => schedule.balances_interval_secs,
            JobKind::AuthzSync => schedule.authz_interval_secs,
            JobKind::RewardSweep => schedule.rewards_interval_secs,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobKind {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|job| job.as_str() == s)
            .ok_or_else(|| NodeError::InvalidInput(format!("unknown job: {s}")))
    }
}

/// At most one holder at a time.
#[derive(Debug, Default)]
pub struct JobGuard {
    running: AtomicBool,
}

/// Held for the duration of a pass; releases the guard on drop.
#[derive(Debug)]
pub struct JobLease<'a> {
    guard: &'a JobGuard,
}

impl JobGuard {
    pub fn try_acquire(&self) -> Option<JobLease<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| JobLease { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for JobLease<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

pub struct Scheduler {
    agent: Arc<Agent>,
    intervals: Vec<(JobKind, Duration)>,
    pass_timeout: Duration,
    guards: HashMap<JobKind, Arc<JobGuard>>,
    metrics: NodeMetrics,
}

impl Scheduler {
    pub fn new(agent: Arc<Agent>, schedule: &ScheduleConfig) -> Self {
        let metrics = agent.metrics().clone();
        Self {
            agent,
            intervals: JobKind::ALL
                .into_iter()
                .map(|job| (job, job.interval(schedule)))
                .collect(),
            pass_timeout: Duration::from_secs(schedule.pass_timeout_secs),
            guards: JobKind::ALL
                .into_iter()
                .map(|job| (job, Arc::new(JobGuard::default())))
                .collect(),
            metrics,
        }
    }

    pub fn guard(&self, job: JobKind) -> Arc<JobGuard> {
        self.guards
            .get(&job)
            .cloned()
            .unwrap_or_default()
    }

    /// Run one pass of `job` unless one is already running.
    ///
    /// Returns `None` for a skipped tick. A pass that exceeds the pass
    /// timeout is abandoned and reported.
    pub async fn run_once(&self, job: JobKind) -> Option<Result<PassSummary, NodeError>> {
        let guard = self.guard(job);
        let Some(_lease) = guard.try_acquire() else {
            self.metrics
                .passes_skipped
                .with_label_values(&[job.as_str()])
                .inc();
            tracing::warn!(%job, "previous pass still running, tick skipped");
            return None;
        };

        self.metrics
            .passes_run
            .with_label_values(&[job.as_str()])
            .inc();
        let timer = self
            .metrics
            .pass_duration_seconds
            .with_label_values(&[job.as_str()])
            .start_timer();
        let result = match tokio::time::timeout(self.pass_timeout, self.agent.run_job(job)).await {
            Ok(result) => result,
            Err(_) => Err(NodeError::PassTimeout(self.pass_timeout.as_secs())),
        };
        timer.observe_duration();

        match &result {
            Ok(summary) => tracing::info!(
                %job,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "pass complete"
            ),
            Err(e) => {
                tracing::error!(%job, error = %e, "pass failed");
                self.agent.report_failure(job.description(), e).await;
            }
        }
        Some(result)
    }

    /// Start one interval loop per job. Passes run on their own tasks so a
    /// slow pass shows up as skipped ticks.
    pub fn spawn(self: Arc<Self>, shutdown: &ShutdownController) -> Vec<JoinHandle<()>> {
        self.intervals
            .iter()
            .map(|&(job, period)| {
                let scheduler = self.clone();
                let mut shutdown_rx = shutdown.subscribe();
                let stopped = shutdown.clone();
                tokio::spawn(async move {
                    if stopped.is_triggered() {
                        return;
                    }
                    let mut ticker = tokio::time::interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    tracing::info!(%job, interval_secs = period.as_secs(), "job scheduled");
                    loop {
                        tokio::select! {
                            _ = ticker.tick() => {
                                let scheduler = scheduler.clone();
                                tokio::spawn(async move {
                                    scheduler.run_once(job).await;
                                });
                            }
                            _ = shutdown_rx.recv() => {
                                tracing::info!(%job, "job loop shutting down");
                                break;
                            }
                        }
                    }
                })
            })
            .collect()
    }
}
