//! Prometheus metrics for the agent.
//!
//! Counters cover every scheduled pass and the work done inside it: proposals
//! seen and missed, grant checks, sweeps, broadcasts, and alerts. The
//! [`NodeMetrics`] struct owns a dedicated [`Registry`] that the API's
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, HistogramOpts,
    HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Central collection of all agent-level Prometheus metrics.
#[derive(Clone)]
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Passes started, by job.
    pub passes_run: IntCounterVec,
    /// Ticks dropped because the previous pass of the job was still running.
    pub passes_skipped: IntCounterVec,
    /// Per-network failures inside a pass, by job.
    pub network_failures: IntCounterVec,
    pub proposals_seen: IntCounter,
    pub missed_proposals: IntCounter,
    pub alerts_sent: IntCounter,
    pub alerts_failed: IntCounter,
    pub grant_checks: IntCounter,
    pub sweeps_executed: IntCounter,
    /// Sweeps skipped by the once-per-period guard or for lack of grants.
    pub sweeps_skipped: IntCounter,
    pub votes_cast: IntCounter,
    pub broadcasts_failed: IntCounter,
    pub low_balances: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Proposals in their voting period at the last proposal pass.
    pub active_proposals: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    pub pass_duration_seconds: HistogramVec,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| {
            register_int_counter_with_registry!(Opts::new(name, help), registry)
        };
        let per_job = |name: &str, help: &str| {
            register_int_counter_vec_with_registry!(Opts::new(name, help), &["job"], registry)
        };

        let passes_run = per_job("vigil_passes_total", "Scheduled passes started")?;
        let passes_skipped = per_job(
            "vigil_passes_skipped_total",
            "Scheduled ticks skipped while the previous pass was running",
        )?;
        let network_failures = per_job(
            "vigil_network_failures_total",
            "Per-network failures inside a pass",
        )?;
        let proposals_seen = counter(
            "vigil_proposals_seen_total",
            "Proposals in voting period observed by proposal passes",
        )?;
        let missed_proposals = counter(
            "vigil_missed_proposals_total",
            "Active proposals the tracked validator had not voted on",
        )?;
        let alerts_sent = counter("vigil_alerts_sent_total", "Alerts delivered")?;
        let alerts_failed = counter(
            "vigil_alerts_failed_total",
            "Alerts that could not be delivered",
        )?;
        let grant_checks = counter("vigil_grant_checks_total", "Authz grant queries")?;
        let sweeps_executed = counter(
            "vigil_sweeps_executed_total",
            "Reward sweeps that broadcast a withdrawal",
        )?;
        let sweeps_skipped = counter(
            "vigil_sweeps_skipped_total",
            "Reward sweeps skipped (already recorded or no grants)",
        )?;
        let votes_cast = counter("vigil_votes_cast_total", "Votes cast through authz")?;
        let broadcasts_failed = counter(
            "vigil_broadcasts_failed_total",
            "Broadcasts that failed or returned a non-zero code",
        )?;
        let low_balances = counter(
            "vigil_low_balances_total",
            "Balance checks at or below one whole token",
        )?;

        let active_proposals = register_int_gauge_with_registry!(
            Opts::new(
                "vigil_active_proposals",
                "Proposals in voting period at the last proposal pass"
            ),
            registry
        )?;

        let pass_duration_seconds = register_histogram_vec_with_registry!(
            HistogramOpts::new("vigil_pass_duration_seconds", "Wall time of one pass")
                .buckets(vec![0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 1800.0]),
            &["job"],
            registry
        )?;

        Ok(Self {
            registry,
            passes_run,
            passes_skipped,
            network_failures,
            proposals_seen,
            missed_proposals,
            alerts_sent,
            alerts_failed,
            grant_checks,
            sweeps_executed,
            sweeps_skipped,
            votes_cast,
            broadcasts_failed,
            low_balances,
            active_proposals,
            pass_duration_seconds,
        })
    }

    /// Text exposition of every metric.
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_text_output() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.passes_run.with_label_values(&["proposals"]).inc();
        metrics.missed_proposals.inc_by(3);
        metrics.active_proposals.set(4);
        let text = metrics.gather_text().unwrap();
        assert!(text.contains("vigil_passes_total{job=\"proposals\"} 1"));
        assert!(text.contains("vigil_missed_proposals_total 3"));
        assert!(text.contains("vigil_active_proposals 4"));
    }

    #[test]
    fn registries_are_independent() {
        let a = NodeMetrics::new().unwrap();
        let b = NodeMetrics::new().unwrap();
        a.alerts_sent.inc();
        assert_eq!(b.alerts_sent.get(), 0);
    }
}
