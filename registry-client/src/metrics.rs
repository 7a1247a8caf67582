//! Client metrics
//!
//! - `client_submissions_total` - Transactions broadcast
//! - `client_outcomes_total{status}` - Mutation outcomes by status
//! - `client_confirmation_seconds` - Time from broadcast to receipt

use crate::outcome::OutcomeStatus;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct ClientMetrics {
    /// Transactions broadcast
    pub submissions_total: IntCounter,

    /// Outcomes by status
    pub outcomes_total: IntCounterVec,

    /// Confirmation latency
    pub confirmation_seconds: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl ClientMetrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let submissions_total =
            IntCounter::new("client_submissions_total", "Transactions broadcast")?;
        registry.register(Box::new(submissions_total.clone()))?;

        let outcomes_total = IntCounterVec::new(
            Opts::new("client_outcomes_total", "Mutation outcomes by status"),
            &["status"],
        )?;
        registry.register(Box::new(outcomes_total.clone()))?;

        let confirmation_seconds = Histogram::with_opts(
            HistogramOpts::new("client_confirmation_seconds", "Time from broadcast to receipt")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]),
        )?;
        registry.register(Box::new(confirmation_seconds.clone()))?;

        Ok(Self {
            submissions_total,
            outcomes_total,
            confirmation_seconds,
            registry,
        })
    }

    /// Record a broadcast
    pub fn record_submission(&self) {
        self.submissions_total.inc();
    }

    /// Record an outcome
    pub fn record_outcome(&self, status: OutcomeStatus) {
        self.outcomes_total.with_label_values(&[status.as_str()]).inc();
    }

    /// Record confirmation latency
    pub fn record_confirmation(&self, seconds: f64) {
        self.confirmation_seconds.observe(seconds);
    }

    /// Outcomes recorded for a status
    pub fn outcome_count(&self, status: OutcomeStatus) -> u64 {
        self.outcomes_total.with_label_values(&[status.as_str()]).get()
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for ClientMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientMetrics")
            .field("submissions_total", &self.submissions_total.get())
            .finish()
    }
}
