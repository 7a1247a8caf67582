//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the devnet.
//!
//! # Metrics
//!
//! - `devnet_transactions_total` - Transactions admitted to the mempool
//! - `devnet_reverts_total` - Transactions reverted at inclusion
//! - `devnet_blocks_total` - Blocks produced
//! - `devnet_block_size` - Histogram of transactions per block
//!
//! Collectors are registered on a per-instance [`Registry`] so several
//! devnets can coexist in one process.

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Transactions admitted
    pub transactions_total: IntCounter,

    /// Transactions reverted at inclusion
    pub reverts_total: IntCounter,

    /// Blocks produced
    pub blocks_total: IntCounter,

    /// Block size histogram
    pub block_size: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounter::new(
            "devnet_transactions_total",
            "Transactions admitted to the mempool",
        )?;
        registry.register(Box::new(transactions_total.clone()))?;

        let reverts_total =
            IntCounter::new("devnet_reverts_total", "Transactions reverted at inclusion")?;
        registry.register(Box::new(reverts_total.clone()))?;

        let blocks_total = IntCounter::new("devnet_blocks_total", "Blocks produced")?;
        registry.register(Box::new(blocks_total.clone()))?;

        let block_size = Histogram::with_opts(
            HistogramOpts::new("devnet_block_size", "Histogram of transactions per block")
                .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        )?;
        registry.register(Box::new(block_size.clone()))?;

        Ok(Self {
            transactions_total,
            reverts_total,
            blocks_total,
            block_size,
            registry,
        })
    }

    /// Record transaction admission
    pub fn record_transaction(&self) {
        self.transactions_total.inc();
    }

    /// Record a revert at inclusion
    pub fn record_revert(&self) {
        self.reverts_total.inc();
    }

    /// Record block production
    pub fn record_block(&self, tx_count: usize) {
        self.blocks_total.inc();
        self.block_size.observe(tx_count as f64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("transactions_total", &self.transactions_total.get())
            .field("blocks_total", &self.blocks_total.get())
            .finish_non_exhaustive()
    }
}
