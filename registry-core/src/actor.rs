//! Actor-based block production for the devnet
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One logical writer owns the mempool and seals blocks, so transaction
//!   order is total and nonces advance without races
//! - Admission (chain id, target, signature, nonce, dry run) happens in the
//!   actor, against confirmed state plus the mempool
//! - Async message passing with backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │          Providers / sessions (many tasks)            │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │ Mempool: Vec<(TxHash, Transaction)>            │  │
//! │  │ automine | block_time tick | max_txs → seal    │  │
//! │  └────────────────────────────────────────────────┘  │
//! │                       │                               │
//! │                       ▼                               │
//! │           Storage::commit_block()                     │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::config::{BlockConfig, Config};
use crate::metrics::Metrics;
use crate::types::{Address, Block, Transaction, TxHash};
use crate::{Error, Result, Storage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Duration, Instant};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Admit a signed transaction to the mempool
    SubmitTransaction {
        tx: Box<Transaction>,
        response: oneshot::Sender<Result<TxHash>>,
    },

    /// Next nonce for an address, counting mempool transactions
    TransactionCount {
        address: Address,
        response: oneshot::Sender<u64>,
    },

    /// Seal a block now, even if the mempool is empty
    MineBlock {
        response: oneshot::Sender<Result<Block>>,
    },

    /// Number of transactions waiting for inclusion
    PendingCount { response: oneshot::Sender<usize> },

    /// Shutdown actor
    Shutdown,
}

/// Actor that admits transactions and produces blocks
pub struct LedgerActor {
    /// Chain state
    storage: Arc<Storage>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Admitted, not yet included
    mempool: Vec<(TxHash, Transaction)>,

    /// Block production settings
    block: BlockConfig,

    /// Metrics
    metrics: Metrics,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        storage: Arc<Storage>,
        mailbox: mpsc::Receiver<LedgerMessage>,
        block: BlockConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            storage,
            mailbox,
            mempool: Vec::with_capacity(block.max_txs_per_block),
            block,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let period = Duration::from_millis(self.block.block_time_ms);
        let mut block_timer = interval_at(Instant::now() + period, period);
        block_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Process incoming messages
                Some(msg) = self.mailbox.recv() => {
                    if let LedgerMessage::Shutdown = msg {
                        self.drain_mempool();
                        break;
                    }
                    self.handle_message(msg);

                    while self.block_due() {
                        if let Err(e) = self.produce_block() {
                            tracing::error!("Error producing block: {}", e);
                            break;
                        }
                    }
                }

                // Block time elapsed
                _ = block_timer.tick(), if !self.mempool.is_empty() => {
                    if let Err(e) = self.produce_block() {
                        tracing::error!("Error producing block on tick: {}", e);
                    }
                }

                // Mailbox closed
                else => {
                    self.drain_mempool();
                    break;
                }
            }
        }

        tracing::debug!("Ledger actor stopped");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::SubmitTransaction { tx, response } => {
                let result = self.admit(*tx);
                let _ = response.send(result);
            }

            LedgerMessage::TransactionCount { address, response } => {
                let _ = response.send(self.next_nonce(&address));
            }

            LedgerMessage::MineBlock { response } => {
                let _ = response.send(self.produce_block());
            }

            LedgerMessage::PendingCount { response } => {
                let _ = response.send(self.mempool.len());
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn block_due(&self) -> bool {
        !self.mempool.is_empty()
            && (self.block.automine || self.mempool.len() >= self.block.max_txs_per_block)
    }

    fn next_nonce(&self, address: &Address) -> u64 {
        let queued = self
            .mempool
            .iter()
            .filter(|(_, tx)| tx.from() == *address)
            .count() as u64;
        self.storage.confirmed_nonce(address) + queued
    }

    /// Admission checks, in order: chain, target, signature, nonce, dry run
    fn admit(&mut self, tx: Transaction) -> Result<TxHash> {
        if tx.unsigned.chain_id != self.storage.chain_id() {
            return Err(Error::InvalidTransaction(format!(
                "invalid chain id: expected {}, got {}",
                self.storage.chain_id(),
                tx.unsigned.chain_id
            )));
        }

        if tx.unsigned.to != self.storage.registry_address() {
            return Err(Error::InvalidTransaction(format!(
                "unknown contract address {}",
                tx.unsigned.to
            )));
        }

        tx.verify_signature()?;

        let expected = self.next_nonce(&tx.from());
        if tx.unsigned.nonce < expected {
            return Err(Error::InvalidTransaction(format!(
                "nonce too low: expected {}, got {}",
                expected, tx.unsigned.nonce
            )));
        }
        if tx.unsigned.nonce > expected {
            return Err(Error::InvalidTransaction(format!(
                "nonce too high: expected {}, got {}",
                expected, tx.unsigned.nonce
            )));
        }

        let pending: Vec<Transaction> = self.mempool.iter().map(|(_, tx)| tx.clone()).collect();
        self.storage.dry_run(&pending, &tx)?;

        let tx_hash = tx.hash()?;
        tracing::info!(
            tx_hash = %tx_hash,
            from = %tx.from(),
            nonce = tx.unsigned.nonce,
            method = tx.unsigned.call.method_name(),
            "Transaction admitted"
        );

        self.mempool.push((tx_hash, tx));
        self.metrics.record_transaction();

        Ok(tx_hash)
    }

    /// Seal up to `max_txs_per_block` mempool transactions into a block
    fn produce_block(&mut self) -> Result<Block> {
        let take = self.mempool.len().min(self.block.max_txs_per_block);
        let batch: Vec<(TxHash, Transaction)> = self.mempool.drain(..take).collect();

        let (block, receipts) = self.storage.commit_block(batch)?;

        let reverted = receipts.iter().filter(|r| !r.is_success()).count();
        for _ in 0..reverted {
            self.metrics.record_revert();
        }
        self.metrics.record_block(block.tx_hashes.len());

        tracing::info!(
            block_number = block.number,
            tx_count = block.tx_hashes.len(),
            reverted,
            "Block produced"
        );

        Ok(block)
    }

    fn drain_mempool(&mut self) {
        while !self.mempool.is_empty() {
            if let Err(e) = self.produce_block() {
                tracing::error!("Error producing block on shutdown: {}", e);
                break;
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(message(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Submit a signed transaction
    pub async fn submit_transaction(&self, tx: Transaction) -> Result<TxHash> {
        self.request(|response| LedgerMessage::SubmitTransaction {
            tx: Box::new(tx),
            response,
        })
        .await?
    }

    /// Next nonce for `address`, counting mempool transactions
    pub async fn transaction_count(&self, address: Address) -> Result<u64> {
        self.request(|response| LedgerMessage::TransactionCount { address, response })
            .await
    }

    /// Seal a block now
    pub async fn mine_block(&self) -> Result<Block> {
        self.request(|response| LedgerMessage::MineBlock { response })
            .await?
    }

    /// Number of transactions waiting for inclusion
    pub async fn pending_count(&self) -> Result<usize> {
        self.request(|response| LedgerMessage::PendingCount { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(storage: Arc<Storage>, config: &Config, metrics: Metrics) -> LedgerHandle {
    // Bounded channel for backpressure
    let (tx, rx) = mpsc::channel(config.mailbox_capacity);
    let actor = LedgerActor::new(storage, rx, config.block.clone(), metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
