//! Chain state for the devnet
//!
//! Holds the deployed registry, confirmed per-sender nonces, the block list
//! and the receipt index. Only the ledger actor writes (through
//! [`Storage::commit_block`]); reads go straight to storage without passing
//! through the actor mailbox.
//!
//! # Layout
//!
//! - `state` - registry, confirmed nonces and blocks behind one lock, so a
//!   block and its state transitions become visible together
//! - `receipts` - receipt index (key: tx hash)

use crate::{
    config::Config,
    crypto::{contract_address, merkle_root},
    error::{Error, Result},
    registry::{CallContext, CertificateRegistry},
    types::{
        Address, Block, QueryResult, Receipt, RegistryCall, RegistryQuery, Role, Transaction,
        TxHash, TxStatus,
    },
};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

struct ChainState {
    registry: CertificateRegistry,
    confirmed_nonces: HashMap<Address, u64>,
    blocks: Vec<Block>,
}

impl ChainState {
    fn latest(&self) -> Result<&Block> {
        self.blocks
            .last()
            .ok_or_else(|| Error::Concurrency("chain has no genesis block".to_string()))
    }
}

/// In-memory chain state
pub struct Storage {
    chain_id: u64,
    registry_address: Address,
    state: RwLock<ChainState>,
    receipts: DashMap<TxHash, Receipt>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("chain_id", &self.chain_id)
            .field("registry_address", &self.registry_address)
            .field("receipts", &self.receipts.len())
            .finish()
    }
}

impl Storage {
    /// Create the chain: deploy the registry from `deployer`, apply genesis
    /// provisioning and seal block 0
    pub fn open(config: &Config, deployer: Address) -> Result<Self> {
        let registry_address = contract_address(&deployer, 0);
        let mut registry = CertificateRegistry::deploy(registry_address, deployer, &config.registry);

        let timestamp = Utc::now().timestamp();
        let ctx = CallContext {
            sender: deployer,
            timestamp,
        };

        for issuer in &config.genesis.issuers {
            registry.execute(
                &ctx,
                &RegistryCall::GrantRole {
                    role: Role::issuer(),
                    account: *issuer,
                },
            )?;
        }

        for name in &config.genesis.universities {
            registry.execute(&ctx, &RegistryCall::ApproveUniversity { name: name.clone() })?;
        }

        let mut genesis = Block {
            block_id: Uuid::now_v7(),
            number: 0,
            tx_root: merkle_root(&[]),
            parent_hash: [0u8; 32],
            hash: [0u8; 32],
            tx_hashes: Vec::new(),
            timestamp,
            created_at: Utc::now(),
        };
        genesis.hash = genesis.compute_hash();

        tracing::info!(
            chain_id = config.chain_id,
            registry = %registry_address,
            admin = %deployer,
            issuers = config.genesis.issuers.len(),
            universities = config.genesis.universities.len(),
            "Deployed certificate registry"
        );

        Ok(Self {
            chain_id: config.chain_id,
            registry_address,
            state: RwLock::new(ChainState {
                registry,
                confirmed_nonces: HashMap::new(),
                blocks: vec![genesis],
            }),
            receipts: DashMap::new(),
        })
    }

    /// Network identifier
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Address of the deployed registry
    pub fn registry_address(&self) -> Address {
        self.registry_address
    }

    /// Read-only registry call against confirmed state
    pub fn call(&self, query: &RegistryQuery) -> Result<QueryResult> {
        self.state.read().registry.query(query)
    }

    /// Evaluate `tx` against confirmed state with `pending` applied first.
    /// Nothing is committed.
    pub fn dry_run(&self, pending: &[Transaction], tx: &Transaction) -> Result<()> {
        let state = self.state.read();
        let timestamp = state.latest()?.timestamp;
        let ctx = |tx: &Transaction| CallContext {
            sender: tx.from(),
            timestamp,
        };

        if pending.is_empty() {
            return state.registry.precheck(&ctx(tx), &tx.unsigned.call);
        }

        let mut registry = state.registry.clone();
        drop(state);
        for queued in pending {
            // Queued calls that would revert simply leave the scratch state unchanged
            let _ = registry.execute(&ctx(queued), &queued.unsigned.call);
        }
        registry.precheck(&ctx(tx), &tx.unsigned.call)
    }

    /// Next nonce expected from `address` by confirmed state
    pub fn confirmed_nonce(&self, address: &Address) -> u64 {
        self.state
            .read()
            .confirmed_nonces
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Receipt of an included transaction
    pub fn get_receipt(&self, tx_hash: &TxHash) -> Option<Receipt> {
        self.receipts.get(tx_hash).map(|entry| entry.value().clone())
    }

    /// Most recent block
    pub fn latest_block(&self) -> Result<Block> {
        self.state.read().latest().cloned()
    }

    /// Block by number
    pub fn get_block(&self, number: u64) -> Result<Block> {
        let state = self.state.read();
        usize::try_from(number)
            .ok()
            .and_then(|index| state.blocks.get(index))
            .cloned()
            .ok_or(Error::BlockNotFound(number))
    }

    /// Execute `txs` in order and seal them into the next block
    ///
    /// Reverted calls still consume their nonce and get a receipt. The block,
    /// state changes and receipts become visible together.
    pub fn commit_block(&self, txs: Vec<(TxHash, Transaction)>) -> Result<(Block, Vec<Receipt>)> {
        let mut state = self.state.write();

        let parent = state.latest()?.clone();
        let timestamp = Utc::now().timestamp().max(parent.timestamp);
        let number = parent.number + 1;

        let mut receipts = Vec::with_capacity(txs.len());
        for (tx_hash, tx) in &txs {
            let ctx = CallContext {
                sender: tx.from(),
                timestamp,
            };

            let (status, logs) = match state.registry.execute(&ctx, &tx.unsigned.call) {
                Ok(logs) => (TxStatus::Success, logs),
                Err(Error::Revert(reason)) => (TxStatus::Reverted { reason }, Vec::new()),
                Err(e) => (
                    TxStatus::Reverted {
                        reason: e.to_string(),
                    },
                    Vec::new(),
                ),
            };

            if let TxStatus::Reverted { reason } = &status {
                tracing::debug!(
                    tx_hash = %tx_hash,
                    method = tx.unsigned.call.method_name(),
                    reason = %reason,
                    "Transaction reverted"
                );
            }

            state
                .confirmed_nonces
                .insert(tx.from(), tx.unsigned.nonce + 1);

            receipts.push(Receipt {
                tx_hash: *tx_hash,
                block_number: number,
                block_hash: [0u8; 32],
                from: tx.from(),
                to: tx.unsigned.to,
                status,
                logs,
            });
        }

        let tx_hashes: Vec<TxHash> = txs.iter().map(|(hash, _)| *hash).collect();
        let leaves: Vec<[u8; 32]> = tx_hashes.iter().map(|hash| *hash.as_bytes()).collect();

        let mut block = Block {
            block_id: Uuid::now_v7(),
            number,
            tx_root: merkle_root(&leaves),
            parent_hash: parent.hash,
            hash: [0u8; 32],
            tx_hashes,
            timestamp,
            created_at: Utc::now(),
        };
        block.hash = block.compute_hash();

        for receipt in &mut receipts {
            receipt.block_hash = block.hash;
            self.receipts.insert(receipt.tx_hash, receipt.clone());
        }
        state.blocks.push(block.clone());

        Ok((block, receipts))
    }
}
