//! In-process provider
//!
//! Routes requests to devnet [`Ledger`]s running in the same process, keyed
//! by chain id, behind a wallet model that only knows the chains registered
//! with it. Every request is recorded by its RPC method name so callers can
//! inspect what reached the provider and in which order.

use super::{
    LedgerProvider, ProviderError, ProviderResult, CHAIN_DISCONNECTED, DISCONNECTED,
    EXECUTION_REVERTED, INTERNAL_ERROR, TRANSACTION_REJECTED, UNRECOGNIZED_CHAIN, USER_REJECTED,
};
use crate::config::NetworkParams;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use registry_core::{
    Address, Error as LedgerError, Ledger, QueryResult, Receipt, RegistryQuery, Transaction, TxHash,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
struct WalletState {
    active_chain: u64,
    known_chains: HashSet<u64>,
    connected: bool,
    reject_switch: bool,
}

/// Provider backed by in-process devnet ledgers
#[derive(Debug)]
pub struct InProcessProvider {
    nodes: DashMap<u64, Arc<Ledger>>,
    wallet: RwLock<WalletState>,
    requests: Mutex<Vec<String>>,
}

impl InProcessProvider {
    /// Wallet on `active_chain`, knowing only that chain
    pub fn new(active_chain: u64) -> Self {
        Self {
            nodes: DashMap::new(),
            wallet: RwLock::new(WalletState {
                active_chain,
                known_chains: HashSet::from([active_chain]),
                connected: true,
                reject_switch: false,
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Wallet connected to `ledger`'s chain
    pub fn connected_to(ledger: Arc<Ledger>) -> Self {
        let provider = Self::new(ledger.chain_id());
        provider.add_node(ledger);
        provider
    }

    /// Make a ledger reachable. The wallet does not learn its chain.
    pub fn add_node(&self, ledger: Arc<Ledger>) {
        self.nodes.insert(ledger.chain_id(), ledger);
    }

    /// Teach the wallet a chain without a request
    pub fn register_chain(&self, chain_id: u64) {
        self.wallet.write().known_chains.insert(chain_id);
    }

    /// Whether the wallet knows a chain
    pub fn knows_chain(&self, chain_id: u64) -> bool {
        self.wallet.read().known_chains.contains(&chain_id)
    }

    /// Simulate the user declining network switches
    pub fn set_reject_switch(&self, reject: bool) {
        self.wallet.write().reject_switch = reject;
    }

    /// Simulate the provider losing or regaining its connection
    pub fn set_connected(&self, connected: bool) {
        self.wallet.write().connected = connected;
    }

    /// Methods requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Forget recorded requests
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn record(&self, method: &str) {
        self.requests.lock().push(method.to_string());
    }

    fn ensure_connected(&self) -> ProviderResult<()> {
        if self.wallet.read().connected {
            Ok(())
        } else {
            Err(ProviderError::rpc(DISCONNECTED, "Provider is disconnected from all chains"))
        }
    }

    fn active_node(&self) -> ProviderResult<Arc<Ledger>> {
        self.ensure_connected()?;
        let chain_id = self.wallet.read().active_chain;
        self.nodes
            .get(&chain_id)
            .map(|node| node.value().clone())
            .ok_or_else(|| {
                ProviderError::rpc(
                    CHAIN_DISCONNECTED,
                    format!("Provider is disconnected from chain 0x{:x}", chain_id),
                )
            })
    }
}

/// Map a ledger error onto the RPC error a node would return
fn rpc_error(err: LedgerError) -> ProviderError {
    match err {
        LedgerError::Revert(reason) => {
            ProviderError::rpc(EXECUTION_REVERTED, format!("execution reverted: {}", reason))
        }
        LedgerError::InvalidTransaction(message) | LedgerError::SignatureError(message) => {
            ProviderError::rpc(TRANSACTION_REJECTED, message)
        }
        LedgerError::Concurrency(message) => ProviderError::Transport(message),
        other => ProviderError::rpc(INTERNAL_ERROR, other.to_string()),
    }
}

#[async_trait]
impl LedgerProvider for InProcessProvider {
    async fn chain_id(&self) -> ProviderResult<u64> {
        self.record("eth_chainId");
        self.ensure_connected()?;
        Ok(self.wallet.read().active_chain)
    }

    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        self.record("wallet_switchEthereumChain");
        self.ensure_connected()?;

        let mut wallet = self.wallet.write();
        if wallet.reject_switch {
            return Err(ProviderError::rpc(USER_REJECTED, "User rejected the request."));
        }
        if !wallet.known_chains.contains(&chain_id) {
            return Err(ProviderError::rpc(
                UNRECOGNIZED_CHAIN,
                format!(
                    "Unrecognized chain ID \"0x{:x}\". Try adding the chain using wallet_addEthereumChain first.",
                    chain_id
                ),
            ));
        }

        info!(from = wallet.active_chain, to = chain_id, "Wallet switched chain");
        wallet.active_chain = chain_id;
        Ok(())
    }

    async fn add_chain(&self, params: &NetworkParams) -> ProviderResult<()> {
        self.record("wallet_addEthereumChain");
        self.ensure_connected()?;

        let mut wallet = self.wallet.write();
        if wallet.reject_switch {
            return Err(ProviderError::rpc(USER_REJECTED, "User rejected the request."));
        }
        info!(chain_id = params.chain_id, name = %params.name, "Wallet registered chain");
        wallet.known_chains.insert(params.chain_id);
        Ok(())
    }

    async fn call(&self, to: Address, query: &RegistryQuery) -> ProviderResult<QueryResult> {
        self.record("eth_call");
        let node = self.active_node()?;
        debug!(to = %to, "eth_call");
        node.call(to, query).map_err(rpc_error)
    }

    async fn transaction_count(&self, address: Address) -> ProviderResult<u64> {
        self.record("eth_getTransactionCount");
        let node = self.active_node()?;
        node.transaction_count(address).await.map_err(rpc_error)
    }

    async fn send_transaction(&self, tx: Transaction) -> ProviderResult<TxHash> {
        self.record("eth_sendRawTransaction");
        let node = self.active_node()?;
        node.submit_transaction(tx).await.map_err(rpc_error)
    }

    async fn transaction_receipt(&self, tx_hash: &TxHash) -> ProviderResult<Option<Receipt>> {
        self.record("eth_getTransactionReceipt");
        let node = self.active_node()?;
        Ok(node.transaction_receipt(tx_hash))
    }
}
