//! Devnet ledger orchestration layer
//!
//! This module ties together storage, the block-producing actor and metrics
//! into the node-facing API a provider talks to: submit a signed
//! transaction, read the pending nonce, call the registry, fetch receipts.
//!
//! # Example
//!
//! ```no_run
//! use registry_core::{Config, KeyPair, Ledger};
//!
//! #[tokio::main]
//! async fn main() -> registry_core::Result<()> {
//!     let admin = KeyPair::generate();
//!     let ledger = Ledger::open(Config::default(), admin.address()).await?;
//!
//!     println!("registry deployed at {}", ledger.registry_address());
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    metrics::Metrics,
    types::{Address, Block, QueryResult, Receipt, RegistryQuery, Transaction, TxHash},
    Config, Error, Result, Storage,
};
use std::sync::Arc;

/// Single-node ledger hosting one certificate registry
#[derive(Debug)]
pub struct Ledger {
    /// Actor handle for writes
    handle: LedgerHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Start a ledger whose registry is deployed by `deployer`
    ///
    /// `deployer` holds the admin role from genesis; genesis issuers and
    /// universities from the configuration are provisioned before block 0.
    pub async fn open(config: Config, deployer: Address) -> Result<Self> {
        config.validate()?;

        let storage = Arc::new(Storage::open(&config, deployer)?);
        let metrics =
            Metrics::new().map_err(|e| Error::Config(format!("metrics registry: {}", e)))?;

        let handle = spawn_ledger_actor(storage.clone(), &config, metrics.clone());

        tracing::info!(
            service = %config.service_name,
            chain_id = config.chain_id,
            automine = config.block.automine,
            "Devnet ledger started"
        );

        Ok(Self {
            handle,
            storage,
            metrics,
            config,
        })
    }

    /// Network identifier
    pub fn chain_id(&self) -> u64 {
        self.storage.chain_id()
    }

    /// Address of the deployed registry
    pub fn registry_address(&self) -> Address {
        self.storage.registry_address()
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Submit a signed transaction; returns once it is in the mempool
    pub async fn submit_transaction(&self, tx: Transaction) -> Result<TxHash> {
        self.handle.submit_transaction(tx).await
    }

    /// Next nonce for `address`, counting pending transactions
    pub async fn transaction_count(&self, address: Address) -> Result<u64> {
        self.handle.transaction_count(address).await
    }

    /// Read-only call against confirmed state
    pub fn call(&self, to: Address, query: &RegistryQuery) -> Result<QueryResult> {
        if to != self.registry_address() {
            return Err(Error::InvalidTransaction(format!(
                "unknown contract address {}",
                to
            )));
        }

        tracing::debug!(query = ?query, "Registry call");
        self.storage.call(query)
    }

    /// Receipt of an included transaction; `None` while pending or unknown
    pub fn transaction_receipt(&self, tx_hash: &TxHash) -> Option<Receipt> {
        self.storage.get_receipt(tx_hash)
    }

    /// Seal a block now
    pub async fn mine_block(&self) -> Result<Block> {
        self.handle.mine_block().await
    }

    /// Number of transactions waiting for inclusion
    pub async fn pending_count(&self) -> Result<usize> {
        self.handle.pending_count().await
    }

    /// Most recent block
    pub fn latest_block(&self) -> Result<Block> {
        self.storage.latest_block()
    }

    /// Block by number
    pub fn block_by_number(&self, number: u64) -> Result<Block> {
        self.storage.get_block(number)
    }

    /// Shutdown ledger; pending transactions are sealed first
    pub async fn shutdown(&self) -> Result<()> {
        self.handle.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::types::{
        CertificateId, IssueCertificate, RegistryCall, Role, TxStatus, UnsignedTransaction,
    };
    use crate::events::{transfer_topic, u64_from_topic};

    fn admin() -> KeyPair {
        KeyPair::from_seed(&[1u8; 32])
    }

    fn issuer() -> KeyPair {
        KeyPair::from_seed(&[2u8; 32])
    }

    async fn create_test_ledger() -> Ledger {
        let mut config = Config::default();
        config.genesis.issuers.push(issuer().address());
        Ledger::open(config, admin().address()).await.unwrap()
    }

    async fn send(ledger: &Ledger, key: &KeyPair, call: RegistryCall) -> Result<TxHash> {
        let nonce = ledger.transaction_count(key.address()).await?;
        let tx = key.sign_transaction(UnsignedTransaction {
            chain_id: ledger.chain_id(),
            nonce,
            from: key.address(),
            to: ledger.registry_address(),
            call,
        })?;
        ledger.submit_transaction(tx).await
    }

    fn issuance(student_id: &str) -> RegistryCall {
        RegistryCall::IssueCertificate(IssueCertificate {
            student: Address::from_bytes([7u8; 20]),
            student_name: "Nguyen Van A".to_string(),
            student_id: student_id.to_string(),
            degree: "Computer Science".to_string(),
            major: "Software Engineering".to_string(),
            university: "Đại học Bách Khoa Hà Nội".to_string(),
            graduation_date: 1_717_000_000,
            content_hash: "QmTestHash123456789".to_string(),
            gpa: "3.75".to_string(),
        })
    }

    #[tokio::test]
    async fn test_ledger_open() {
        let ledger = create_test_ledger().await;
        assert_eq!(ledger.chain_id(), 31337);
        assert_eq!(ledger.latest_block().unwrap().number, 0);
        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_issue_and_read_back() {
        let ledger = create_test_ledger().await;

        let hash = send(&ledger, &issuer(), issuance("SV20241001")).await.unwrap();
        let receipt = ledger.transaction_receipt(&hash).unwrap();
        assert_eq!(receipt.status, TxStatus::Success);

        let transfer = receipt
            .logs
            .iter()
            .find(|log| log.topics.first() == Some(&transfer_topic()))
            .unwrap();
        assert_eq!(u64_from_topic(&transfer.topics[3]), Some(1));

        let result = ledger
            .call(
                ledger.registry_address(),
                &RegistryQuery::GetCertificate { id: CertificateId(1) },
            )
            .unwrap();
        match result {
            QueryResult::Certificate(certificate) => {
                assert_eq!(certificate.student_id, "SV20241001");
                assert_eq!(certificate.issuer, issuer().address());
                assert!(certificate.is_valid);
            }
            other => panic!("unexpected result {:?}", other),
        }

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_call_unknown_contract() {
        let ledger = create_test_ledger().await;
        let err = ledger
            .call(Address::from_bytes([0xee; 20]), &RegistryQuery::Name)
            .unwrap_err();
        assert!(err.to_string().contains("unknown contract address"));
        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_role_grant_then_issue() {
        let ledger = create_test_ledger().await;
        let newcomer = KeyPair::from_seed(&[8u8; 32]);

        assert!(send(&ledger, &newcomer, issuance("SV1")).await.unwrap_err().is_revert());

        send(
            &ledger,
            &admin(),
            RegistryCall::GrantRole {
                role: Role::issuer(),
                account: newcomer.address(),
            },
        )
        .await
        .unwrap();

        let hash = send(&ledger, &newcomer, issuance("SV1")).await.unwrap();
        assert!(ledger.transaction_receipt(&hash).unwrap().is_success());
        assert_eq!(ledger.metrics().blocks_total.get(), 2);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_blocks_chain_together() {
        let ledger = create_test_ledger().await;
        send(&ledger, &issuer(), issuance("SV1")).await.unwrap();
        let mined = ledger.mine_block().await.unwrap();

        assert_eq!(mined.number, 2);
        assert!(mined.tx_hashes.is_empty());
        let previous = ledger.block_by_number(1).unwrap();
        assert_eq!(mined.parent_hash, previous.hash);
        assert!(mined.timestamp >= previous.timestamp);
        assert!(ledger.block_by_number(3).is_err());

        ledger.shutdown().await.unwrap();
    }
}
