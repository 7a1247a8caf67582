//! End-to-end tests: client orchestration against an in-process devnet
//!
//! Each test starts its own ledger, connects sessions through an
//! [`InProcessProvider`] and drives the registry only through the client.

use async_trait::async_trait;
use registry_client::provider::{ProviderResult, TRANSACTION_REJECTED};
use registry_client::{
    ClientConfig, ErrorKind, InMemoryMirror, InProcessProvider, IssueRequest, LedgerProvider,
    LocalWallet, MutationKind, NetworkParams, OutcomeStatus, ProviderError, Session,
    TransactionOrchestrator, VerificationService,
};
use registry_core::{
    config::BlockConfig, Address, CertificateId, Config, KeyPair, Ledger, QueryResult, Receipt,
    RegistryQuery, Transaction, TxHash, TxStatus,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const UNIVERSITY: &str = "Đại học Bách Khoa Hà Nội";

fn admin() -> KeyPair {
    KeyPair::from_seed(&[1u8; 32])
}

fn issuer() -> KeyPair {
    KeyPair::from_seed(&[2u8; 32])
}

fn outsider() -> KeyPair {
    KeyPair::from_seed(&[3u8; 32])
}

fn student() -> Address {
    Address::from_bytes([7u8; 20])
}

fn request(student_id: &str) -> IssueRequest {
    IssueRequest {
        student_address: Some(student().to_string()),
        student_name: "Nguyễn Văn An".to_string(),
        student_id: student_id.to_string(),
        degree: "Kỹ sư".to_string(),
        major: "Khoa học máy tính".to_string(),
        university: UNIVERSITY.to_string(),
        gpa: "3.75".to_string(),
        graduation_date: Some(1_719_792_000),
        content_hash: Some("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG".to_string()),
    }
}

fn client_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.confirmation.poll_interval_ms = 5;
    config.confirmation.timeout_ms = 2_000;
    config
}

async fn start_devnet(block: BlockConfig) -> Arc<Ledger> {
    let mut config = Config::default();
    config.block = block;
    config.genesis.issuers.push(issuer().address());
    config.genesis.universities.push(UNIVERSITY.to_string());
    Arc::new(Ledger::open(config, admin().address()).await.unwrap())
}

async fn devnet() -> Arc<Ledger> {
    start_devnet(BlockConfig::default()).await
}

fn session_for(provider: Arc<dyn LedgerProvider>, ledger: &Ledger, key: KeyPair) -> Session {
    Session::new(provider, ledger.registry_address()).with_signer(Arc::new(LocalWallet::new(key)))
}

async fn total_certificates(ledger: &Ledger) -> u64 {
    match ledger
        .call(ledger.registry_address(), &RegistryQuery::GetTotalCertificates)
        .unwrap()
    {
        QueryResult::Count(count) => count,
        other => panic!("unexpected result {:?}", other),
    }
}

/// Provider that strips logs from every receipt
struct LogStrippingProvider {
    inner: Arc<InProcessProvider>,
}

#[async_trait]
impl LedgerProvider for LogStrippingProvider {
    async fn chain_id(&self) -> ProviderResult<u64> {
        self.inner.chain_id().await
    }

    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        self.inner.switch_chain(chain_id).await
    }

    async fn add_chain(&self, params: &NetworkParams) -> ProviderResult<()> {
        self.inner.add_chain(params).await
    }

    async fn call(&self, to: Address, query: &RegistryQuery) -> ProviderResult<QueryResult> {
        self.inner.call(to, query).await
    }

    async fn transaction_count(&self, address: Address) -> ProviderResult<u64> {
        self.inner.transaction_count(address).await
    }

    async fn send_transaction(&self, tx: Transaction) -> ProviderResult<TxHash> {
        self.inner.send_transaction(tx).await
    }

    async fn transaction_receipt(&self, tx_hash: &TxHash) -> ProviderResult<Option<Receipt>> {
        let receipt = self.inner.transaction_receipt(tx_hash).await?;
        Ok(receipt.map(|mut receipt| {
            receipt.logs.clear();
            receipt
        }))
    }
}

/// Provider whose receipt lookups fail with a transport error a set number of times
struct FlakyReceiptProvider {
    inner: Arc<InProcessProvider>,
    failures: AtomicUsize,
}

#[async_trait]
impl LedgerProvider for FlakyReceiptProvider {
    async fn chain_id(&self) -> ProviderResult<u64> {
        self.inner.chain_id().await
    }

    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        self.inner.switch_chain(chain_id).await
    }

    async fn add_chain(&self, params: &NetworkParams) -> ProviderResult<()> {
        self.inner.add_chain(params).await
    }

    async fn call(&self, to: Address, query: &RegistryQuery) -> ProviderResult<QueryResult> {
        self.inner.call(to, query).await
    }

    async fn transaction_count(&self, address: Address) -> ProviderResult<u64> {
        self.inner.transaction_count(address).await
    }

    async fn send_transaction(&self, tx: Transaction) -> ProviderResult<TxHash> {
        self.inner.send_transaction(tx).await
    }

    async fn transaction_receipt(&self, tx_hash: &TxHash) -> ProviderResult<Option<Receipt>> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ProviderError::Transport("connection reset".to_string()));
        }
        self.inner.transaction_receipt(tx_hash).await
    }
}

/// Provider that reports a nonce one ahead the first time it is asked
struct StaleNonceProvider {
    inner: Arc<InProcessProvider>,
    skewed: AtomicBool,
    rejections: parking_lot::Mutex<Vec<String>>,
}

#[async_trait]
impl LedgerProvider for StaleNonceProvider {
    async fn chain_id(&self) -> ProviderResult<u64> {
        self.inner.chain_id().await
    }

    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        self.inner.switch_chain(chain_id).await
    }

    async fn add_chain(&self, params: &NetworkParams) -> ProviderResult<()> {
        self.inner.add_chain(params).await
    }

    async fn call(&self, to: Address, query: &RegistryQuery) -> ProviderResult<QueryResult> {
        self.inner.call(to, query).await
    }

    async fn transaction_count(&self, address: Address) -> ProviderResult<u64> {
        let nonce = self.inner.transaction_count(address).await?;
        if self.skewed.swap(false, Ordering::SeqCst) {
            Ok(nonce + 1)
        } else {
            Ok(nonce)
        }
    }

    async fn send_transaction(&self, tx: Transaction) -> ProviderResult<TxHash> {
        let result = self.inner.send_transaction(tx).await;
        if let Err(e) = &result {
            self.rejections.lock().push(e.message().to_string());
        }
        result
    }

    async fn transaction_receipt(&self, tx_hash: &TxHash) -> ProviderResult<Option<Receipt>> {
        self.inner.transaction_receipt(tx_hash).await
    }
}

/// Provider whose node is gone
struct UnreachableProvider;

#[async_trait]
impl LedgerProvider for UnreachableProvider {
    async fn chain_id(&self) -> ProviderResult<u64> {
        Err(ProviderError::Transport("connection refused".to_string()))
    }

    async fn switch_chain(&self, _chain_id: u64) -> ProviderResult<()> {
        Err(ProviderError::Transport("connection refused".to_string()))
    }

    async fn add_chain(&self, _params: &NetworkParams) -> ProviderResult<()> {
        Err(ProviderError::Transport("connection refused".to_string()))
    }

    async fn call(&self, _to: Address, _query: &RegistryQuery) -> ProviderResult<QueryResult> {
        Err(ProviderError::Transport("connection refused".to_string()))
    }

    async fn transaction_count(&self, _address: Address) -> ProviderResult<u64> {
        Err(ProviderError::Transport("connection refused".to_string()))
    }

    async fn send_transaction(&self, _tx: Transaction) -> ProviderResult<TxHash> {
        Err(ProviderError::rpc(TRANSACTION_REJECTED, "unreachable"))
    }

    async fn transaction_receipt(&self, _tx_hash: &TxHash) -> ProviderResult<Option<Receipt>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_issue_verify_revoke_scenario() {
    let ledger = devnet().await;
    let provider = Arc::new(InProcessProvider::connected_to(ledger.clone()));
    let issuer_session = session_for(provider.clone(), &ledger, issuer());
    let verifier = Session::new(provider, ledger.registry_address());

    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();
    let verification = VerificationService::default();

    let issued = orchestrator
        .issue_certificate(&issuer_session, request("SV20241001"))
        .await;
    assert_eq!(issued.status, OutcomeStatus::Confirmed, "{:?}", issued.message);
    assert!(issued.success);
    assert_eq!(issued.identifier, Some(1));
    assert!(issued.transaction_reference.is_some());

    let id = CertificateId(1);
    let certificate = verification
        .get_certificate(&verifier, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(certificate.student_id, "SV20241001");
    assert_eq!(certificate.gpa, "3.75");
    assert_eq!(certificate.university, UNIVERSITY);
    assert_eq!(certificate.issuer, issuer().address());
    assert!(certificate.is_valid);
    assert!(verification.verify_certificate(&verifier, id).await.unwrap());

    let by_student_id = verification
        .get_certificate_by_student_id(&verifier, "SV20241001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_student_id.student_name, certificate.student_name);
    assert_eq!(
        verification
            .get_student_certificates(&verifier, &student().to_string())
            .await
            .unwrap(),
        vec![id]
    );

    let valid_before = verification
        .get_valid_certificates_count(&verifier)
        .await
        .unwrap();

    let revoked = orchestrator
        .revoke_certificate(&issuer_session, id, "issued in error")
        .await;
    assert_eq!(revoked.status, OutcomeStatus::Confirmed, "{:?}", revoked.message);
    assert_eq!(revoked.identifier, Some(1));

    assert!(!verification.verify_certificate(&verifier, id).await.unwrap());
    assert_eq!(
        verification
            .get_valid_certificates_count(&verifier)
            .await
            .unwrap(),
        valid_before - 1
    );
    assert_eq!(verification.get_total_certificates(&verifier).await.unwrap(), 1);

    let report = verification
        .verification_report(&verifier, id)
        .await
        .unwrap()
        .unwrap();
    assert!(!report.is_valid);
    assert_eq!(report.revoke_reason.as_deref(), Some("issued in error"));

    // Revocation is terminal
    let again = orchestrator
        .revoke_certificate(&issuer_session, id, "issued in error")
        .await;
    assert_eq!(again.status, OutcomeStatus::Failed);
    assert_eq!(again.error_kind, Some(ErrorKind::RevertedBusinessRule));

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_issuance_with_precheck() {
    let ledger = devnet().await;
    let provider = Arc::new(InProcessProvider::connected_to(ledger.clone()));
    let session = session_for(provider.clone(), &ledger, outsider());
    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();

    let outcome = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.error_kind, Some(ErrorKind::Unauthorized));
    assert!(outcome.transaction_reference.is_none());
    assert!(!provider
        .requests()
        .contains(&"eth_sendRawTransaction".to_string()));
    assert_eq!(total_certificates(&ledger).await, 0);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_issuance_without_precheck() {
    let ledger = devnet().await;
    let provider = Arc::new(InProcessProvider::connected_to(ledger.clone()));
    let session = session_for(provider.clone(), &ledger, outsider());

    let mut config = client_config();
    config.submission.precheck_roles = false;
    let orchestrator = TransactionOrchestrator::new(config).unwrap();

    let outcome = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.error_kind, Some(ErrorKind::Unauthorized));
    assert!(provider
        .requests()
        .contains(&"eth_sendRawTransaction".to_string()));
    assert_eq!(total_certificates(&ledger).await, 0);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_issuances_get_sequential_ids() {
    let ledger = devnet().await;
    let provider = Arc::new(InProcessProvider::connected_to(ledger.clone()));
    let session = session_for(provider, &ledger, issuer());
    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();

    let (a, b, c) = tokio::join!(
        orchestrator.issue_certificate(&session, request("SV20241001")),
        orchestrator.issue_certificate(&session, request("SV20241002")),
        orchestrator.issue_certificate(&session, request("SV20241003")),
    );

    let mut ids: Vec<u64> = [a, b, c]
        .iter()
        .map(|outcome| {
            assert_eq!(outcome.status, OutcomeStatus::Confirmed, "{:?}", outcome.message);
            outcome.identifier.unwrap()
        })
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(total_certificates(&ledger).await, 3);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_missing_mint_log_is_partial_success() {
    let ledger = devnet().await;
    let provider = Arc::new(LogStrippingProvider {
        inner: Arc::new(InProcessProvider::connected_to(ledger.clone())),
    });
    let session = session_for(provider, &ledger, issuer());
    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();

    let outcome = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(outcome.status, OutcomeStatus::PartialSuccess);
    assert!(outcome.success);
    assert_eq!(outcome.identifier, Some(0));
    assert!(outcome.message.is_some());
    assert_eq!(
        orchestrator
            .metrics()
            .outcome_count(OutcomeStatus::PartialSuccess),
        1
    );

    // The certificate exists regardless
    assert_eq!(total_certificates(&ledger).await, 1);
    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_timeout_reports_pending_then_resumes() {
    let ledger = start_devnet(BlockConfig {
        max_txs_per_block: 100,
        block_time_ms: 60_000,
        automine: false,
    })
    .await;
    let provider = Arc::new(InProcessProvider::connected_to(ledger.clone()));
    let session = session_for(provider.clone(), &ledger, issuer());

    let mut config = client_config();
    config.confirmation.timeout_ms = 100;
    let orchestrator = TransactionOrchestrator::new(config).unwrap();

    let outcome = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(outcome.status, OutcomeStatus::Pending);
    assert!(!outcome.success);
    assert!(outcome.error_kind.is_none());
    let tx_hash = outcome.transaction_reference.unwrap();
    assert_eq!(ledger.pending_count().await.unwrap(), 1);

    ledger.mine_block().await.unwrap();

    // Wallet moved to another network while the transaction was pending
    provider.register_chain(1);
    provider.switch_chain(1).await.unwrap();

    let resumed = orchestrator
        .wait_for_confirmation(&session, tx_hash, MutationKind::Issuance)
        .await;
    assert_eq!(resumed.status, OutcomeStatus::Confirmed);
    assert_eq!(resumed.identifier, Some(1));
    assert_eq!(resumed.transaction_reference, Some(tx_hash));
    assert_eq!(provider.chain_id().await.unwrap(), 31337);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_receipt_poll_error_keeps_waiting() {
    let ledger = devnet().await;
    let provider = Arc::new(FlakyReceiptProvider {
        inner: Arc::new(InProcessProvider::connected_to(ledger.clone())),
        failures: AtomicUsize::new(1),
    });
    let session = session_for(provider.clone(), &ledger, issuer());
    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();

    let outcome = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(outcome.status, OutcomeStatus::Confirmed, "{:?}", outcome.message);
    assert_eq!(outcome.identifier, Some(1));
    assert_eq!(provider.failures.load(Ordering::SeqCst), 0);
    assert_eq!(total_certificates(&ledger).await, 1);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_receipt_poll_errors_until_timeout_are_pending() {
    let ledger = devnet().await;
    let provider = Arc::new(FlakyReceiptProvider {
        inner: Arc::new(InProcessProvider::connected_to(ledger.clone())),
        failures: AtomicUsize::new(usize::MAX),
    });
    let session = session_for(provider, &ledger, issuer());

    let mut config = client_config();
    config.confirmation.timeout_ms = 100;
    let orchestrator = TransactionOrchestrator::new(config).unwrap();

    let outcome = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(outcome.status, OutcomeStatus::Pending);
    assert!(outcome.error_kind.is_none());
    assert!(outcome.transaction_reference.is_some());
    // Committed despite the unreadable receipt
    assert_eq!(total_certificates(&ledger).await, 1);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_mirror_failure_does_not_change_outcome() {
    let ledger = devnet().await;
    let provider = Arc::new(InProcessProvider::connected_to(ledger.clone()));
    let session = session_for(provider, &ledger, issuer());

    let mirror = Arc::new(InMemoryMirror::new());
    let orchestrator = TransactionOrchestrator::new(client_config())
        .unwrap()
        .with_mirror(mirror.clone());

    let first = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(first.status, OutcomeStatus::Confirmed);
    let record = mirror.get(CertificateId(1)).unwrap();
    assert_eq!(record.student, student());
    assert_eq!(record.student_id, "SV20241001");
    assert!(!record.authoritative);

    mirror.set_failing(true);
    let second = orchestrator.issue_certificate(&session, request("SV20241002")).await;
    assert_eq!(second.status, OutcomeStatus::Confirmed);
    assert_eq!(second.identifier, Some(2));
    assert!(mirror.get(CertificateId(2)).is_none());

    mirror.set_failing(false);
    let revoked = orchestrator
        .revoke_certificate(&session, CertificateId(1), "issued in error")
        .await;
    assert_eq!(revoked.status, OutcomeStatus::Confirmed);
    assert_eq!(
        mirror.get(CertificateId(1)).unwrap().revoke_reason.as_deref(),
        Some("issued in error")
    );

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_signer_rejection_and_missing_wallet() {
    let ledger = devnet().await;
    let provider = Arc::new(InProcessProvider::connected_to(ledger.clone()));
    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();

    let wallet = Arc::new(LocalWallet::new(issuer()));
    wallet.set_rejecting(true);
    let rejecting = Session::new(provider.clone(), ledger.registry_address()).with_signer(wallet);
    let outcome = orchestrator.issue_certificate(&rejecting, request("SV20241001")).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::UserRejected));

    let read_only = Session::new(provider, ledger.registry_address());
    let outcome = orchestrator
        .approve_university(&read_only, "Đại học Quốc gia Hà Nội")
        .await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::WalletUnavailable));

    assert_eq!(total_certificates(&ledger).await, 0);
    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_validation_sends_nothing() {
    let ledger = devnet().await;
    let provider = Arc::new(InProcessProvider::connected_to(ledger.clone()));
    let session = session_for(provider.clone(), &ledger, issuer());
    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();

    let mut blank_gpa = request("SV20241001");
    blank_gpa.gpa = "  ".to_string();
    let outcome = orchestrator.issue_certificate(&session, blank_gpa).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));
    assert_eq!(outcome.message.as_deref(), Some("Validation error: GPA cannot be empty"));

    let mut bad_student = request("SV20241001");
    bad_student.student_address = Some("0x1234".to_string());
    let outcome = orchestrator.issue_certificate(&session, bad_student).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));

    let outcome = orchestrator
        .revoke_certificate(&session, CertificateId(1), "")
        .await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));

    assert!(provider.requests().is_empty());
    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stale_nonce_is_retried() {
    let ledger = devnet().await;
    let provider = Arc::new(StaleNonceProvider {
        inner: Arc::new(InProcessProvider::connected_to(ledger.clone())),
        skewed: AtomicBool::new(true),
        rejections: parking_lot::Mutex::new(Vec::new()),
    });
    let session = session_for(provider.clone(), &ledger, issuer());
    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();

    let outcome = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(outcome.status, OutcomeStatus::Confirmed, "{:?}", outcome.message);
    assert_eq!(outcome.identifier, Some(1));

    let rejections = provider.rejections.lock().clone();
    assert_eq!(rejections.len(), 1);
    assert!(rejections[0].starts_with("nonce too high"));
    assert_eq!(orchestrator.metrics().submissions_total.get(), 1);

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_provider() {
    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();
    let session = Session::new(Arc::new(UnreachableProvider), Address::from_bytes([9u8; 20]))
        .with_signer(Arc::new(LocalWallet::new(issuer())));

    let outcome = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::NetworkUnreachable));

    let err = VerificationService::default()
        .get_total_certificates(&session)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkUnreachable);
}

#[tokio::test]
async fn test_reverted_receipt_is_classified() {
    struct RevertingProvider {
        inner: Arc<InProcessProvider>,
    }

    #[async_trait]
    impl LedgerProvider for RevertingProvider {
        async fn chain_id(&self) -> ProviderResult<u64> {
            self.inner.chain_id().await
        }

        async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
            self.inner.switch_chain(chain_id).await
        }

        async fn add_chain(&self, params: &NetworkParams) -> ProviderResult<()> {
            self.inner.add_chain(params).await
        }

        async fn call(&self, to: Address, query: &RegistryQuery) -> ProviderResult<QueryResult> {
            self.inner.call(to, query).await
        }

        async fn transaction_count(&self, address: Address) -> ProviderResult<u64> {
            self.inner.transaction_count(address).await
        }

        async fn send_transaction(&self, tx: Transaction) -> ProviderResult<TxHash> {
            self.inner.send_transaction(tx).await
        }

        async fn transaction_receipt(&self, tx_hash: &TxHash) -> ProviderResult<Option<Receipt>> {
            let receipt = self.inner.transaction_receipt(tx_hash).await?;
            Ok(receipt.map(|mut receipt| {
                receipt.status = TxStatus::Reverted {
                    reason: "Caller is not an issuer".to_string(),
                };
                receipt.logs.clear();
                receipt
            }))
        }
    }

    let ledger = devnet().await;
    let provider = Arc::new(RevertingProvider {
        inner: Arc::new(InProcessProvider::connected_to(ledger.clone())),
    });
    let session = session_for(provider, &ledger, issuer());
    let orchestrator = TransactionOrchestrator::new(client_config()).unwrap();

    let outcome = orchestrator.issue_certificate(&session, request("SV20241001")).await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.error_kind, Some(ErrorKind::Unauthorized));
    assert!(outcome.transaction_reference.is_some());
    assert!(outcome.block_number.is_some());

    ledger.shutdown().await.unwrap();
}
