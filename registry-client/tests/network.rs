//! Network selection against a wallet on the wrong chain

use registry_client::{
    ClientConfig, ErrorKind, InProcessProvider, IssueRequest, LocalWallet, NetworkParams,
    OutcomeStatus, Session, TransactionOrchestrator, VerificationService,
};
use registry_core::{Config, KeyPair, Ledger};
use std::sync::Arc;

fn admin() -> KeyPair {
    KeyPair::from_seed(&[1u8; 32])
}

async fn devnet() -> Arc<Ledger> {
    let mut config = Config::default();
    config.genesis.issuers.push(admin().address());
    Arc::new(Ledger::open(config, admin().address()).await.unwrap())
}

/// Wallet active on mainnet (chain 1) with the devnet reachable but unknown to it
fn mainnet_wallet(ledger: &Arc<Ledger>) -> Arc<InProcessProvider> {
    let provider = Arc::new(InProcessProvider::new(1));
    provider.add_node(ledger.clone());
    provider
}

fn position(requests: &[String], method: &str) -> usize {
    requests
        .iter()
        .position(|r| r == method)
        .unwrap_or_else(|| panic!("{} not requested: {:?}", method, requests))
}

#[tokio::test]
async fn test_switch_precedes_registry_reads() {
    let ledger = devnet().await;
    let provider = mainnet_wallet(&ledger);
    provider.register_chain(31337);
    let session = Session::new(provider.clone(), ledger.registry_address());

    let total = VerificationService::new(NetworkParams::default())
        .get_total_certificates(&session)
        .await
        .unwrap();
    assert_eq!(total, 0);

    let requests = provider.requests();
    assert!(position(&requests, "wallet_switchEthereumChain") < position(&requests, "eth_call"));
    assert!(!requests.contains(&"wallet_addEthereumChain".to_string()));

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_network_registered_before_switch() {
    let ledger = devnet().await;
    let provider = mainnet_wallet(&ledger);
    let session = Session::new(provider.clone(), ledger.registry_address())
        .with_signer(Arc::new(LocalWallet::new(admin())));

    let mut config = ClientConfig::default();
    config.confirmation.poll_interval_ms = 5;
    let orchestrator = TransactionOrchestrator::new(config).unwrap();
    assert_eq!(orchestrator.network().expected().name, "Local Test Network");

    let outcome = orchestrator
        .issue_certificate(
            &session,
            IssueRequest {
                student_address: None,
                student_name: "Trần Thị Bình".to_string(),
                student_id: "SV20241001".to_string(),
                degree: "Cử nhân".to_string(),
                major: "Kinh tế".to_string(),
                university: "Đại học Bách Khoa Hà Nội".to_string(),
                gpa: "3.75".to_string(),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(outcome.status, OutcomeStatus::Confirmed, "{:?}", outcome.message);
    assert_eq!(outcome.identifier, Some(1));

    let requests = provider.requests();
    let first_switch = position(&requests, "wallet_switchEthereumChain");
    let add = position(&requests, "wallet_addEthereumChain");
    assert!(first_switch < add);
    assert!(add < position(&requests, "eth_call"));
    assert!(add < position(&requests, "eth_sendRawTransaction"));
    assert_eq!(
        requests
            .iter()
            .filter(|r| *r == "wallet_switchEthereumChain")
            .count(),
        2
    );
    assert!(provider.knows_chain(31337));

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_declined_switch_is_user_rejection() {
    let ledger = devnet().await;
    let provider = mainnet_wallet(&ledger);
    provider.register_chain(31337);
    provider.set_reject_switch(true);
    let session = Session::new(provider.clone(), ledger.registry_address());

    let err = VerificationService::default()
        .verify_certificate(&session, registry_core::CertificateId(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserRejected);
    assert!(!provider.requests().contains(&"eth_call".to_string()));

    ledger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_expected_network_without_node() {
    // Wallet switches, but nothing serves chain 31337
    let provider = Arc::new(InProcessProvider::new(1));
    let session = Session::new(provider, registry_core::Address::from_bytes([9u8; 20]));

    let err = VerificationService::default()
        .get_total_certificates(&session)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkUnreachable);
}

#[tokio::test]
async fn test_other_expected_network() {
    let mut devnet_config = Config::default();
    devnet_config.chain_id = 1337;
    let ledger = Arc::new(Ledger::open(devnet_config, admin().address()).await.unwrap());

    let provider = Arc::new(InProcessProvider::new(31337));
    provider.add_node(ledger.clone());
    let session = Session::new(provider.clone(), ledger.registry_address());

    let expected = NetworkParams {
        chain_id: 1337,
        name: "Ganache".to_string(),
        ..Default::default()
    };
    let total = VerificationService::new(expected)
        .get_total_certificates(&session)
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert!(provider.knows_chain(1337));

    ledger.shutdown().await.unwrap();
}
