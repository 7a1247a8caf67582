//! Registry walkthrough
//!
//! Starts a devnet, connects an administrator, an issuer and a verifier
//! through a wallet that begins on the wrong network, then issues, verifies
//! and revokes a certificate.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use registry_client::{
    ClientConfig, InMemoryMirror, InProcessProvider, IssueRequest, LocalWallet, OutcomeStatus,
    Session, TransactionOrchestrator, TxOutcome, VerificationService,
};
use registry_core::{CertificateId, Config, KeyPair, Ledger};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const UNIVERSITY: &str = "Đại học Bách Khoa Hà Nội";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let admin = KeyPair::generate();
    let issuer = KeyPair::generate();
    let student = KeyPair::generate();

    let mut devnet_config = match std::env::var("DEVNET_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => Config::from_env()?,
    };
    devnet_config.genesis.issuers.push(admin.address());
    let client_config = ClientConfig::from_env()?;

    let ledger = Arc::new(Ledger::open(devnet_config, admin.address()).await?);

    // Wallet starts on mainnet and has never seen the devnet
    let provider = Arc::new(InProcessProvider::new(1));
    provider.add_node(ledger.clone());

    let registry = client_config
        .registry_address
        .unwrap_or_else(|| ledger.registry_address());
    let admin_session =
        Session::new(provider.clone(), registry).with_signer(Arc::new(LocalWallet::new(admin)));
    let issuer_session = Session::new(provider.clone(), registry)
        .with_signer(Arc::new(LocalWallet::new(issuer.clone())));
    let verifier = Session::new(provider.clone(), registry);

    let mirror = Arc::new(InMemoryMirror::new());
    let orchestrator = TransactionOrchestrator::new(client_config.clone())?.with_mirror(mirror.clone());
    let verification = VerificationService::new(client_config.network.clone());

    banner("Provisioning");
    report(
        "approve university",
        orchestrator.approve_university(&admin_session, UNIVERSITY).await,
    )?;
    report(
        "grant ISSUER_ROLE",
        orchestrator
            .grant_role(&admin_session, "ISSUER_ROLE", &issuer.address().to_string())
            .await,
    )?;
    info!(requests = ?provider.requests(), "Wallet requests during provisioning");

    banner("Issuance");
    let outcome = orchestrator
        .issue_certificate(
            &issuer_session,
            IssueRequest {
                student_address: Some(student.address().to_string()),
                student_name: "Nguyễn Văn An".to_string(),
                student_id: "SV20241001".to_string(),
                degree: "Kỹ sư".to_string(),
                major: "Khoa học máy tính".to_string(),
                university: UNIVERSITY.to_string(),
                gpa: "3.75".to_string(),
                ..Default::default()
            },
        )
        .await;
    report("issue certificate", outcome.clone())?;
    let Some(id) = outcome.certificate_id() else {
        bail!("issuance did not report a certificate id");
    };

    banner("Verification");
    let Some(verified) = verification.verification_report(&verifier, id).await? else {
        bail!("certificate {} not found", id);
    };
    println!("{}", serde_json::to_string_pretty(&verified)?);
    if let Some(record) = mirror.get(id) {
        println!(
            "  mirror: {} / {} (authoritative: {})",
            record.student_name, record.student_id, record.authoritative
        );
    }

    banner("Revocation");
    report(
        "revoke certificate",
        orchestrator
            .revoke_certificate(&issuer_session, id, "issued in error")
            .await,
    )?;
    let valid = verification.verify_certificate(&verifier, id).await?;
    println!("  certificate {} valid: {}", id, valid);

    let missing = verification
        .get_certificate(&verifier, CertificateId(id.value() + 1))
        .await?;
    println!("  certificate {} found: {}", id.value() + 1, missing.is_some());

    banner("Totals");
    println!(
        "  issued: {}  valid: {}",
        verification.get_total_certificates(&verifier).await?,
        verification.get_valid_certificates_count(&verifier).await?
    );
    println!(
        "  confirmed outcomes: {}",
        orchestrator
            .metrics()
            .outcome_count(OutcomeStatus::Confirmed)
    );

    ledger.shutdown().await?;
    Ok(())
}

fn banner(title: &str) {
    println!("\n{}", format!("== {} ==", title).bold());
}

fn report(step: &str, outcome: TxOutcome) -> Result<()> {
    let status = match outcome.status {
        OutcomeStatus::Confirmed => "confirmed".green(),
        OutcomeStatus::PartialSuccess => "partial success".yellow(),
        OutcomeStatus::Pending => "pending".yellow(),
        OutcomeStatus::Failed => "failed".red(),
    };

    let tx = outcome
        .transaction_reference
        .map(|hash| hash.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("  {:<20} {} tx={}", step, status, tx);

    if let Some(message) = &outcome.message {
        println!("  {:<20} {}", "", message.dimmed());
    }
    if outcome.status == OutcomeStatus::Failed {
        bail!("{} failed: {:?}", step, outcome.error_kind);
    }
    Ok(())
}
