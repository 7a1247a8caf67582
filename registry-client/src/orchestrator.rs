//! Transaction orchestrator
//!
//! Every registry mutation runs the same protocol:
//!
//! 1. **Construct**: validate input locally; nothing is sent on failure
//! 2. **Ensure network**: switch the provider to the expected network
//! 3. **Pre-check**: optional role check, never proof of permission
//! 4. **Submit**: nonce, sign and broadcast under the session's lock
//! 5. **Confirm & decode**: poll for the receipt and decode its logs
//!
//! Operations never return `Err`; each resolves to a [`TxOutcome`]. A
//! broadcast transaction cannot be withdrawn, so a confirmation timeout
//! yields `Pending` and [`TransactionOrchestrator::wait_for_confirmation`]
//! can resume waiting later.

use crate::classify::{
    classify_provider_error, classify_revert_reason, classify_signer_error, is_nonce_rejection,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::metrics::ClientMetrics;
use crate::mirror::{MirrorRecord, MirrorSink};
use crate::network::NetworkManager;
use crate::outcome::TxOutcome;
use crate::receipt::{decode_assigned_id, IdRecovery};
use crate::session::{unexpected, Session};
use crate::validate;
use chrono::Utc;
use registry_core::{
    CertificateId, IssueCertificate, QueryResult, Receipt, RegistryCall, RegistryQuery, Role,
    TxHash, TxStatus, UnsignedTransaction,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Issuance input as entered by an issuer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueRequest {
    /// Owner address; the signer's own address when absent
    pub student_address: Option<String>,
    /// Student full name
    pub student_name: String,
    /// External student id
    pub student_id: String,
    /// Degree title
    pub degree: String,
    /// Major
    pub major: String,
    /// University name
    pub university: String,
    /// GPA text
    pub gpa: String,
    /// Graduation date (unix seconds); now when absent
    pub graduation_date: Option<i64>,
    /// Content reference; a generated placeholder when absent
    pub content_hash: Option<String>,
}

/// What a confirmed receipt should be decoded as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Certificate issuance; the id comes from the mint log
    Issuance,
    /// Revocation of a known certificate
    Revocation(CertificateId),
    /// Role or university administration
    Administrative,
}

/// Role the pre-check requires
#[derive(Debug, Clone, Copy)]
enum Authority {
    IssuerOrAdmin,
    Admin,
}

/// Runs registry mutations end to end
pub struct TransactionOrchestrator {
    network: NetworkManager,
    config: ClientConfig,
    metrics: ClientMetrics,
    mirror: Option<Arc<dyn MirrorSink>>,
}

impl TransactionOrchestrator {
    /// Create an orchestrator
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let metrics = ClientMetrics::new()
            .map_err(|e| ClientError::Config(format!("metrics registry: {}", e)))?;

        Ok(Self {
            network: NetworkManager::new(config.network.clone()),
            config,
            metrics,
            mirror: None,
        })
    }

    /// Copy confirmed issuances and revocations to an off-chain mirror
    pub fn with_mirror(mut self, mirror: Arc<dyn MirrorSink>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Network manager
    pub fn network(&self) -> &NetworkManager {
        &self.network
    }

    /// Configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Metrics
    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    /// Issue a certificate; the outcome carries the assigned id
    pub async fn issue_certificate(&self, session: &Session, request: IssueRequest) -> TxOutcome {
        let params = match build_issuance(session, request) {
            Ok(params) => params,
            Err(e) => return self.fail(e),
        };

        self.execute(
            session,
            RegistryCall::IssueCertificate(params),
            Authority::IssuerOrAdmin,
            MutationKind::Issuance,
        )
        .await
    }

    /// Revoke a certificate
    pub async fn revoke_certificate(
        &self,
        session: &Session,
        id: CertificateId,
        reason: &str,
    ) -> TxOutcome {
        if let Err(e) = validate::revocation(id, reason) {
            return self.fail(e);
        }

        let call = RegistryCall::RevokeCertificate {
            id,
            reason: reason.trim().to_string(),
        };
        self.execute(session, call, Authority::IssuerOrAdmin, MutationKind::Revocation(id))
            .await
    }

    /// Grant a role by name (`ISSUER_ROLE`, `DEFAULT_ADMIN_ROLE`) or identifier
    pub async fn grant_role(&self, session: &Session, role: &str, account: &str) -> TxOutcome {
        let call = match role_call(role, account) {
            Ok((role, account)) => RegistryCall::GrantRole { role, account },
            Err(e) => return self.fail(e),
        };
        self.execute(session, call, Authority::Admin, MutationKind::Administrative)
            .await
    }

    /// Revoke a role
    pub async fn revoke_role(&self, session: &Session, role: &str, account: &str) -> TxOutcome {
        let call = match role_call(role, account) {
            Ok((role, account)) => RegistryCall::RevokeRole { role, account },
            Err(e) => return self.fail(e),
        };
        self.execute(session, call, Authority::Admin, MutationKind::Administrative)
            .await
    }

    /// Approve a university
    pub async fn approve_university(&self, session: &Session, name: &str) -> TxOutcome {
        if let Err(e) = validate::require_text("University name", name) {
            return self.fail(e);
        }

        let call = RegistryCall::ApproveUniversity {
            name: name.trim().to_string(),
        };
        self.execute(session, call, Authority::Admin, MutationKind::Administrative)
            .await
    }

    /// Wait for a broadcast transaction and decode its receipt
    ///
    /// Switches the wallet back to the expected network before polling.
    pub async fn wait_for_confirmation(
        &self,
        session: &Session,
        tx_hash: TxHash,
        kind: MutationKind,
    ) -> TxOutcome {
        if let Err(e) = self.network.ensure_network(session).await {
            warn!(tx_hash = %tx_hash, error = %e, "Cannot reach the expected network; transaction still pending");
            return self.finish(TxOutcome::pending(tx_hash));
        }
        self.confirm(session, tx_hash, kind).await
    }

    async fn confirm(&self, session: &Session, tx_hash: TxHash, kind: MutationKind) -> TxOutcome {
        let started = Instant::now();
        let timeout = Duration::from_millis(self.config.confirmation.timeout_ms);

        let outcome = match tokio::time::timeout(timeout, self.poll_receipt(session, &tx_hash)).await
        {
            Err(_) => {
                warn!(
                    tx_hash = %tx_hash,
                    timeout_ms = self.config.confirmation.timeout_ms,
                    "Confirmation timed out; transaction still pending"
                );
                TxOutcome::pending(tx_hash)
            }
            Ok(receipt) => {
                self.metrics
                    .record_confirmation(started.elapsed().as_secs_f64());
                self.decode(session, receipt, kind).await
            }
        };

        self.finish(outcome)
    }

    async fn execute(
        &self,
        session: &Session,
        call: RegistryCall,
        authority: Authority,
        kind: MutationKind,
    ) -> TxOutcome {
        let method = call.method_name();

        match self.prepare_and_submit(session, call, authority).await {
            Ok(tx_hash) => self.confirm(session, tx_hash, kind).await,
            Err(e) => {
                warn!(method, error = %e, "Mutation not submitted");
                self.fail(e)
            }
        }
    }

    async fn prepare_and_submit(
        &self,
        session: &Session,
        call: RegistryCall,
        authority: Authority,
    ) -> Result<TxHash> {
        self.network.ensure_network(session).await?;
        if self.config.submission.precheck_roles {
            self.precheck(session, authority).await?;
        }
        self.submit(session, call).await
    }

    async fn precheck(&self, session: &Session, authority: Authority) -> Result<()> {
        let account = session.signer()?.address();

        if session.has_role(Role::DEFAULT_ADMIN, account).await? {
            return Ok(());
        }

        match authority {
            Authority::Admin => Err(ClientError::Unauthorized(format!(
                "{} does not hold the admin role",
                account
            ))),
            Authority::IssuerOrAdmin => {
                let issuer = session.issuer_role().await?;
                if session.has_role(issuer, account).await? {
                    Ok(())
                } else {
                    Err(ClientError::Unauthorized("Caller is not an issuer".to_string()))
                }
            }
        }
    }

    async fn submit(&self, session: &Session, call: RegistryCall) -> Result<TxHash> {
        let signer = session.signer()?;
        let from = signer.address();
        let provider = session.provider();
        let max_retries = self.config.submission.max_nonce_retries;

        let _guard = session.lock_submissions().await;

        let mut attempt = 0;
        loop {
            let nonce = provider
                .transaction_count(from)
                .await
                .map_err(|e| classify_provider_error(&e))?;

            let unsigned = UnsignedTransaction {
                chain_id: self.network.expected().chain_id,
                nonce,
                from,
                to: session.registry(),
                call: call.clone(),
            };
            let tx = signer
                .sign(unsigned)
                .await
                .map_err(|e| classify_signer_error(&e))?;

            match provider.send_transaction(tx).await {
                Ok(tx_hash) => {
                    self.metrics.record_submission();
                    info!(
                        tx_hash = %tx_hash,
                        method = call.method_name(),
                        from = %from,
                        nonce,
                        "Transaction submitted"
                    );
                    return Ok(tx_hash);
                }
                Err(e) if is_nonce_rejection(&e) && attempt < max_retries => {
                    attempt += 1;
                    warn!(
                        "Nonce rejected, retry {}/{} for {}: {}",
                        attempt,
                        max_retries,
                        call.method_name(),
                        e.message()
                    );
                }
                Err(e) => return Err(classify_provider_error(&e)),
            }
        }
    }

    /// Polls until a receipt appears; the caller bounds the wait
    async fn poll_receipt(&self, session: &Session, tx_hash: &TxHash) -> Receipt {
        let interval = Duration::from_millis(self.config.confirmation.poll_interval_ms);

        loop {
            match session.provider().transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return receipt,
                Ok(None) => {
                    debug!(tx_hash = %tx_hash, "Receipt not available yet");
                }
                Err(e) => {
                    // Already broadcast; a failed lookup is not a failed transaction
                    warn!(
                        tx_hash = %tx_hash,
                        error = %classify_provider_error(&e),
                        "Receipt poll failed; retrying"
                    );
                }
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn decode(&self, session: &Session, receipt: Receipt, kind: MutationKind) -> TxOutcome {
        let tx_hash = receipt.tx_hash;
        let block_number = receipt.block_number;

        if let TxStatus::Reverted { reason } = &receipt.status {
            let err = classify_revert_reason(reason);
            warn!(tx_hash = %tx_hash, block_number, reason = %reason, "Transaction reverted");
            return TxOutcome::failed(&err, Some(tx_hash)).in_block(block_number);
        }

        match kind {
            MutationKind::Issuance => match decode_assigned_id(&receipt) {
                IdRecovery::Recovered(id) => {
                    info!(tx_hash = %tx_hash, block_number, certificate_id = %id, "Certificate issued");
                    self.mirror_issuance(session, id, tx_hash).await;
                    TxOutcome::confirmed(tx_hash, block_number, Some(id))
                }
                IdRecovery::Missing => {
                    warn!(tx_hash = %tx_hash, "Issuance confirmed without a mint log");
                    TxOutcome::partial_success(
                        tx_hash,
                        block_number,
                        "Certificate issued, but no Transfer event was found to read its id from",
                    )
                }
                IdRecovery::Malformed => {
                    warn!(tx_hash = %tx_hash, "Issuance confirmed with an undecodable mint log");
                    TxOutcome::partial_success(
                        tx_hash,
                        block_number,
                        "Certificate issued, but its id could not be decoded from the Transfer event",
                    )
                }
            },
            MutationKind::Revocation(id) => {
                info!(tx_hash = %tx_hash, block_number, certificate_id = %id, "Certificate revoked");
                self.mirror_revocation(session, id).await;
                TxOutcome::confirmed(tx_hash, block_number, Some(id))
            }
            MutationKind::Administrative => {
                info!(tx_hash = %tx_hash, block_number, "Transaction confirmed");
                TxOutcome::confirmed(tx_hash, block_number, None)
            }
        }
    }

    async fn mirror_issuance(&self, session: &Session, id: CertificateId, tx_hash: TxHash) {
        let Some(mirror) = &self.mirror else {
            return;
        };

        if let Err(e) = copy_issuance(mirror.as_ref(), session, id, tx_hash).await {
            warn!(certificate_id = %id, error = %e, "Mirror update failed");
        }
    }

    async fn mirror_revocation(&self, session: &Session, id: CertificateId) {
        let Some(mirror) = &self.mirror else {
            return;
        };

        if let Err(e) = copy_revocation(mirror.as_ref(), session, id).await {
            warn!(certificate_id = %id, error = %e, "Mirror update failed");
        }
    }

    fn fail(&self, err: ClientError) -> TxOutcome {
        self.finish(TxOutcome::failed(&err, None))
    }

    fn finish(&self, outcome: TxOutcome) -> TxOutcome {
        self.metrics.record_outcome(outcome.status);
        outcome
    }
}

impl fmt::Debug for TransactionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionOrchestrator")
            .field("network", &self.network)
            .field("config", &self.config)
            .field("mirror", &self.mirror.is_some())
            .finish()
    }
}

fn build_issuance(session: &Session, request: IssueRequest) -> Result<IssueCertificate> {
    let student = match request.student_address.as_deref() {
        Some(address) => validate::parse_student_address(address)?,
        None => session.address().ok_or_else(|| {
            ClientError::Validation("Student address is required without a connected wallet".to_string())
        })?,
    };

    let now = Utc::now();
    let params = IssueCertificate {
        student,
        student_name: request.student_name.trim().to_string(),
        student_id: request.student_id.trim().to_string(),
        degree: request.degree.trim().to_string(),
        major: request.major.trim().to_string(),
        university: request.university.trim().to_string(),
        graduation_date: request.graduation_date.unwrap_or_else(|| now.timestamp()),
        content_hash: request
            .content_hash
            .unwrap_or_else(|| format!("QmHash{}", now.timestamp_millis())),
        gpa: request.gpa.trim().to_string(),
    };

    validate::issuance(&params)?;
    Ok(params)
}

fn role_call(role: &str, account: &str) -> Result<(Role, registry_core::Address)> {
    let role = validate::resolve_role(role)?;
    let account = validate::parse_address("Account", account)?;
    Ok((role, account))
}

async fn copy_issuance(
    mirror: &dyn MirrorSink,
    session: &Session,
    id: CertificateId,
    tx_hash: TxHash,
) -> Result<()> {
    let certificate = read_certificate(session, id).await?;
    let student = match session.call(&RegistryQuery::OwnerOf { id }).await? {
        QueryResult::Address(owner) => owner,
        other => return Err(unexpected("ownerOf", &other)),
    };

    let record = MirrorRecord {
        certificate_id: id,
        student,
        student_id: certificate.student_id,
        student_name: certificate.student_name,
        university: certificate.university,
        degree: certificate.degree,
        transaction_reference: tx_hash,
        revoke_reason: None,
        authoritative: false,
        recorded_at: Utc::now(),
    };
    mirror
        .record_issuance(record)
        .await
        .map_err(|e| ClientError::Unknown(e.to_string()))
}

async fn copy_revocation(mirror: &dyn MirrorSink, session: &Session, id: CertificateId) -> Result<()> {
    let certificate = read_certificate(session, id).await?;
    mirror
        .record_revocation(id, &certificate.revoke_reason)
        .await
        .map_err(|e| ClientError::Unknown(e.to_string()))
}

async fn read_certificate(
    session: &Session,
    id: CertificateId,
) -> Result<registry_core::Certificate> {
    match session.call(&RegistryQuery::GetCertificate { id }).await? {
        QueryResult::Certificate(certificate) => Ok(certificate),
        other => Err(unexpected("getCertificate", &other)),
    }
}
