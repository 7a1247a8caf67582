//! Verification service
//!
//! Read-only view over the registry. Every read goes through the network
//! manager and is a fresh provider round trip; nothing is cached. A
//! missing record is `Ok(None)`, every other failure keeps its
//! classification.

use crate::config::NetworkParams;
use crate::error::{ClientError, Result};
use crate::network::NetworkManager;
use crate::session::{unexpected, Session};
use crate::validate;
use registry_core::{Certificate, CertificateId, QueryResult, RegistryQuery};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Certificate together with its current validity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Certificate id
    pub certificate_id: CertificateId,
    /// Stored record
    pub certificate: Certificate,
    /// Validity at the time of the read
    pub is_valid: bool,
    /// Reason, when revoked
    pub revoke_reason: Option<String>,
}

/// Registry reads
#[derive(Debug, Clone)]
pub struct VerificationService {
    network: NetworkManager,
}

impl VerificationService {
    /// Service reading from the expected network
    pub fn new(expected: NetworkParams) -> Self {
        Self {
            network: NetworkManager::new(expected),
        }
    }

    /// Certificate by id
    pub async fn get_certificate(
        &self,
        session: &Session,
        id: CertificateId,
    ) -> Result<Option<Certificate>> {
        let result = self
            .read(session, RegistryQuery::GetCertificate { id })
            .await
            .and_then(|result| certificate(result, "getCertificate"));
        not_found_as_none(result)
    }

    /// Validity of a certificate; false for unknown ids
    pub async fn verify_certificate(&self, session: &Session, id: CertificateId) -> Result<bool> {
        match self.read(session, RegistryQuery::VerifyCertificate { id }).await? {
            QueryResult::Bool(valid) => Ok(valid),
            other => Err(unexpected("verifyCertificate", &other)),
        }
    }

    /// Live certificate for an external student id
    pub async fn get_certificate_by_student_id(
        &self,
        session: &Session,
        student_id: &str,
    ) -> Result<Option<Certificate>> {
        validate::require_text("Student ID", student_id)?;

        let query = RegistryQuery::GetCertificateByStudentId {
            student_id: student_id.trim().to_string(),
        };
        let result = self
            .read(session, query)
            .await
            .and_then(|result| certificate(result, "getCertificateByStudentId"));
        not_found_as_none(result)
    }

    /// Ids owned by a student, in issuance order
    pub async fn get_student_certificates(
        &self,
        session: &Session,
        student: &str,
    ) -> Result<Vec<CertificateId>> {
        let student = validate::parse_address("Student address", student)?;

        match self
            .read(session, RegistryQuery::GetStudentCertificates { student })
            .await?
        {
            QueryResult::Ids(ids) => Ok(ids),
            other => Err(unexpected("getStudentCertificates", &other)),
        }
    }

    /// Certificates ever issued
    pub async fn get_total_certificates(&self, session: &Session) -> Result<u64> {
        self.count(session, RegistryQuery::GetTotalCertificates, "getTotalCertificates")
            .await
    }

    /// Certificates currently valid
    pub async fn get_valid_certificates_count(&self, session: &Session) -> Result<u64> {
        self.count(
            session,
            RegistryQuery::GetValidCertificatesCount,
            "getValidCertificatesCount",
        )
        .await
    }

    /// Role membership by role name or identifier
    pub async fn has_role(&self, session: &Session, role: &str, account: &str) -> Result<bool> {
        let role = validate::resolve_role(role)?;
        let account = validate::parse_address("Account", account)?;

        self.network.ensure_network(session).await?;
        session.has_role(role, account).await
    }

    /// Whether an account holds the issuer role published by the registry
    pub async fn is_issuer(&self, session: &Session, account: &str) -> Result<bool> {
        let account = validate::parse_address("Account", account)?;

        self.network.ensure_network(session).await?;
        let issuer = session.issuer_role().await?;
        session.has_role(issuer, account).await
    }

    /// Whether a university is approved
    pub async fn university_approved(&self, session: &Session, name: &str) -> Result<bool> {
        let query = RegistryQuery::UniversityApproved {
            name: name.trim().to_string(),
        };
        match self.read(session, query).await? {
            QueryResult::Bool(approved) => Ok(approved),
            other => Err(unexpected("universityApproved", &other)),
        }
    }

    /// Record and validity in one report
    pub async fn verification_report(
        &self,
        session: &Session,
        id: CertificateId,
    ) -> Result<Option<VerificationReport>> {
        let Some(certificate) = self.get_certificate(session, id).await? else {
            return Ok(None);
        };
        let is_valid = self.verify_certificate(session, id).await?;

        let revoke_reason =
            (!is_valid && !certificate.revoke_reason.is_empty()).then(|| certificate.revoke_reason.clone());

        Ok(Some(VerificationReport {
            certificate_id: id,
            certificate,
            is_valid,
            revoke_reason,
        }))
    }

    async fn count(&self, session: &Session, query: RegistryQuery, method: &str) -> Result<u64> {
        match self.read(session, query).await? {
            QueryResult::Count(count) => Ok(count),
            other => Err(unexpected(method, &other)),
        }
    }

    async fn read(&self, session: &Session, query: RegistryQuery) -> Result<QueryResult> {
        self.network.ensure_network(session).await?;
        debug!(query = ?query, "Registry read");
        session.call(&query).await
    }
}

impl Default for VerificationService {
    fn default() -> Self {
        Self::new(NetworkParams::default())
    }
}

fn certificate(result: QueryResult, method: &str) -> Result<Certificate> {
    match result {
        QueryResult::Certificate(certificate) => Ok(certificate),
        other => Err(unexpected(method, &other)),
    }
}

/// `Ok(None)` for a missing record, the error otherwise
fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ClientError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
