//! Certificate registry state machine
//!
//! The registry is the ledger-resident credential store. It is executed by
//! the devnet ledger one transaction at a time, in block order:
//!
//! - [`CertificateRegistry::precheck`] evaluates every precondition of a call
//!   without touching state (used for dry runs at submission)
//! - [`CertificateRegistry::execute`] re-runs the same checks and applies the
//!   call, returning the emitted logs; a failed check leaves state untouched
//! - [`CertificateRegistry::query`] serves read-only calls
//!
//! # Invariants
//!
//! - Ids are assigned sequentially from 1 and never reused
//! - A certificate changes only once, from valid to revoked
//! - `total_issued` and `valid_count` are maintained incrementally
//! - At most one valid certificate per student id

use crate::access::AccessControl;
use crate::config::RegistryConfig;
use crate::events;
use crate::types::{
    Address, Certificate, CertificateId, IssueCertificate, LogEntry, QueryResult, RegistryCall,
    RegistryQuery, Role,
};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Token collection name
pub const NAME: &str = "Academic Certificate";

/// Token collection symbol
pub const SYMBOL: &str = "ACERT";

/// Caller and ledger time for one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Transaction sender
    pub sender: Address,
    /// Block timestamp (unix seconds)
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
struct Record {
    certificate: Certificate,
    owner: Address,
}

/// Credential store with its indices and counters
#[derive(Debug, Clone)]
pub struct CertificateRegistry {
    address: Address,
    access: AccessControl,
    require_approved_university: bool,
    records: BTreeMap<CertificateId, Record>,
    by_student_id: HashMap<String, CertificateId>,
    by_owner: HashMap<Address, Vec<CertificateId>>,
    total_issued: u64,
    valid_count: u64,
}

impl CertificateRegistry {
    /// Deploy a registry at `address`; `deployer` becomes the administrator
    pub fn deploy(address: Address, deployer: Address, config: &RegistryConfig) -> Self {
        Self {
            address,
            access: AccessControl::with_admin(deployer),
            require_approved_university: config.require_approved_university,
            records: BTreeMap::new(),
            by_student_id: HashMap::new(),
            by_owner: HashMap::new(),
            total_issued: 0,
            valid_count: 0,
        }
    }

    /// Contract address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Role and approval membership
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Check every precondition of `call` without changing state
    pub fn precheck(&self, ctx: &CallContext, call: &RegistryCall) -> Result<()> {
        match call {
            RegistryCall::IssueCertificate(params) => self.check_issue(&ctx.sender, params),
            RegistryCall::RevokeCertificate { id, reason } => {
                self.check_revoke(&ctx.sender, *id, reason)
            }
            RegistryCall::GrantRole { .. } | RegistryCall::RevokeRole { .. } => {
                self.access.check_admin(&ctx.sender)
            }
            RegistryCall::ApproveUniversity { name } => {
                self.access.check_approve_university(&ctx.sender, name)
            }
        }
    }

    /// Apply `call`, returning the emitted logs
    pub fn execute(&mut self, ctx: &CallContext, call: &RegistryCall) -> Result<Vec<LogEntry>> {
        self.precheck(ctx, call)?;

        let logs = match call {
            RegistryCall::IssueCertificate(params) => {
                let id = self.apply_issue(ctx, params);
                tracing::info!(
                    certificate_id = %id,
                    student = %params.student,
                    issuer = %ctx.sender,
                    "Certificate issued"
                );
                vec![
                    events::transfer(self.address, Address::ZERO, params.student, id),
                    events::certificate_issued(self.address, id, params.student, &params.student_id),
                ]
            }
            RegistryCall::RevokeCertificate { id, reason } => {
                self.apply_revoke(*id, reason)?;
                tracing::info!(certificate_id = %id, revoker = %ctx.sender, "Certificate revoked");
                vec![events::certificate_revoked(self.address, *id, reason)]
            }
            RegistryCall::GrantRole { role, account } => {
                if self.access.grant_role(&ctx.sender, *role, *account)? {
                    vec![events::role_granted(self.address, *role, *account, ctx.sender)]
                } else {
                    Vec::new()
                }
            }
            RegistryCall::RevokeRole { role, account } => {
                if self.access.revoke_role(&ctx.sender, role, account)? {
                    vec![events::role_revoked(self.address, *role, *account, ctx.sender)]
                } else {
                    Vec::new()
                }
            }
            RegistryCall::ApproveUniversity { name } => {
                if self.access.approve_university(&ctx.sender, name)? {
                    vec![events::university_approved(self.address, name)]
                } else {
                    Vec::new()
                }
            }
        };

        Ok(logs)
    }

    /// Serve a read-only call
    pub fn query(&self, query: &RegistryQuery) -> Result<QueryResult> {
        let result = match query {
            RegistryQuery::Name => QueryResult::Text(NAME.to_string()),
            RegistryQuery::Symbol => QueryResult::Text(SYMBOL.to_string()),
            RegistryQuery::IssuerRole => QueryResult::Role(Role::issuer()),
            RegistryQuery::HasRole { role, account } => {
                QueryResult::Bool(self.access.has_role(role, account))
            }
            RegistryQuery::UniversityApproved { name } => {
                QueryResult::Bool(self.access.university_approved(name))
            }
            RegistryQuery::GetCertificate { id } => {
                QueryResult::Certificate(self.get_certificate(*id)?.clone())
            }
            RegistryQuery::VerifyCertificate { id } => {
                QueryResult::Bool(self.verify_certificate(*id))
            }
            RegistryQuery::GetCertificateByStudentId { student_id } => {
                QueryResult::Certificate(self.get_certificate_by_student_id(student_id)?.clone())
            }
            RegistryQuery::GetStudentCertificates { student } => {
                QueryResult::Ids(self.student_certificates(student).to_vec())
            }
            RegistryQuery::GetTotalCertificates => QueryResult::Count(self.total_certificates()),
            RegistryQuery::GetValidCertificatesCount => {
                QueryResult::Count(self.valid_certificates_count())
            }
            RegistryQuery::OwnerOf { id } => QueryResult::Address(self.owner_of(*id)?),
            RegistryQuery::BalanceOf { owner } => QueryResult::Count(self.balance_of(owner)),
        };

        Ok(result)
    }

    /// Certificate by id
    pub fn get_certificate(&self, id: CertificateId) -> Result<&Certificate> {
        self.records
            .get(&id)
            .map(|record| &record.certificate)
            .ok_or_else(|| Error::revert("Certificate does not exist"))
    }

    /// Certificate by external student id
    pub fn get_certificate_by_student_id(&self, student_id: &str) -> Result<&Certificate> {
        self.by_student_id
            .get(student_id)
            .and_then(|id| self.records.get(id))
            .map(|record| &record.certificate)
            .ok_or_else(|| Error::revert("No certificate found for student ID"))
    }

    /// Validity flag; unknown ids read as not valid
    pub fn verify_certificate(&self, id: CertificateId) -> bool {
        self.records
            .get(&id)
            .map(|record| record.certificate.is_valid)
            .unwrap_or(false)
    }

    /// Ids owned by `student`, in issuance order
    pub fn student_certificates(&self, student: &Address) -> &[CertificateId] {
        self.by_owner.get(student).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total certificates ever issued
    pub fn total_certificates(&self) -> u64 {
        self.total_issued
    }

    /// Certificates currently valid
    pub fn valid_certificates_count(&self) -> u64 {
        self.valid_count
    }

    /// Owner of a certificate
    pub fn owner_of(&self, id: CertificateId) -> Result<Address> {
        self.records
            .get(&id)
            .map(|record| record.owner)
            .ok_or_else(|| Error::revert("Certificate does not exist"))
    }

    /// Number of certificates owned by `owner`
    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.student_certificates(owner).len() as u64
    }

    fn check_issue(&self, sender: &Address, params: &IssueCertificate) -> Result<()> {
        if !self.access.has_role(&Role::issuer(), sender) {
            return Err(Error::revert("Caller is not an issuer"));
        }

        if params.student.is_zero() {
            return Err(Error::revert("Invalid student address"));
        }

        for (field, value) in params.text_fields() {
            if value.trim().is_empty() {
                return Err(Error::revert(format!("{} cannot be empty", field)));
            }
        }

        if self.require_approved_university && !self.access.university_approved(&params.university) {
            return Err(Error::revert("University not approved"));
        }

        let live = self
            .by_student_id
            .get(&params.student_id)
            .map(|id| self.verify_certificate(*id))
            .unwrap_or(false);
        if live {
            return Err(Error::revert("Certificate already exists for student ID"));
        }

        Ok(())
    }

    fn check_revoke(&self, sender: &Address, id: CertificateId, reason: &str) -> Result<()> {
        let certificate = self.get_certificate(id)?;

        let is_original_issuer =
            certificate.issuer == *sender && self.access.has_role(&Role::issuer(), sender);
        if !is_original_issuer && !self.access.has_role(&Role::DEFAULT_ADMIN, sender) {
            return Err(Error::revert("Caller is not authorized to revoke"));
        }

        if !certificate.is_valid {
            return Err(Error::revert("Certificate already revoked"));
        }

        if reason.trim().is_empty() {
            return Err(Error::revert("Revoke reason cannot be empty"));
        }

        Ok(())
    }

    fn apply_issue(&mut self, ctx: &CallContext, params: &IssueCertificate) -> CertificateId {
        let id = CertificateId(self.total_issued + 1);

        let certificate = Certificate {
            student_name: params.student_name.clone(),
            student_id: params.student_id.clone(),
            degree: params.degree.clone(),
            major: params.major.clone(),
            university: params.university.clone(),
            issued_at: ctx.timestamp,
            content_hash: params.content_hash.clone(),
            is_valid: true,
            graduation_date: params.graduation_date,
            issuer: ctx.sender,
            gpa: params.gpa.clone(),
            revoke_reason: String::new(),
        };

        self.records.insert(
            id,
            Record {
                certificate,
                owner: params.student,
            },
        );
        self.by_student_id.insert(params.student_id.clone(), id);
        self.by_owner.entry(params.student).or_default().push(id);
        self.total_issued += 1;
        self.valid_count += 1;

        id
    }

    fn apply_revoke(&mut self, id: CertificateId, reason: &str) -> Result<()> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| Error::revert("Certificate does not exist"))?;

        record.certificate.is_valid = false;
        record.certificate.revoke_reason = reason.to_string();
        self.valid_count -= 1;

        Ok(())
    }
}
