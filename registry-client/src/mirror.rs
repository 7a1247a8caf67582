//! Off-chain mirror
//!
//! Best-effort copy of certificate metadata for listing and search outside
//! the ledger. Mirror records are never authoritative; the registry is.
//! Mirror failures are logged by the orchestrator and never change an
//! outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use registry_core::{Address, CertificateId, TxHash};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Mirror failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    /// Mirror cannot be reached
    #[error("mirror unavailable: {0}")]
    Unavailable(String),

    /// Mirror refused the record
    #[error("mirror rejected record: {0}")]
    Rejected(String),
}

/// Mirrored issuance metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRecord {
    /// Certificate id
    pub certificate_id: CertificateId,
    /// Owner
    pub student: Address,
    /// External student id
    pub student_id: String,
    /// Student name
    pub student_name: String,
    /// University
    pub university: String,
    /// Degree
    pub degree: String,
    /// Issuing transaction
    pub transaction_reference: TxHash,
    /// Revocation reason once revoked
    pub revoke_reason: Option<String>,
    /// Always false: the registry is authoritative
    pub authoritative: bool,
    /// Time the mirror stored the record
    pub recorded_at: DateTime<Utc>,
}

/// Destination for mirrored metadata
#[async_trait]
pub trait MirrorSink: Send + Sync {
    /// Store a confirmed issuance
    async fn record_issuance(&self, record: MirrorRecord) -> Result<(), MirrorError>;

    /// Mark a certificate revoked
    async fn record_revocation(&self, id: CertificateId, reason: &str) -> Result<(), MirrorError>;
}

/// In-memory mirror
#[derive(Debug, Default)]
pub struct InMemoryMirror {
    records: DashMap<CertificateId, MirrorRecord>,
    failing: AtomicBool,
}

impl InMemoryMirror {
    /// Empty mirror
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Mirrored record
    pub fn get(&self, id: CertificateId) -> Option<MirrorRecord> {
        self.records.get(&id).map(|record| record.value().clone())
    }

    /// Number of mirrored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing is mirrored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_available(&self) -> Result<(), MirrorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MirrorError::Unavailable("mirror offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MirrorSink for InMemoryMirror {
    async fn record_issuance(&self, mut record: MirrorRecord) -> Result<(), MirrorError> {
        self.check_available()?;
        record.authoritative = false;
        self.records.insert(record.certificate_id, record);
        Ok(())
    }

    async fn record_revocation(&self, id: CertificateId, reason: &str) -> Result<(), MirrorError> {
        self.check_available()?;
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| MirrorError::Rejected(format!("certificate {} not mirrored", id)))?;
        record.revoke_reason = Some(reason.to_string());
        Ok(())
    }
}
