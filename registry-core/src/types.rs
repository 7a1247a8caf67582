//! Core types for the registry ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode) for signing and hashing
//! - Human-readable identifiers (`0x`-prefixed hex) in configs and logs
//! - No interior mutability: state changes go through the registry

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

fn parse_hex_array<const N: usize>(s: &str, what: &str) -> Result<[u8; N]> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| Error::Decode(format!("{} must start with 0x: {}", what, s)))?;

    if digits.len() != N * 2 {
        return Err(Error::Decode(format!(
            "{} must have {} hex digits, got {}",
            what,
            N * 2,
            digits.len()
        )));
    }

    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| Error::Decode(format!("invalid {} {}: {}", what, s, e)))?;
    Ok(out)
}

macro_rules! hex_serde {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

/// Account reference (20 bytes) used to sign transactions and own certificates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// The zero address ("no account"); source of every mint
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive the account address of an Ed25519 verifying key
    /// (last 20 bytes of its SHA-256 digest)
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let digest: [u8; 32] = Sha256::digest(public_key).into();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }

    /// Is this the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Left-pad into a 32-byte log topic
    pub fn to_topic(&self) -> [u8; 32] {
        let mut topic = [0u8; 32];
        topic[12..].copy_from_slice(&self.0);
        topic
    }

    /// Recover an address from a 32-byte log topic
    pub fn from_topic(topic: &[u8; 32]) -> Option<Self> {
        if topic[..12].iter().any(|b| *b != 0) {
            return None;
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&topic[12..]);
        Some(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_array::<20>(s.trim(), "address").map(Self)
    }
}

hex_serde!(Address);

/// Role identifier (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Role([u8; 32]);

impl Role {
    /// Administrative role; may grant/revoke roles and approve universities
    pub const DEFAULT_ADMIN: Role = Role([0u8; 32]);

    /// Name hashed to obtain the issuer role identifier
    pub const ISSUER_ROLE_NAME: &'static str = "ISSUER_ROLE";

    /// Role identifier for a role name (SHA-256 of the name)
    pub fn from_name(name: &str) -> Self {
        Self(Sha256::digest(name.as_bytes()).into())
    }

    /// The issuer role
    pub fn issuer() -> Self {
        Self::from_name(Self::ISSUER_ROLE_NAME)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_array::<32>(s.trim(), "role").map(Self)
    }
}

hex_serde!(Role);

/// Transaction hash (BLAKE3 of the signed transaction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for TxHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_array::<32>(s.trim(), "transaction hash").map(Self)
    }
}

hex_serde!(TxHash);

/// Certificate identifier. Assigned by the registry from 1 upwards, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CertificateId(pub u64);

impl CertificateId {
    /// Numeric value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Encode as a 32-byte big-endian log topic
    pub fn to_topic(&self) -> [u8; 32] {
        let mut topic = [0u8; 32];
        topic[24..].copy_from_slice(&self.0.to_be_bytes());
        topic
    }
}

impl From<u64> for CertificateId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credential record held by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Student full name
    pub student_name: String,
    /// External student identifier (free text)
    pub student_id: String,
    /// Degree title
    pub degree: String,
    /// Major / field of study
    pub major: String,
    /// University name (free text)
    pub university: String,
    /// Ledger time of issuance (unix seconds)
    pub issued_at: i64,
    /// Opaque pointer to externally stored supporting material
    pub content_hash: String,
    /// False once revoked
    pub is_valid: bool,
    /// Graduation date supplied by the issuer (unix seconds)
    pub graduation_date: i64,
    /// Account that issued the certificate
    pub issuer: Address,
    /// Grade point average as written on the credential
    pub gpa: String,
    /// Empty unless revoked
    pub revoke_reason: String,
}

/// Parameters of an issuance call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCertificate {
    /// Owner of the new certificate
    pub student: Address,
    /// Student full name
    pub student_name: String,
    /// External student identifier
    pub student_id: String,
    /// Degree title
    pub degree: String,
    /// Major
    pub major: String,
    /// University name
    pub university: String,
    /// Graduation date (unix seconds)
    pub graduation_date: i64,
    /// Opaque content reference
    pub content_hash: String,
    /// GPA text
    pub gpa: String,
}

impl IssueCertificate {
    /// Text fields paired with their display names, in call order
    pub fn text_fields(&self) -> [(&'static str, &str); 7] {
        [
            ("Student name", self.student_name.as_str()),
            ("Student ID", self.student_id.as_str()),
            ("Degree", self.degree.as_str()),
            ("Major", self.major.as_str()),
            ("University", self.university.as_str()),
            ("Content hash", self.content_hash.as_str()),
            ("GPA", self.gpa.as_str()),
        ]
    }
}

/// Mutating registry call carried by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryCall {
    /// Issue a new certificate
    IssueCertificate(IssueCertificate),
    /// Revoke an existing certificate
    RevokeCertificate {
        /// Certificate to revoke
        id: CertificateId,
        /// Reason stored on the record
        reason: String,
    },
    /// Grant a role
    GrantRole {
        /// Role identifier
        role: Role,
        /// Grantee
        account: Address,
    },
    /// Revoke a role
    RevokeRole {
        /// Role identifier
        role: Role,
        /// Account losing the role
        account: Address,
    },
    /// Add a university to the approval set
    ApproveUniversity {
        /// University name
        name: String,
    },
}

impl RegistryCall {
    /// Contract method name, for logs
    pub fn method_name(&self) -> &'static str {
        match self {
            RegistryCall::IssueCertificate(_) => "issueCertificate",
            RegistryCall::RevokeCertificate { .. } => "revokeCertificate",
            RegistryCall::GrantRole { .. } => "grantRole",
            RegistryCall::RevokeRole { .. } => "revokeRole",
            RegistryCall::ApproveUniversity { .. } => "approveUniversity",
        }
    }
}

/// Read-only registry call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryQuery {
    /// Token collection name
    Name,
    /// Token collection symbol
    Symbol,
    /// Issuer role identifier
    IssuerRole,
    /// Role membership
    HasRole {
        /// Role identifier
        role: Role,
        /// Account to check
        account: Address,
    },
    /// University approval
    UniversityApproved {
        /// University name
        name: String,
    },
    /// Full record by id
    GetCertificate {
        /// Certificate id
        id: CertificateId,
    },
    /// Validity flag by id
    VerifyCertificate {
        /// Certificate id
        id: CertificateId,
    },
    /// Full record by external student id
    GetCertificateByStudentId {
        /// External student id
        student_id: String,
    },
    /// Ids owned by a student, in issuance order
    GetStudentCertificates {
        /// Owner
        student: Address,
    },
    /// Total issued
    GetTotalCertificates,
    /// Currently valid
    GetValidCertificatesCount,
    /// Owner of a certificate
    OwnerOf {
        /// Certificate id
        id: CertificateId,
    },
    /// Number of certificates owned
    BalanceOf {
        /// Owner
        owner: Address,
    },
}

/// Result of a registry query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryResult {
    /// Text value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Role identifier
    Role(Role),
    /// Account reference
    Address(Address),
    /// Certificate record
    Certificate(Certificate),
    /// Certificate ids
    Ids(Vec<CertificateId>),
    /// Counter value
    Count(u64),
}

impl QueryResult {
    /// Variant name, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            QueryResult::Text(_) => "text",
            QueryResult::Bool(_) => "bool",
            QueryResult::Role(_) => "role",
            QueryResult::Address(_) => "address",
            QueryResult::Certificate(_) => "certificate",
            QueryResult::Ids(_) => "ids",
            QueryResult::Count(_) => "count",
        }
    }
}

/// Digital signature (Ed25519, 64 bytes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes.to_vec())
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Verify signature
    pub fn verify(&self, message: &[u8], public_key: &[u8; 32]) -> bool {
        use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};

        let bytes: [u8; 64] = match self.0.as_slice().try_into() {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let signature = DalekSignature::from_bytes(&bytes);

        let verifying_key = match VerifyingKey::from_bytes(public_key) {
            Ok(key) => key,
            Err(_) => return false,
        };

        verifying_key.verify(message, &signature).is_ok()
    }
}

/// Transaction before signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Network the transaction is valid on
    pub chain_id: u64,
    /// Per-sender sequence number
    pub nonce: u64,
    /// Sender
    pub from: Address,
    /// Registry contract address
    pub to: Address,
    /// Call to execute
    pub call: RegistryCall,
}

impl UnsignedTransaction {
    /// Canonical bytes covered by the signature
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

/// Signed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Signed payload
    pub unsigned: UnsignedTransaction,
    /// Sender's Ed25519 verifying key
    pub public_key: [u8; 32],
    /// Signature over `unsigned.canonical_bytes()`
    pub signature: Signature,
}

impl Transaction {
    /// Transaction hash
    pub fn hash(&self) -> Result<TxHash> {
        let bytes = bincode::serialize(self)?;
        Ok(TxHash(*blake3::hash(&bytes).as_bytes()))
    }

    /// Sender
    pub fn from(&self) -> Address {
        self.unsigned.from
    }

    /// Check the signature and that the key belongs to the sender
    pub fn verify_signature(&self) -> Result<()> {
        if Address::from_public_key(&self.public_key) != self.unsigned.from {
            return Err(Error::SignatureError(format!(
                "public key does not match sender {}",
                self.unsigned.from
            )));
        }

        let message = self.unsigned.canonical_bytes()?;
        if !self.signature.verify(&message, &self.public_key) {
            return Err(Error::SignatureError("invalid transaction signature".to_string()));
        }

        Ok(())
    }
}

/// Structured log entry emitted by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Emitting contract
    pub address: Address,
    /// Indexed fields; `topics[0]` is the event signature hash
    pub topics: Vec<[u8; 32]>,
    /// Non-indexed fields (bincode)
    pub data: Vec<u8>,
}

/// Execution status recorded in a receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Call executed, logs emitted
    Success,
    /// Call rejected at inclusion; no state change
    Reverted {
        /// Revert reason string
        reason: String,
    },
}

/// Confirmation returned once a transaction is included in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Including block
    pub block_number: u64,
    /// Including block hash
    pub block_hash: [u8; 32],
    /// Sender
    pub from: Address,
    /// Target contract
    pub to: Address,
    /// Execution status
    pub status: TxStatus,
    /// Emitted logs (empty when reverted)
    pub logs: Vec<LogEntry>,
}

impl Receipt {
    /// True if the call executed
    pub fn is_success(&self) -> bool {
        matches!(self.status, TxStatus::Success)
    }
}

/// Produced block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Unique block ID
    pub block_id: Uuid,

    /// Block number (sequential, genesis = 0)
    pub number: u64,

    /// Merkle root of transaction hashes
    pub tx_root: [u8; 32],

    /// Hash of previous block
    pub parent_hash: [u8; 32],

    /// Hash of this block's header
    pub hash: [u8; 32],

    /// Transactions in inclusion order
    pub tx_hashes: Vec<TxHash>,

    /// Ledger timestamp (unix seconds)
    pub timestamp: i64,

    /// Wall-clock creation time
    pub created_at: DateTime<Utc>,
}

impl Block {
    /// Compute block hash
    pub fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.tx_root);
        hasher.update(self.parent_hash);
        hasher.update((self.tx_hashes.len() as u64).to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());

        hasher.finalize().into()
    }
}
