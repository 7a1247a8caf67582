//! Certchain Registry Core
//!
//! Ledger-resident side of the certificate registry: identities, roles, the
//! certificate registry state machine, event logs and receipts, plus a
//! single-node devnet ledger that hosts the registry.
//!
//! # Architecture
//!
//! - **Registry**: credential store gated by role-based access control
//! - **Single Writer**: one actor admits transactions and seals blocks
//! - **Receipts**: execution results with structured logs, the only channel
//!   through which a mutation reports back
//! - **Merkle Root**: each block commits to its transaction hashes
//!
//! # Invariants
//!
//! - Certificate ids are sequential from 1 and never reused
//! - Revocation is terminal: valid → revoked, never back
//! - `valid == issued − revoked` at every block
//! - Per-sender nonces are strictly sequential

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod access;
pub mod actor;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod registry;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use crypto::KeyPair;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use registry::CertificateRegistry;
pub use storage::Storage;
pub use types::{
    Address, Block, Certificate, CertificateId, IssueCertificate, LogEntry, QueryResult, Receipt,
    RegistryCall, RegistryQuery, Role, Signature, Transaction, TxHash, TxStatus,
    UnsignedTransaction,
};
