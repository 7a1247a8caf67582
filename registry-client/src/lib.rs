//! Certchain Registry Client
//!
//! Client side of the certificate registry: network selection, the
//! construct / submit / confirm protocol for mutations, and read-only
//! verification.
//!
//! # Architecture
//!
//! - **Session**: provider, signer and registry address for one identity,
//!   passed explicitly into every operation
//! - **NetworkManager**: switches the wallet to the expected network,
//!   registering it first when the wallet does not know it
//! - **TransactionOrchestrator**: validates, pre-checks, submits and decodes
//!   mutations into a [`TxOutcome`]
//! - **VerificationService**: uncached registry reads
//! - **classify**: the only place provider and revert text is interpreted
//!
//! # Example
//!
//! ```no_run
//! use registry_client::{
//!     ClientConfig, InProcessProvider, IssueRequest, LocalWallet, Session,
//!     TransactionOrchestrator,
//! };
//! use registry_core::{Config, KeyPair, Ledger};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let admin = KeyPair::generate();
//!     let mut devnet = Config::default();
//!     devnet.genesis.issuers.push(admin.address());
//!     let ledger = Arc::new(Ledger::open(devnet, admin.address()).await?);
//!
//!     let provider = Arc::new(InProcessProvider::connected_to(ledger.clone()));
//!     let session = Session::new(provider, ledger.registry_address())
//!         .with_signer(Arc::new(LocalWallet::new(admin)));
//!
//!     let orchestrator = TransactionOrchestrator::new(ClientConfig::default())?;
//!     let outcome = orchestrator
//!         .issue_certificate(&session, IssueRequest {
//!             student_name: "Nguyễn Văn An".to_string(),
//!             student_id: "SV20241001".to_string(),
//!             degree: "Kỹ sư".to_string(),
//!             major: "Khoa học máy tính".to_string(),
//!             university: "Đại học Bách Khoa Hà Nội".to_string(),
//!             gpa: "3.75".to_string(),
//!             ..Default::default()
//!         })
//!         .await;
//!     println!("{:?} {:?}", outcome.status, outcome.identifier);
//!
//!     ledger.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod classify;
pub mod config;
pub mod error;
pub mod metrics;
pub mod mirror;
pub mod network;
pub mod orchestrator;
pub mod outcome;
pub mod provider;
pub mod receipt;
pub mod session;
pub mod signer;
pub mod validate;
pub mod verification;

// Re-exports
pub use config::{ClientConfig, NetworkParams};
pub use error::{ClientError, ErrorKind, Result};
pub use metrics::ClientMetrics;
pub use mirror::{InMemoryMirror, MirrorRecord, MirrorSink};
pub use network::NetworkManager;
pub use orchestrator::{IssueRequest, MutationKind, TransactionOrchestrator};
pub use outcome::{OutcomeStatus, TxOutcome, SENTINEL_ID};
pub use provider::local::InProcessProvider;
pub use provider::{LedgerProvider, ProviderError};
pub use receipt::{decode_assigned_id, IdRecovery};
pub use session::Session;
pub use signer::{LocalWallet, Signer, SignerError};
pub use verification::{VerificationReport, VerificationService};
