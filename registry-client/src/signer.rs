//! Signer seam
//!
//! A signer holds the identity a session acts as and produces signed
//! transactions. It may be missing entirely (read-only session), locked, or
//! the user may refuse a signature.

use async_trait::async_trait;
use registry_core::{Address, KeyPair, Transaction, UnsignedTransaction};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Signing failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// User declined to sign
    #[error("user rejected signing: {0}")]
    Rejected(String),

    /// Signer cannot sign (locked, disconnected, wrong account)
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// Identity that signs transactions
#[async_trait]
pub trait Signer: Send + Sync {
    /// Account this signer acts as
    fn address(&self) -> Address;

    /// Sign a transaction
    async fn sign(&self, unsigned: UnsignedTransaction) -> Result<Transaction, SignerError>;
}

/// Signer backed by an Ed25519 key pair held in memory
#[derive(Debug)]
pub struct LocalWallet {
    keypair: KeyPair,
    rejecting: AtomicBool,
    locked: AtomicBool,
}

impl LocalWallet {
    /// Wallet for a key pair
    pub fn new(keypair: KeyPair) -> Self {
        Self {
            keypair,
            rejecting: AtomicBool::new(false),
            locked: AtomicBool::new(false),
        }
    }

    /// Simulate the user declining every signature request
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Simulate a locked wallet
    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }
}

#[async_trait]
impl Signer for LocalWallet {
    fn address(&self) -> Address {
        self.keypair.address()
    }

    async fn sign(&self, unsigned: UnsignedTransaction) -> Result<Transaction, SignerError> {
        if self.locked.load(Ordering::SeqCst) {
            return Err(SignerError::Unavailable("wallet is locked".to_string()));
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(SignerError::Rejected("User denied transaction signature.".to_string()));
        }

        self.keypair
            .sign_transaction(unsigned)
            .map_err(|e| SignerError::Unavailable(e.to_string()))
    }
}
