//! Cryptographic operations for the registry ledger
//!
//! This module provides:
//! - Ed25519 key pairs that back ledger identities
//! - Transaction signing
//! - SHA-256 hashing for addresses, event topics and blocks
//! - Merkle roots over transaction hashes

use crate::types::{Address, Signature, Transaction, UnsignedTransaction};
use crate::{Error, Result};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

/// Ed25519 key pair for signing
#[derive(Debug, Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Get public key bytes
    pub fn public_key(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Ledger address of this key
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        let signature = self.signing_key.sign(message);
        Signature::from_bytes(signature.to_bytes())
    }

    /// Verify a signature
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        let bytes: [u8; 64] = signature
            .as_bytes()
            .try_into()
            .map_err(|_| Error::SignatureError("signature must be 64 bytes".to_string()))?;
        let dalek_sig = DalekSignature::from_bytes(&bytes);
        self.verifying_key
            .verify(message, &dalek_sig)
            .map_err(|e| Error::SignatureError(format!("Verification failed: {}", e)))
    }

    /// Sign a transaction. The sender must be this key's address.
    pub fn sign_transaction(&self, unsigned: UnsignedTransaction) -> Result<Transaction> {
        if unsigned.from != self.address() {
            return Err(Error::SignatureError(format!(
                "key for {} cannot sign for {}",
                self.address(),
                unsigned.from
            )));
        }

        let signature = self.sign(&unsigned.canonical_bytes()?);
        Ok(Transaction {
            unsigned,
            public_key: self.public_key(),
            signature,
        })
    }
}

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Topic hash of an event signature, e.g. `Transfer(address,address,uint256)`
pub fn event_topic(signature: &str) -> [u8; 32] {
    hash_bytes(signature.as_bytes())
}

/// Deterministic contract address for a deployment by `deployer`
pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(deployer.as_bytes());
    hasher.update(nonce.to_be_bytes());
    let digest: [u8; 32] = hasher.finalize().into();

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from_bytes(bytes)
}

/// Create a Merkle root from transaction hashes
///
/// If a level has odd length, the last hash is duplicated.
pub fn merkle_root(hashes: &[[u8; 32]]) -> [u8; 32] {
    if hashes.is_empty() {
        return [0u8; 32];
    }

    let mut current_level: Vec<[u8; 32]> = hashes.to_vec();

    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity(current_level.len().div_ceil(2));

        for pair in current_level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);

            let mut hasher = Sha256::new();
            hasher.update(left);
            hasher.update(right);
            next_level.push(hasher.finalize().into());
        }

        current_level = next_level;
    }

    current_level[0]
}
