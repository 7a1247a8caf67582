//! Sessions
//!
//! A [`Session`] binds a provider, an optional signer and the registry
//! address. It is created per connected identity and passed explicitly into
//! every operation; several sessions may share one provider.

use crate::classify::classify_provider_error;
use crate::error::{ClientError, Result};
use crate::provider::LedgerProvider;
use crate::signer::Signer;
use registry_core::{Address, QueryResult, RegistryQuery, Role};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Connection context for registry operations
pub struct Session {
    provider: Arc<dyn LedgerProvider>,
    signer: Option<Arc<dyn Signer>>,
    registry: Address,
    submit_lock: Mutex<()>,
}

impl Session {
    /// Read-only session
    pub fn new(provider: Arc<dyn LedgerProvider>, registry: Address) -> Self {
        Self {
            provider,
            signer: None,
            registry,
            submit_lock: Mutex::new(()),
        }
    }

    /// Attach the identity that signs mutations
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Provider
    pub fn provider(&self) -> &dyn LedgerProvider {
        self.provider.as_ref()
    }

    /// Signer, or `WalletUnavailable` for a read-only session
    pub fn signer(&self) -> Result<&dyn Signer> {
        self.signer
            .as_deref()
            .ok_or_else(|| ClientError::WalletUnavailable("No wallet connected".to_string()))
    }

    /// Signer's account, if any
    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|signer| signer.address())
    }

    /// Registry contract
    pub fn registry(&self) -> Address {
        self.registry
    }

    /// Serializes nonce acquisition and broadcast for this identity
    pub async fn lock_submissions(&self) -> MutexGuard<'_, ()> {
        self.submit_lock.lock().await
    }

    /// Registry read through the provider
    pub async fn call(&self, query: &RegistryQuery) -> Result<QueryResult> {
        self.provider
            .call(self.registry, query)
            .await
            .map_err(|e| classify_provider_error(&e))
    }

    /// Issuer role identifier as published by the registry
    pub async fn issuer_role(&self) -> Result<Role> {
        match self.call(&RegistryQuery::IssuerRole).await? {
            QueryResult::Role(role) => Ok(role),
            other => Err(unexpected("ISSUER_ROLE", &other)),
        }
    }

    /// Role membership
    pub async fn has_role(&self, role: Role, account: Address) -> Result<bool> {
        match self.call(&RegistryQuery::HasRole { role, account }).await? {
            QueryResult::Bool(held) => Ok(held),
            other => Err(unexpected("hasRole", &other)),
        }
    }
}

/// Registry answered with the wrong result shape
pub(crate) fn unexpected(method: &str, result: &QueryResult) -> ClientError {
    ClientError::Unknown(format!("unexpected {} result from {}", result.kind(), method))
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("registry", &self.registry)
            .field("signer", &self.address())
            .finish()
    }
}
