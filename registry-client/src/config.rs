//! Configuration for the registry client

use registry_core::Address;
use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Network every operation must run against
    pub network: NetworkParams,

    /// Deployed registry
    pub registry_address: Option<Address>,

    /// Receipt polling
    pub confirmation: ConfirmationConfig,

    /// Transaction submission
    pub submission: SubmissionConfig,
}

/// Parameters of the expected network, as registered with a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Chain identifier
    pub chain_id: u64,

    /// Display name
    pub name: String,

    /// RPC endpoint
    pub rpc_url: String,

    /// Native currency
    pub native_currency: NativeCurrency,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            chain_id: 31337,
            name: "Local Test Network".to_string(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            native_currency: NativeCurrency::default(),
        }
    }
}

/// Native currency of a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeCurrency {
    /// Name
    pub name: String,

    /// Ticker symbol
    pub symbol: String,

    /// Decimal places
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self {
            name: "ETH".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Receipt polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Give up waiting and report the transaction as pending (milliseconds)
    pub timeout_ms: u64,

    /// Interval between receipt polls (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            poll_interval_ms: 250,
        }
    }
}

/// Submission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Resubmissions after a nonce rejection
    pub max_nonce_retries: u32,

    /// Check roles before submitting
    pub precheck_roles: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_nonce_retries: 3,
            precheck_roles: true,
        }
    }
}

impl ClientConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = ClientConfig::default();

        if let Ok(chain_id) = std::env::var("REGISTRY_CHAIN_ID") {
            config.network.chain_id = chain_id
                .parse()
                .map_err(|e| crate::ClientError::Config(format!("REGISTRY_CHAIN_ID: {}", e)))?;
        }

        if let Ok(url) = std::env::var("REGISTRY_RPC_URL") {
            config.network.rpc_url = url;
        }

        if let Ok(address) = std::env::var("REGISTRY_ADDRESS") {
            config.registry_address = Some(
                address
                    .parse()
                    .map_err(|e| crate::ClientError::Config(format!("REGISTRY_ADDRESS: {}", e)))?,
            );
        }

        if let Ok(timeout) = std::env::var("REGISTRY_CONFIRMATION_TIMEOUT_MS") {
            config.confirmation.timeout_ms = timeout.parse().map_err(|e| {
                crate::ClientError::Config(format!("REGISTRY_CONFIRMATION_TIMEOUT_MS: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the orchestrator cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.confirmation.poll_interval_ms == 0 {
            return Err(crate::ClientError::Config(
                "confirmation.poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.confirmation.timeout_ms == 0 {
            return Err(crate::ClientError::Config(
                "confirmation.timeout_ms must be positive".to_string(),
            ));
        }
        if self.network.name.trim().is_empty() {
            return Err(crate::ClientError::Config("network.name must not be empty".to_string()));
        }
        Ok(())
    }
}
