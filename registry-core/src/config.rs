//! Configuration for the devnet ledger

use crate::types::Address;
use serde::{Deserialize, Serialize};

/// Devnet ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Network identifier; transactions for any other chain are rejected
    pub chain_id: u64,

    /// Block production
    pub block: BlockConfig,

    /// Registry deployment options
    pub registry: RegistryConfig,

    /// Actor mailbox capacity (bounded for backpressure)
    pub mailbox_capacity: usize,

    /// State applied at deployment
    pub genesis: GenesisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "registry-devnet".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            chain_id: 31337,
            block: BlockConfig::default(),
            registry: RegistryConfig::default(),
            mailbox_capacity: 1000,
            genesis: GenesisConfig::default(),
        }
    }
}

/// Block production configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Seal a block once the mempool holds this many transactions
    pub max_txs_per_block: usize,

    /// Interval between block production ticks (milliseconds)
    pub block_time_ms: u64,

    /// Seal a block for every admitted transaction
    pub automine: bool,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            max_txs_per_block: 100,
            block_time_ms: 1000,
            automine: true,
        }
    }
}

/// Registry deployment options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Reject issuance for universities outside the approval set
    pub require_approved_university: bool,
}

/// Roles and approvals provisioned at deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Accounts granted the issuer role
    pub issuers: Vec<Address>,

    /// Pre-approved university names
    pub universities: Vec<String>,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(chain_id) = std::env::var("DEVNET_CHAIN_ID") {
            config.chain_id = chain_id
                .parse()
                .map_err(|e| crate::Error::Config(format!("DEVNET_CHAIN_ID: {}", e)))?;
        }

        if let Ok(block_time) = std::env::var("DEVNET_BLOCK_TIME_MS") {
            config.block.block_time_ms = block_time
                .parse()
                .map_err(|e| crate::Error::Config(format!("DEVNET_BLOCK_TIME_MS: {}", e)))?;
        }

        if let Ok(automine) = std::env::var("DEVNET_AUTOMINE") {
            config.block.automine = automine
                .parse()
                .map_err(|e| crate::Error::Config(format!("DEVNET_AUTOMINE: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the actor cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.block.max_txs_per_block == 0 {
            return Err(crate::Error::Config(
                "block.max_txs_per_block must be positive".to_string(),
            ));
        }
        if self.block.block_time_ms == 0 {
            return Err(crate::Error::Config(
                "block.block_time_ms must be positive".to_string(),
            ));
        }
        if self.mailbox_capacity == 0 {
            return Err(crate::Error::Config("mailbox_capacity must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "registry-devnet");
        assert_eq!(config.chain_id, 31337);
        assert!(config.block.automine);
        assert!(!config.registry.require_approved_university);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
chain_id = 1337

[block]
automine = false
block_time_ms = 50

[registry]
require_approved_university = true

[genesis]
universities = ["Đại học Bách Khoa Hà Nội"]
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.chain_id, 1337);
        assert!(!config.block.automine);
        assert_eq!(config.block.block_time_ms, 50);
        assert_eq!(config.block.max_txs_per_block, 100);
        assert!(config.registry.require_approved_university);
        assert_eq!(config.genesis.universities.len(), 1);
        assert!(config.genesis.issuers.is_empty());
    }

    #[test]
    fn test_from_file_rejects_zero_block_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[block]\nmax_txs_per_block = 0").unwrap();

        assert!(matches!(
            Config::from_file(file.path()),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chain_id = \"not a number\"").unwrap();

        assert!(Config::from_file(file.path()).is_err());
    }
}
