//! Network manager
//!
//! Makes sure a session's provider is on the expected network before any
//! registry call, switching the wallet and registering the network with it
//! when the wallet does not know it yet.

use crate::classify::classify_provider_error;
use crate::config::NetworkParams;
use crate::error::{ClientError, Result};
use crate::provider::UNRECOGNIZED_CHAIN;
use crate::session::Session;
use tracing::{debug, info};

/// Guards the active network
#[derive(Debug, Clone)]
pub struct NetworkManager {
    expected: NetworkParams,
}

impl NetworkManager {
    /// Manager for an expected network
    pub fn new(expected: NetworkParams) -> Self {
        Self { expected }
    }

    /// Expected network
    pub fn expected(&self) -> &NetworkParams {
        &self.expected
    }

    /// Switch the session's provider to the expected network if needed
    ///
    /// Idempotent. An unknown network is registered and the switch retried
    /// once; any other switch failure is classified.
    pub async fn ensure_network(&self, session: &Session) -> Result<()> {
        let provider = session.provider();
        let expected = self.expected.chain_id;

        let current = provider
            .chain_id()
            .await
            .map_err(|e| classify_provider_error(&e))?;
        if current == expected {
            debug!(chain_id = current, "Network already active");
            return Ok(());
        }

        info!(from = current, to = expected, network = %self.expected.name, "Switching network");

        match provider.switch_chain(expected).await {
            Ok(()) => {}
            Err(e) if e.code() == Some(UNRECOGNIZED_CHAIN) => {
                info!(chain_id = expected, "Registering network with wallet");
                provider
                    .add_chain(&self.expected)
                    .await
                    .map_err(|e| classify_provider_error(&e))?;
                provider
                    .switch_chain(expected)
                    .await
                    .map_err(|e| classify_provider_error(&e))?;
            }
            Err(e) => return Err(classify_provider_error(&e)),
        }

        let active = provider
            .chain_id()
            .await
            .map_err(|e| classify_provider_error(&e))?;
        if active != expected {
            return Err(ClientError::WrongNetwork(format!(
                "expected chain {} ({}), connected to {}",
                expected, self.expected.name, active
            )));
        }

        info!(chain_id = active, "Network switched");
        Ok(())
    }
}
