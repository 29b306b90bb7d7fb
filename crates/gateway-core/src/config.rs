//! Configuration for the gateway

use crate::domain::{GasLimit, GatewayError, NetworkId};
use serde::{Deserialize, Serialize};

/// Seven days.
pub const DEFAULT_CHALLENGE_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

/// Gateway configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Network this gateway instance runs on
    pub network_id: NetworkId,
    /// Delay before a recovery ticket becomes executable
    pub recovery_challenge_period_secs: u64,
    /// Ceiling on the serialized size of one buffered batch
    pub max_batch_bytes: usize,
    /// Ceiling on the summed gas limit of one buffered batch
    pub max_batch_gas: GasLimit,
    /// Events retained in the in-memory journal
    pub journal_capacity: usize,
    /// Unexecuted tallies kept per (origin, pool); the oldest is evicted beyond this
    pub max_pending_tallies: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            network_id: 1,
            recovery_challenge_period_secs: DEFAULT_CHALLENGE_PERIOD_SECS,
            max_batch_bytes: 128 * 1024,
            max_batch_gas: 30_000_000,
            journal_capacity: 1024,
            max_pending_tallies: 4096,
        }
    }
}

impl GatewayConfig {
    /// Default configuration for `network_id`.
    pub fn for_network(network_id: NetworkId) -> Self {
        Self {
            network_id,
            ..Default::default()
        }
    }

    /// Reject values the gateway cannot operate with.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.recovery_challenge_period_secs == 0 {
            return Err(GatewayError::InvalidConfig(
                "recovery_challenge_period_secs must be positive".to_string(),
            ));
        }
        // Room for one length prefix and one byte.
        if self.max_batch_bytes < 3 {
            return Err(GatewayError::InvalidConfig(format!(
                "max_batch_bytes {} too small",
                self.max_batch_bytes
            )));
        }
        if self.max_batch_gas == 0 {
            return Err(GatewayError::InvalidConfig(
                "max_batch_gas must be positive".to_string(),
            ));
        }
        if self.max_pending_tallies == 0 {
            return Err(GatewayError::InvalidConfig(
                "max_pending_tallies must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
