//! # Outbound Ports
//!
//! Traits for external dependencies (transport adapters, the message
//! processor, time).

use crate::domain::{Address, AdapterId, Amount, GasLimit, NetworkId};
use async_trait::async_trait;
use thiserror::Error;

/// Transport adapter error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Transport cannot reach the destination.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Transport refused the payload or payment.
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Acknowledgement of a transport send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterReceipt {
    /// Adapter that sent the payload.
    pub adapter: AdapterId,
    /// Value kept by the transport.
    pub fee_paid: Amount,
    /// Transport-specific reference (message id, nonce).
    pub reference: u64,
}

/// Transport plugin - outbound port.
///
/// The same identity is used by the adapter's endpoints on every network,
/// so a destination gateway recognises the caller of `handle` by `id()`.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Stable identity.
    fn id(&self) -> AdapterId;

    /// Transmit `payload` to `dest`, paying `payment`. Overpayment goes to `refund`.
    async fn send(
        &self,
        dest: NetworkId,
        payload: &[u8],
        gas_limit: GasLimit,
        payment: Amount,
        refund: Address,
    ) -> Result<AdapterReceipt, AdapterError>;

    /// Quote the cost of sending `payload`.
    async fn estimate(
        &self,
        dest: NetworkId,
        payload: &[u8],
        gas_limit: GasLimit,
    ) -> Result<Amount, AdapterError>;
}

/// Message processor error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Processor rejected message: {0}")]
pub struct ProcessorError(pub String);

/// Business logic consuming executed messages - outbound port.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    /// Handle one decoded message from `origin`.
    async fn handle(&self, origin: NetworkId, message: &[u8]) -> Result<(), ProcessorError>;
}

/// Time source for consistent timestamp handling.
pub trait TimeSource: Send + Sync {
    /// Current timestamp in seconds since epoch.
    fn now(&self) -> u64;
}
