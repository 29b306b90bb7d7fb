//! # Domain Errors
//!
//! Error types for the multi-adapter gateway.

use thiserror::Error;

/// Hash type (32-byte Keccak-256).
pub type Hash = [u8; 32];

/// Address type (20-byte). Identifies callers, adapters and refund targets.
pub type Address = [u8; 20];

/// Identifier of a connected network.
pub type NetworkId = u16;

/// Identifier of the pool (business unit) owning a message flow.
pub type PoolId = u64;

/// Native value used for fees, subsidies and refunds.
pub type Amount = u128;

/// Gas limit requested for execution on the destination network.
pub type GasLimit = u64;

/// Position of an adapter inside an adapter set. Slot 0 is the primary.
pub type AdapterSlot = u8;

/// Identity of an adapter, shared by its endpoints on every network.
pub type AdapterId = Address;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Inbound call from a source that is not configured for the route.
    #[error("Invalid adapter {adapter} for network {network}, pool {pool}")]
    InvalidAdapter {
        /// Hex-encoded caller address.
        adapter: String,
        /// Origin network.
        network: NetworkId,
        /// Pool the payload was addressed to.
        pool: PoolId,
    },

    /// No adapter set configured for the destination.
    #[error("Unknown destination: network {network}, pool {pool}")]
    UnknownDestination {
        /// Destination network.
        network: NetworkId,
        /// Pool id.
        pool: PoolId,
    },

    /// Adapter set longer than the supported maximum.
    #[error("Too many adapters: {count} > {max}")]
    TooManyAdapters {
        /// Requested adapter count.
        count: usize,
        /// Maximum supported.
        max: usize,
    },

    /// Quorum is zero or exceeds the adapter count.
    #[error("Invalid quorum {quorum} for {count} adapters")]
    InvalidQuorum {
        /// Requested quorum.
        quorum: u8,
        /// Adapter count.
        count: usize,
    },

    /// The same adapter appears twice in one set.
    #[error("Duplicate adapter {0}")]
    DuplicateAdapter(String),

    /// Adapter id not present in the transport table.
    #[error("Unknown adapter {0}")]
    UnknownAdapter(String),

    /// Caller already has an open batching session.
    #[error("Already batching")]
    AlreadyBatching,

    /// Caller has no open batching session.
    #[error("Not batching")]
    NotBatching,

    /// Neither attached value nor subsidy covers the dispatch cost.
    #[error("Insufficient funding: required {required}, available {available}")]
    InsufficientFunding {
        /// Quoted cost.
        required: Amount,
        /// Attached value plus subsidy.
        available: Amount,
    },

    /// Recovery challenge period has not elapsed yet.
    #[error("Recovery not elapsed: executable at {executable_at}, now {now}")]
    RecoveryNotElapsed {
        /// Timestamp at which the ticket becomes executable.
        executable_at: u64,
        /// Current timestamp.
        now: u64,
    },

    /// No pending recovery ticket for the key.
    #[error("No pending recovery")]
    NoPendingRecovery,

    /// Recovery ticket can no longer be disputed.
    #[error("Recovery not disputable: challenge period ended at {expired_at}")]
    NotDisputable {
        /// Timestamp at which the challenge period ended.
        expired_at: u64,
    },

    /// Caller lacks the role required by the operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Payload shape not accepted from the delivering slot.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Inbound envelope could not be decoded.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Batch bytes do not split into valid frames.
    #[error("Malformed batch: {0}")]
    MalformedBatch(String),

    /// Messages must carry at least one byte.
    #[error("Empty message")]
    EmptyMessage,

    /// Message does not fit the frame length prefix.
    #[error("Message too large: {size} > {max}")]
    MessageTooLarge {
        /// Message length in bytes.
        size: usize,
        /// Maximum frame length.
        max: usize,
    },

    /// Buffered batch would exceed the configured ceiling.
    #[error("Batch too large: {0}")]
    BatchTooLarge(String),

    /// Outgoing traffic blocked for the route.
    #[error("Outgoing blocked: network {network}, pool {pool}")]
    OutgoingBlocked {
        /// Destination network.
        network: NetworkId,
        /// Pool id.
        pool: PoolId,
    },

    /// Retry requested for a message with no recorded failure.
    #[error("Not a failed message: {0}")]
    NotFailedMessage(String),

    /// Message processor rejected the message.
    #[error("Processor failure: {0}")]
    ProcessorFailure(String),

    /// Transport adapter failed to quote or send.
    #[error("Adapter failure: {0}")]
    AdapterFailure(String),

    /// Invalid configuration value.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Short hex rendering used in logs and error payloads.
pub fn short_hex(bytes: &[u8]) -> String {
    let end = bytes.len().min(4);
    format!("0x{}..", hex::encode(&bytes[..end]))
}
