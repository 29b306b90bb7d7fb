//! # Quorum Gateway Core
//!
//! Multi-adapter messaging between independent networks.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Each network runs one gateway. Outgoing messages are batched per
//! (destination, pool) and dispatched through several independently operated
//! transport adapters: the primary carries the full batch, every other
//! adapter only its Keccak-256 content hash. The receiving gateway executes
//! a batch once a quorum of distinct adapters agree on that hash and the
//! bytes are known, so up to `quorum - 1` faulty transports cannot forge or
//! block delivery.
//!
//! ## Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | Exactly-once execution | Quorum check and consume in one critical section |
//! | Idempotent votes | One vote per slot per (origin, pool, hash) |
//! | Fee conservation | Attached value first, subsidy second, all or nothing |
//! | Liveness under silent adapters | Disputable, time-delayed recovery |
//!
//! ## Module Structure
//!
//! ```text
//! gateway-core/
//! ├── domain/          # AdapterSet, VoteTally, Session, roles, errors
//! ├── algorithms/      # Batch framing, envelopes, fee allocation
//! ├── ports/           # GatewayApi, Adapter, MessageProcessor, TimeSource
//! ├── adapters/        # Loopback transport, recording processor, clocks
//! └── application/     # GatewayService
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;

// Re-exports
pub use adapters::{
    LoopbackAdapter, ManualTimeSource, ProcessedMessage, RecordingProcessor, SentPayload,
    SystemTimeSource,
};
pub use algorithms::{
    allocate_funding, content_hash, decode_batch, encode_batch, Envelope, EnvelopeBody,
    FundingSplit,
};
pub use application::GatewayService;
pub use config::GatewayConfig;
pub use domain::{
    Address, AdapterId, AdapterSet, AdapterSlot, Amount, GasLimit, GatewayError, GatewayResult,
    Hash, NetworkId, PoolId, RecoveryState, Role, RouteKey, GLOBAL_POOL, MAX_ADAPTER_COUNT,
    MAX_MESSAGE_LEN, PRIMARY_SLOT,
};
pub use events::{CorrelationId, EventJournal, GatewayEvent};
pub use ports::{
    Adapter, AdapterError, AdapterReceipt, BatchFailure, DispatchReceipt, EndBatchingOutcome,
    GatewayAdminApi, GatewayApi, HandleOutcome, MessageProcessor, OutboundMessage,
    ProcessorError, Refund, SendOutcome, TimeSource,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
