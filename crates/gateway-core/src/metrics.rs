//! # Gateway Metrics
//!
//! Prometheus metrics for outbound dispatch, quorum voting and recovery.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! gateway-core = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `gateway_batches_sent_total` - Counter of batches dispatched through the primary
//! - `gateway_proofs_sent_total` - Counter of proofs dispatched through secondaries
//! - `gateway_dispatch_failures_total` - Counter of transport failures (by slot role)
//! - `gateway_votes_recorded_total` - Counter of accepted inbound votes
//! - `gateway_batches_executed_total` - Counter of batches reaching quorum
//! - `gateway_messages_failed_total` - Counter of processor failures
//! - `gateway_recoveries_total` - Counter of recovery actions (by action)
//! - `gateway_fees_charged` - Counter of value paid to adapters

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter, register_int_counter, register_int_counter_vec, Counter, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Batches dispatched through the primary adapter
    pub static ref BATCHES_SENT: IntCounter = register_int_counter!(
        "gateway_batches_sent_total",
        "Total number of batches dispatched"
    )
    .expect("Failed to create BATCHES_SENT metric");

    /// Proofs dispatched through secondary adapters
    pub static ref PROOFS_SENT: IntCounter = register_int_counter!(
        "gateway_proofs_sent_total",
        "Total number of proofs dispatched"
    )
    .expect("Failed to create PROOFS_SENT metric");

    /// Transport failures, labeled by slot role
    pub static ref DISPATCH_FAILURES: IntCounterVec = register_int_counter_vec!(
        "gateway_dispatch_failures_total",
        "Total number of adapter send failures",
        &["role"]
    )
    .expect("Failed to create DISPATCH_FAILURES metric");

    /// Accepted inbound votes
    pub static ref VOTES_RECORDED: IntCounter = register_int_counter!(
        "gateway_votes_recorded_total",
        "Total number of inbound votes recorded"
    )
    .expect("Failed to create VOTES_RECORDED metric");

    /// Batches executed after reaching quorum
    pub static ref BATCHES_EXECUTED: IntCounter = register_int_counter!(
        "gateway_batches_executed_total",
        "Total number of batches executed"
    )
    .expect("Failed to create BATCHES_EXECUTED metric");

    /// Messages rejected by the processor
    pub static ref MESSAGES_FAILED: IntCounter = register_int_counter!(
        "gateway_messages_failed_total",
        "Total number of messages recorded as failed"
    )
    .expect("Failed to create MESSAGES_FAILED metric");

    /// Recovery actions, labeled by action
    pub static ref RECOVERIES: IntCounterVec = register_int_counter_vec!(
        "gateway_recoveries_total",
        "Total number of recovery actions",
        &["action"]
    )
    .expect("Failed to create RECOVERIES metric");

    /// Value paid to adapters
    pub static ref FEES_CHARGED: Counter = register_counter!(
        "gateway_fees_charged",
        "Total value paid to adapters"
    )
    .expect("Failed to create FEES_CHARGED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a batch and its proofs dispatched, with the total fee
#[cfg(feature = "metrics")]
pub fn record_batch_sent(proofs: u64, charged: u128) {
    BATCHES_SENT.inc();
    PROOFS_SENT.inc_by(proofs);
    FEES_CHARGED.inc_by(charged as f64);
}

/// Record an adapter send failure
#[cfg(feature = "metrics")]
pub fn record_dispatch_failure(role: &str) {
    DISPATCH_FAILURES.with_label_values(&[role]).inc();
}

/// Record an accepted vote
#[cfg(feature = "metrics")]
pub fn record_vote() {
    VOTES_RECORDED.inc();
}

/// Record a batch executed
#[cfg(feature = "metrics")]
pub fn record_batch_executed() {
    BATCHES_EXECUTED.inc();
}

/// Record a message failure
#[cfg(feature = "metrics")]
pub fn record_message_failed() {
    MESSAGES_FAILED.inc();
}

/// Record a recovery action
#[cfg(feature = "metrics")]
pub fn record_recovery(action: &str) {
    RECOVERIES.with_label_values(&[action]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

/// Record a dispatched batch (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_batch_sent(_proofs: u64, _charged: u128) {}

/// Record a failed transport send (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_dispatch_failure(_role: &str) {}

/// Record an admitted vote (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_vote() {}

/// Record an executed batch (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_batch_executed() {}

/// Record a processor failure (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_message_failed() {}

/// Record a recovery action (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_recovery(_action: &str) {}
