//! # Domain Value Objects
//!
//! Immutable value types for the gateway.

use super::errors::{AdapterSlot, NetworkId, PoolId};
use serde::{Deserialize, Serialize};

/// Maximum adapters in one set.
pub const MAX_ADAPTER_COUNT: usize = 8;

/// Slot that carries full batch payloads.
pub const PRIMARY_SLOT: AdapterSlot = 0;

/// Pool whose adapter set is the fallback for every network.
pub const GLOBAL_POOL: PoolId = 0;

/// Maximum message length (width of the frame length prefix).
pub const MAX_MESSAGE_LEN: usize = u16::MAX as usize;

/// Access-control roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Configures adapters, roles, processor and subsidies.
    Admin,
    /// Business entrypoint allowed to send messages.
    Entrypoint,
    /// May open recovery tickets.
    RecoveryInitiator,
    /// May dispute recovery tickets on any route.
    Guardian,
}

impl Role {
    /// Lowercase label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Entrypoint => "entrypoint",
            Role::RecoveryInitiator => "recovery_initiator",
            Role::Guardian => "guardian",
        }
    }
}

/// (network, pool) pair used to key adapter sets and buffered batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey {
    /// Remote network.
    pub network: NetworkId,
    /// Pool id.
    pub pool: PoolId,
}

impl RouteKey {
    /// Create a new route key.
    pub fn new(network: NetworkId, pool: PoolId) -> Self {
        Self { network, pool }
    }

    /// Same network, global pool.
    pub fn global(&self) -> Self {
        Self::new(self.network, GLOBAL_POOL)
    }

    /// Whether this key addresses the global pool.
    pub fn is_global(&self) -> bool {
        self.pool == GLOBAL_POOL
    }
}

/// Shape of an inbound payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// Full serialized batch (primary slot only).
    Batch,
    /// Content hash of a batch (secondary slots only).
    Proof,
}

impl PayloadKind {
    /// Whether a payload of this kind may be delivered through `slot`.
    pub fn accepted_from(&self, slot: AdapterSlot) -> bool {
        match self {
            PayloadKind::Batch => slot == PRIMARY_SLOT,
            PayloadKind::Proof => slot != PRIMARY_SLOT,
        }
    }
}

/// Recovery state machine for one (origin, slot, hash) key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryState {
    /// No ticket.
    #[default]
    None,
    /// Ticket open; executable from `expires_at`.
    Pending {
        /// Timestamp at which the challenge period ends.
        expires_at: u64,
    },
}

impl RecoveryState {
    /// Executable once the challenge period has fully elapsed.
    pub fn can_execute(&self, now: u64) -> bool {
        match self {
            RecoveryState::None => false,
            RecoveryState::Pending { expires_at } => now >= *expires_at,
        }
    }

    /// Disputable strictly inside the challenge period.
    pub fn can_dispute(&self, now: u64) -> bool {
        match self {
            RecoveryState::None => false,
            RecoveryState::Pending { expires_at } => now < *expires_at,
        }
    }

    /// Whether a ticket exists.
    pub fn is_pending(&self) -> bool {
        matches!(self, RecoveryState::Pending { .. })
    }
}
