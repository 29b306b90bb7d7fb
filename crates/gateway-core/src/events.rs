//! # Gateway Events
//!
//! Every state transition is journaled so the embedding host can forward
//! it (to a bus, an indexer, a log shipper) after the call returns.

use crate::domain::{
    Address, AdapterId, AdapterSlot, Amount, Hash, NetworkId, PoolId, Role, RouteKey,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Correlation ID linking a dispatch to its receipt and log records.
pub type CorrelationId = Uuid;

/// State transition emitted by the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEvent {
    /// Role granted.
    RoleGranted {
        /// Role.
        role: Role,
        /// Grantee.
        who: Address,
    },
    /// Role revoked.
    RoleRevoked {
        /// Role.
        role: Role,
        /// Former holder.
        who: Address,
    },
    /// Transport added to the adapter table.
    AdapterRegistered {
        /// Adapter id.
        adapter: AdapterId,
    },
    /// Adapter set replaced for a route.
    AdaptersConfigured {
        /// Route.
        route: RouteKey,
        /// Adapters in slot order.
        adapters: Vec<AdapterId>,
        /// Quorum.
        quorum: u8,
        /// New configuration epoch.
        config_epoch: u64,
    },
    /// Outgoing traffic blocked or unblocked.
    OutgoingBlockChanged {
        /// Route.
        route: RouteKey,
        /// New flag.
        blocked: bool,
    },
    /// Message processor swapped.
    ProcessorReplaced,
    /// Session opened.
    BatchingStarted {
        /// Session owner.
        caller: Address,
    },
    /// Message appended to a session.
    MessageBuffered {
        /// Session owner.
        caller: Address,
        /// Destination route.
        route: RouteKey,
        /// Messages buffered for the route so far.
        position: usize,
    },
    /// Session closed.
    BatchingEnded {
        /// Session owner.
        caller: Address,
        /// Batches attempted.
        batches: usize,
    },
    /// Batch dispatched through the adapter set.
    BatchSent {
        /// Correlation id of the dispatch.
        correlation_id: CorrelationId,
        /// Destination route.
        route: RouteKey,
        /// Content hash.
        hash: Hash,
        /// Messages in the batch.
        messages: usize,
        /// Total paid to adapters.
        charged: Amount,
        /// Secondary slots whose send failed.
        failed_slots: Vec<AdapterSlot>,
    },
    /// Inbound vote accepted.
    VoteRecorded {
        /// Origin network.
        origin: NetworkId,
        /// Pool.
        pool: PoolId,
        /// Content hash.
        hash: Hash,
        /// Voting slot.
        slot: AdapterSlot,
        /// Distinct votes so far.
        votes: usize,
    },
    /// Votes dropped because the adapter set changed.
    StaleVotesDiscarded {
        /// Origin network.
        origin: NetworkId,
        /// Content hash.
        hash: Hash,
        /// Epoch now in force.
        config_epoch: u64,
    },
    /// Oldest unexecuted tally of a route dropped to stay under the cap.
    TallyEvicted {
        /// Origin network.
        origin: NetworkId,
        /// Pool.
        pool: PoolId,
        /// Content hash of the dropped tally.
        hash: Hash,
    },
    /// Pending recovery tickets dropped because the adapter set changed.
    RecoveriesInvalidated {
        /// Reconfigured (network, pool).
        route: RouteKey,
        /// Tickets dropped.
        dropped: usize,
    },
    /// Batch reached quorum and was handed to the processor.
    BatchExecuted {
        /// Origin network.
        origin: NetworkId,
        /// Pool.
        pool: PoolId,
        /// Content hash.
        hash: Hash,
        /// Messages accepted by the processor.
        executed: usize,
        /// Messages recorded as failed.
        failed: usize,
    },
    /// Processor rejected a message.
    MessageFailed {
        /// Origin network.
        origin: NetworkId,
        /// Keccak-256 of the message.
        message_hash: Hash,
        /// Processor reason.
        reason: String,
    },
    /// Failed message retried successfully.
    MessageRetried {
        /// Origin network.
        origin: NetworkId,
        /// Keccak-256 of the message.
        message_hash: Hash,
    },
    /// Recovery ticket opened.
    RecoveryInitiated {
        /// Origin network.
        origin: NetworkId,
        /// Pool.
        pool: PoolId,
        /// Slot whose vote will be forced.
        slot: AdapterSlot,
        /// Content hash.
        hash: Hash,
        /// Executable from.
        expires_at: u64,
    },
    /// Recovery ticket cancelled.
    RecoveryDisputed {
        /// Origin network.
        origin: NetworkId,
        /// Slot.
        slot: AdapterSlot,
        /// Content hash.
        hash: Hash,
        /// Disputer.
        by: Address,
    },
    /// Recovery ticket executed.
    RecoveryExecuted {
        /// Origin network.
        origin: NetworkId,
        /// Slot.
        slot: AdapterSlot,
        /// Content hash.
        hash: Hash,
    },
    /// Subsidy credited.
    PoolSubsidized {
        /// Pool.
        pool: PoolId,
        /// Amount credited.
        amount: Amount,
        /// Balance after the credit.
        balance: Amount,
    },
    /// Subsidy debited by an administrator.
    SubsidyWithdrawn {
        /// Pool.
        pool: PoolId,
        /// Amount debited.
        amount: Amount,
        /// Balance after the debit.
        balance: Amount,
    },
}

impl GatewayEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            GatewayEvent::RoleGranted { .. } => "role_granted",
            GatewayEvent::RoleRevoked { .. } => "role_revoked",
            GatewayEvent::AdapterRegistered { .. } => "adapter_registered",
            GatewayEvent::AdaptersConfigured { .. } => "adapters_configured",
            GatewayEvent::OutgoingBlockChanged { .. } => "outgoing_block_changed",
            GatewayEvent::ProcessorReplaced => "processor_replaced",
            GatewayEvent::BatchingStarted { .. } => "batching_started",
            GatewayEvent::MessageBuffered { .. } => "message_buffered",
            GatewayEvent::BatchingEnded { .. } => "batching_ended",
            GatewayEvent::BatchSent { .. } => "batch_sent",
            GatewayEvent::VoteRecorded { .. } => "vote_recorded",
            GatewayEvent::StaleVotesDiscarded { .. } => "stale_votes_discarded",
            GatewayEvent::TallyEvicted { .. } => "tally_evicted",
            GatewayEvent::RecoveriesInvalidated { .. } => "recoveries_invalidated",
            GatewayEvent::BatchExecuted { .. } => "batch_executed",
            GatewayEvent::MessageFailed { .. } => "message_failed",
            GatewayEvent::MessageRetried { .. } => "message_retried",
            GatewayEvent::RecoveryInitiated { .. } => "recovery_initiated",
            GatewayEvent::RecoveryDisputed { .. } => "recovery_disputed",
            GatewayEvent::RecoveryExecuted { .. } => "recovery_executed",
            GatewayEvent::PoolSubsidized { .. } => "pool_subsidized",
            GatewayEvent::SubsidyWithdrawn { .. } => "subsidy_withdrawn",
        }
    }
}

/// Bounded in-memory event journal. Oldest events are evicted first.
#[derive(Debug)]
pub struct EventJournal {
    events: VecDeque<GatewayEvent>,
    capacity: usize,
    evicted: u64,
}

impl EventJournal {
    /// Create a journal holding at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            evicted: 0,
        }
    }

    /// Append an event.
    pub fn push(&mut self, event: GatewayEvent) {
        if self.capacity == 0 {
            self.evicted += 1;
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.evicted += 1;
        }
        self.events.push_back(event);
    }

    /// Take every retained event, oldest first.
    pub fn drain(&mut self) -> Vec<GatewayEvent> {
        self.events.drain(..).collect()
    }

    /// Retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events dropped because the journal was full.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}
