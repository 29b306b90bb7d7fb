//! # Inbound Ports
//!
//! API traits defining what the gateway can do, and the outcome types its
//! operations return.

use crate::domain::{
    Address, AdapterId, AdapterSlot, Amount, GasLimit, GatewayError, GatewayResult, Hash,
    NetworkId, PoolId, Role, RouteKey,
};
use crate::events::CorrelationId;
use crate::ports::outbound::{Adapter, MessageProcessor};
use async_trait::async_trait;
use std::sync::Arc;

/// Outgoing message submitted by a business entrypoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination network.
    pub dest: NetworkId,
    /// Pool owning the message flow.
    pub pool: PoolId,
    /// Opaque message body.
    pub message: Vec<u8>,
    /// Gas limit requested on the destination.
    pub gas_limit: GasLimit,
    /// Value attached to the call.
    pub value: Amount,
    /// Where unused value goes.
    pub refund: Address,
}

impl OutboundMessage {
    /// Message with no attached value, refunding to `refund`.
    pub fn new(dest: NetworkId, pool: PoolId, message: Vec<u8>, refund: Address) -> Self {
        Self {
            dest,
            pool,
            message,
            gas_limit: 0,
            value: 0,
            refund,
        }
    }

    /// Set the gas limit.
    pub fn with_gas_limit(mut self, gas_limit: GasLimit) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Attach value.
    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }

    /// Destination route.
    pub fn route(&self) -> RouteKey {
        RouteKey::new(self.dest, self.pool)
    }
}

/// Unused value owed back to a caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Refund {
    /// Recipient.
    pub to: Address,
    /// Amount.
    pub amount: Amount,
}

/// Result of one batch dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReceipt {
    /// Correlation id shared with the `BatchSent` event and log records.
    pub correlation_id: CorrelationId,
    /// Destination route.
    pub route: RouteKey,
    /// Content hash of the batch.
    pub hash: Hash,
    /// Messages in the batch.
    pub messages: usize,
    /// Total paid to adapters.
    pub charged: Amount,
    /// Part of `charged` paid from attached value or session fuel.
    pub attached_consumed: Amount,
    /// Part of `charged` paid from the pool subsidy.
    pub subsidy_consumed: Amount,
    /// Secondary slots whose send failed; their fee was not charged.
    pub failed_slots: Vec<AdapterSlot>,
}

/// Result of `send`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Appended to the caller's open session.
    Buffered {
        /// Destination route.
        route: RouteKey,
        /// Messages buffered for the route, this one included.
        position: usize,
    },
    /// Dispatched immediately as a single-message batch.
    Dispatched {
        /// Dispatch receipt.
        receipt: DispatchReceipt,
        /// Unused attached value.
        refund: Refund,
    },
}

/// Buffered batch that could not be dispatched at session close.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchFailure {
    /// Destination route.
    pub route: RouteKey,
    /// Messages dropped with the batch.
    pub messages: usize,
    /// Cause.
    pub error: GatewayError,
}

/// Result of `end_batching`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndBatchingOutcome {
    /// Dispatched batches in first-append order.
    pub receipts: Vec<DispatchReceipt>,
    /// Batches that failed, in first-append order.
    pub failures: Vec<BatchFailure>,
    /// Unused fuel plus attached value.
    pub refund: Refund,
}

/// Result of an inbound delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Vote recorded, batch not executable yet.
    Pending {
        /// Distinct votes so far.
        votes: usize,
        /// Votes required.
        quorum: u8,
    },
    /// Quorum reached by this delivery and the batch was processed.
    Executed {
        /// Messages accepted by the processor.
        executed: usize,
        /// Messages recorded as failed.
        failed: usize,
    },
    /// Batch had already been executed; the delivery had no effect.
    AlreadyExecuted,
}

/// Gateway API - inbound port.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Buffer or dispatch a message. Entrypoint role required.
    async fn send(&self, caller: Address, message: OutboundMessage) -> GatewayResult<SendOutcome>;

    /// Open a batching session for `caller`.
    async fn start_batching(&self, caller: Address) -> GatewayResult<()>;

    /// Close the session and dispatch every buffered batch.
    async fn end_batching(
        &self,
        caller: Address,
        value: Amount,
        refund: Address,
    ) -> GatewayResult<EndBatchingOutcome>;

    /// Quote a single-message dispatch.
    async fn estimate(
        &self,
        dest: NetworkId,
        pool: PoolId,
        message: &[u8],
        gas_limit: GasLimit,
    ) -> GatewayResult<Amount>;

    /// Credit a pool subsidy. Returns the new balance.
    async fn subsidize_pool(&self, pool: PoolId, amount: Amount) -> GatewayResult<Amount>;

    /// Inbound delivery from adapter `caller`.
    async fn handle(
        &self,
        caller: AdapterId,
        origin: NetworkId,
        payload: &[u8],
    ) -> GatewayResult<HandleOutcome>;

    /// Re-dispatch a message the processor rejected earlier.
    async fn retry(&self, origin: NetworkId, message: &[u8]) -> GatewayResult<()>;

    /// Open a recovery ticket forcing `slot`'s vote for `hash`. Returns its expiry.
    async fn initiate_message_recovery(
        &self,
        caller: Address,
        origin: NetworkId,
        pool: PoolId,
        slot: AdapterSlot,
        hash: Hash,
    ) -> GatewayResult<u64>;

    /// Cancel a pending recovery ticket.
    async fn dispute_message_recovery(
        &self,
        caller: Address,
        origin: NetworkId,
        pool: PoolId,
        slot: AdapterSlot,
        hash: Hash,
    ) -> GatewayResult<()>;

    /// Execute an elapsed recovery ticket with the payload `slot` should have delivered.
    async fn execute_message_recovery(
        &self,
        caller: Address,
        origin: NetworkId,
        slot: AdapterSlot,
        payload: &[u8],
    ) -> GatewayResult<HandleOutcome>;
}

/// Administrative surface - inbound port.
pub trait GatewayAdminApi: Send + Sync {
    /// Grant `role` to `who`. Admin only.
    fn grant_role(&self, caller: Address, role: Role, who: Address) -> GatewayResult<()>;

    /// Revoke `role` from `who`. Admin only.
    fn revoke_role(&self, caller: Address, role: Role, who: Address) -> GatewayResult<()>;

    /// Add a transport to the adapter table. Admin only.
    fn register_adapter(&self, caller: Address, adapter: Arc<dyn Adapter>) -> GatewayResult<()>;

    /// Replace the adapter set of (network, pool). Returns the new config epoch.
    fn set_adapters(
        &self,
        caller: Address,
        network: NetworkId,
        pool: PoolId,
        adapters: Vec<AdapterId>,
        quorum: u8,
    ) -> GatewayResult<u64>;

    /// Block or unblock outgoing traffic for (network, pool).
    fn block_outgoing(
        &self,
        caller: Address,
        network: NetworkId,
        pool: PoolId,
        blocked: bool,
    ) -> GatewayResult<()>;

    /// Swap the message processor.
    fn set_processor(
        &self,
        caller: Address,
        processor: Arc<dyn MessageProcessor>,
    ) -> GatewayResult<()>;

    /// Debit a pool subsidy. Returns the new balance.
    fn withdraw_subsidy(&self, caller: Address, pool: PoolId, amount: Amount)
        -> GatewayResult<Amount>;
}
