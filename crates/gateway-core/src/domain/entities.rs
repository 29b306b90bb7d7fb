//! # Domain Entities
//!
//! Adapter sets, vote tallies, batching sessions, recovery tickets and the
//! role registry owned by one gateway instance.

use super::errors::{
    short_hex, Address, AdapterId, AdapterSlot, Amount, GasLimit, GatewayError, PoolId,
};
use super::invariants::{invariant_adapter_count, invariant_quorum, invariant_unique_adapters};
use super::value_objects::{RecoveryState, Role, RouteKey, MAX_ADAPTER_COUNT, PRIMARY_SLOT};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Bytes added in front of every message inside a batch.
pub const FRAME_PREFIX_LEN: usize = 2;

/// Ordered adapter list and quorum for one route.
///
/// Slot 0 is the primary and alone carries full batches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterSet {
    adapters: Vec<AdapterId>,
    quorum: u8,
    config_epoch: u64,
}

impl AdapterSet {
    /// Create a validated adapter set.
    pub fn new(
        adapters: Vec<AdapterId>,
        quorum: u8,
        config_epoch: u64,
    ) -> Result<Self, GatewayError> {
        invariant_adapter_count(adapters.len())?;
        invariant_quorum(quorum, adapters.len())?;
        invariant_unique_adapters(&adapters)?;
        Ok(Self {
            adapters,
            quorum,
            config_epoch,
        })
    }

    /// Adapters in slot order.
    pub fn adapters(&self) -> &[AdapterId] {
        &self.adapters
    }

    /// Distinct votes required for execution.
    pub fn quorum(&self) -> u8 {
        self.quorum
    }

    /// Configuration generation of the route this set belongs to.
    pub fn config_epoch(&self) -> u64 {
        self.config_epoch
    }

    /// Number of adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Always false for a validated set.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Primary adapter.
    pub fn primary(&self) -> AdapterId {
        self.adapters[PRIMARY_SLOT as usize]
    }

    /// Slot occupied by `adapter`.
    pub fn slot_of(&self, adapter: &AdapterId) -> Option<AdapterSlot> {
        self.adapters
            .iter()
            .position(|a| a == adapter)
            .map(|idx| idx as AdapterSlot)
    }

    /// Adapter in `slot`.
    pub fn adapter_at(&self, slot: AdapterSlot) -> Option<AdapterId> {
        self.adapters.get(slot as usize).copied()
    }

    /// Every non-primary adapter with its slot.
    pub fn secondaries(&self) -> impl Iterator<Item = (AdapterSlot, AdapterId)> + '_ {
        self.adapters
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, a)| (idx as AdapterSlot, *a))
    }
}

/// Votes for one (origin, pool, content hash).
///
/// Frozen once consumed: later votes are absorbed without effect.
#[derive(Clone, Debug, Default)]
pub struct VoteTally {
    votes: [bool; MAX_ADAPTER_COUNT],
    config_epoch: u64,
    batch: Option<Vec<u8>>,
    consumed: bool,
}

impl VoteTally {
    /// Create an empty tally bound to a configuration epoch.
    pub fn new(config_epoch: u64) -> Self {
        Self {
            config_epoch,
            ..Default::default()
        }
    }

    /// Drop votes recorded under an older configuration.
    ///
    /// Batch bytes are content-addressed and survive the reset.
    /// Returns true when votes were discarded.
    pub fn sync_epoch(&mut self, config_epoch: u64) -> bool {
        if self.consumed || self.config_epoch == config_epoch {
            return false;
        }
        let had_votes = self.vote_count() > 0;
        self.votes = [false; MAX_ADAPTER_COUNT];
        self.config_epoch = config_epoch;
        had_votes
    }

    /// Record a vote. Returns false for duplicates and consumed tallies.
    pub fn vote(&mut self, slot: AdapterSlot) -> bool {
        let idx = slot as usize;
        if self.consumed || idx >= MAX_ADAPTER_COUNT || self.votes[idx] {
            return false;
        }
        self.votes[idx] = true;
        true
    }

    /// Whether `slot` has voted.
    pub fn has_voted(&self, slot: AdapterSlot) -> bool {
        self.votes.get(slot as usize).copied().unwrap_or(false)
    }

    /// Distinct slots that voted.
    pub fn vote_count(&self) -> usize {
        self.votes.iter().filter(|v| **v).count()
    }

    /// Store the full batch bytes delivered by the primary.
    pub fn store_batch(&mut self, bytes: Vec<u8>) {
        if !self.consumed && self.batch.is_none() {
            self.batch = Some(bytes);
        }
    }

    /// Whether the full batch bytes are known.
    pub fn has_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Whether the batch already executed.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Quorum of distinct votes and the batch bytes are both present.
    pub fn is_executable(&self, quorum: u8) -> bool {
        !self.consumed && self.batch.is_some() && self.vote_count() >= quorum as usize
    }

    /// Freeze the tally and hand out the batch bytes.
    pub fn consume(&mut self) -> Option<Vec<u8>> {
        if self.consumed {
            return None;
        }
        let bytes = self.batch.take()?;
        self.consumed = true;
        Some(bytes)
    }
}

/// Messages buffered for one route during a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingBatch {
    route: RouteKey,
    messages: Vec<Vec<u8>>,
    encoded_len: usize,
    gas_limit: GasLimit,
}

impl PendingBatch {
    /// Create an empty batch for `route`.
    pub fn new(route: RouteKey) -> Self {
        Self {
            route,
            messages: Vec::new(),
            encoded_len: 0,
            gas_limit: 0,
        }
    }

    /// Destination route.
    pub fn route(&self) -> RouteKey {
        self.route
    }

    /// Buffered messages in append order.
    pub fn messages(&self) -> &[Vec<u8>] {
        &self.messages
    }

    /// Serialized size of the batch.
    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// Summed gas limit of the buffered messages.
    pub fn gas_limit(&self) -> GasLimit {
        self.gas_limit
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Check that one more message fits under the ceilings.
    pub fn check_capacity(
        &self,
        message_len: usize,
        gas_limit: GasLimit,
        max_bytes: usize,
        max_gas: GasLimit,
    ) -> Result<(), GatewayError> {
        let bytes = self.encoded_len + FRAME_PREFIX_LEN + message_len;
        if bytes > max_bytes {
            return Err(GatewayError::BatchTooLarge(format!(
                "{} bytes > {} max",
                bytes, max_bytes
            )));
        }
        let gas = self.gas_limit.saturating_add(gas_limit);
        if gas > max_gas {
            return Err(GatewayError::BatchTooLarge(format!(
                "gas {} > {} max",
                gas, max_gas
            )));
        }
        Ok(())
    }

    /// Append a message.
    pub fn push(&mut self, message: Vec<u8>, gas_limit: GasLimit) {
        self.encoded_len += FRAME_PREFIX_LEN + message.len();
        self.gas_limit = self.gas_limit.saturating_add(gas_limit);
        self.messages.push(message);
    }

    /// Take the buffered messages.
    pub fn into_messages(self) -> Vec<Vec<u8>> {
        self.messages
    }
}

/// Open batching session of one caller.
#[derive(Clone, Debug, Default)]
pub struct Session {
    fuel: Amount,
    batches: Vec<PendingBatch>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value attached while batching, spent at session close.
    pub fn fuel(&self) -> Amount {
        self.fuel
    }

    /// Add attached value.
    pub fn add_fuel(&mut self, amount: Amount) {
        self.fuel = self.fuel.saturating_add(amount);
    }

    /// Buffered batch for `route`.
    pub fn batch(&self, route: &RouteKey) -> Option<&PendingBatch> {
        self.batches.iter().find(|b| b.route == *route)
    }

    /// Buffered batch for `route`, created on first use.
    pub fn batch_mut(&mut self, route: RouteKey) -> &mut PendingBatch {
        let idx = match self.batches.iter().position(|b| b.route == route) {
            Some(idx) => idx,
            None => {
                self.batches.push(PendingBatch::new(route));
                self.batches.len() - 1
            }
        };
        &mut self.batches[idx]
    }

    /// Total buffered messages across routes.
    pub fn message_count(&self) -> usize {
        self.batches.iter().map(PendingBatch::len).sum()
    }

    /// Close the session: buffered batches in first-append order, plus fuel.
    pub fn close(self) -> (Vec<PendingBatch>, Amount) {
        (self.batches, self.fuel)
    }
}

/// Pending recovery ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryTicket {
    /// Pool of the route the forced vote belongs to.
    pub pool: PoolId,
    /// Executable from this timestamp.
    pub expires_at: u64,
    /// Who opened the ticket.
    pub initiated_by: Address,
}

impl RecoveryTicket {
    /// State view of this ticket.
    pub fn state(&self) -> RecoveryState {
        RecoveryState::Pending {
            expires_at: self.expires_at,
        }
    }
}

/// Role registry.
#[derive(Clone, Debug, Default)]
pub struct AccessControl {
    members: HashMap<Role, HashSet<Address>>,
}

impl AccessControl {
    /// Registry with a single admin.
    pub fn with_admin(admin: Address) -> Self {
        let mut access = Self::default();
        access.grant(Role::Admin, admin);
        access
    }

    /// Grant a role. Returns false if already held.
    pub fn grant(&mut self, role: Role, who: Address) -> bool {
        self.members.entry(role).or_default().insert(who)
    }

    /// Revoke a role. Returns false if not held.
    pub fn revoke(&mut self, role: Role, who: &Address) -> bool {
        self.members
            .get_mut(&role)
            .map(|set| set.remove(who))
            .unwrap_or(false)
    }

    /// Whether `who` holds `role`.
    pub fn has(&self, role: Role, who: &Address) -> bool {
        self.members
            .get(&role)
            .map(|set| set.contains(who))
            .unwrap_or(false)
    }

    /// Fail with `Unauthorized` unless `who` holds `role`.
    pub fn require(&self, role: Role, who: &Address) -> Result<(), GatewayError> {
        if !self.has(role, who) {
            return Err(GatewayError::Unauthorized(format!(
                "{} lacks {} role",
                short_hex(who),
                role.label()
            )));
        }
        Ok(())
    }

    /// Holders of `role`.
    pub fn count(&self, role: Role) -> usize {
        self.members.get(&role).map(HashSet::len).unwrap_or(0)
    }
}
