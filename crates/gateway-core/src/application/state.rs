//! Gateway state
//!
//! Everything mutable lives here, behind the service's single lock.

use crate::domain::{
    short_hex, AccessControl, Address, AdapterId, AdapterSet, AdapterSlot, Amount, GatewayError,
    GatewayResult, Hash, NetworkId, PoolId, RecoveryTicket, RouteKey, Session, VoteTally,
    GLOBAL_POOL,
};
use crate::events::{EventJournal, GatewayEvent};
use crate::ports::outbound::{Adapter, MessageProcessor};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Tally key: (origin network, pool, content hash).
pub(crate) type TallyKey = (NetworkId, PoolId, Hash);

/// Recovery key: (origin network, adapter slot, content hash).
pub(crate) type RecoveryKey = (NetworkId, AdapterSlot, Hash);

/// Failed message key: (origin network, message hash).
pub(crate) type FailedKey = (NetworkId, Hash);

pub(crate) struct GatewayState {
    pub access: AccessControl,
    /// Transport table indexed by adapter id.
    pub registry: HashMap<AdapterId, Arc<dyn Adapter>>,
    pub routes: HashMap<RouteKey, AdapterSet>,
    /// Last config epoch handed out, shared by every route.
    pub epoch: u64,
    pub blocked: HashSet<RouteKey>,
    pub tallies: HashMap<TallyKey, VoteTally>,
    /// Tally creation order per (origin, pool), bounded by the tally cap.
    pub tally_order: HashMap<(NetworkId, PoolId), VecDeque<Hash>>,
    pub sessions: HashMap<Address, Session>,
    pub subsidies: HashMap<PoolId, Amount>,
    pub failed: HashMap<FailedKey, u32>,
    pub recoveries: HashMap<RecoveryKey, RecoveryTicket>,
    pub journal: EventJournal,
    pub processor: Arc<dyn MessageProcessor>,
}

impl GatewayState {
    pub fn new(
        admin: Address,
        processor: Arc<dyn MessageProcessor>,
        journal_capacity: usize,
    ) -> Self {
        Self {
            access: AccessControl::with_admin(admin),
            registry: HashMap::new(),
            routes: HashMap::new(),
            epoch: 0,
            blocked: HashSet::new(),
            tallies: HashMap::new(),
            tally_order: HashMap::new(),
            sessions: HashMap::new(),
            subsidies: HashMap::new(),
            failed: HashMap::new(),
            recoveries: HashMap::new(),
            journal: EventJournal::new(journal_capacity),
            processor,
        }
    }

    /// Record a new tally for `key` in its route's creation order. Beyond
    /// `cap` entries the oldest is forgotten; if that tally never executed
    /// it is removed and its hash returned.
    pub fn track_tally(&mut self, key: TallyKey, cap: usize) -> Option<Hash> {
        let (origin, pool, hash) = key;
        let order = self.tally_order.entry((origin, pool)).or_default();
        order.push_back(hash);
        if order.len() <= cap {
            return None;
        }
        let oldest = order.pop_front()?;
        let oldest_key = (origin, pool, oldest);
        let pending = self
            .tallies
            .get(&oldest_key)
            .is_some_and(|t| !t.is_consumed());
        if pending {
            self.tallies.remove(&oldest_key);
            Some(oldest)
        } else {
            None
        }
    }

    /// Drop recovery tickets whose slot was resolved through `route`'s set.
    /// Returns how many were dropped.
    pub fn drop_recoveries_for(&mut self, route: &RouteKey) -> usize {
        let before = self.recoveries.len();
        let routes = &self.routes;
        self.recoveries.retain(|(origin, _, _), ticket| {
            if *origin != route.network {
                return true;
            }
            let ticket_route = RouteKey::new(*origin, ticket.pool);
            let resolves_through = if routes.contains_key(&ticket_route) {
                ticket_route == *route
            } else {
                route.pool == GLOBAL_POOL
            };
            !resolves_through
        });
        before - self.recoveries.len()
    }

    /// Adapter set for `route`, falling back to the network's global pool.
    pub fn resolve(&self, route: &RouteKey) -> Option<&AdapterSet> {
        self.routes
            .get(route)
            .or_else(|| self.routes.get(&route.global()))
    }

    /// Like `resolve`, failing with `UnknownDestination`.
    pub fn require_route(&self, route: &RouteKey) -> GatewayResult<&AdapterSet> {
        self.resolve(route)
            .ok_or(GatewayError::UnknownDestination {
                network: route.network,
                pool: route.pool,
            })
    }

    /// Fail with `OutgoingBlocked` when an administrator blocked `route`.
    pub fn require_unblocked(&self, route: &RouteKey) -> GatewayResult<()> {
        if self.blocked.contains(route) {
            return Err(GatewayError::OutgoingBlocked {
                network: route.network,
                pool: route.pool,
            });
        }
        Ok(())
    }

    /// Transports of `set` in slot order.
    pub fn transports(&self, set: &AdapterSet) -> GatewayResult<Vec<Arc<dyn Adapter>>> {
        set.adapters()
            .iter()
            .map(|id| {
                self.registry
                    .get(id)
                    .cloned()
                    .ok_or_else(|| GatewayError::UnknownAdapter(short_hex(id)))
            })
            .collect()
    }

    pub fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    pub fn subsidy(&self, pool: PoolId) -> Amount {
        self.subsidies.get(&pool).copied().unwrap_or(0)
    }

    /// Credit `amount` to `pool`. Returns the new balance.
    pub fn credit_subsidy(&mut self, pool: PoolId, amount: Amount) -> Amount {
        let balance = self.subsidies.entry(pool).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    /// Debit `amount` from `pool`. Caller checked the balance.
    pub fn debit_subsidy(&mut self, pool: PoolId, amount: Amount) -> Amount {
        let balance = self.subsidies.entry(pool).or_insert(0);
        *balance = balance.saturating_sub(amount);
        *balance
    }

    pub fn emit(&mut self, event: GatewayEvent) {
        self.journal.push(event);
    }
}
