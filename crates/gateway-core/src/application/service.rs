//! Gateway Service
//!
//! Main service implementing `GatewayApi` and `GatewayAdminApi`. The
//! outbound, inbound and recovery paths live in sibling modules as further
//! `impl GatewayService` blocks.

use super::state::GatewayState;
use crate::config::GatewayConfig;
use crate::domain::{
    short_hex, Address, AdapterId, AdapterSet, AdapterSlot, Amount, GasLimit, GatewayError,
    GatewayResult, Hash, NetworkId, PoolId, RecoveryState, Role, RouteKey,
};
use crate::events::GatewayEvent;
use crate::ports::inbound::{
    EndBatchingOutcome, GatewayAdminApi, GatewayApi, HandleOutcome, OutboundMessage, SendOutcome,
};
use crate::ports::outbound::{Adapter, MessageProcessor, TimeSource};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Gateway Service
///
/// One instance per network. Cloning is cheap and yields a handle to the
/// same gateway, which is how a message processor calls back into `send`.
#[derive(Clone)]
pub struct GatewayService {
    pub(super) config: GatewayConfig,
    pub(super) state: Arc<RwLock<GatewayState>>,
    pub(super) time_source: Arc<dyn TimeSource>,
}

impl GatewayService {
    /// Create a gateway. `deployer` becomes the first admin.
    pub fn new(
        config: GatewayConfig,
        deployer: Address,
        processor: Arc<dyn MessageProcessor>,
        time_source: Arc<dyn TimeSource>,
    ) -> GatewayResult<Self> {
        config.validate()?;
        info!(
            network = config.network_id,
            admin = %short_hex(&deployer),
            challenge_period_secs = config.recovery_challenge_period_secs,
            "[gateway] Gateway initialized"
        );
        let state = GatewayState::new(deployer, processor, config.journal_capacity);
        Ok(Self {
            config,
            state: Arc::new(RwLock::new(state)),
            time_source,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Network this gateway runs on.
    pub fn network_id(&self) -> NetworkId {
        self.config.network_id
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Whether `who` holds `role`.
    pub fn has_role(&self, role: Role, who: &Address) -> bool {
        self.state.read().access.has(role, who)
    }

    /// Adapter set configured for exactly (network, pool).
    pub fn configured_adapters(&self, network: NetworkId, pool: PoolId) -> Option<AdapterSet> {
        self.state
            .read()
            .routes
            .get(&RouteKey::new(network, pool))
            .cloned()
    }

    /// Adapter set in force for (network, pool), global pool included.
    pub fn resolved_adapters(&self, network: NetworkId, pool: PoolId) -> Option<AdapterSet> {
        self.state
            .read()
            .resolve(&RouteKey::new(network, pool))
            .cloned()
    }

    /// Whether outgoing traffic to (network, pool) is blocked.
    pub fn is_outgoing_blocked(&self, network: NetworkId, pool: PoolId) -> bool {
        self.state
            .read()
            .blocked
            .contains(&RouteKey::new(network, pool))
    }

    /// Subsidy balance of `pool`.
    pub fn subsidy(&self, pool: PoolId) -> Amount {
        self.state.read().subsidy(pool)
    }

    /// Whether `caller` has an open session.
    pub fn is_batching(&self, caller: &Address) -> bool {
        self.state.read().sessions.contains_key(caller)
    }

    /// Messages buffered in `caller`'s session.
    pub fn buffered_messages(&self, caller: &Address) -> usize {
        self.state
            .read()
            .sessions
            .get(caller)
            .map(|s| s.message_count())
            .unwrap_or(0)
    }

    /// Distinct votes recorded for (origin, pool, hash).
    pub fn vote_count(&self, origin: NetworkId, pool: PoolId, hash: &Hash) -> usize {
        self.state
            .read()
            .tallies
            .get(&(origin, pool, *hash))
            .map(|t| t.vote_count())
            .unwrap_or(0)
    }

    /// Whether the batch (origin, pool, hash) has executed.
    pub fn is_executed(&self, origin: NetworkId, pool: PoolId, hash: &Hash) -> bool {
        self.state
            .read()
            .tallies
            .get(&(origin, pool, *hash))
            .map(|t| t.is_consumed())
            .unwrap_or(false)
    }

    /// Pending retries for a message hash.
    pub fn failed_count(&self, origin: NetworkId, message_hash: &Hash) -> u32 {
        self.state
            .read()
            .failed
            .get(&(origin, *message_hash))
            .copied()
            .unwrap_or(0)
    }

    /// Recovery state of (origin, slot, hash).
    pub fn recovery_state(
        &self,
        origin: NetworkId,
        slot: AdapterSlot,
        hash: &Hash,
    ) -> RecoveryState {
        self.state
            .read()
            .recoveries
            .get(&(origin, slot, *hash))
            .map(|t| t.state())
            .unwrap_or_default()
    }

    /// Take every journaled event, oldest first.
    pub fn drain_events(&self) -> Vec<GatewayEvent> {
        self.state.write().journal.drain()
    }

    /// Events dropped because the journal was full.
    pub fn evicted_events(&self) -> u64 {
        self.state.read().journal.evicted()
    }
}

impl GatewayAdminApi for GatewayService {
    fn grant_role(&self, caller: Address, role: Role, who: Address) -> GatewayResult<()> {
        let mut state = self.state.write();
        state.access.require(Role::Admin, &caller)?;
        if state.access.grant(role, who) {
            info!(role = role.label(), who = %short_hex(&who), "[gateway] Role granted");
            state.emit(GatewayEvent::RoleGranted { role, who });
        }
        Ok(())
    }

    fn revoke_role(&self, caller: Address, role: Role, who: Address) -> GatewayResult<()> {
        let mut state = self.state.write();
        state.access.require(Role::Admin, &caller)?;
        if role == Role::Admin && state.access.has(role, &who) && state.access.count(role) == 1 {
            return Err(GatewayError::InvalidConfig(
                "cannot revoke the last admin".to_string(),
            ));
        }
        if state.access.revoke(role, &who) {
            info!(role = role.label(), who = %short_hex(&who), "[gateway] Role revoked");
            state.emit(GatewayEvent::RoleRevoked { role, who });
        }
        Ok(())
    }

    fn register_adapter(&self, caller: Address, adapter: Arc<dyn Adapter>) -> GatewayResult<()> {
        let id = adapter.id();
        let mut state = self.state.write();
        state.access.require(Role::Admin, &caller)?;
        if state.registry.contains_key(&id) {
            return Err(GatewayError::DuplicateAdapter(short_hex(&id)));
        }
        state.registry.insert(id, adapter);
        info!(adapter = %short_hex(&id), "[gateway] Adapter registered");
        state.emit(GatewayEvent::AdapterRegistered { adapter: id });
        Ok(())
    }

    fn set_adapters(
        &self,
        caller: Address,
        network: NetworkId,
        pool: PoolId,
        adapters: Vec<AdapterId>,
        quorum: u8,
    ) -> GatewayResult<u64> {
        let mut state = self.state.write();
        state.access.require(Role::Admin, &caller)?;
        if let Some(unknown) = adapters.iter().find(|id| !state.registry.contains_key(*id)) {
            return Err(GatewayError::UnknownAdapter(short_hex(unknown)));
        }

        let set = AdapterSet::new(adapters, quorum, state.epoch + 1)?;
        let config_epoch = state.next_epoch();
        let route = RouteKey::new(network, pool);

        info!(
            network,
            pool,
            adapters = set.len(),
            quorum,
            config_epoch,
            "[gateway] Adapter set configured"
        );
        state.emit(GatewayEvent::AdaptersConfigured {
            route,
            adapters: set.adapters().to_vec(),
            quorum,
            config_epoch,
        });
        state.routes.insert(route, set);

        let dropped = state.drop_recoveries_for(&route);
        if dropped > 0 {
            warn!(
                network,
                pool,
                dropped,
                "[gateway] Pending recoveries dropped with the old adapter set"
            );
            state.emit(GatewayEvent::RecoveriesInvalidated { route, dropped });
        }
        Ok(config_epoch)
    }

    fn block_outgoing(
        &self,
        caller: Address,
        network: NetworkId,
        pool: PoolId,
        blocked: bool,
    ) -> GatewayResult<()> {
        let mut state = self.state.write();
        state.access.require(Role::Admin, &caller)?;
        let route = RouteKey::new(network, pool);
        let changed = if blocked {
            state.blocked.insert(route)
        } else {
            state.blocked.remove(&route)
        };
        if changed {
            warn!(network, pool, blocked, "[gateway] Outgoing block changed");
            state.emit(GatewayEvent::OutgoingBlockChanged { route, blocked });
        }
        Ok(())
    }

    fn set_processor(
        &self,
        caller: Address,
        processor: Arc<dyn MessageProcessor>,
    ) -> GatewayResult<()> {
        let mut state = self.state.write();
        state.access.require(Role::Admin, &caller)?;
        state.processor = processor;
        info!("[gateway] Message processor replaced");
        state.emit(GatewayEvent::ProcessorReplaced);
        Ok(())
    }

    fn withdraw_subsidy(
        &self,
        caller: Address,
        pool: PoolId,
        amount: Amount,
    ) -> GatewayResult<Amount> {
        let mut state = self.state.write();
        state.access.require(Role::Admin, &caller)?;
        let available = state.subsidy(pool);
        if amount > available {
            return Err(GatewayError::InsufficientFunding {
                required: amount,
                available,
            });
        }
        let balance = state.debit_subsidy(pool, amount);
        info!(pool, amount, balance, "[gateway] Subsidy withdrawn");
        state.emit(GatewayEvent::SubsidyWithdrawn {
            pool,
            amount,
            balance,
        });
        Ok(balance)
    }
}

#[async_trait]
impl GatewayApi for GatewayService {
    async fn send(&self, caller: Address, message: OutboundMessage) -> GatewayResult<SendOutcome> {
        self.submit(caller, message).await
    }

    async fn start_batching(&self, caller: Address) -> GatewayResult<()> {
        self.open_session(caller)
    }

    async fn end_batching(
        &self,
        caller: Address,
        value: Amount,
        refund: Address,
    ) -> GatewayResult<EndBatchingOutcome> {
        self.close_session(caller, value, refund).await
    }

    async fn estimate(
        &self,
        dest: NetworkId,
        pool: PoolId,
        message: &[u8],
        gas_limit: GasLimit,
    ) -> GatewayResult<Amount> {
        self.quote(dest, pool, message, gas_limit).await
    }

    async fn subsidize_pool(&self, pool: PoolId, amount: Amount) -> GatewayResult<Amount> {
        let mut state = self.state.write();
        let balance = state.credit_subsidy(pool, amount);
        info!(pool, amount, balance, "[gateway] Pool subsidized");
        state.emit(GatewayEvent::PoolSubsidized {
            pool,
            amount,
            balance,
        });
        Ok(balance)
    }

    async fn handle(
        &self,
        caller: AdapterId,
        origin: NetworkId,
        payload: &[u8],
    ) -> GatewayResult<HandleOutcome> {
        self.deliver(caller, origin, payload).await
    }

    async fn retry(&self, origin: NetworkId, message: &[u8]) -> GatewayResult<()> {
        self.retry_failed(origin, message).await
    }

    async fn initiate_message_recovery(
        &self,
        caller: Address,
        origin: NetworkId,
        pool: PoolId,
        slot: AdapterSlot,
        hash: Hash,
    ) -> GatewayResult<u64> {
        self.initiate_recovery(caller, origin, pool, slot, hash)
    }

    async fn dispute_message_recovery(
        &self,
        caller: Address,
        origin: NetworkId,
        pool: PoolId,
        slot: AdapterSlot,
        hash: Hash,
    ) -> GatewayResult<()> {
        self.dispute_recovery(caller, origin, pool, slot, hash)
    }

    async fn execute_message_recovery(
        &self,
        caller: Address,
        origin: NetworkId,
        slot: AdapterSlot,
        payload: &[u8],
    ) -> GatewayResult<HandleOutcome> {
        self.execute_recovery(caller, origin, slot, payload).await
    }
}
