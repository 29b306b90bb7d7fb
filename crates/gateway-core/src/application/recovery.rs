//! Recovery manager
//!
//! Time-delayed, disputable overrides for adapter votes that never arrived.
//! The challenge period is checked on demand against the time source.

use super::inbound::VoteSource;
use super::service::GatewayService;
use super::state::RecoveryKey;
use crate::algorithms::Envelope;
use crate::domain::{
    short_hex, Address, AdapterSlot, GatewayError, GatewayResult, Hash, NetworkId, PoolId,
    RecoveryTicket, Role, RouteKey,
};
use crate::events::GatewayEvent;
use crate::metrics;
use crate::ports::inbound::HandleOutcome;
use tracing::{info, warn};

impl GatewayService {
    pub(super) fn initiate_recovery(
        &self,
        caller: Address,
        origin: NetworkId,
        pool: PoolId,
        slot: AdapterSlot,
        hash: Hash,
    ) -> GatewayResult<u64> {
        let now = self.time_source.now();
        let mut state = self.state.write();
        state.access.require(Role::RecoveryInitiator, &caller)?;

        let in_set = state
            .resolve(&RouteKey::new(origin, pool))
            .and_then(|set| set.adapter_at(slot))
            .is_some();
        if !in_set {
            return Err(GatewayError::InvalidAdapter {
                adapter: format!("slot {}", slot),
                network: origin,
                pool,
            });
        }

        let expires_at = now.saturating_add(self.config.recovery_challenge_period_secs);
        let key: RecoveryKey = (origin, slot, hash);
        let replaced = state
            .recoveries
            .insert(
                key,
                RecoveryTicket {
                    pool,
                    expires_at,
                    initiated_by: caller,
                },
            )
            .is_some();

        metrics::record_recovery("initiated");
        info!(
            origin,
            pool,
            slot,
            hash = %short_hex(&hash),
            expires_at,
            replaced,
            "[gateway] Recovery initiated"
        );
        state.emit(GatewayEvent::RecoveryInitiated {
            origin,
            pool,
            slot,
            hash,
            expires_at,
        });
        Ok(expires_at)
    }

    pub(super) fn dispute_recovery(
        &self,
        caller: Address,
        origin: NetworkId,
        pool: PoolId,
        slot: AdapterSlot,
        hash: Hash,
    ) -> GatewayResult<()> {
        let now = self.time_source.now();
        let mut state = self.state.write();

        let is_adapter = state
            .resolve(&RouteKey::new(origin, pool))
            .map(|set| set.slot_of(&caller).is_some())
            .unwrap_or(false);
        if !is_adapter && !state.access.has(Role::Guardian, &caller) {
            return Err(GatewayError::Unauthorized(format!(
                "{} is neither an adapter of network {} nor a guardian",
                short_hex(&caller),
                origin
            )));
        }

        let key: RecoveryKey = (origin, slot, hash);
        let ticket = state
            .recoveries
            .get(&key)
            .filter(|t| t.pool == pool)
            .ok_or(GatewayError::NoPendingRecovery)?;
        if !ticket.state().can_dispute(now) {
            return Err(GatewayError::NotDisputable {
                expired_at: ticket.expires_at,
            });
        }

        state.recoveries.remove(&key);
        metrics::record_recovery("disputed");
        warn!(
            origin,
            slot,
            hash = %short_hex(&hash),
            by = %short_hex(&caller),
            "[gateway] Recovery disputed"
        );
        state.emit(GatewayEvent::RecoveryDisputed {
            origin,
            slot,
            hash,
            by: caller,
        });
        Ok(())
    }

    pub(super) async fn execute_recovery(
        &self,
        caller: Address,
        origin: NetworkId,
        slot: AdapterSlot,
        payload: &[u8],
    ) -> GatewayResult<HandleOutcome> {
        let envelope = Envelope::decode(payload)?;
        let now = self.time_source.now();
        info!(
            origin,
            slot,
            caller = %short_hex(&caller),
            "[gateway] Executing recovery"
        );
        self.admit_vote(origin, envelope, VoteSource::Recovery { slot, now })
            .await
    }
}
