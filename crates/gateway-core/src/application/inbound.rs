//! Inbound path
//!
//! Vote admission and quorum detection run in one critical section, which
//! is what makes execution exactly-once when adapters race. The processor
//! runs after the lock is released.

use super::service::GatewayService;
use super::state::{RecoveryKey, TallyKey};
use crate::algorithms::{content_hash, decode_batch, Envelope, EnvelopeBody};
use crate::domain::{
    invariant_payload_shape, short_hex, AdapterId, AdapterSlot, GatewayError, GatewayResult,
    Hash, NetworkId, PoolId, RouteKey, VoteTally,
};
use crate::events::GatewayEvent;
use crate::metrics;
use crate::ports::inbound::HandleOutcome;
use crate::ports::outbound::MessageProcessor;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Who a vote is attributed to.
#[derive(Clone, Copy, Debug)]
pub(super) enum VoteSource {
    /// Delivered by the adapter calling `handle`.
    Adapter(AdapterId),
    /// Forced through an elapsed recovery ticket.
    Recovery {
        /// Slot the vote is recorded for.
        slot: AdapterSlot,
        /// Time of the execute call.
        now: u64,
    },
}

fn invalid_adapter(who: String, origin: NetworkId, pool: PoolId) -> GatewayError {
    GatewayError::InvalidAdapter {
        adapter: who,
        network: origin,
        pool,
    }
}

impl GatewayService {
    pub(super) async fn deliver(
        &self,
        caller: AdapterId,
        origin: NetworkId,
        payload: &[u8],
    ) -> GatewayResult<HandleOutcome> {
        let envelope = Envelope::decode(payload)?;
        self.admit_vote(origin, envelope, VoteSource::Adapter(caller))
            .await
    }

    /// Record a vote and execute the batch if it reached quorum.
    pub(super) async fn admit_vote(
        &self,
        origin: NetworkId,
        envelope: Envelope,
        source: VoteSource,
    ) -> GatewayResult<HandleOutcome> {
        if let EnvelopeBody::Batch(bytes) = &envelope.body {
            decode_batch(bytes)?;
        }
        let pool = envelope.pool;
        let hash = envelope.content_hash();
        let kind = envelope.kind();

        let (bytes, processor) = {
            let mut state = self.state.write();
            let route = RouteKey::new(origin, pool);

            if let VoteSource::Recovery { slot, now } = source {
                let key: RecoveryKey = (origin, slot, hash);
                let ticket = state
                    .recoveries
                    .get(&key)
                    .ok_or(GatewayError::NoPendingRecovery)?;
                if !ticket.state().can_execute(now) {
                    return Err(GatewayError::RecoveryNotElapsed {
                        executable_at: ticket.expires_at,
                        now,
                    });
                }
                if ticket.pool != pool {
                    return Err(GatewayError::InvalidPayload(format!(
                        "ticket for pool {}, payload for pool {}",
                        ticket.pool, pool
                    )));
                }
            }

            let (slot, quorum, config_epoch) = {
                let rejected = || match source {
                    VoteSource::Adapter(id) => invalid_adapter(short_hex(&id), origin, pool),
                    VoteSource::Recovery { slot, .. } => {
                        invalid_adapter(format!("slot {}", slot), origin, pool)
                    }
                };
                let set = state.resolve(&route).ok_or_else(rejected)?;
                let slot = match source {
                    VoteSource::Adapter(id) => set.slot_of(&id),
                    VoteSource::Recovery { slot, .. } => set.adapter_at(slot).map(|_| slot),
                }
                .ok_or_else(rejected)?;
                (slot, set.quorum(), set.config_epoch())
            };
            invariant_payload_shape(kind, slot)?;

            if let VoteSource::Recovery { slot, .. } = source {
                state.recoveries.remove(&(origin, slot, hash));
                metrics::record_recovery("executed");
                info!(
                    origin,
                    slot,
                    hash = %short_hex(&hash),
                    "[gateway] Recovery executed"
                );
                state.emit(GatewayEvent::RecoveryExecuted { origin, slot, hash });
            }

            let key: TallyKey = (origin, pool, hash);
            if !state.tallies.contains_key(&key) {
                if let Some(evicted) = state.track_tally(key, self.config.max_pending_tallies) {
                    warn!(
                        origin,
                        pool,
                        evicted = %short_hex(&evicted),
                        "[gateway] Pending tally limit reached, oldest evicted"
                    );
                    state.emit(GatewayEvent::TallyEvicted {
                        origin,
                        pool,
                        hash: evicted,
                    });
                }
            }
            let tally = state
                .tallies
                .entry(key)
                .or_insert_with(|| VoteTally::new(config_epoch));
            if tally.is_consumed() {
                debug!(
                    origin,
                    slot,
                    hash = %short_hex(&hash),
                    "[gateway] Late vote for executed batch ignored"
                );
                return Ok(HandleOutcome::AlreadyExecuted);
            }

            let stale = tally.sync_epoch(config_epoch);
            if let EnvelopeBody::Batch(bytes) = envelope.body {
                tally.store_batch(bytes);
            }
            let counted = tally.vote(slot);
            let votes = tally.vote_count();
            let bytes = if tally.is_executable(quorum) {
                tally.consume()
            } else {
                None
            };

            if stale {
                warn!(
                    origin,
                    hash = %short_hex(&hash),
                    config_epoch,
                    "[gateway] Votes from previous adapter set discarded"
                );
                state.emit(GatewayEvent::StaleVotesDiscarded {
                    origin,
                    hash,
                    config_epoch,
                });
            }
            if counted {
                metrics::record_vote();
                debug!(
                    origin,
                    pool,
                    slot,
                    votes,
                    quorum,
                    hash = %short_hex(&hash),
                    "[gateway] Vote recorded"
                );
                state.emit(GatewayEvent::VoteRecorded {
                    origin,
                    pool,
                    hash,
                    slot,
                    votes,
                });
            }

            match bytes {
                Some(bytes) => (bytes, state.processor.clone()),
                None => return Ok(HandleOutcome::Pending { votes, quorum }),
            }
        };

        self.execute_batch(origin, pool, hash, bytes, processor)
            .await
    }

    /// Hand every message of a consumed batch to the processor, in order.
    async fn execute_batch(
        &self,
        origin: NetworkId,
        pool: PoolId,
        hash: Hash,
        bytes: Vec<u8>,
        processor: Arc<dyn MessageProcessor>,
    ) -> GatewayResult<HandleOutcome> {
        let messages = decode_batch(&bytes)?;
        info!(
            origin,
            pool,
            hash = %short_hex(&hash),
            messages = messages.len(),
            "[gateway] Quorum reached, executing batch"
        );

        let mut executed = 0;
        let mut failed = 0;
        for message in &messages {
            match processor.handle(origin, message).await {
                Ok(()) => executed += 1,
                Err(e) => {
                    failed += 1;
                    let message_hash = content_hash(message);
                    metrics::record_message_failed();
                    warn!(
                        origin,
                        message = %short_hex(&message_hash),
                        error = %e,
                        "[gateway] Message failed, recorded for retry"
                    );
                    let mut state = self.state.write();
                    *state.failed.entry((origin, message_hash)).or_insert(0) += 1;
                    state.emit(GatewayEvent::MessageFailed {
                        origin,
                        message_hash,
                        reason: e.0,
                    });
                }
            }
        }

        metrics::record_batch_executed();
        self.state.write().emit(GatewayEvent::BatchExecuted {
            origin,
            pool,
            hash,
            executed,
            failed,
        });
        Ok(HandleOutcome::Executed { executed, failed })
    }

    pub(super) async fn retry_failed(&self, origin: NetworkId, message: &[u8]) -> GatewayResult<()> {
        let message_hash = content_hash(message);
        let key = (origin, message_hash);

        // Take one pending retry up front so concurrent retries cannot both succeed on it.
        let processor = {
            let mut state = self.state.write();
            let remaining = match state.failed.get_mut(&key) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    *count
                }
                _ => return Err(GatewayError::NotFailedMessage(short_hex(&message_hash))),
            };
            if remaining == 0 {
                state.failed.remove(&key);
            }
            state.processor.clone()
        };

        match processor.handle(origin, message).await {
            Ok(()) => {
                info!(
                    origin,
                    message = %short_hex(&message_hash),
                    "[gateway] Failed message retried"
                );
                self.state.write().emit(GatewayEvent::MessageRetried {
                    origin,
                    message_hash,
                });
                Ok(())
            }
            Err(e) => {
                *self.state.write().failed.entry(key).or_insert(0) += 1;
                warn!(
                    origin,
                    message = %short_hex(&message_hash),
                    error = %e,
                    "[gateway] Retry failed"
                );
                Err(GatewayError::ProcessorFailure(e.0))
            }
        }
    }
}
