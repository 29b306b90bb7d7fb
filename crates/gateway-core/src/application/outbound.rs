//! Outbound path
//!
//! Buffering, batch dispatch and fee accounting. Quotes and sends run
//! outside the state lock; funding is reserved and returned under it.

use super::service::GatewayService;
use crate::algorithms::{allocate_funding, content_hash, encode_batch, Envelope};
use crate::domain::{
    short_hex, Address, AdapterSlot, Amount, GasLimit, GatewayError, GatewayResult, Hash, NetworkId,
    PendingBatch, PoolId, Role, RouteKey, Session, MAX_MESSAGE_LEN, PRIMARY_SLOT,
};
use crate::events::GatewayEvent;
use crate::metrics;
use crate::ports::inbound::{
    BatchFailure, DispatchReceipt, EndBatchingOutcome, OutboundMessage, Refund, SendOutcome,
};
use crate::ports::outbound::Adapter;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Serialized batch and the two envelopes carrying it.
struct Payloads {
    hash: Hash,
    full: Vec<u8>,
    proof: Vec<u8>,
}

impl Payloads {
    fn build<M: AsRef<[u8]>>(pool: PoolId, messages: &[M]) -> GatewayResult<Self> {
        let bytes = encode_batch(messages)?;
        let hash = content_hash(&bytes);
        Ok(Self {
            hash,
            full: Envelope::batch(pool, bytes).encode(),
            proof: Envelope::proof(pool, hash).encode(),
        })
    }

    fn for_slot(&self, slot: usize) -> &[u8] {
        if slot == PRIMARY_SLOT as usize {
            &self.full
        } else {
            &self.proof
        }
    }
}

fn check_message(message: &[u8]) -> GatewayResult<()> {
    if message.is_empty() {
        return Err(GatewayError::EmptyMessage);
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(GatewayError::MessageTooLarge {
            size: message.len(),
            max: MAX_MESSAGE_LEN,
        });
    }
    Ok(())
}

/// Quote every transport for its envelope, in slot order.
async fn collect_quotes(
    transports: &[Arc<dyn Adapter>],
    network: NetworkId,
    payloads: &Payloads,
    gas_limit: GasLimit,
) -> GatewayResult<Vec<Amount>> {
    let mut quotes = Vec::with_capacity(transports.len());
    for (slot, transport) in transports.iter().enumerate() {
        let quote = transport
            .estimate(network, payloads.for_slot(slot), gas_limit)
            .await
            .map_err(|e| GatewayError::AdapterFailure(format!("slot {} estimate: {}", slot, e)))?;
        quotes.push(quote);
    }
    Ok(quotes)
}

impl GatewayService {
    pub(super) async fn submit(
        &self,
        caller: Address,
        message: OutboundMessage,
    ) -> GatewayResult<SendOutcome> {
        check_message(&message.message)?;
        let route = message.route();

        {
            let mut state = self.state.write();
            state.access.require(Role::Entrypoint, &caller)?;
            state.require_route(&route)?;
            state.require_unblocked(&route)?;

            if let Some(session) = state.sessions.get_mut(&caller) {
                let position = buffer_message(
                    session,
                    route,
                    &message,
                    self.config.max_batch_bytes,
                    self.config.max_batch_gas,
                )?;
                debug!(
                    caller = %short_hex(&caller),
                    network = route.network,
                    pool = route.pool,
                    position,
                    "[gateway] Message buffered"
                );
                state.emit(GatewayEvent::MessageBuffered {
                    caller,
                    route,
                    position,
                });
                return Ok(SendOutcome::Buffered { route, position });
            }
        }

        // A lone message is a batch of one and obeys the same ceilings.
        PendingBatch::new(route).check_capacity(
            message.message.len(),
            message.gas_limit,
            self.config.max_batch_bytes,
            self.config.max_batch_gas,
        )?;

        let receipt = self
            .dispatch(
                route,
                std::slice::from_ref(&message.message),
                message.gas_limit,
                message.value,
                message.refund,
            )
            .await?;
        let refund = Refund {
            to: message.refund,
            amount: message.value - receipt.attached_consumed,
        };
        Ok(SendOutcome::Dispatched { receipt, refund })
    }

    pub(super) fn open_session(&self, caller: Address) -> GatewayResult<()> {
        let mut state = self.state.write();
        state.access.require(Role::Entrypoint, &caller)?;
        if state.sessions.contains_key(&caller) {
            return Err(GatewayError::AlreadyBatching);
        }
        state.sessions.insert(caller, Session::new());
        debug!(caller = %short_hex(&caller), "[gateway] Batching started");
        state.emit(GatewayEvent::BatchingStarted { caller });
        Ok(())
    }

    pub(super) async fn close_session(
        &self,
        caller: Address,
        value: Amount,
        refund: Address,
    ) -> GatewayResult<EndBatchingOutcome> {
        let session = self
            .state
            .write()
            .sessions
            .remove(&caller)
            .ok_or(GatewayError::NotBatching)?;
        let (batches, fuel) = session.close();
        let mut budget = fuel.saturating_add(value);

        let mut outcome = EndBatchingOutcome::default();
        for batch in batches.into_iter().filter(|b| !b.is_empty()) {
            let route = batch.route();
            let gas_limit = batch.gas_limit();
            let messages = batch.into_messages();
            match self
                .dispatch(route, &messages, gas_limit, budget, refund)
                .await
            {
                Ok(receipt) => {
                    budget -= receipt.attached_consumed;
                    outcome.receipts.push(receipt);
                }
                Err(error) => {
                    warn!(
                        network = route.network,
                        pool = route.pool,
                        messages = messages.len(),
                        %error,
                        "[gateway] Buffered batch dropped"
                    );
                    outcome.failures.push(BatchFailure {
                        route,
                        messages: messages.len(),
                        error,
                    });
                }
            }
        }
        outcome.refund = Refund {
            to: refund,
            amount: budget,
        };

        info!(
            caller = %short_hex(&caller),
            dispatched = outcome.receipts.len(),
            failed = outcome.failures.len(),
            refund = budget,
            "[gateway] Batching ended"
        );
        self.state.write().emit(GatewayEvent::BatchingEnded {
            caller,
            batches: outcome.receipts.len() + outcome.failures.len(),
        });
        Ok(outcome)
    }

    pub(super) async fn quote(
        &self,
        dest: NetworkId,
        pool: PoolId,
        message: &[u8],
        gas_limit: GasLimit,
    ) -> GatewayResult<Amount> {
        check_message(message)?;
        let route = RouteKey::new(dest, pool);
        let payloads = Payloads::build(pool, &[message])?;
        let transports = {
            let state = self.state.read();
            let set = state.require_route(&route)?;
            state.transports(set)?
        };
        let quotes = collect_quotes(&transports, dest, &payloads, gas_limit).await?;
        Ok(quotes.iter().fold(0, |acc: Amount, q| acc.saturating_add(*q)))
    }

    /// Send one batch through the adapter set of `route`.
    ///
    /// The primary carries the full batch, every other slot the proof. On
    /// success the receipt tells how much of `attached` was consumed.
    async fn dispatch(
        &self,
        route: RouteKey,
        messages: &[Vec<u8>],
        gas_limit: GasLimit,
        attached: Amount,
        refund: Address,
    ) -> GatewayResult<DispatchReceipt> {
        let payloads = Payloads::build(route.pool, messages)?;
        let transports = {
            let state = self.state.read();
            let set = state.require_route(&route)?;
            state.require_unblocked(&route)?;
            state.transports(set)?
        };
        let quotes = collect_quotes(&transports, route.network, &payloads, gas_limit).await?;
        let cost = quotes.iter().fold(0, |acc: Amount, q| acc.saturating_add(*q));

        let mut split = {
            let mut state = self.state.write();
            let split = allocate_funding(cost, attached, state.subsidy(route.pool))?;
            state.debit_subsidy(route.pool, split.from_subsidy);
            split
        };

        if let Err(e) = transports[PRIMARY_SLOT as usize]
            .send(
                route.network,
                &payloads.full,
                gas_limit,
                quotes[PRIMARY_SLOT as usize],
                refund,
            )
            .await
        {
            if split.from_subsidy > 0 {
                self.state
                    .write()
                    .credit_subsidy(route.pool, split.from_subsidy);
            }
            metrics::record_dispatch_failure("primary");
            warn!(
                network = route.network,
                pool = route.pool,
                error = %e,
                "[gateway] Primary adapter failed, nothing charged"
            );
            return Err(GatewayError::AdapterFailure(format!("primary: {}", e)));
        }

        let mut failed_slots = Vec::new();
        for (slot, transport) in transports.iter().enumerate().skip(1) {
            if let Err(e) = transport
                .send(route.network, &payloads.proof, gas_limit, quotes[slot], refund)
                .await
            {
                let back = split.release(quotes[slot]);
                if back.from_subsidy > 0 {
                    self.state
                        .write()
                        .credit_subsidy(route.pool, back.from_subsidy);
                }
                metrics::record_dispatch_failure("secondary");
                warn!(
                    network = route.network,
                    pool = route.pool,
                    slot,
                    error = %e,
                    "[gateway] Secondary adapter failed, fee returned"
                );
                failed_slots.push(slot as AdapterSlot);
            }
        }

        let receipt = DispatchReceipt {
            correlation_id: Uuid::new_v4(),
            route,
            hash: payloads.hash,
            messages: messages.len(),
            charged: split.total(),
            attached_consumed: split.from_attached,
            subsidy_consumed: split.from_subsidy,
            failed_slots,
        };

        let proofs = (transports.len() - 1 - receipt.failed_slots.len()) as u64;
        metrics::record_batch_sent(proofs, receipt.charged);
        info!(
            correlation_id = %receipt.correlation_id,
            network = route.network,
            pool = route.pool,
            hash = %short_hex(&receipt.hash),
            messages = receipt.messages,
            charged = receipt.charged,
            "[gateway] Batch sent"
        );
        self.state.write().emit(GatewayEvent::BatchSent {
            correlation_id: receipt.correlation_id,
            route,
            hash: receipt.hash,
            messages: receipt.messages,
            charged: receipt.charged,
            failed_slots: receipt.failed_slots.clone(),
        });
        Ok(receipt)
    }
}

/// Append to the session. Returns the message's position in its batch.
fn buffer_message(
    session: &mut Session,
    route: RouteKey,
    message: &OutboundMessage,
    max_bytes: usize,
    max_gas: GasLimit,
) -> GatewayResult<usize> {
    let len = message.message.len();
    match session.batch(&route) {
        Some(batch) => batch.check_capacity(len, message.gas_limit, max_bytes, max_gas)?,
        None => PendingBatch::new(route).check_capacity(len, message.gas_limit, max_bytes, max_gas)?,
    }
    let batch = session.batch_mut(route);
    batch.push(message.message.clone(), message.gas_limit);
    let position = batch.len();
    session.add_fuel(message.value);
    Ok(position)
}
