//! Loopback Adapter
//!
//! Implements the `Adapter` port in memory. Every send is recorded so a test
//! harness (or a local simulation) can relay it to the destination gateway.

use crate::domain::{short_hex, Address, AdapterId, Amount, GasLimit, NetworkId};
use crate::ports::outbound::{Adapter, AdapterError, AdapterReceipt};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// Payload captured by a loopback send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentPayload {
    /// Destination network.
    pub dest: NetworkId,
    /// Envelope bytes.
    pub payload: Vec<u8>,
    /// Requested gas limit.
    pub gas_limit: GasLimit,
    /// Value paid.
    pub payment: Amount,
    /// Refund address supplied by the gateway.
    pub refund: Address,
}

/// In-memory transport with a flat plus per-byte fee.
pub struct LoopbackAdapter {
    id: AdapterId,
    base_fee: Amount,
    fee_per_byte: Amount,
    sent: RwLock<Vec<SentPayload>>,
    fail_sends: AtomicBool,
    nonce: AtomicU64,
}

impl LoopbackAdapter {
    /// Free transport.
    pub fn new(id: AdapterId) -> Self {
        Self::with_fees(id, 0, 0)
    }

    /// Transport charging `base_fee + fee_per_byte * payload.len()`.
    pub fn with_fees(id: AdapterId, base_fee: Amount, fee_per_byte: Amount) -> Self {
        Self {
            id,
            base_fee,
            fee_per_byte,
            sent: RwLock::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            nonce: AtomicU64::new(0),
        }
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::SeqCst);
    }

    /// Take every recorded send, oldest first.
    pub fn take_sent(&self) -> Vec<SentPayload> {
        std::mem::take(&mut *self.sent.write())
    }

    /// Number of recorded sends not yet taken.
    pub fn sent_count(&self) -> usize {
        self.sent.read().len()
    }

    fn quote(&self, payload: &[u8]) -> Amount {
        self.base_fee + self.fee_per_byte * payload.len() as Amount
    }
}

#[async_trait]
impl Adapter for LoopbackAdapter {
    fn id(&self) -> AdapterId {
        self.id
    }

    async fn send(
        &self,
        dest: NetworkId,
        payload: &[u8],
        gas_limit: GasLimit,
        payment: Amount,
        refund: Address,
    ) -> Result<AdapterReceipt, AdapterError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AdapterError::Unavailable(format!(
                "loopback {} offline",
                short_hex(&self.id)
            )));
        }

        let fee = self.quote(payload);
        if payment < fee {
            return Err(AdapterError::Rejected(format!(
                "payment {} below fee {}",
                payment, fee
            )));
        }

        debug!(
            "[gateway] Loopback {} sending {} bytes to network {}",
            short_hex(&self.id),
            payload.len(),
            dest
        );

        self.sent.write().push(SentPayload {
            dest,
            payload: payload.to_vec(),
            gas_limit,
            payment,
            refund,
        });

        Ok(AdapterReceipt {
            adapter: self.id,
            fee_paid: payment,
            reference: self.nonce.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn estimate(
        &self,
        _dest: NetworkId,
        payload: &[u8],
        _gas_limit: GasLimit,
    ) -> Result<Amount, AdapterError> {
        Ok(self.quote(payload))
    }
}
