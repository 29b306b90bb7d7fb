//! Shared setup for service tests.

use super::service::GatewayService;
use crate::adapters::{LoopbackAdapter, ManualTimeSource, RecordingProcessor};
use crate::algorithms::{content_hash, encode_batch, Envelope};
use crate::config::GatewayConfig;
use crate::domain::{Address, AdapterId, Amount, Hash, NetworkId, PoolId, Role};
use crate::ports::inbound::GatewayAdminApi;
use std::sync::Arc;

pub(crate) const LOCAL: NetworkId = 1;
pub(crate) const REMOTE: NetworkId = 2;
pub(crate) const POOL: PoolId = 7;
pub(crate) const START_TIME: u64 = 1_700_000_000;

pub(crate) const ADMIN: Address = [0xAA; 20];
pub(crate) const ENTRY: Address = [0xE0; 20];
pub(crate) const REFUND: Address = [0xEF; 20];
pub(crate) const INITIATOR: Address = [0xC0; 20];
pub(crate) const GUARDIAN: Address = [0xD0; 20];
pub(crate) const OUTSIDER: Address = [0x55; 20];

/// Adapter id of slot `i` in fixtures.
pub(crate) fn adapter_id(i: usize) -> AdapterId {
    [0xA1 + i as u8; 20]
}

pub(crate) struct Fixture {
    pub service: GatewayService,
    pub adapters: Vec<Arc<LoopbackAdapter>>,
    pub processor: Arc<RecordingProcessor>,
    pub time: Arc<ManualTimeSource>,
}

impl Fixture {
    /// Gateway on `network` with one flat-fee loopback adapter per entry of `fees`.
    pub fn new(network: NetworkId, fees: &[Amount]) -> Self {
        Self::with_config(GatewayConfig::for_network(network), fees)
    }

    pub fn with_config(config: GatewayConfig, fees: &[Amount]) -> Self {
        let schedule: Vec<(Amount, Amount)> = fees.iter().map(|f| (*f, 0)).collect();
        Self::build(config, &schedule)
    }

    pub fn with_fee_schedule(network: NetworkId, schedule: &[(Amount, Amount)]) -> Self {
        Self::build(GatewayConfig::for_network(network), schedule)
    }

    fn build(config: GatewayConfig, schedule: &[(Amount, Amount)]) -> Self {
        let processor = Arc::new(RecordingProcessor::new());
        let time = Arc::new(ManualTimeSource::new(START_TIME));
        let service = GatewayService::new(config, ADMIN, processor.clone(), time.clone())
            .expect("valid config");

        let adapters: Vec<Arc<LoopbackAdapter>> = schedule
            .iter()
            .enumerate()
            .map(|(i, (base, per_byte))| {
                Arc::new(LoopbackAdapter::with_fees(adapter_id(i), *base, *per_byte))
            })
            .collect();
        for adapter in &adapters {
            service.register_adapter(ADMIN, adapter.clone()).unwrap();
        }
        service.grant_role(ADMIN, Role::Entrypoint, ENTRY).unwrap();
        service
            .grant_role(ADMIN, Role::RecoveryInitiator, INITIATOR)
            .unwrap();
        service.grant_role(ADMIN, Role::Guardian, GUARDIAN).unwrap();
        service.drain_events();

        Self {
            service,
            adapters,
            processor,
            time,
        }
    }

    /// Configure every fixture adapter, in order, for (network, pool).
    pub fn configure(&self, network: NetworkId, pool: PoolId, quorum: u8) -> u64 {
        let ids = (0..self.adapters.len()).map(adapter_id).collect();
        self.service
            .set_adapters(ADMIN, network, pool, ids, quorum)
            .unwrap()
    }
}

/// Full and proof envelopes of a batch of `messages` for `pool`.
pub(crate) fn envelopes(pool: PoolId, messages: &[&[u8]]) -> (Vec<u8>, Vec<u8>, Hash) {
    let bytes = encode_batch(messages).unwrap();
    let hash = content_hash(&bytes);
    (
        Envelope::batch(pool, bytes).encode(),
        Envelope::proof(pool, hash).encode(),
        hash,
    )
}
