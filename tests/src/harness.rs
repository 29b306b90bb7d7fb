//! # Two-Network Harness
//!
//! Two gateways, each with its own loopback adapters. Adapter `i` carries
//! the same identity on both sides, so the set configured on A for network
//! B is also the set B trusts for traffic from A. Nothing is delivered
//! until a test relays it, which lets each test pick the arrival order,
//! drop a transport, or hold a payload back for recovery.

use std::sync::Arc;

use gateway_core::{
    AdapterId, Address, Amount, GatewayAdminApi, GatewayApi, GatewayConfig, GatewayResult,
    GatewayService, HandleOutcome, LoopbackAdapter, ManualTimeSource, NetworkId, PoolId,
    RecordingProcessor, Role,
};
use gateway_telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};
use tokio::sync::OnceCell;
use tracing::debug;

pub const NETWORK_A: NetworkId = 1;
pub const NETWORK_B: NetworkId = 2;
pub const POOL: PoolId = 7;
pub const START_TIME: u64 = 1_700_000_000;

pub const ADMIN: Address = [0xAA; 20];
pub const ENTRY: Address = [0xE0; 20];
pub const REFUND: Address = [0xEF; 20];
pub const INITIATOR: Address = [0xC0; 20];
pub const GUARDIAN: Address = [0xD0; 20];
pub const OUTSIDER: Address = [0x55; 20];

static TELEMETRY: OnceCell<Option<TelemetryGuard>> = OnceCell::const_new();

/// Install the log subscriber once per binary. Silent unless `GW_LOG_LEVEL`
/// is set (`GW_LOG_LEVEL=debug` shows every relayed payload).
pub async fn init_logging() {
    TELEMETRY
        .get_or_init(|| async {
            let mut config = TelemetryConfig::from_env();
            config.console_output = std::env::var("GW_LOG_LEVEL").is_ok();
            init_telemetry(config).await.ok()
        })
        .await;
}

/// Identity of adapter slot `i` on both networks.
pub fn adapter_id(i: usize) -> AdapterId {
    [0xA1 + i as u8; 20]
}

/// One gateway plus the transports it sends through.
pub struct Network {
    pub id: NetworkId,
    pub gateway: GatewayService,
    pub adapters: Vec<Arc<LoopbackAdapter>>,
    pub processor: Arc<RecordingProcessor>,
    pub time: Arc<ManualTimeSource>,
}

impl Network {
    /// Gateway for `id` with one flat-fee adapter per entry of `fees`.
    pub fn new(id: NetworkId, fees: &[Amount]) -> GatewayResult<Self> {
        let processor = Arc::new(RecordingProcessor::new());
        let time = Arc::new(ManualTimeSource::new(START_TIME));
        let gateway = GatewayService::new(
            GatewayConfig::for_network(id),
            ADMIN,
            processor.clone(),
            time.clone(),
        )?;

        let adapters: Vec<Arc<LoopbackAdapter>> = fees
            .iter()
            .enumerate()
            .map(|(i, fee)| Arc::new(LoopbackAdapter::with_fees(adapter_id(i), *fee, 0)))
            .collect();
        for adapter in &adapters {
            gateway.register_adapter(ADMIN, adapter.clone())?;
        }
        gateway.grant_role(ADMIN, Role::Entrypoint, ENTRY)?;
        gateway.grant_role(ADMIN, Role::RecoveryInitiator, INITIATOR)?;
        gateway.grant_role(ADMIN, Role::Guardian, GUARDIAN)?;

        Ok(Self {
            id,
            gateway,
            adapters,
            processor,
            time,
        })
    }

    /// Trust every adapter, in slot order, for (`peer`, `pool`).
    pub fn connect(&self, peer: NetworkId, pool: PoolId, quorum: u8) -> GatewayResult<u64> {
        let ids = (0..self.adapters.len()).map(adapter_id).collect();
        self.gateway.set_adapters(ADMIN, peer, pool, ids, quorum)
    }

    /// Payloads adapter `slot` has sent so far, removed from its outbox.
    pub fn take_from(&self, slot: usize) -> Vec<Vec<u8>> {
        self.adapters[slot]
            .take_sent()
            .into_iter()
            .map(|sent| sent.payload)
            .collect()
    }
}

/// Gateways A and B connected on `POOL`.
pub struct TwoNetworks {
    pub a: Network,
    pub b: Network,
}

impl TwoNetworks {
    pub async fn new(fees: &[Amount], quorum: u8) -> GatewayResult<Self> {
        init_logging().await;
        let a = Network::new(NETWORK_A, fees)?;
        let b = Network::new(NETWORK_B, fees)?;
        a.connect(NETWORK_B, POOL, quorum)?;
        b.connect(NETWORK_A, POOL, quorum)?;
        a.gateway.drain_events();
        b.gateway.drain_events();
        Ok(Self { a, b })
    }

    /// Free transports.
    pub async fn free(adapters: usize, quorum: u8) -> GatewayResult<Self> {
        Self::new(&vec![0; adapters], quorum).await
    }
}

/// Deliver everything `from`'s adapters sent, visiting `slots` in order.
pub async fn relay(
    from: &Network,
    to: &Network,
    slots: &[usize],
) -> GatewayResult<Vec<HandleOutcome>> {
    let mut outcomes = Vec::new();
    for &slot in slots {
        for payload in from.take_from(slot) {
            debug!(
                from = from.id,
                to = to.id,
                slot,
                bytes = payload.len(),
                "[harness] Relaying payload"
            );
            outcomes.push(to.gateway.handle(adapter_id(slot), from.id, &payload).await?);
        }
    }
    Ok(outcomes)
}

/// Deliver through every adapter, primary first.
pub async fn relay_all(from: &Network, to: &Network) -> GatewayResult<Vec<HandleOutcome>> {
    let slots: Vec<usize> = (0..from.adapters.len()).collect();
    relay(from, to, &slots).await
}
