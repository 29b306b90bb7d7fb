//! # End-to-End Choreography Tests
//!
//! Round trips between two gateways:
//!
//! ```text
//! [App on A] ──send──→ [Gateway A] ──adapters──→ [Gateway B] ──handle──→ [Echo on B]
//!                                                                          │
//! [App on A] ←──handle── [Gateway A] ←──adapters── [Gateway B] ←──send─────┘
//! ```
//!
//! ## Test Categories
//!
//! 1. **Re-entrancy**: a processor sends from inside delivery
//! 2. **Races**: every adapter delivers at once, the batch runs once

#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use async_trait::async_trait;

#[cfg(test)]
use gateway_core::{
    GatewayApi, GatewayService, MessageProcessor, NetworkId, OutboundMessage, ProcessorError,
};

#[cfg(test)]
use crate::harness::*;

/// Answers every `ping:<x>` with `pong:<x>` to the origin network.
#[cfg(test)]
struct EchoProcessor {
    gateway: GatewayService,
}

#[cfg(test)]
#[async_trait]
impl MessageProcessor for EchoProcessor {
    async fn handle(&self, origin: NetworkId, message: &[u8]) -> Result<(), ProcessorError> {
        let body = message
            .strip_prefix(b"ping:")
            .ok_or_else(|| ProcessorError("not a ping".into()))?;
        let reply = [&b"pong:"[..], body].concat();
        self.gateway
            .send(ENTRY, OutboundMessage::new(origin, POOL, reply, REFUND))
            .await
            .map(|_| ())
            .map_err(|e| ProcessorError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use gateway_core::{GatewayAdminApi, HandleOutcome};

    #[tokio::test]
    async fn test_processor_replies_from_inside_delivery() {
        let net = TwoNetworks::free(3, 2).await.unwrap();
        let echo = Arc::new(EchoProcessor {
            gateway: net.b.gateway.clone(),
        });
        net.b.gateway.set_processor(ADMIN, echo).unwrap();

        for body in [&b"ping:1"[..], b"ping:2"] {
            let message = OutboundMessage::new(NETWORK_B, POOL, body.to_vec(), REFUND);
            net.a.gateway.send(ENTRY, message).await.unwrap();
        }

        relay_all(&net.a, &net.b).await.unwrap();
        assert_eq!(net.b.adapters[0].sent_count(), 2);

        relay_all(&net.b, &net.a).await.unwrap();
        assert_eq!(
            net.a.processor.bodies(),
            vec![b"pong:1".to_vec(), b"pong:2".to_vec()]
        );
    }

    /// A rejected ping is recorded on B and nothing travels back.
    #[tokio::test]
    async fn test_processor_error_is_contained() {
        let net = TwoNetworks::free(2, 2).await.unwrap();
        let echo = Arc::new(EchoProcessor {
            gateway: net.b.gateway.clone(),
        });
        net.b.gateway.set_processor(ADMIN, echo).unwrap();

        let message = OutboundMessage::new(NETWORK_B, POOL, b"hello".to_vec(), REFUND);
        net.a.gateway.send(ENTRY, message).await.unwrap();

        let outcomes = relay_all(&net.a, &net.b).await.unwrap();
        assert_eq!(outcomes[1], HandleOutcome::Executed { executed: 0, failed: 1 });
        assert_eq!(
            net.b
                .gateway
                .failed_count(NETWORK_A, &gateway_core::content_hash(b"hello")),
            1
        );
        assert!(net.b.adapters.iter().all(|a| a.sent_count() == 0));
    }

    /// Five adapters race with quorum 2: exactly one delivery executes.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deliveries_execute_once() {
        let net = TwoNetworks::free(5, 2).await.unwrap();
        let message = OutboundMessage::new(NETWORK_B, POOL, b"race".to_vec(), REFUND);
        net.a.gateway.send(ENTRY, message).await.unwrap();

        let mut deliveries = Vec::new();
        for slot in 0..net.a.adapters.len() {
            for payload in net.a.take_from(slot) {
                let gateway = net.b.gateway.clone();
                deliveries.push(tokio::spawn(async move {
                    gateway.handle(adapter_id(slot), NETWORK_A, &payload).await
                }));
            }
        }
        let outcomes: Vec<HandleOutcome> = join_all(deliveries)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        let executed = outcomes
            .iter()
            .filter(|o| matches!(o, HandleOutcome::Executed { .. }))
            .count();
        assert_eq!(outcomes.len(), 5);
        assert_eq!(executed, 1);
        assert_eq!(net.b.processor.bodies(), vec![b"race".to_vec()]);
    }
}
