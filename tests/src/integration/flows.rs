//! # Integration Test Flows
//!
//! Gateway A sends, gateway B receives; the harness plays the transports.
//!
//! ## Flows Tested:
//!
//! 1. **Quorum delivery**: primary batch plus proofs, executed exactly once
//! 2. **Proofs before bytes**: quorum of proofs waits for the primary
//! 3. **Sessions**: one batch per route, one dispatch per adapter
//! 4. **Fees**: attached value first, subsidy second, refund of the rest
//! 5. **Faults**: secondary outage, primary outage, processor failure and retry
//! 6. **Reconfiguration**: votes from a replaced adapter set are discarded

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use gateway_core::{
        GatewayAdminApi, GatewayApi, GatewayError, HandleOutcome, OutboundMessage, Refund,
        SendOutcome,
    };

    fn message(body: &[u8]) -> OutboundMessage {
        OutboundMessage::new(NETWORK_B, POOL, body.to_vec(), REFUND)
    }

    fn dispatched(outcome: SendOutcome) -> (gateway_core::DispatchReceipt, Refund) {
        match outcome {
            SendOutcome::Dispatched { receipt, refund } => (receipt, refund),
            other => panic!("expected immediate dispatch, got {:?}", other),
        }
    }

    // =========================================================================
    // QUORUM DELIVERY
    // =========================================================================

    /// A(primary), B, C with quorum 2: A + B execute, C's late proof is a no-op.
    #[tokio::test]
    async fn test_two_of_three_executes_exactly_once() {
        let net = TwoNetworks::free(3, 2).await.unwrap();
        let (receipt, _) = dispatched(net.a.gateway.send(ENTRY, message(b"hello")).await.unwrap());
        assert_eq!(receipt.messages, 1);

        let outcomes = relay_all(&net.a, &net.b).await.unwrap();
        assert_eq!(
            outcomes,
            vec![
                HandleOutcome::Pending { votes: 1, quorum: 2 },
                HandleOutcome::Executed { executed: 1, failed: 0 },
                HandleOutcome::AlreadyExecuted,
            ]
        );
        assert_eq!(net.b.processor.bodies(), vec![b"hello".to_vec()]);
        assert!(net.b.gateway.is_executed(NETWORK_A, POOL, &receipt.hash));
    }

    /// B and C reach quorum on proofs alone; nothing runs until A's bytes land.
    #[tokio::test]
    async fn test_proof_quorum_waits_for_primary_bytes() {
        let net = TwoNetworks::free(3, 2).await.unwrap();
        let (receipt, _) = dispatched(net.a.gateway.send(ENTRY, message(b"late")).await.unwrap());

        let outcomes = relay(&net.a, &net.b, &[1, 2]).await.unwrap();
        assert_eq!(
            outcomes,
            vec![
                HandleOutcome::Pending { votes: 1, quorum: 2 },
                HandleOutcome::Pending { votes: 2, quorum: 2 },
            ]
        );
        assert!(net.b.processor.processed().is_empty());
        assert_eq!(net.b.gateway.vote_count(NETWORK_A, POOL, &receipt.hash), 2);

        let outcomes = relay(&net.a, &net.b, &[0]).await.unwrap();
        assert_eq!(outcomes, vec![HandleOutcome::Executed { executed: 1, failed: 0 }]);
        assert_eq!(net.b.processor.bodies(), vec![b"late".to_vec()]);
    }

    /// A primary payload from an adapter B does not trust is rejected outright.
    #[tokio::test]
    async fn test_untrusted_adapter_cannot_vote() {
        let net = TwoNetworks::free(2, 2).await.unwrap();
        net.a.gateway.send(ENTRY, message(b"x")).await.unwrap();
        let payload = net.a.take_from(0).remove(0);

        let forged = net.b.gateway.handle([0x99; 20], NETWORK_A, &payload).await;
        assert!(matches!(forged, Err(GatewayError::InvalidAdapter { .. })));
        assert!(net.b.processor.processed().is_empty());
    }

    // =========================================================================
    // SESSIONS
    // =========================================================================

    /// Messages for two pools in one session become two batches.
    #[tokio::test]
    async fn test_session_groups_messages_per_route() {
        const OTHER_POOL: u64 = 9;
        let net = TwoNetworks::free(2, 2).await.unwrap();
        net.a.connect(NETWORK_B, OTHER_POOL, 2).unwrap();
        net.b.connect(NETWORK_A, OTHER_POOL, 2).unwrap();

        net.a.gateway.start_batching(ENTRY).await.unwrap();
        for body in [&b"p7-1"[..], b"p7-2", b"p7-3"] {
            let outcome = net.a.gateway.send(ENTRY, message(body)).await.unwrap();
            assert!(matches!(outcome, SendOutcome::Buffered { .. }));
        }
        let other = OutboundMessage::new(NETWORK_B, OTHER_POOL, b"p9-1".to_vec(), REFUND);
        net.a.gateway.send(ENTRY, other).await.unwrap();
        assert_eq!(net.a.gateway.buffered_messages(&ENTRY), 4);
        assert_eq!(net.a.adapters[0].sent_count(), 0);

        let outcome = net.a.gateway.end_batching(ENTRY, 0, REFUND).await.unwrap();
        assert!(outcome.failures.is_empty());
        assert_eq!(
            outcome.receipts.iter().map(|r| r.messages).collect::<Vec<_>>(),
            vec![3, 1]
        );
        assert_eq!(net.a.adapters[0].sent_count(), 2);
        assert_eq!(net.a.adapters[1].sent_count(), 2);

        relay_all(&net.a, &net.b).await.unwrap();
        assert_eq!(
            net.b.processor.bodies(),
            vec![
                b"p7-1".to_vec(),
                b"p7-2".to_vec(),
                b"p7-3".to_vec(),
                b"p9-1".to_vec()
            ]
        );
    }

    // =========================================================================
    // FEES
    // =========================================================================

    #[tokio::test]
    async fn test_fees_drawn_from_value_then_subsidy() {
        let net = TwoNetworks::new(&[100, 50, 50], 2).await.unwrap();

        // Value covers everything: 50 comes back
        let (receipt, refund) = dispatched(
            net.a
                .gateway
                .send(ENTRY, message(b"paid").with_value(250))
                .await
                .unwrap(),
        );
        assert_eq!(receipt.charged, 200);
        assert_eq!(refund, Refund { to: REFUND, amount: 50 });

        // Short by 120: the pool subsidy makes up the difference
        net.a.gateway.subsidize_pool(POOL, 500).await.unwrap();
        let (receipt, refund) = dispatched(
            net.a
                .gateway
                .send(ENTRY, message(b"subsidized").with_value(80))
                .await
                .unwrap(),
        );
        assert_eq!(receipt.attached_consumed, 80);
        assert_eq!(receipt.subsidy_consumed, 120);
        assert_eq!(refund.amount, 0);
        assert_eq!(net.a.gateway.subsidy(POOL), 380);

        relay_all(&net.a, &net.b).await.unwrap();
        assert_eq!(
            net.b.processor.bodies(),
            vec![b"paid".to_vec(), b"subsidized".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_underfunded_send_has_no_effect() {
        let net = TwoNetworks::new(&[100, 50, 50], 2).await.unwrap();
        net.a.gateway.subsidize_pool(POOL, 50).await.unwrap();

        let result = net.a.gateway.send(ENTRY, message(b"x").with_value(100)).await;
        assert_eq!(
            result,
            Err(GatewayError::InsufficientFunding {
                required: 200,
                available: 150
            })
        );
        assert_eq!(net.a.gateway.subsidy(POOL), 50);
        assert!(net.a.adapters.iter().all(|a| a.sent_count() == 0));
    }

    // =========================================================================
    // FAULTS
    // =========================================================================

    /// One dead secondary is tolerated when the rest still reach quorum.
    #[tokio::test]
    async fn test_secondary_outage_is_tolerated() {
        let net = TwoNetworks::free(3, 2).await.unwrap();
        net.a.adapters[2].set_failing(true);

        let (receipt, _) = dispatched(net.a.gateway.send(ENTRY, message(b"m")).await.unwrap());
        assert_eq!(receipt.failed_slots, vec![2]);

        let outcomes = relay_all(&net.a, &net.b).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(net.b.processor.bodies(), vec![b"m".to_vec()]);
    }

    /// Without the primary nothing can execute, so the send fails as a whole.
    #[tokio::test]
    async fn test_primary_outage_fails_send() {
        let net = TwoNetworks::new(&[10, 10], 2).await.unwrap();
        net.a.gateway.subsidize_pool(POOL, 100).await.unwrap();
        net.a.adapters[0].set_failing(true);

        let result = net.a.gateway.send(ENTRY, message(b"m")).await;
        assert!(matches!(result, Err(GatewayError::AdapterFailure(_))));
        assert_eq!(net.a.gateway.subsidy(POOL), 100);
    }

    /// A message the processor rejects stays retryable without re-delivery.
    #[tokio::test]
    async fn test_processor_failure_then_retry() {
        let net = TwoNetworks::free(2, 2).await.unwrap();
        net.b.processor.fail_on(b"boom");

        net.a.gateway.start_batching(ENTRY).await.unwrap();
        net.a.gateway.send(ENTRY, message(b"ok")).await.unwrap();
        net.a.gateway.send(ENTRY, message(b"boom")).await.unwrap();
        net.a.gateway.end_batching(ENTRY, 0, REFUND).await.unwrap();

        let outcomes = relay_all(&net.a, &net.b).await.unwrap();
        assert_eq!(outcomes[1], HandleOutcome::Executed { executed: 1, failed: 1 });

        assert!(matches!(
            net.b.gateway.retry(NETWORK_A, b"boom").await,
            Err(GatewayError::ProcessorFailure(_))
        ));

        net.b.processor.accept(b"boom");
        net.b.gateway.retry(NETWORK_A, b"boom").await.unwrap();
        assert_eq!(
            net.b.processor.bodies(),
            vec![b"ok".to_vec(), b"boom".to_vec()]
        );
        assert!(matches!(
            net.b.gateway.retry(NETWORK_A, b"boom").await,
            Err(GatewayError::NotFailedMessage(_))
        ));
    }

    #[tokio::test]
    async fn test_blocked_route_rejects_then_recovers() {
        let net = TwoNetworks::free(2, 2).await.unwrap();
        net.a
            .gateway
            .block_outgoing(ADMIN, NETWORK_B, POOL, true)
            .unwrap();
        assert!(matches!(
            net.a.gateway.send(ENTRY, message(b"m")).await,
            Err(GatewayError::OutgoingBlocked { .. })
        ));

        net.a
            .gateway
            .block_outgoing(ADMIN, NETWORK_B, POOL, false)
            .unwrap();
        net.a.gateway.send(ENTRY, message(b"m")).await.unwrap();
        relay_all(&net.a, &net.b).await.unwrap();
        assert_eq!(net.b.processor.bodies(), vec![b"m".to_vec()]);
    }

    // =========================================================================
    // RECONFIGURATION
    // =========================================================================

    /// Votes cast under a replaced adapter set no longer count.
    #[tokio::test]
    async fn test_reconfiguration_discards_pending_votes() {
        let net = TwoNetworks::free(3, 2).await.unwrap();
        let (receipt, _) = dispatched(net.a.gateway.send(ENTRY, message(b"m")).await.unwrap());

        relay(&net.a, &net.b, &[1]).await.unwrap();
        assert_eq!(net.b.gateway.vote_count(NETWORK_A, POOL, &receipt.hash), 1);

        net.b.connect(NETWORK_A, POOL, 2).unwrap();
        let outcomes = relay(&net.a, &net.b, &[0]).await.unwrap();
        assert_eq!(outcomes, vec![HandleOutcome::Pending { votes: 1, quorum: 2 }]);

        let outcomes = relay(&net.a, &net.b, &[2]).await.unwrap();
        assert_eq!(outcomes, vec![HandleOutcome::Executed { executed: 1, failed: 0 }]);
    }
}
