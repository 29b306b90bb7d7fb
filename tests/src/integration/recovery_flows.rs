//! # Recovery Flows
//!
//! A transport goes silent after its peers delivered. The receiving side
//! opens a recovery ticket, waits out the challenge period and supplies the
//! missing payload itself, unless an adapter or guardian disputes first.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use gateway_core::{
        content_hash, encode_batch, Envelope, GatewayApi, GatewayError, HandleOutcome,
        OutboundMessage, RecoveryState, SendOutcome,
    };

    async fn send_one(net: &TwoNetworks, body: &[u8]) -> gateway_core::Hash {
        let message = OutboundMessage::new(NETWORK_B, POOL, body.to_vec(), REFUND);
        match net.a.gateway.send(ENTRY, message).await.unwrap() {
            SendOutcome::Dispatched { receipt, .. } => receipt.hash,
            other => panic!("expected immediate dispatch, got {:?}", other),
        }
    }

    fn challenge_period(net: &TwoNetworks) -> u64 {
        net.b.gateway.config().recovery_challenge_period_secs
    }

    /// Only proofs arrived; recovery of the primary slot supplies the bytes.
    #[tokio::test]
    async fn test_recovery_replaces_lost_primary() {
        let net = TwoNetworks::free(3, 2).await.unwrap();
        let hash = send_one(&net, b"stranded").await;
        let lost = net.a.take_from(0).remove(0);

        relay(&net.a, &net.b, &[1]).await.unwrap();
        assert!(net.b.processor.processed().is_empty());

        let expires_at = net
            .b
            .gateway
            .initiate_message_recovery(INITIATOR, NETWORK_A, POOL, 0, hash)
            .await
            .unwrap();
        assert_eq!(expires_at, START_TIME + challenge_period(&net));

        net.b.time.set(expires_at - 1);
        assert!(matches!(
            net.b
                .gateway
                .execute_message_recovery(OUTSIDER, NETWORK_A, 0, &lost)
                .await,
            Err(GatewayError::RecoveryNotElapsed { .. })
        ));

        net.b.time.set(expires_at);
        let outcome = net
            .b
            .gateway
            .execute_message_recovery(OUTSIDER, NETWORK_A, 0, &lost)
            .await
            .unwrap();
        assert_eq!(outcome, HandleOutcome::Executed { executed: 1, failed: 0 });
        assert_eq!(net.b.processor.bodies(), vec![b"stranded".to_vec()]);

        // The third transport shows up late
        let outcomes = relay(&net.a, &net.b, &[2]).await.unwrap();
        assert_eq!(outcomes, vec![HandleOutcome::AlreadyExecuted]);
    }

    /// A disputed ticket is gone; the real delivery still completes the batch.
    #[tokio::test]
    async fn test_adapter_dispute_cancels_recovery() {
        let net = TwoNetworks::free(2, 2).await.unwrap();
        let hash = send_one(&net, b"m").await;
        relay(&net.a, &net.b, &[0]).await.unwrap();

        net.b
            .gateway
            .initiate_message_recovery(INITIATOR, NETWORK_A, POOL, 1, hash)
            .await
            .unwrap();
        net.b
            .gateway
            .dispute_message_recovery(adapter_id(1), NETWORK_A, POOL, 1, hash)
            .await
            .unwrap();
        assert_eq!(
            net.b.gateway.recovery_state(NETWORK_A, 1, &hash),
            RecoveryState::None
        );

        net.b.time.advance(challenge_period(&net));
        let proof = Envelope::proof(POOL, hash).encode();
        assert_eq!(
            net.b
                .gateway
                .execute_message_recovery(OUTSIDER, NETWORK_A, 1, &proof)
                .await,
            Err(GatewayError::NoPendingRecovery)
        );

        let outcomes = relay(&net.a, &net.b, &[1]).await.unwrap();
        assert_eq!(outcomes, vec![HandleOutcome::Executed { executed: 1, failed: 0 }]);
    }

    /// A forced vote is only a vote: it cannot execute bytes nobody delivered.
    #[tokio::test]
    async fn test_recovery_cannot_conjure_unseen_batch() {
        let net = TwoNetworks::free(2, 2).await.unwrap();
        let bytes = encode_batch(&[&b"never sent"[..]]).unwrap();
        let hash = content_hash(&bytes);

        let expires_at = net
            .b
            .gateway
            .initiate_message_recovery(INITIATOR, NETWORK_A, POOL, 1, hash)
            .await
            .unwrap();
        net.b.time.set(expires_at);

        let outcome = net
            .b
            .gateway
            .execute_message_recovery(
                OUTSIDER,
                NETWORK_A,
                1,
                &Envelope::proof(POOL, hash).encode(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, HandleOutcome::Pending { votes: 1, quorum: 2 });
        assert!(net.b.processor.processed().is_empty());
    }

    #[tokio::test]
    async fn test_guardian_dispute_window_closes_at_expiry() {
        let net = TwoNetworks::free(2, 2).await.unwrap();
        let hash = send_one(&net, b"m").await;
        let expires_at = net
            .b
            .gateway
            .initiate_message_recovery(INITIATOR, NETWORK_A, POOL, 1, hash)
            .await
            .unwrap();

        net.b.time.set(expires_at);
        assert_eq!(
            net.b
                .gateway
                .dispute_message_recovery(GUARDIAN, NETWORK_A, POOL, 1, hash)
                .await,
            Err(GatewayError::NotDisputable {
                expired_at: expires_at
            })
        );
        assert!(net.b.gateway.recovery_state(NETWORK_A, 1, &hash).is_pending());
    }
}
