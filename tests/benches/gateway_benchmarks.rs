//! # Quorum-Gateway Benchmarks
//!
//! | Area | Operation | Target |
//! |------|-----------|--------|
//! | Codec | Frame/unframe a batch | linear in bytes |
//! | Hashing | Keccak-256 content hash | linear in bytes |
//! | Gateway | send → relay → quorum → execute | < 1ms per batch |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gateway_core::{content_hash, decode_batch, encode_batch, GatewayApi, OutboundMessage};
use gateway_tests::harness::{relay_all, TwoNetworks, ENTRY, NETWORK_B, POOL, REFUND};
use std::time::Duration;

fn messages(count: usize, size: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            let mut body = vec![0u8; size];
            body[..8].copy_from_slice(&(i as u64).to_be_bytes());
            body
        })
        .collect()
}

// ============================================================================
// Batch codec
// ============================================================================

fn bench_batch_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch-codec");

    for count in [1usize, 16, 128, 1024] {
        let batch = messages(count, 256);
        let encoded = encode_batch(&batch).unwrap();
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", count), &batch, |b, batch| {
            b.iter(|| black_box(encode_batch(batch).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decode", count), &encoded, |b, bytes| {
            b.iter(|| black_box(decode_batch(bytes).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("hash", count), &encoded, |b, bytes| {
            b.iter(|| black_box(content_hash(bytes)))
        });
    }

    group.finish();
}

// ============================================================================
// Full round trip through two gateways
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("gateway-round-trip");
    group.measurement_time(Duration::from_secs(10));

    for adapters in [1usize, 3, 5] {
        let quorum = (adapters / 2 + 1) as u8;
        let net = runtime.block_on(TwoNetworks::free(adapters, quorum)).unwrap();
        let mut nonce = 0u64;

        group.bench_function(BenchmarkId::new("send_relay_execute", adapters), |b| {
            b.iter(|| {
                nonce += 1;
                let message =
                    OutboundMessage::new(NETWORK_B, POOL, nonce.to_be_bytes().to_vec(), REFUND);
                runtime.block_on(async {
                    net.a.gateway.send(ENTRY, message).await.unwrap();
                    black_box(relay_all(&net.a, &net.b).await.unwrap())
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_batch_codec, bench_round_trip);
criterion_main!(benches);
