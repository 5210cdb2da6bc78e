use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use evgate::{
    event::{decode, encode},
    Event, EventBroker, EventKind, Gateway, GatewayConfig,
};

fn event(payload_len: usize) -> Event {
    Event::new(EventKind::PublishData, vec![0xab; payload_len])
        .with_async_id(42)
        .with_handle(7)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_encode");
    for len in [0usize, 64, 4096] {
        let ev = event(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &ev, |b, ev| {
            b.iter(|| black_box(encode(black_box(ev))))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_decode");
    for len in [0usize, 64, 4096] {
        let raw = encode(&event(len));
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &raw, |b, raw| {
            b.iter(|| black_box(decode(black_box(raw)).unwrap()))
        });
    }
    group.finish();
}

fn bench_gateway_malformed(c: &mut Criterion) {
    let gw = Gateway::new(Arc::new(EventBroker::default()), GatewayConfig::default());
    let garbage = [0u8; 32];
    c.bench_function("gateway_drop_malformed", |b| {
        b.iter(|| black_box(gw.on_event(black_box(&garbage))))
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_gateway_malformed);
criterion_main!(benches);
