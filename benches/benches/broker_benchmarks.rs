use std::{hint::black_box, sync::Arc, time::Duration};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use evgate::{BrokerConfig, Event, EventBroker, EventKind, Matcher};

fn rpc(id: u64) -> Event {
    Event::new(EventKind::RpcResponse, "payload").with_async_id(id)
}

fn bench_dispatch_no_waiters(c: &mut Criterion) {
    let broker = EventBroker::default();
    let mut id = 0u64;
    c.bench_function("dispatch_no_waiters", |b| {
        b.iter(|| {
            id += 1;
            broker.dispatch(black_box(rpc(id)));
        })
    });
}

/// Стоимость `dispatch` при разном числе подписчиков рассылки.
fn bench_dispatch_with_subscribers(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_with_subscribers");
    for subs in [1usize, 10, 100] {
        let broker = EventBroker::default();
        for _ in 0..subs {
            broker.subscribe(|ev| {
                black_box(ev.kind());
            });
        }
        group.bench_with_input(BenchmarkId::from_parameter(subs), &subs, |b, _| {
            b.iter(|| broker.dispatch(black_box(rpc(1))))
        });
    }
    group.finish();
}

/// Ожидание, удовлетворяемое из истории: проверка и захват под одной
/// блокировкой.
fn bench_wait_history_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let broker = EventBroker::new(BrokerConfig {
        history_capacity: 1024,
        ..Default::default()
    });

    c.bench_function("wait_history_hit", |b| {
        b.iter(|| {
            broker.dispatch(rpc(7));
            let ev = rt.block_on(broker.wait_for_event(
                Matcher::AsyncId(7),
                Some(Duration::from_secs(1)),
                None,
            ));
            black_box(ev.unwrap());
        })
    });
}

/// Захват ожидающим при `dispatch`, когда в реестре много чужих
/// ожиданий по другим `async_id`.
fn bench_resolve_among_pending(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("resolve_among_pending");

    for pending in [10u64, 1000] {
        let broker = Arc::new(EventBroker::default());
        let _background: Vec<_> = (0..pending)
            .map(|i| {
                let broker = broker.clone();
                rt.spawn(async move {
                    let _ = broker
                        .wait_for_event(Matcher::AsyncId(1_000_000 + i), None, None)
                        .await;
                })
            })
            .collect();
        while broker.pending_waiters() < pending as usize {
            std::thread::yield_now();
        }

        group.bench_with_input(BenchmarkId::from_parameter(pending), &pending, |b, _| {
            b.iter(|| {
                let id = broker.next_async_id();
                let waiter = {
                    let broker = broker.clone();
                    rt.spawn(async move { broker.wait_for_async_id(id, None).await })
                };
                while broker.pending_waiters() <= pending as usize {
                    std::thread::yield_now();
                }
                broker.dispatch(rpc(id));
                black_box(rt.block_on(waiter).unwrap().unwrap());
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_dispatch_no_waiters,
    bench_dispatch_with_subscribers,
    bench_wait_history_hit,
    bench_resolve_among_pending,
);
criterion_main!(benches);
