//! Performance benchmarks for delegate dispatch

use std::sync::Arc;

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use rtm_connection::{Connection, ConnectionConfiguration, ConnectionDelegate, ConnectionEvent};

struct NoopDelegate;
impl ConnectionDelegate for NoopDelegate {}

fn registry_benchmark(c: &mut Criterion) {
    let conn = Connection::new(ConnectionConfiguration::new()).unwrap();

    let mut group = c.benchmark_group("delegate_registry");

    group.bench_function("add_remove_cycle", |b| {
        let delegate: Arc<dyn ConnectionDelegate> = Arc::new(NoopDelegate);
        b.iter(|| {
            conn.add_delegate(delegate.clone());
            conn.remove_delegate(delegate.clone());
        })
    });

    group.bench_function("duplicate_add", |b| {
        let delegate: Arc<dyn ConnectionDelegate> = Arc::new(NoopDelegate);
        conn.add_delegate(delegate.clone());
        b.iter(|| {
            conn.add_delegate(delegate.clone());
        })
    });

    group.finish();
}

fn dispatch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    for delegates in [1usize, 8, 64] {
        let conn = Connection::new(ConnectionConfiguration::new()).unwrap();
        conn.mark_connecting();
        conn.dispatch(ConnectionEvent::Opened);

        // Keep the delegates alive for the duration of the benchmark.
        let held: Vec<Arc<dyn ConnectionDelegate>> = (0..delegates)
            .map(|_| Arc::new(NoopDelegate) as Arc<dyn ConnectionDelegate>)
            .collect();
        for delegate in &held {
            conn.add_delegate(delegate.clone());
        }

        let payload = Bytes::from_static(b"benchmark payload");
        group.bench_function(format!("message_to_{delegates}_delegates"), |b| {
            b.iter(|| {
                conn.dispatch(ConnectionEvent::Message(black_box(payload.clone())));
            })
        });
    }

    group.finish();
}

fn metrics_benchmark(c: &mut Criterion) {
    use rtm_connection::metrics::METRICS;

    let mut group = c.benchmark_group("metrics");
    group.throughput(Throughput::Elements(1));

    group.bench_function("counter_increment", |b| {
        b.iter(|| {
            METRICS.message_received(black_box(1024));
        })
    });

    group.bench_function("snapshot", |b| {
        b.iter(|| {
            let snapshot = METRICS.snapshot();
            black_box(snapshot);
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    registry_benchmark,
    dispatch_benchmark,
    metrics_benchmark,
);
criterion_main!(benches);
