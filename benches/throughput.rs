//! Throughput Benchmark for kvexpiry
//!
//! This benchmark measures the overhead the expiration engine adds on top
//! of an in-memory backend under various workloads.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use kvexpiry::expiry::{ExpiringKv, ManualClock, Span, TimeSpec};
use kvexpiry::storage::MemoryStore;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let kv = ExpiringKv::new(MemoryStore::new(), "bench:");

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_permanent", |b| {
        let mut i = 0u64;
        b.iter(|| {
            kv.set(&format!("key:{}", i), json!("small_value")).unwrap();
            i += 1;
        });
    });

    group.bench_function("set_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            kv.set_with_ttl(&format!("ttl:{}", i), json!("small_value"), TimeSpec::Days(1))
                .unwrap();
            i += 1;
        });
    });

    group.bench_function("set_object", |b| {
        let mut i = 0u64;
        let value = json!({"user": 7, "roles": ["admin", "dev"], "name": "x".repeat(1024)});
        b.iter(|| {
            kv.set(&format!("obj:{}", i), value.clone()).unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let kv = ExpiringKv::new(MemoryStore::new(), "bench:");

    // Pre-populate with data, half of it expiring
    for i in 0..100_000 {
        if i % 2 == 0 {
            kv.set(&format!("key:{}", i), json!(i)).unwrap();
        } else {
            kv.set_with_ttl(&format!("key:{}", i), json!(i), TimeSpec::Days(1))
                .unwrap();
        }
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(kv.get(&format!("key:{}", i % 100_000)).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(kv.get(&format!("missing:{}", i)).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let kv = ExpiringKv::new(MemoryStore::new(), "bench:");

    // Pre-populate
    for i in 0..10_000 {
        kv.set(&format!("key:{}", i), json!(i)).unwrap();
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            if i % 5 == 0 {
                // 20% writes
                kv.set_with_ttl(&format!("new:{}", i), json!("value"), Span::new().minutes(5))
                    .unwrap();
            } else {
                // 80% reads
                black_box(kv.get(&format!("key:{}", i % 10_000)).unwrap());
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark a full sweep where half the namespace has expired
fn bench_flush_expired(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush_expired");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("10k_entries_half_expired", |b| {
        b.iter_batched(
            || {
                let clock = Arc::new(ManualClock::new(1_000));
                let kv = ExpiringKv::new(MemoryStore::new(), "bench:").with_clock(clock.clone());
                for i in 0..10_000 {
                    let ttl = if i % 2 == 0 {
                        Span::new().seconds(1)
                    } else {
                        Span::new().hours(1)
                    };
                    kv.set_with_ttl(&format!("key:{}", i), json!(i), ttl).unwrap();
                }
                clock.advance(Duration::from_secs(2));
                kv
            },
            |kv| black_box(kv.flush_expired().unwrap()),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

/// Benchmark flushing a namespace that shares its backend with another
fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush");

    group.bench_function("flush_one_of_two_namespaces", |b| {
        b.iter_batched(
            || {
                let store = Arc::new(MemoryStore::new());
                let users = ExpiringKv::new(Arc::clone(&store), "user:");
                let sessions = ExpiringKv::new(Arc::clone(&store), "session:");
                for i in 0..1_000 {
                    users.set(&format!("{}", i), json!("user_data")).unwrap();
                    sessions
                        .set_with_ttl(&format!("{}", i), json!("session_data"), TimeSpec::Days(1))
                        .unwrap();
                }
                sessions
            },
            |sessions| black_box(sessions.flush().unwrap()),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_mixed,
    bench_flush_expired,
    bench_flush,
);

criterion_main!(benches);
