//! Criterion benchmarks for peer snapshot replacement.
//!
//! Every peer-list notification from the radio replaces the whole registry,
//! so the cost of `replace_snapshot` scales with the number of visible peers.
//!
//! Run with:
//! ```bash
//! cargo bench --package sendora-core --bench registry_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sendora_core::{encode_event, DeviceAddress, Event, Peer, PeerRegistry};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn make_snapshot(count: usize, name_suffix: &str) -> Vec<Peer> {
    (0..count)
        .map(|i| {
            let raw = format!("02:00:00:00:{:02x}:{:02x}", (i >> 8) & 0xff, i & 0xff);
            let address = DeviceAddress::parse(&raw).expect("fixture address is valid");
            Peer::new(address, format!("device-{i}{name_suffix}"))
        })
        .collect()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_replace_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("replace_snapshot");
    for &count in &[1usize, 16, 128] {
        let first = make_snapshot(count, "");
        let renamed = make_snapshot(count, "-renamed");

        group.bench_with_input(BenchmarkId::new("unchanged", count), &count, |b, _| {
            let mut registry = PeerRegistry::new();
            registry.replace_snapshot(first.clone());
            b.iter(|| black_box(registry.replace_snapshot(black_box(first.clone()))));
        });

        group.bench_with_input(BenchmarkId::new("all_renamed", count), &count, |b, _| {
            let mut registry = PeerRegistry::new();
            let mut flip = false;
            b.iter(|| {
                flip = !flip;
                let next = if flip { renamed.clone() } else { first.clone() };
                black_box(registry.replace_snapshot(next))
            });
        });
    }
    group.finish();
}

fn bench_encode_peers_available(c: &mut Criterion) {
    let event = Event::PeersAvailable {
        peers: make_snapshot(32, ""),
    };
    c.bench_function("encode_peers_available_32", |b| {
        b.iter(|| encode_event(black_box(&event)).expect("encode must succeed"))
    });
}

criterion_group!(benches, bench_replace_snapshot, bench_encode_peers_available);
criterion_main!(benches);
