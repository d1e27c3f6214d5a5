use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use lirc_proto::{Message, Prefix};
use lircd::handlers::paginate_names;
use std::hint::black_box;
use std::sync::Arc;

// Broadcasts render a message once and share the line; measure that path
// against per-recipient rendering.
fn broadcast_rendering_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");
    group.throughput(Throughput::Elements(100));

    let msg = Message::privmsg("#channel", "Hello world")
        .with_prefix(Prefix::new_user("sender", "user", "127.0.0.1"));

    group.bench_function("render_once_share", |b| {
        b.iter(|| {
            let line: Arc<str> = Arc::from(msg.to_string());
            let copies: Vec<Arc<str>> = (0..100).map(|_| Arc::clone(&line)).collect();
            black_box(copies)
        })
    });

    group.bench_function("render_per_recipient", |b| {
        b.iter(|| {
            let copies: Vec<String> = (0..100).map(|_| msg.to_string()).collect();
            black_box(copies)
        })
    });

    group.finish();
}

fn names_pagination_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("names");
    let names: Vec<String> = (0..256).map(|i| format!("@member{i:03}")).collect();
    group.throughput(Throughput::Elements(names.len() as u64));

    group.bench_function("paginate_256", |b| {
        b.iter(|| black_box(paginate_names(black_box(&names), 470)))
    });

    group.finish();
}

criterion_group!(benches, broadcast_rendering_benchmark, names_pagination_benchmark);
criterion_main!(benches);
