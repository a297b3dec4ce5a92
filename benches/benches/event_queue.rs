// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_event_queue::{EventQueue, HandlerKey, QueueConfig, Visibility};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive == 0 {
            return 0;
        }
        (self.next_u32() as usize) % upper_exclusive
    }
}

/// A queue with `handlers` registrations and `events` events spread randomly over them.
fn build_queue(
    handlers: usize,
    events: usize,
    visibility: Visibility,
    seed: u64,
) -> (EventQueue<u64>, Vec<HandlerKey>) {
    let mut queue = EventQueue::with_config(QueueConfig::new().with_visibility(visibility));
    let keys: Vec<_> = (0..handlers).map(|_| queue.register()).collect();
    let mut rng = Lcg::new(seed);
    for i in 0..events {
        let key = keys[rng.gen_range_usize(keys.len())];
        let _ = queue.enqueue(key, i as u64);
    }
    (queue, keys)
}

fn bench_event_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_event_queue");
    group.sample_size(50);

    for &(handlers, events) in &[
        (64_usize, 256_usize),
        (1_024_usize, 4_096_usize),
        (16_384_usize, 16_384_usize),
    ] {
        group.bench_function(format!("enqueue(h={handlers},e={events})"), |b| {
            b.iter_batched(
                || build_queue(handlers, 0, Visibility::Deferred, 0xE7E7_0000_0000_0001),
                |(mut queue, keys)| {
                    let mut rng = Lcg::new(7);
                    for i in 0..events {
                        let key = keys[rng.gen_range_usize(keys.len())];
                        let _ = queue.enqueue(key, i as u64);
                    }
                    black_box(queue);
                },
                BatchSize::SmallInput,
            );
        });

        for visibility in [Visibility::Deferred, Visibility::Immediate] {
            group.bench_function(
                format!("pass_drain_all(h={handlers},e={events},{visibility:?})"),
                |b| {
                    b.iter_batched(
                        || build_queue(handlers, events, visibility, 0xE7E7_0000_0000_0002),
                        |(mut queue, keys)| {
                            let mut pass = queue.begin_pass();
                            let mut sum = 0_u64;
                            for &key in &keys {
                                sum = sum.wrapping_add(pass.events(key).sum::<u64>());
                            }
                            black_box(pass.finish());
                            black_box(sum);
                        },
                        BatchSize::SmallInput,
                    );
                },
            );
        }

        group.bench_function(format!("register_churn(h={handlers})"), |b| {
            b.iter_batched(
                || build_queue(handlers, events, Visibility::Deferred, 0xE7E7_0000_0000_0003),
                |(mut queue, keys)| {
                    for &key in keys.iter().step_by(2) {
                        let _ = queue.unregister(key);
                    }
                    for _ in 0..keys.len() / 2 {
                        black_box(queue.register());
                    }
                    black_box(queue);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_event_queue);
criterion_main!(benches);
