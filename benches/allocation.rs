//! Benchmarks for the three acquire paths: free-list reuse, active-slab bump, and the
//! exhausted fast-fail.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use new_zealand::nz;
use slab_pool::{Instanced, MutexLock, PoolConfig, PoolOrigin, SlabItem, SlabPool, Unique};

struct Message {
    origin: PoolOrigin<MessagePool>,
    payload: [u64; 4],
}

impl Message {
    fn new(seed: u64) -> Self {
        Self {
            origin: PoolOrigin::new(),
            payload: [seed; 4],
        }
    }
}

struct MessagePool;

impl PoolConfig for MessagePool {
    type Item = Message;
    type Ownership = Unique;
    type Lock = MutexLock;
    type Kind = Instanced;
}

// SAFETY: `origin` is the field embedded in this message.
unsafe impl SlabItem<MessagePool> for Message {
    fn origin(&self) -> &PoolOrigin<MessagePool> {
        &self.origin
    }
}

criterion_group!(benches, entrypoint);
criterion_main!(benches);

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("slab_pool");

    group.bench_function("allocate_release_reuse", |b| {
        let pool = SlabPool::<MessagePool>::builder()
            .max_slabs(nz!(1))
            .preallocate(true)
            .build();

        b.iter(|| {
            let message = pool.allocate(Message::new(1)).unwrap();
            black_box(&message.payload);
        });
    });

    group.bench_function("fill_and_drain_one_slab", |b| {
        let pool = SlabPool::<MessagePool>::builder()
            .max_slabs(nz!(1))
            .preallocate(true)
            .build();

        b.iter(|| {
            let mut batch = Vec::with_capacity(SlabPool::<MessagePool>::SLAB_CAPACITY);
            for seed in 0..SlabPool::<MessagePool>::SLAB_CAPACITY {
                batch.push(pool.allocate(Message::new(seed as u64)).unwrap());
            }
            black_box(&batch);
        });
    });

    group.bench_function("exhausted_fast_fail", |b| {
        let pool = SlabPool::<MessagePool>::new(nz!(1));

        let full: Vec<_> = (0..SlabPool::<MessagePool>::SLAB_CAPACITY)
            .map(|seed| pool.allocate(Message::new(seed as u64)).unwrap())
            .collect();

        b.iter(|| black_box(pool.allocate(Message::new(0)).is_none()));

        drop(full);
    });

    group.finish();
}
