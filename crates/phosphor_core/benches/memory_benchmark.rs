//! Benchmarks for the frame memory hot path.
//!
//! Steady-state frames must not touch the OS allocator: one pool
//! acquisition, a handful of bump carves, one reclaim.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use phosphor_core::{BufferPool, BufferTag, StackAllocator};

fn bench_bump_allocation(c: &mut Criterion) {
    c.bench_function("buffer_bump_alloc_64x16b", |b| {
        let pool = BufferPool::new();
        let mut buffer = pool.get_buffer(BufferTag::Primary, 0, 4096);
        b.iter(|| {
            buffer.reset();
            for _ in 0..64 {
                let range = buffer.alloc_slice::<[f32; 4]>(1).unwrap();
                black_box(range);
            }
        });
    });
}

fn bench_steady_state_frame(c: &mut Criterion) {
    c.bench_function("pool_steady_state_frame", |b| {
        let pool = Arc::new(BufferPool::new());
        let mut slot = 0u32;
        b.iter(|| {
            let mut alloc = StackAllocator::new(Arc::clone(&pool), BufferTag::Primary, slot);
            alloc.reserve(2048);
            let meshes = alloc.alloc_slice::<[f32; 12]>(32).unwrap();
            black_box(alloc.write(meshes).unwrap());
            let frozen = alloc.finish().unwrap();
            drop(frozen);
            pool.free_slot(BufferTag::Primary, slot);
            slot ^= 1;
        });
    });
}

criterion_group!(benches, bench_bump_allocation, bench_steady_state_frame);
criterion_main!(benches);
