//! Benchmarks `allocate`/`deallocate` under the fragment-then-refill
//! workload from scenario S3: many small allocations, half freed, then
//! refilled from the fragment pool.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use allocator2d::{Allocator2D, Point};

const CANVAS: u32 = 1024;
const BLOCK: u32 = 16;
const BLOCK_COUNT: usize = 256;

fn fill_canvas(allocator: &mut Allocator2D) -> Vec<Point> {
    let mut origins = Vec::with_capacity(BLOCK_COUNT);
    for _ in 0..BLOCK_COUNT {
        if let Some(origin) = allocator.allocate(Point::new(BLOCK, BLOCK)) {
            origins.push(origin);
        }
    }
    origins
}

fn bench_allocate_into_fresh_canvas(c: &mut Criterion) {
    c.bench_function("allocate into fresh canvas", |b| {
        b.iter(|| {
            let mut allocator = Allocator2D::new(Point::new(CANVAS, CANVAS));
            black_box(fill_canvas(&mut allocator));
        });
    });
}

fn bench_fragment_then_refill(c: &mut Criterion) {
    c.bench_function("allocate after fragmenting the free pool", |b| {
        b.iter(|| {
            let mut allocator = Allocator2D::new(Point::new(CANVAS, CANVAS));
            let origins = fill_canvas(&mut allocator);
            for (index, origin) in origins.iter().enumerate() {
                if index % 2 == 0 {
                    allocator.deallocate(*origin);
                }
            }
            for _ in 0..origins.len() / 2 {
                black_box(allocator.allocate(Point::new(BLOCK, BLOCK)));
            }
        });
    });
}

criterion_group!(benches, bench_allocate_into_fresh_canvas, bench_fragment_then_refill);
criterion_main!(benches);
