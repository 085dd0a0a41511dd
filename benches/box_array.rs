use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridbox::{BoxArray, IndexBox, IntVect};




fn level(size: i64, block: i64) -> BoxArray<3> {
    let mut ba = BoxArray::from_box(IndexBox::new([0, 0, 0], [size - 1, size - 1, size - 1]));
    ba.max_size(IntVect::splat(block)).unwrap();
    ba
}

fn ghost_regions(ba: &BoxArray<3>) -> Vec<IndexBox<3>> {
    ba.iter().unwrap().map(|b| b.grow(IntVect::splat(2))).collect()
}




// ============================================================================
fn bench_ghost_intersections(c: &mut Criterion) {
    let mut group = c.benchmark_group("ghost_intersections");

    for &size in &[64i64, 128] {
        let ba = level(size, 16);
        let ghosts = ghost_regions(&ba);

        group.bench_with_input(BenchmarkId::new("hashed", size), &size, |b, _| {
            b.iter(|| {
                let total: usize = ghosts
                    .iter()
                    .map(|g| ba.intersections(g, false, IntVect::zero()).unwrap().len())
                    .sum();
                black_box(total);
            });
        });

        group.bench_with_input(BenchmarkId::new("brute_force", size), &size, |b, _| {
            let boxes: Vec<_> = ba.iter().unwrap().collect();
            b.iter(|| {
                let total: usize = ghosts
                    .iter()
                    .map(|g| boxes.iter().filter(|b| b.intersects(g)).count())
                    .sum();
                black_box(total);
            });
        });
    }
    group.finish();
}




// ============================================================================
fn bench_hash_build(c: &mut Criterion) {
    let ba = level(128, 8);

    c.bench_function("hash_build_128_by_8", |b| {
        b.iter(|| {
            let mut fresh = BoxArray::from_list(ba.box_list().unwrap()).unwrap();
            black_box(fresh.contains_point(&IntVect::splat(3)).unwrap());
            fresh.clear();
        });
    });
}




// ============================================================================
fn bench_remove_overlap(c: &mut Criterion) {
    let mut grown = level(64, 8);
    grown.grow(IntVect::splat(1)).unwrap();

    c.bench_function("remove_overlap_64_by_8", |b| {
        b.iter(|| {
            let mut ba = grown.clone();
            ba.remove_overlap(true).unwrap();
            black_box(ba.len().unwrap());
        });
    });
}




criterion_group!(benches, bench_ghost_intersections, bench_hash_build, bench_remove_overlap);
criterion_main!(benches);
