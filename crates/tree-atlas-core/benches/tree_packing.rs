use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tree_atlas_core::prelude::*;

fn generate_textures(count: usize, min_size: u32, max_size: u32) -> Vec<(String, u32, u32)> {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            (format!("tex_{}", i), w, h)
        })
        .collect()
}

fn bench_tree_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_insert");

    for count in [100, 1_000, 5_000] {
        let textures = generate_textures(count, 4, 64);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("PackTree", count), &textures, |b, textures| {
            b.iter(|| {
                let mut tree = PackTree::new(4096, 4096, 1);
                for (i, (_, w, h)) in textures.iter().enumerate() {
                    let _ = tree.try_place(i, *w, *h);
                }
                black_box(tree.placed_count())
            });
        });
    }

    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_layout");

    for (label, order) in [
        ("diagonal_asc", SortOrder::DiagonalAsc),
        ("diagonal_desc", SortOrder::DiagonalDesc),
    ] {
        let textures = generate_textures(1_000, 4, 64);
        group.bench_with_input(BenchmarkId::new(label, 1_000), &textures, |b, textures| {
            b.iter(|| {
                let cfg = PackerConfig::builder()
                    .with_dimensions(2048, 2048)
                    .margin(1)
                    .sort_order(order)
                    .build();
                black_box(pack_layout(textures.clone(), cfg))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tree_insert, bench_layout);
criterion_main!(benches);
