use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feistelperm::FeistelPerm;

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate");
    for &n in &[1u32 << 10, (1 << 10) + 1, 1 << 14, (1 << 14) + 1] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                FeistelPerm::new(n, 42).for_each_index(|i| {
                    black_box(i);
                })
            })
        });
    }
    group.finish();
}

fn bench_encrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("encrypt");
    for &n in &[1u32 << 20, (1 << 20) + 1, 1 << 30, u32::MAX] {
        let mut perm = FeistelPerm::new(n, 42);
        let mask = (perm.padded_size() - 1) as u32;
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            let mut x = 0u32;
            b.iter(|| {
                x = perm.encrypt(x.wrapping_add(1) & mask);
                black_box(x);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_enumerate, bench_encrypt);
criterion_main!(benches);
