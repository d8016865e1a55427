#[cfg(feature = "benchmarks")]
use criterion::{criterion_group, criterion_main, Criterion};

#[cfg(feature = "benchmarks")]
fn commit_benchmark(c: &mut Criterion) {
    use memcommit::{Buffer, Committer, KeccakHasher, Options};

    let mut buffer = Buffer::new(3);
    for i in 0..256u64 {
        buffer.write(i * 65_537, &[i as u8 | 1; 512]).unwrap();
    }

    for workers in [1, 4] {
        let mut o = Options::new();
        o.commit_concurrency(workers);
        let committer = Committer::<KeccakHasher>::open(o).unwrap();
        c.bench_function(&format!("commit_sparse_l3_{}w", workers), |b| {
            b.iter(|| committer.commit(&buffer))
        });
    }

    c.bench_function("commit_absent_l7", |b| {
        let committer = Committer::<KeccakHasher>::open(Options::new()).unwrap();
        let buffer = Buffer::new(7);
        b.iter(|| committer.commit(&buffer))
    });
}

#[cfg(feature = "benchmarks")]
criterion_group!(benches, commit_benchmark);
#[cfg(feature = "benchmarks")]
criterion_main!(benches);

#[cfg(not(feature = "benchmarks"))]
fn main() {}
