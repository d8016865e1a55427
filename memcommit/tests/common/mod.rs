use memcommit::{
    buffer::{capacity, PAGE_SIZE},
    hasher::{BinaryHash, CHUNK_SIZE},
    Buffer, Committer, Digest, KeccakHasher, Options,
};
use rand::{Rng as _, SeedableRng as _};

pub type Hasher = KeccakHasher;

#[allow(dead_code)]
fn opts(commit_concurrency: usize) -> Options {
    let mut opts = Options::new();
    opts.commit_concurrency(commit_concurrency);
    opts.metrics(true);
    opts
}

/// Route committer logs to the test output. Filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub fn committer(commit_concurrency: usize) -> Committer<Hasher> {
    init_tracing();
    Committer::open(opts(commit_concurrency)).unwrap()
}

/// A buffer at `level` with `writes` short runs of non-zero bytes at reproducible offsets.
pub fn sparse_buffer(seed: u64, level: u32, writes: usize) -> Buffer {
    let mut seed_bytes = [0; 16];
    seed_bytes[0..8].copy_from_slice(&seed.to_le_bytes());
    let mut rng = rand_pcg::Lcg64Xsh32::from_seed(seed_bytes);

    let mut buffer = Buffer::new(level);
    let capacity = capacity(level);
    for _ in 0..writes {
        let len = rng.gen_range(1..=2 * PAGE_SIZE);
        let offset = rng.gen_range(0..capacity - len as u64);
        let data = (0..len).map(|_| rng.gen_range(1..=255u8)).collect::<Vec<_>>();
        buffer.write(offset, &data).unwrap();
    }
    buffer
}

/// Hash every pair of the whole region, zero or not. Only feasible for small levels.
#[allow(dead_code)]
pub fn materialized_hash(buffer: &Buffer) -> Digest {
    let mut bytes = vec![0; buffer.capacity() as usize];
    buffer.read(0, &mut bytes).unwrap();
    materialize(&bytes)
}

fn materialize(bytes: &[u8]) -> Digest {
    if bytes.len() == CHUNK_SIZE {
        return Hasher::hash(bytes);
    }
    let (left, right) = bytes.split_at(bytes.len() / 2);
    Hasher::hash2_32_concat(&materialize(left), &materialize(right))
}
