mod common;

use common::{committer, sparse_buffer};
use memcommit::{hash, Buffer, Committer, KeccakHasher, Metric, Options};

#[test]
fn parallel_commit_matches_sequential_hash() {
    for workers in [1, 2, 4, 8] {
        let committer = committer(workers);
        for (seed, level) in [(1, 1), (2, 2), (3, 2), (4, 3)] {
            let buffer = sparse_buffer(seed, level, 40);
            assert_eq!(
                committer.commit(&buffer),
                hash::<KeccakHasher>(&buffer),
                "workers {} seed {} level {}",
                workers,
                seed,
                level
            );
        }
    }
}

#[test]
fn commit_is_deterministic() {
    let committer = committer(4);
    let buffer = sparse_buffer(7, 3, 25);
    assert_eq!(committer.commit(&buffer), committer.commit(&buffer));
    assert_eq!(committer.metrics().get(Metric::Commits), Some(2));
}

#[test]
fn snapshot_is_isolated_from_writes() {
    let committer = committer(4);
    let mut buffer = sparse_buffer(11, 2, 10);
    let snapshot = buffer.clone();
    let before = committer.commit(&snapshot);

    buffer.write(0, &[0xff; 4096]).unwrap();
    assert_ne!(committer.commit(&buffer), before);
    assert_eq!(committer.commit(&snapshot), before);
}

#[test]
fn concurrent_commits_share_the_committer() {
    let committer = committer(4);
    let buffers = (0..4)
        .map(|seed| sparse_buffer(100 + seed, 2, 16))
        .collect::<Vec<_>>();

    let handles = buffers
        .iter()
        .cloned()
        .map(|buffer| {
            let committer = committer.clone();
            std::thread::spawn(move || committer.commit(&buffer))
        })
        .collect::<Vec<_>>();

    for (handle, buffer) in handles.into_iter().zip(&buffers) {
        assert_eq!(handle.join().unwrap(), hash::<KeccakHasher>(buffer));
    }
}

#[test]
fn lazy_zero_cache_fills_on_demand() {
    let mut o = Options::new();
    o.prepopulate_zero_hashes(false);
    o.metrics(true);
    let committer = Committer::<KeccakHasher>::open(o).unwrap();
    assert!(committer.zero_hashes().is_empty());

    let root = committer.commit(&Buffer::new(1));
    assert_eq!(root, hash::<KeccakHasher>(&Buffer::new(1)));
    assert!(!committer.zero_hashes().is_empty());
    assert!(committer.metrics().get(Metric::ZeroCacheMisses).unwrap() > 0);
}

#[test]
fn invalid_options_fail_to_open() {
    let mut o = Options::new();
    o.commit_concurrency(0);
    assert!(Committer::<KeccakHasher>::open(o).is_err());
}
