//! A shared, lazily filled cache of zero-region digests.
//!
//! Every fill for a given size computes the same digest, so concurrent fills of the same entry
//! only duplicate work. The cache never evicts: there is one entry per power of two up to the
//! largest buffer capacity.

use std::marker::PhantomData;

use dashmap::DashMap;
use memcommit_core::{
    buffer::{capacity, MAX_LEVEL},
    hasher::{BinaryHash, CHUNK_SIZE},
    zero::ZeroHashes,
    Digest,
};

use crate::metrics::{Metric, Metrics};

/// A read-through cache of zero-region digests, keyed by region size.
pub struct ZeroHashCache<H> {
    hashes: DashMap<u64, Digest>,
    metrics: Metrics,
    _marker: PhantomData<fn() -> H>,
}

impl<H: BinaryHash> ZeroHashCache<H> {
    /// Create an empty cache.
    pub fn new(metrics: Metrics) -> Self {
        ZeroHashCache {
            hashes: DashMap::new(),
            metrics,
            _marker: PhantomData,
        }
    }

    /// Fill the cache for every size from 32 bytes up to and including `max_size`.
    pub fn prepopulate(&self, max_size: u64) {
        let mut size = CHUNK_SIZE as u64;
        while size <= max_size {
            let _ = self.zero_hash(size);
            size *= 2;
        }
        tracing::debug!(max_size, entries = self.len(), "prepopulated zero hash cache");
    }

    /// The number of cached sizes.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Whether nothing is cached yet.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl<H: BinaryHash> ZeroHashes for ZeroHashCache<H> {
    type Hasher = H;

    fn zero_hash(&self, size: u64) -> Digest {
        // the shard guard must be released before recursing into smaller sizes.
        if let Some(hash) = self.hashes.get(&size).map(|h| *h) {
            return hash;
        }

        assert!(
            size.is_power_of_two() && size >= CHUNK_SIZE as u64,
            "zero region size must be a power of two >= 32, got {}",
            size
        );
        assert!(
            size <= capacity(MAX_LEVEL),
            "zero region of {} bytes exceeds the largest buffer capacity",
            size
        );

        self.metrics.count(Metric::ZeroCacheMisses);
        let hash = if size == CHUNK_SIZE as u64 {
            H::hash_chunk(&[0; CHUNK_SIZE])
        } else {
            let half = self.zero_hash(size / 2);
            H::hash2_32_concat(&half, &half)
        };

        tracing::trace!(size, "filled zero hash cache entry");
        self.hashes.insert(size, hash);
        hash
    }
}
