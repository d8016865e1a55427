//! Commitments over sparse paged memory.
//!
//! A [`Committer`] computes the commitment of a [`Buffer`]: one digest over its whole logical
//! region, equal to what [`Buffer::hash`] computes on a single thread. The committer keeps a
//! shared cache of zero-region digests and a pool of workers across which the independent
//! subtrees of large buffers are hashed.
//!
//! ```
//! use memcommit::{Buffer, Committer, KeccakHasher, Options};
//!
//! let mut opts = Options::new();
//! opts.commit_concurrency(4);
//! let committer = Committer::<KeccakHasher>::open(opts).unwrap();
//!
//! let mut buffer = Buffer::new(2);
//! buffer.write(4096, b"hello").unwrap();
//! let root = committer.commit(&buffer);
//! assert_eq!(root, memcommit::hash::<KeccakHasher>(&buffer));
//! ```

use std::sync::Arc;

use commit::CommitPool;
use memcommit_core::{
    buffer::{capacity, MAX_LEVEL},
    hasher::BinaryHash,
};

pub use memcommit_core::{
    buffer::{self, Buffer, OutOfBounds},
    combine, hash,
    hasher,
    packed::{self, Digest, Packed},
    zero::{self, ZeroHashes, ZeroTable},
};

#[cfg(feature = "blake3-hasher")]
pub use memcommit_core::hasher::Blake3Hasher;
#[cfg(feature = "keccak-hasher")]
pub use memcommit_core::hasher::KeccakHasher;
#[cfg(feature = "sha2-hasher")]
pub use memcommit_core::hasher::Sha2Hasher;

pub use metrics::{Metric, Metrics};
pub use options::Options;
pub use zero_cache::ZeroHashCache;

mod commit;
mod metrics;
mod options;
mod zero_cache;

cfg_if::cfg_if! {
    if #[cfg(feature = "keccak-hasher")] {
        /// The hasher commitments are computed with unless specified otherwise.
        pub type DefaultHasher = KeccakHasher;
    } else if #[cfg(feature = "blake3-hasher")] {
        /// The hasher commitments are computed with unless specified otherwise.
        pub type DefaultHasher = Blake3Hasher;
    } else if #[cfg(feature = "sha2-hasher")] {
        /// The hasher commitments are computed with unless specified otherwise.
        pub type DefaultHasher = Sha2Hasher;
    }
}

/// A hash function usable across commit worker threads.
pub trait HashAlgorithm: BinaryHash + Send + Sync + 'static {}

impl<H: BinaryHash + Send + Sync + 'static> HashAlgorithm for H {}

struct Shared<H> {
    zeros: Arc<ZeroHashCache<H>>,
    pool: CommitPool,
    metrics: Metrics,
}

/// Computes commitments of buffers.
///
/// Cloning a committer is cheap; clones share the zero-hash cache, worker pool, and metrics.
pub struct Committer<H> {
    shared: Arc<Shared<H>>,
}

impl<H> Clone for Committer<H> {
    fn clone(&self) -> Self {
        Committer {
            shared: self.shared.clone(),
        }
    }
}

impl<H: HashAlgorithm> Committer<H> {
    /// Create a committer with the given options.
    pub fn open(o: Options) -> anyhow::Result<Self> {
        o.validate()?;

        let metrics = Metrics::new(o.metrics);
        let zeros = Arc::new(ZeroHashCache::new(metrics.clone()));
        if o.prepopulate_zero_hashes {
            zeros.prepopulate(capacity(MAX_LEVEL));
        }

        let workers = o.effective_concurrency();
        tracing::debug!(
            workers,
            parallel_level = o.parallel_level,
            "opened committer"
        );

        Ok(Committer {
            shared: Arc::new(Shared {
                zeros,
                pool: CommitPool::new(workers, o.parallel_level, metrics.clone()),
                metrics,
            }),
        })
    }

    /// Compute the commitment of `buffer`.
    ///
    /// The buffer is read through shared payloads only. To keep writing while a commit is in
    /// flight, commit a clone: it is a snapshot.
    pub fn commit(&self, buffer: &Buffer) -> Digest {
        self.commit_packed(buffer).unpack(&*self.shared.zeros)
    }

    /// Compute the packed commitment of `buffer`. See [`Buffer::hash_aux`].
    pub fn commit_packed(&self, buffer: &Buffer) -> Packed {
        let _timer = self.shared.metrics.record(Metric::CommitTime);
        self.shared.metrics.count(Metric::Commits);

        let packed = self.shared.pool.commit(buffer, &self.shared.zeros);
        tracing::debug!(
            level = buffer.level(),
            packed = packed.packed(),
            "committed buffer"
        );
        packed
    }

    /// The shared zero-hash cache.
    pub fn zero_hashes(&self) -> &ZeroHashCache<H> {
        &self.shared.zeros
    }

    /// The metrics of this committer.
    pub fn metrics(&self) -> &Metrics {
        &self.shared.metrics
    }
}
