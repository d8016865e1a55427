//! Digests of all-zero regions.
//!
//! `zero_hash(32)` is the hash of a single zero chunk and `zero_hash(2n)` is the hash of two
//! `zero_hash(n)` concatenated. Every size used by a commitment is a power of two between 32
//! bytes and the capacity of the deepest buffer, so the whole domain fits in a small table.

use core::marker::PhantomData;

use arrayvec::ArrayVec;

use crate::buffer::{capacity, MAX_LEVEL};
use crate::hasher::{BinaryHash, CHUNK_SIZE};
use crate::packed::Digest;

/// The number of distinct zero region sizes: every power of two from 32 bytes to
/// `capacity(MAX_LEVEL)`.
pub const ZERO_SIZES: usize = 55;

/// A source of zero-region digests.
///
/// Implementations must return exactly [`zero_hash`] for the associated hasher. They are free
/// to memoize.
pub trait ZeroHashes {
    /// The hash function the digests are computed with.
    type Hasher: BinaryHash;

    /// The digest of an all-zero region of `size` bytes.
    ///
    /// `size` must be a power of two of at least 32. Implementations may panic otherwise.
    fn zero_hash(&self, size: u64) -> Digest;
}

/// Compute the digest of an all-zero region of `size` bytes from scratch.
///
/// Panics if `size` is not a power of two of at least 32.
pub fn zero_hash<H: BinaryHash>(size: u64) -> Digest {
    assert!(
        size.is_power_of_two() && size >= CHUNK_SIZE as u64,
        "zero region size must be a power of two >= 32, got {}",
        size
    );

    if size == CHUNK_SIZE as u64 {
        return H::hash_chunk(&[0; CHUNK_SIZE]);
    }
    let half = zero_hash::<H>(size / 2);
    H::hash2_32_concat(&half, &half)
}

/// The index into a table like [`ZeroTable`] of the zero digest for `size` bytes.
///
/// Panics if `size` is not a power of two of at least 32.
pub fn zero_index(size: u64) -> usize {
    assert!(
        size.is_power_of_two() && size >= CHUNK_SIZE as u64,
        "zero region size must be a power of two >= 32, got {}",
        size
    );
    (size.trailing_zeros() - CHUNK_SIZE.trailing_zeros()) as usize
}

/// A fully precomputed table of zero digests for every size up to `capacity(MAX_LEVEL)`.
///
/// Building the table costs one hash per size. Lookups are a bounds check and an index.
pub struct ZeroTable<H> {
    hashes: ArrayVec<Digest, ZERO_SIZES>,
    _marker: PhantomData<H>,
}

impl<H: BinaryHash> ZeroTable<H> {
    /// Build the table.
    pub fn new() -> Self {
        let mut hashes = ArrayVec::new();
        let mut cur = H::hash_chunk(&[0; CHUNK_SIZE]);
        hashes.push(cur);
        while !hashes.is_full() {
            cur = H::hash2_32_concat(&cur, &cur);
            hashes.push(cur);
        }

        ZeroTable {
            hashes,
            _marker: PhantomData,
        }
    }

    /// All zero digests, ascending by size and starting at 32 bytes.
    pub fn as_slice(&self) -> &[Digest] {
        &self.hashes
    }
}

impl<H: BinaryHash> Default for ZeroTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: BinaryHash> Clone for ZeroTable<H> {
    fn clone(&self) -> Self {
        ZeroTable {
            hashes: self.hashes.clone(),
            _marker: PhantomData,
        }
    }
}

impl<H: BinaryHash> ZeroHashes for ZeroTable<H> {
    type Hasher = H;

    fn zero_hash(&self, size: u64) -> Digest {
        let index = zero_index(size);
        assert!(
            index < ZERO_SIZES,
            "zero region of {} bytes exceeds the largest buffer capacity {}",
            size,
            capacity(MAX_LEVEL)
        );
        self.hashes[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::{Blake3Hasher, KeccakHasher};
    use hex_literal::hex;

    #[test]
    fn table_covers_every_capacity() {
        assert_eq!(zero_index(capacity(MAX_LEVEL)), ZERO_SIZES - 1);
        let zeros = ZeroTable::<KeccakHasher>::new();
        assert_eq!(zeros.as_slice().len(), ZERO_SIZES);
        for level in 0..=MAX_LEVEL {
            let _ = zeros.zero_hash(capacity(level));
        }
    }

    #[test]
    fn known_keccak_zero_hashes() {
        let zeros = ZeroTable::<KeccakHasher>::new();
        assert_eq!(
            zeros.zero_hash(32),
            hex!("290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"),
        );
        assert_eq!(
            zeros.zero_hash(64),
            hex!("633dc4d7da7256660a892f8f1604a44b5432649cc8ec5cb3ced4c4e6ac94dd1d"),
        );
    }

    #[test]
    fn table_matches_recursive_definition() {
        let zeros = ZeroTable::<Blake3Hasher>::new();
        let mut size = 32;
        while size <= 1 << 20 {
            assert_eq!(zeros.zero_hash(size), zero_hash::<Blake3Hasher>(size));
            size *= 2;
        }
    }

    #[test]
    fn zero_hash_is_deterministic() {
        assert_eq!(
            zero_hash::<KeccakHasher>(4096),
            zero_hash::<KeccakHasher>(4096)
        );
        assert_ne!(
            zero_hash::<KeccakHasher>(4096),
            zero_hash::<KeccakHasher>(2048)
        );
    }

    #[test]
    #[should_panic]
    fn table_rejects_oversized_region() {
        let zeros = ZeroTable::<KeccakHasher>::new();
        zeros.zero_hash(capacity(MAX_LEVEL) * 2);
    }

    #[test]
    #[should_panic]
    fn zero_hash_rejects_non_power_of_two() {
        zero_hash::<KeccakHasher>(48);
    }
}
