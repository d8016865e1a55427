//! Packed hash values.
//!
//! A [`Packed`] value stands for the digest of a subtree of `size * 2^packed` bytes, where the
//! subtree is a `size`-byte region hashing to `hash` followed, at each of `packed` doublings, by
//! an all-zero right sibling. The doublings are not hashed until the value is [`Packed::unpack`]ed,
//! which only happens when the value meets a sibling that is not itself zero.
//!
//! Values produced from zero content always carry `zero_hash(32)` in their `hash` field: packing
//! only ever increments `packed`. This makes "is this subtree all zero" a single comparison
//! against the base zero digest, regardless of `size` and `packed`.

use core::fmt;

use crate::hasher::{BinaryHash, CHUNK_SIZE};
use crate::zero::ZeroHashes;

/// A 256-bit digest produced by a [`BinaryHash`].
pub type Digest = [u8; 32];

/// A lazily-folded subtree digest. See the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
pub struct Packed {
    hash: Digest,
    size: u64,
    packed: u32,
}

impl Packed {
    /// Wrap a fully materialized digest of a `size`-byte region.
    pub fn normal(hash: Digest, size: u64) -> Self {
        Packed {
            hash,
            size,
            packed: 0,
        }
    }

    /// The canonical packed representation of an all-zero region of `size` bytes.
    ///
    /// This is the base zero chunk packed `log2(size / 32)` times, so no hashing beyond the base
    /// zero digest is performed.
    ///
    /// Panics if `size` is not a power of two of at least 32.
    pub fn zero<Z: ZeroHashes>(zeros: &Z, size: u64) -> Self {
        assert!(
            size.is_power_of_two() && size >= CHUNK_SIZE as u64,
            "zero region size must be a power of two >= 32, got {}",
            size
        );

        Packed {
            hash: zeros.zero_hash(CHUNK_SIZE as u64),
            size: CHUNK_SIZE as u64,
            packed: size.trailing_zeros() - CHUNK_SIZE.trailing_zeros(),
        }
    }

    /// Defer one fold step: the result stands for this value with an all-zero right sibling of
    /// equal logical size.
    pub fn pack(self) -> Self {
        Packed {
            packed: self.packed + 1,
            ..self
        }
    }

    /// Perform all deferred fold steps, producing the digest of the whole logical subtree.
    pub fn unpack<Z: ZeroHashes>(&self, zeros: &Z) -> Digest {
        let mut res = self.hash;
        let mut size = self.size;
        for _ in 0..self.packed {
            res = Z::Hasher::hash2_32_concat(&res, &zeros.zero_hash(size));
            size *= 2;
        }
        res
    }

    /// Whether this value stands for an all-zero region.
    ///
    /// Only the base digest is compared. This is sound because every zero-derived value carries
    /// the base zero digest and `pack` never rewrites it.
    pub fn is_zero_hash<Z: ZeroHashes>(&self, zeros: &Z) -> bool {
        self.hash == zeros.zero_hash(CHUNK_SIZE as u64)
    }

    /// The base digest, before any deferred folds.
    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    /// The size, in bytes, of the region `hash` covers.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The number of deferred fold steps.
    pub fn packed(&self) -> u32 {
        self.packed
    }

    /// The size, in bytes, of the logical region this value stands for.
    pub fn logical_size(&self) -> u64 {
        self.size << self.packed
    }
}

impl fmt::Display for Packed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "0x{} ({} bytes, {} deferred)",
            hex::encode(self.hash),
            self.size,
            self.packed
        )
    }
}
