//! Hashers (feature-gated) and utilities for implementing them.
//!
//! The commitment only ever hashes two shapes of input: a single 32-byte chunk (either raw page
//! bytes or the zero chunk) and the concatenation of two 32-byte digests. [`BinaryHash`]
//! captures both.

use crate::packed::Digest;

/// The size, in bytes, of the smallest hashed unit of a page.
pub const CHUNK_SIZE: usize = 32;

/// A simple trait for representing binary hash functions.
///
/// The binary hash must behave approximately like a random oracle over the space 2^256. In
/// particular, the digest of 32 zero bytes doubles as the marker for an all-zero chunk, so no
/// non-zero chunk may be expected to hash to it.
///
/// Functions like Keccak/Sha2/Blake3 all meet these criteria.
pub trait BinaryHash {
    /// Given a bit-string, produce a 32-byte hash.
    fn hash(input: &[u8]) -> Digest;

    /// Hash a single 32-byte chunk.
    fn hash_chunk(chunk: &[u8; CHUNK_SIZE]) -> Digest {
        Self::hash(chunk)
    }

    /// An optional specialization of `hash` where there are two 32-byte inputs, left and right.
    fn hash2_32_concat(left: &Digest, right: &Digest) -> Digest {
        let mut buf = [0u8; 64];
        buf[0..32].copy_from_slice(left);
        buf[32..64].copy_from_slice(right);
        Self::hash(&buf)
    }
}

#[cfg(any(feature = "keccak-hasher", test))]
pub use keccak::KeccakHasher;

/// A hasher making use of keccak-256.
///
/// This is the hasher commitments are defined over. The others exist for experimentation.
#[cfg(any(feature = "keccak-hasher", test))]
pub mod keccak {
    use super::BinaryHash;
    use crate::packed::Digest;
    use sha3::{Digest as _, Keccak256};

    /// A [`BinaryHash`] implementation for keccak-256.
    pub struct KeccakHasher;

    impl BinaryHash for KeccakHasher {
        fn hash(value: &[u8]) -> Digest {
            Keccak256::digest(value).into()
        }

        fn hash2_32_concat(left: &Digest, right: &Digest) -> Digest {
            let mut hasher = Keccak256::new();
            hasher.update(left);
            hasher.update(right);
            hasher.finalize().into()
        }
    }
}

#[cfg(any(feature = "blake3-hasher", test))]
pub use self::blake3::Blake3Hasher;

/// A hasher making use of blake3.
#[cfg(any(feature = "blake3-hasher", test))]
pub mod blake3 {
    use super::BinaryHash;
    use crate::packed::Digest;

    /// A [`BinaryHash`] implementation for Blake3.
    pub struct Blake3Hasher;

    impl BinaryHash for Blake3Hasher {
        fn hash(value: &[u8]) -> Digest {
            blake3::hash(value).into()
        }

        fn hash2_32_concat(left: &Digest, right: &Digest) -> Digest {
            let mut hasher = blake3::Hasher::new();
            hasher.update(left);
            hasher.update(right);
            hasher.finalize().into()
        }
    }
}

#[cfg(feature = "sha2-hasher")]
pub use self::sha2::Sha2Hasher;

/// A hasher making use of sha2-256.
#[cfg(feature = "sha2-hasher")]
pub mod sha2 {
    use super::BinaryHash;
    use crate::packed::Digest;
    use sha2::{Digest as _, Sha256};

    /// A [`BinaryHash`] implementation for Sha2.
    pub struct Sha2Hasher;

    impl BinaryHash for Sha2Hasher {
        fn hash(value: &[u8]) -> Digest {
            let mut hasher = Sha256::new();
            hasher.update(value);
            hasher.finalize().into()
        }

        fn hash2_32_concat(left: &Digest, right: &Digest) -> Digest {
            let mut hasher = Sha256::new();
            hasher.update(left);
            hasher.update(right);
            hasher.finalize().into()
        }
    }
}
