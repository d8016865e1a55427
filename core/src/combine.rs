//! Reduction of a perfectly balanced binary split into a single [`Packed`] value.
//!
//! Both reducers halve their region until they reach a base case: a 32-byte chunk of a page in
//! [`hash_buf`], a single child subtree in [`fold_children`]. Sibling pairs are then joined on the
//! way back up. Whenever the right sibling is all zero, the join is deferred with
//! [`Packed::pack`] and neither side is hashed. Otherwise both sides are unpacked and hashed
//! together.
//!
//! An all-zero region of any size therefore costs nothing beyond the hashing of its chunks, and
//! a mostly-zero node costs one fold per level above its non-zero data.

use crate::buffer::Buffer;
use crate::hasher::{BinaryHash, CHUNK_SIZE};
use crate::packed::Packed;
use crate::zero::ZeroHashes;

/// Join two sibling values covering `size` bytes in total.
pub fn join<Z: ZeroHashes>(zeros: &Z, left: Packed, right: Packed, size: u64) -> Packed {
    if right.is_zero_hash(zeros) {
        return left.pack();
    }

    let hash = Z::Hasher::hash2_32_concat(&left.unpack(zeros), &right.unpack(zeros));
    Packed::normal(hash, size)
}

/// Hash `size` bytes of `bytes` starting at `offset`.
///
/// Panics if `size` is not a power of two of at least 32 or if the region is out of range.
pub fn hash_buf<Z: ZeroHashes>(zeros: &Z, bytes: &[u8], offset: usize, size: usize) -> Packed {
    assert!(
        size.is_power_of_two() && size >= CHUNK_SIZE,
        "hashed region must be a power of two >= 32, got {}",
        size
    );

    if size == CHUNK_SIZE {
        let mut chunk = [0u8; CHUNK_SIZE];
        chunk.copy_from_slice(&bytes[offset..offset + CHUNK_SIZE]);
        return Packed::normal(Z::Hasher::hash_chunk(&chunk), CHUNK_SIZE as u64);
    }

    let half = size / 2;
    let left = hash_buf(zeros, bytes, offset, half);
    let right = hash_buf(zeros, bytes, offset + half, half);
    join(zeros, left, right, size as u64)
}

/// Reduce `len` consecutive subtrees starting at `offset`, together covering `size` bytes.
///
/// The value of each subtree is supplied by `child`, called once per index in order. This is the
/// reducer behind [`hash_node`], exposed so subtree values computed elsewhere (e.g. on other
/// threads) can be joined the same way.
///
/// Panics if `len` is not a power of two, or if a subtree value does not cover exactly
/// `size / len` bytes.
pub fn fold_children<Z, F>(zeros: &Z, offset: usize, len: usize, size: u64, child: &mut F) -> Packed
where
    Z: ZeroHashes,
    F: FnMut(usize) -> Packed,
{
    assert!(
        len.is_power_of_two(),
        "child count must be a power of two, got {}",
        len
    );

    if len == 1 {
        let packed = child(offset);
        assert_eq!(
            packed.logical_size(),
            size,
            "child subtree covers {} bytes where {} are expected",
            packed.logical_size(),
            size
        );
        return packed;
    }

    let half = len / 2;
    let left = fold_children(zeros, offset, half, size / 2, child);
    let right = fold_children(zeros, offset + half, half, size / 2, child);
    join(zeros, left, right, size)
}

/// Hash `len` child buffers starting at `offset`, together covering `size` bytes.
pub fn hash_node<Z: ZeroHashes>(
    zeros: &Z,
    children: &[Buffer],
    offset: usize,
    len: usize,
    size: u64,
) -> Packed {
    fold_children(zeros, offset, len, size, &mut |i| children[i].hash_aux(zeros))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::KeccakHasher;
    use crate::zero::{zero_hash, ZeroTable};

    type H = KeccakHasher;

    // hash a region without any packing: every pair is materialized.
    fn naive(bytes: &[u8]) -> [u8; 32] {
        if bytes.len() == CHUNK_SIZE {
            return H::hash(bytes);
        }
        let (l, r) = bytes.split_at(bytes.len() / 2);
        H::hash2_32_concat(&naive(l), &naive(r))
    }

    #[test]
    fn zero_bytes_hash_to_zero_hash() {
        let zeros = ZeroTable::<H>::new();
        for size in [32, 64, 256, 1024, 4096] {
            let bytes = vec![0u8; size];
            let p = hash_buf(&zeros, &bytes, 0, size);
            assert!(p.is_zero_hash(&zeros));
            assert_eq!(p.unpack(&zeros), zero_hash::<H>(size as u64));
        }
    }

    #[test]
    fn packed_path_matches_materialized_path() {
        let zeros = ZeroTable::<H>::new();
        let mut bytes = vec![0u8; 1024];
        bytes[..300].iter_mut().enumerate().for_each(|(i, b)| *b = i as u8 | 1);

        let whole = hash_buf(&zeros, &bytes, 0, 1024);
        let left = hash_buf(&zeros, &bytes, 0, 512);
        assert_eq!(
            whole.unpack(&zeros),
            H::hash2_32_concat(&left.unpack(&zeros), &zero_hash::<H>(512)),
        );
        assert_eq!(whole.unpack(&zeros), naive(&bytes));
    }

    #[test]
    fn trailing_nonzero_byte_is_fully_materialized() {
        let zeros = ZeroTable::<H>::new();
        let mut bytes = vec![0u8; 1024];
        bytes[1023] = 1;

        let p = hash_buf(&zeros, &bytes, 0, 1024);
        assert_eq!(p.packed(), 0);
        assert_eq!(p.size(), 1024);
        assert_ne!(p.unpack(&zeros), zero_hash::<H>(1024));
        assert_eq!(p.unpack(&zeros), naive(&bytes));
    }

    #[test]
    fn leading_data_packs_once_per_level() {
        let zeros = ZeroTable::<H>::new();
        let mut bytes = vec![0u8; 1024];
        bytes[0] = 0xaa;

        let p = hash_buf(&zeros, &bytes, 0, 1024);
        assert_eq!(p.size(), 32);
        assert_eq!(p.packed(), 5);
        assert_eq!(p.unpack(&zeros), naive(&bytes));
    }

    #[test]
    fn hash_buf_at_offset() {
        let zeros = ZeroTable::<H>::new();
        let mut bytes = vec![0u8; 2048];
        bytes[1024 + 17] = 5;
        let at_offset = hash_buf(&zeros, &bytes, 1024, 1024);
        let alone = hash_buf(&zeros, &bytes[1024..], 0, 1024);
        assert_eq!(at_offset, alone);
    }

    #[test]
    fn fold_children_matches_pairwise_hashing() {
        let zeros = ZeroTable::<H>::new();
        let leaves: Vec<[u8; 32]> = (0..8u8).map(|i| H::hash(&[i; 32])).collect();
        let folded = fold_children(&zeros, 0, 8, 256, &mut |i| {
            Packed::normal(leaves[i], 32)
        });

        let l1: Vec<_> = leaves
            .chunks(2)
            .map(|c| H::hash2_32_concat(&c[0], &c[1]))
            .collect();
        let l2: Vec<_> = l1
            .chunks(2)
            .map(|c| H::hash2_32_concat(&c[0], &c[1]))
            .collect();
        assert_eq!(folded.unpack(&zeros), H::hash2_32_concat(&l2[0], &l2[1]));
    }

    #[test]
    fn fold_children_visits_in_order() {
        let zeros = ZeroTable::<H>::new();
        let mut visited = Vec::new();
        fold_children(&zeros, 4, 4, 128, &mut |i| {
            visited.push(i);
            Packed::zero(&zeros, 32)
        });
        assert_eq!(visited, vec![4, 5, 6, 7]);
    }

    #[test]
    #[should_panic(expected = "child subtree covers")]
    fn fold_children_rejects_undersized_child() {
        let zeros = ZeroTable::<H>::new();
        fold_children(&zeros, 0, 4, 4096, &mut |i| {
            if i == 0 {
                Packed::normal([1; 32], 512)
            } else {
                Packed::zero(&zeros, 1024)
            }
        });
    }

    #[test]
    #[should_panic]
    fn hash_buf_rejects_bad_size() {
        let zeros = ZeroTable::<H>::new();
        hash_buf(&zeros, &[0u8; 96], 0, 96);
    }
}
