//! The commitment of a buffer: one digest over its whole logical region.

use crate::buffer::{capacity, Buffer, FANOUT, PAGE_SIZE};
use crate::combine::{hash_buf, hash_node};
use crate::hasher::BinaryHash;
use crate::packed::{Digest, Packed};
use crate::zero::{ZeroHashes, ZeroTable};

impl Buffer {
    /// The packed commitment of this node, covering `self.capacity()` bytes.
    ///
    /// Absent nodes cost no hashing at all.
    pub fn hash_aux<Z: ZeroHashes>(&self, zeros: &Z) -> Packed {
        if self.level() == 0 {
            return match self.page() {
                None => Packed::zero(zeros, PAGE_SIZE as u64),
                Some(page) => hash_buf(zeros, &page[..], 0, PAGE_SIZE),
            };
        }

        let capacity = capacity(self.level());
        match self.children() {
            None => Packed::zero(zeros, capacity),
            Some(children) => hash_node(zeros, &children[..], 0, FANOUT, capacity),
        }
    }

    /// The commitment of this node.
    pub fn hash<Z: ZeroHashes>(&self, zeros: &Z) -> Digest {
        self.hash_aux(zeros).unpack(zeros)
    }
}

/// Compute the commitment of a buffer with a freshly built [`ZeroTable`].
///
/// Prefer [`Buffer::hash`] with a long-lived table when hashing repeatedly.
pub fn hash<H: BinaryHash>(buffer: &Buffer) -> Digest {
    buffer.hash(&ZeroTable::<H>::new())
}
