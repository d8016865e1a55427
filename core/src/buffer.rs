//! The buffer tree: sparse paged memory.
//!
//! A buffer is a tree with a fixed two-level addressing scheme. Leaves (level 0) hold a single
//! page of [`PAGE_SIZE`] bytes and internal nodes (level > 0) hold [`FANOUT`] children of the
//! level below. A node at `level` therefore covers [`capacity`]`(level)` bytes.
//!
//! Any node may be absent, in which case the region it covers reads as zero. Absence is an
//! explicit slot state rather than an empty pointer, so a commitment can recognize it without
//! looking at any bytes.
//!
//! Payloads are reference-counted and written copy-on-write: cloning a [`Buffer`] is cheap and
//! yields a snapshot which later writes to the original never affect.

use alloc::sync::Arc;
use core::fmt;

/// The size of a leaf page in bytes.
pub const PAGE_SIZE: usize = 1024;

/// The number of children of an internal node.
pub const FANOUT: usize = 128;

/// log2 of [`FANOUT`].
const FANOUT_BITS: u32 = 7;

/// The deepest supported level. `capacity(MAX_LEVEL)` is 2^59 bytes, the largest capacity
/// representable at this fan-out without overflowing a `u64`.
pub const MAX_LEVEL: u32 = 7;

/// The raw bytes of a leaf page.
pub type Page = [u8; PAGE_SIZE];

/// The child slots of an internal node.
pub type Children = [Buffer; FANOUT];

/// The number of bytes covered by a node at the given level.
///
/// Panics if `level` exceeds [`MAX_LEVEL`].
pub fn capacity(level: u32) -> u64 {
    assert!(
        level <= MAX_LEVEL,
        "buffer level {} exceeds maximum {}",
        level,
        MAX_LEVEL
    );
    (PAGE_SIZE as u64) << (FANOUT_BITS * level)
}

/// Either an owned payload or nothing. Absent payloads read as zero.
#[derive(Debug, Clone)]
pub(crate) enum Slot<T> {
    /// No payload: the region is all zero.
    Absent,
    /// A payload is allocated. Its contents may still be zero.
    Present(T),
}

impl<T> Slot<T> {
    /// Whether the slot is absent.
    pub(crate) fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }

    /// Get a reference to the payload, if present.
    pub(crate) fn as_present(&self) -> Option<&T> {
        match self {
            Slot::Absent => None,
            Slot::Present(t) => Some(t),
        }
    }
}

/// An attempt to access bytes beyond the capacity of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    /// The offset of the access.
    pub offset: u64,
    /// The length of the access.
    pub len: usize,
    /// The capacity of the buffer.
    pub capacity: u64,
}

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "access of {} bytes at offset {} exceeds buffer capacity {}",
            self.len, self.offset, self.capacity
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OutOfBounds {}

/// A node of the buffer tree. See the module docs.
///
/// Nodes are only built through [`Buffer::new`], [`Buffer::from_page`] and
/// [`Buffer::from_children`], so every child of an internal node is one level below it.
#[derive(Debug, Clone)]
pub struct Buffer {
    node: Node,
}

#[derive(Debug, Clone)]
enum Node {
    // level 0.
    Leaf(Slot<Arc<Page>>),
    // level > 0, children at `level - 1`.
    Internal {
        level: u32,
        children: Slot<Arc<Children>>,
    },
}

impl Buffer {
    /// Create an absent (all-zero) buffer at the given level.
    ///
    /// Panics if `level` exceeds [`MAX_LEVEL`].
    pub fn new(level: u32) -> Self {
        assert!(
            level <= MAX_LEVEL,
            "buffer level {} exceeds maximum {}",
            level,
            MAX_LEVEL
        );
        let node = if level == 0 {
            Node::Leaf(Slot::Absent)
        } else {
            Node::Internal {
                level,
                children: Slot::Absent,
            }
        };
        Buffer { node }
    }

    /// Create a leaf holding the given page.
    pub fn from_page(page: Page) -> Self {
        Buffer {
            node: Node::Leaf(Slot::Present(Arc::new(page))),
        }
    }

    /// Create an internal node at `level` holding the given children.
    ///
    /// Panics if `level` is zero or exceeds [`MAX_LEVEL`], or if any child is not at
    /// `level - 1`.
    pub fn from_children(level: u32, children: Children) -> Self {
        assert!(level > 0, "internal nodes live above level 0");
        assert!(
            level <= MAX_LEVEL,
            "buffer level {} exceeds maximum {}",
            level,
            MAX_LEVEL
        );
        for (i, child) in children.iter().enumerate() {
            assert_eq!(
                child.level(),
                level - 1,
                "child {} of a level {} node is at level {}",
                i,
                level,
                child.level()
            );
        }

        Buffer {
            node: Node::Internal {
                level,
                children: Slot::Present(Arc::new(children)),
            },
        }
    }

    /// The level of this node in the tree.
    pub fn level(&self) -> u32 {
        match &self.node {
            Node::Leaf(_) => 0,
            Node::Internal { level, .. } => *level,
        }
    }

    /// The number of bytes covered by this node.
    pub fn capacity(&self) -> u64 {
        capacity(self.level())
    }

    /// Whether this node has no payload at all.
    pub fn is_absent(&self) -> bool {
        match &self.node {
            Node::Leaf(page) => page.is_absent(),
            Node::Internal { children, .. } => children.is_absent(),
        }
    }

    /// The page of a present leaf. `None` for absent leaves and internal nodes.
    pub fn page(&self) -> Option<&Page> {
        match &self.node {
            Node::Leaf(page) => page.as_present().map(|p| &**p),
            Node::Internal { .. } => None,
        }
    }

    /// The children of a present internal node. `None` for absent nodes and leaves.
    pub fn children(&self) -> Option<&Children> {
        match &self.node {
            Node::Leaf(_) => None,
            Node::Internal { children, .. } => children.as_present().map(|c| &**c),
        }
    }

    /// Read `out.len()` bytes starting at `offset`.
    pub fn read(&self, offset: u64, out: &mut [u8]) -> Result<(), OutOfBounds> {
        self.check_bounds(offset, out.len())?;
        self.read_at(offset, out);
        Ok(())
    }

    /// Write `data` starting at `offset`.
    ///
    /// Absent pages and child arrays are allocated as needed, except where the written bytes are
    /// all zero. Shared payloads are copied before being modified.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), OutOfBounds> {
        self.check_bounds(offset, data.len())?;
        self.write_at(offset, data);
        Ok(())
    }

    fn check_bounds(&self, offset: u64, len: usize) -> Result<(), OutOfBounds> {
        let capacity = self.capacity();
        match offset.checked_add(len as u64) {
            Some(end) if end <= capacity => Ok(()),
            _ => Err(OutOfBounds {
                offset,
                len,
                capacity,
            }),
        }
    }

    // bounds are checked by the caller.
    fn read_at(&self, offset: u64, out: &mut [u8]) {
        match &self.node {
            Node::Leaf(Slot::Absent) | Node::Internal { children: Slot::Absent, .. } => {
                out.fill(0)
            }
            Node::Leaf(Slot::Present(page)) => {
                let start = offset as usize;
                out.copy_from_slice(&page[start..start + out.len()]);
            }
            Node::Internal {
                level,
                children: Slot::Present(children),
            } => {
                for_each_child_span(*level, offset, out.len(), |index, inner, span| {
                    children[index].read_at(inner, &mut out[span]);
                });
            }
        }
    }

    // bounds are checked by the caller.
    fn write_at(&mut self, offset: u64, data: &[u8]) {
        if self.is_absent() && data.iter().all(|b| *b == 0) {
            return;
        }

        match &mut self.node {
            Node::Leaf(page) => {
                if page.is_absent() {
                    *page = Slot::Present(Arc::new([0; PAGE_SIZE]));
                }
                if let Slot::Present(page) = page {
                    let start = offset as usize;
                    Arc::make_mut(page)[start..start + data.len()].copy_from_slice(data);
                }
            }
            Node::Internal { level, children } => {
                let level = *level;
                if children.is_absent() {
                    let empty: Children = core::array::from_fn(|_| Buffer::new(level - 1));
                    *children = Slot::Present(Arc::new(empty));
                }
                if let Slot::Present(children) = children {
                    let children = Arc::make_mut(children);
                    for_each_child_span(level, offset, data.len(), |index, inner, span| {
                        children[index].write_at(inner, &data[span]);
                    });
                }
            }
        }
    }
}

// Split an access of `len` bytes at `offset` within a node at `level` into per-child pieces.
// The callback receives the child index, the offset within the child, and the range of the
// access buffer that maps onto it.
fn for_each_child_span(
    level: u32,
    offset: u64,
    len: usize,
    mut f: impl FnMut(usize, u64, core::ops::Range<usize>),
) {
    let child_capacity = capacity(level - 1);
    let mut pos = 0;
    while pos < len {
        let absolute = offset + pos as u64;
        let index = (absolute / child_capacity) as usize;
        let inner = absolute % child_capacity;
        let n = core::cmp::min(child_capacity - inner, (len - pos) as u64) as usize;
        f(index, inner, pos..pos + n);
        pos += n;
    }
}
