//! Core operations and types for committing to sparse paged memory.
//!
//! This crate defines the buffer tree and the commitment over it: a single digest computed by a
//! merkle reduction whose shape mirrors the buffer's pages and fixed-fanout internal nodes.
//! All-zero regions, which dominate freshly allocated or sparsely written memory, are folded
//! lazily via [`packed::Packed`] values and cost no hashing.
//!
//! The core types and commitment routines of this crate do not require the
//! standard library, but do require Rust's alloc crate.

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

pub mod buffer;
pub mod combine;
pub mod commit;
pub mod hasher;
pub mod packed;
pub mod zero;

pub use buffer::{capacity, Buffer, OutOfBounds};
pub use commit::hash;
pub use packed::{Digest, Packed};
pub use zero::{ZeroHashes, ZeroTable};
