//! Persistent hash map based on CHAMP.
//!
//! CHAMP (Compressed Hash-Array Mapped Prefix-tree) is a refined HAMT that
//! keeps the trie in **canonical form**: no single-element subtree survives
//! below the root, and collision buckets exist only where full 64-bit
//! hashes actually collide.
//!
//! # Key properties
//!
//! - **Value semantics**: `clone` is O(1); mutating a clone never disturbs
//!   the original
//! - **COW structural sharing**: uniquely owned nodes are edited in place,
//!   shared nodes are path-copied
//! - **Three-way slot encoding**: inline entries, child nodes, and collision
//!   buckets distinguished by two bitmap words per node
//! - **Zero `unsafe`**: enforced by `#![forbid(unsafe_code)]`
//!
//! # References
//!
//! - Steindorfer & Vinju, 2015 — "Optimizing Hash-Array Mapped Tries
//!   for Fast and Lean Immutable JVM Collections", OOPSLA 2015
//! - Bagwell, 2001 — "Ideal Hash Trees"

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

use std::error;
use std::fmt;

pub mod iter;

mod map;
mod map_sync;
mod node;
mod ops;

#[cfg(test)]
mod tests;

pub use map::ChampMap;
pub use map_sync::ChampMapSync;

/// Error returned by [`ChampMap::from_unique_entries`] when the input
/// sequence contains a key twice.
///
/// Carries the offending key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey<K>(pub K);

impl<K: fmt::Debug> fmt::Display for DuplicateKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate key: {:?}", self.0)
    }
}

impl<K: fmt::Debug> error::Error for DuplicateKey<K> {}
