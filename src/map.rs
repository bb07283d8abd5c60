//! Single-threaded CHAMP map.

use std::fmt;
use std::hash::Hash;
use std::ops;

use archery::{RcK, SharedPointer, SharedPointerKind};

use crate::iter::{Iter, IterRev, Keys, Values};
use crate::node::{hash_one, BitmapNode, Entry};
use crate::ops::get::get_recursive;
use crate::ops::insert::update_recursive;
use crate::ops::remove::{remove_recursive, Residue};
use crate::ops::Effect;
use crate::DuplicateKey;

/// Persistent hash map based on a CHAMP trie.
///
/// The map is a value: [`clone`](Clone::clone) is O(1) and shares the whole
/// trie, and every mutation leaves previous clones untouched. A mutating
/// call edits a node in place only while this map holds the node's sole
/// reference; anything shared with another clone is path-copied instead.
///
/// The pointer kind `P` defaults to plain reference counting; see
/// [`ChampMapSync`](crate::ChampMapSync) for the atomically counted twin.
pub struct ChampMap<K, V, P = RcK>
where
    P: SharedPointerKind,
{
    pub(crate) root: Option<SharedPointer<BitmapNode<K, V, P>, P>>,
    pub(crate) size: usize,
}

// ---------------------------------------------------------------------------
// Construction & accessors — no trait bounds
// ---------------------------------------------------------------------------

impl<K, V> ChampMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self::new_with_ptr_kind()
    }
}

impl<K, V, P: SharedPointerKind> ChampMap<K, V, P> {
    /// Creates an empty map over an explicit pointer kind.
    #[must_use]
    pub const fn new_with_ptr_kind() -> Self {
        Self {
            root: None,
            size: 0,
        }
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` when both maps share the same root node.
    ///
    /// Pointer-equal maps are equal in content; the converse does not hold.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => std::ptr::eq(SharedPointer::as_ptr(a), SharedPointer::as_ptr(b)),
            (None, None) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Read operations — K: Hash + Eq
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V, P: SharedPointerKind> ChampMap<K, V, P> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let root = self.root.as_deref()?;
        get_recursive(root, hash_one(key), key, 0)
    }

    /// Returns the value associated with `key`, or `default` when absent.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    /// Returns `true` if the map contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }
}

// ---------------------------------------------------------------------------
// Write operations — K: Hash + Eq + Clone, V: Clone
// ---------------------------------------------------------------------------

impl<K: Hash + Eq + Clone, V: Clone, P: SharedPointerKind> ChampMap<K, V, P> {
    /// Inserts a key-value pair into the map.
    ///
    /// Returns `None` if the key was new, or `Some(old_value)` if an
    /// existing value was replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = hash_one(&key);
        let entry = Entry { hash, key, value };

        match &mut self.root {
            Some(root) => {
                let mut effect = Effect::new();
                update_recursive(root, entry, 0, &mut effect);
                if effect.modified {
                    self.size += 1;
                }
                effect.replaced
            }
            None => {
                self.root = Some(SharedPointer::new(BitmapNode::single_payload(entry)));
                self.size = 1;
                None
            }
        }
    }

    /// Removes a key from the map. Returns the removed value, or `None` if
    /// the key was not present.
    ///
    /// An absent key leaves the map untouched — no node is cloned.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let hash = hash_one(key);
        match self.root.as_deref() {
            Some(root) if get_recursive(root, hash, key, 0).is_some() => {}
            _ => return None,
        }

        let mut effect = Effect::new();
        let root = self.root.as_mut().expect("root present");
        match remove_recursive(root, hash, key, 0, &mut effect) {
            Residue::Intact => {}
            Residue::Payload(entry) => {
                self.root = Some(SharedPointer::new(BitmapNode::single_payload(entry)));
            }
            Residue::Leaf(leaf) => {
                self.root = Some(SharedPointer::new(BitmapNode::single_collision(leaf)));
            }
            Residue::Empty => self.root = None,
        }
        self.size -= 1;
        debug_assert!(effect.modified);
        effect.replaced
    }

    /// Returns a new map with `key` bound to `value`, leaving `self` as is.
    #[must_use]
    pub fn updated(&self, key: K, value: V) -> Self {
        let mut new = self.clone();
        new.insert(key, value);
        new
    }

    /// Returns a new map without `key`, leaving `self` as is.
    #[must_use]
    pub fn removed(&self, key: &K) -> Self {
        let mut new = self.clone();
        new.remove(key);
        new
    }

    /// Builds a map from a sequence of entries, rejecting duplicate keys.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateKey`] carrying the first key that occurred twice.
    pub fn from_unique_entries<I>(entries: I) -> Result<Self, DuplicateKey<K>>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::new_with_ptr_kind();
        for (key, value) in entries {
            if map.contains_key(&key) {
                return Err(DuplicateKey(key));
            }
            map.insert(key, value);
        }
        Ok(map)
    }
}

// ---------------------------------------------------------------------------
// Iteration
// ---------------------------------------------------------------------------

impl<K, V, P: SharedPointerKind> ChampMap<K, V, P> {
    /// Returns an iterator over `(&K, &V)` pairs in depth-first pre-order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter::new(self.root.as_deref(), self.size)
    }

    /// Returns an iterator yielding the pairs of [`iter`](Self::iter) in
    /// reverse.
    #[must_use]
    pub fn iter_rev(&self) -> IterRev<'_, K, V, P> {
        IterRev::new(self.root.as_deref(), self.size)
    }

    /// Returns an iterator over the keys.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, P> {
        Keys::new(self.iter())
    }

    /// Returns an iterator over the values.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, P> {
        Values::new(self.iter())
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V, P: SharedPointerKind> Default for ChampMap<K, V, P> {
    fn default() -> Self {
        Self::new_with_ptr_kind()
    }
}

// Manual impl — cloning shares the root pointer, no `K: Clone` needed.
impl<K, V, P: SharedPointerKind> Clone for ChampMap<K, V, P> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            size: self.size,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, P: SharedPointerKind> fmt::Debug for ChampMap<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// Content equality: same keys, equal value for every key, regardless of
// insertion order. Shared roots short-circuit.
impl<K: Hash + Eq, V: PartialEq, P: SharedPointerKind> PartialEq for ChampMap<K, V, P> {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.size == other.size && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Hash + Eq, V: Eq, P: SharedPointerKind> Eq for ChampMap<K, V, P> {}

impl<K: Hash + Eq + Clone, V: Clone, P: SharedPointerKind> Extend<(K, V)> for ChampMap<K, V, P> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone, P: SharedPointerKind> FromIterator<(K, V)>
    for ChampMap<K, V, P>
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new_with_ptr_kind();
        map.extend(iter);
        map
    }
}

impl<K: Hash + Eq, V, P: SharedPointerKind> ops::Index<&K> for ChampMap<K, V, P> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<'a, K, V, P: SharedPointerKind> IntoIterator for &'a ChampMap<K, V, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Iter<'a, K, V, P> {
        self.iter()
    }
}
