//! CHAMP trie node types, the two-bitmap slot encoding, and bitmap helpers.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use archery::{RcK, SharedPointer, SharedPointerKind};

/// Bits per trie level (5 → 32-way branching).
pub(crate) const BITS_PER_LEVEL: u32 = 5;

/// Maximum bit-shift value (13 levels, the last one uses 4 hash bits).
pub(crate) const MAX_SHIFT: u32 = 60;

/// Upper bound on node nesting, used to size iterator stacks.
pub(crate) const MAX_DEPTH: usize = (MAX_SHIFT / BITS_PER_LEVEL) as usize + 2;

/// Computes the 64-bit hash of a value using the standard hasher.
#[must_use]
pub(crate) fn hash_one<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Inline entry storing a key-value pair with its precomputed hash.
#[derive(Clone)]
pub(crate) struct Entry<K, V> {
    /// Precomputed 64-bit hash of the key.
    pub(crate) hash: u64,
    /// The key.
    pub(crate) key: K,
    /// The value.
    pub(crate) value: V,
}

// ---------------------------------------------------------------------------
// Bitmap helpers
// ---------------------------------------------------------------------------

/// Extracts the 5-bit hash fragment at the given bit-shift depth.
#[inline]
#[must_use]
pub(crate) const fn fragment(hash: u64, shift: u32) -> u32 {
    ((hash >> shift) & 0x1F) as u32
}

/// Returns the single-bit mask for the given fragment (0..31).
#[inline]
#[must_use]
pub(crate) const fn mask(frag: u32) -> u32 {
    1 << frag
}

/// Returns the compact index of `bit` within `bitmap`.
///
/// Counts the number of set bits below `bit`.
#[inline]
#[must_use]
pub(crate) const fn index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

// ---------------------------------------------------------------------------
// Collision leaf
// ---------------------------------------------------------------------------

/// Bucket of entries whose full 64-bit hashes are identical.
///
/// Invariant: `entries.len() >= 2` on every mutating return. A bucket that
/// shrinks to one entry is rewrapped by the node above it, never by the
/// bucket itself.
#[derive(Clone)]
pub(crate) struct CollisionLeaf<K, V> {
    /// The shared 64-bit hash value.
    pub(crate) hash: u64,
    /// Unordered collision entries.
    pub(crate) entries: Vec<Entry<K, V>>,
}

impl<K, V> CollisionLeaf<K, V> {
    /// Creates a bucket from the two entries that first collided.
    pub(crate) fn new(hash: u64, first: Entry<K, V>, second: Entry<K, V>) -> Self {
        debug_assert_eq!(first.hash, hash);
        debug_assert_eq!(second.hash, hash);
        Self {
            hash,
            entries: vec![first, second],
        }
    }
}

// ---------------------------------------------------------------------------
// Bitmap-indexed node
// ---------------------------------------------------------------------------

/// Child reference of a bitmap-indexed node.
pub(crate) enum Child<K, V, P = RcK>
where
    P: SharedPointerKind,
{
    /// Bitmap-indexed subtree; the descent continues.
    Node(SharedPointer<BitmapNode<K, V, P>, P>),
    /// Collision bucket; the descent ends with a linear scan.
    Collision(SharedPointer<CollisionLeaf<K, V>, P>),
}

/// CHAMP trie inner node.
///
/// Two physical bitmaps encode three pairwise-disjoint occupancy classes:
///
/// - `coll_map = bitmap1 & bitmap2` — collision children
/// - `data_map = bitmap1 ^ coll_map` — inline entries
/// - `node_map = bitmap2 ^ coll_map` — bitmap-indexed children
///
/// The physical words stay private to this module; everything else reads
/// only the derived maps. Inline entries occupy `entries` in ascending
/// slot-bit order; `children` holds the bitmap-indexed children first, then
/// the collision children, each region in ascending slot-bit order.
pub(crate) struct BitmapNode<K, V, P = RcK>
where
    P: SharedPointerKind,
{
    bitmap1: u32,
    bitmap2: u32,
    /// Inline entries, ascending slot-bit order.
    pub(crate) entries: Vec<Entry<K, V>>,
    /// Child region: bitmap-indexed children, then collision children.
    pub(crate) children: Vec<Child<K, V, P>>,
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

impl<K, V, P: SharedPointerKind> BitmapNode<K, V, P> {
    /// Node holding exactly one inline entry, positioned by the root-level
    /// fragment of its hash.
    pub(crate) fn single_payload(entry: Entry<K, V>) -> Self {
        Self {
            bitmap1: mask(fragment(entry.hash, 0)),
            bitmap2: 0,
            entries: vec![entry],
            children: Vec::new(),
        }
    }

    /// Node holding exactly one collision child, positioned by the
    /// root-level fragment of the bucket's hash.
    pub(crate) fn single_collision(leaf: SharedPointer<CollisionLeaf<K, V>, P>) -> Self {
        Self::with_collision_child(mask(fragment(leaf.hash, 0)), leaf)
    }

    /// Node holding two inline entries with distinct fragments.
    pub(crate) fn two_payloads(f1: u32, e1: Entry<K, V>, f2: u32, e2: Entry<K, V>) -> Self {
        debug_assert_ne!(f1, f2);
        let (lo, hi) = if f1 < f2 { (e1, e2) } else { (e2, e1) };
        Self {
            bitmap1: mask(f1) | mask(f2),
            bitmap2: 0,
            entries: vec![lo, hi],
            children: Vec::new(),
        }
    }

    /// Node holding one bitmap-indexed child at `bit`.
    pub(crate) fn with_node_child(bit: u32, child: SharedPointer<Self, P>) -> Self {
        Self {
            bitmap1: 0,
            bitmap2: bit,
            entries: Vec::new(),
            children: vec![Child::Node(child)],
        }
    }

    /// Node holding one collision child at `bit`.
    pub(crate) fn with_collision_child(
        bit: u32,
        leaf: SharedPointer<CollisionLeaf<K, V>, P>,
    ) -> Self {
        Self {
            bitmap1: bit,
            bitmap2: bit,
            entries: Vec::new(),
            children: vec![Child::Collision(leaf)],
        }
    }

    /// Node holding one inline entry and one collision child with distinct
    /// fragments.
    pub(crate) fn payload_and_collision(
        data_frag: u32,
        entry: Entry<K, V>,
        coll_frag: u32,
        leaf: SharedPointer<CollisionLeaf<K, V>, P>,
    ) -> Self {
        debug_assert_ne!(data_frag, coll_frag);
        let coll_bit = mask(coll_frag);
        Self {
            bitmap1: mask(data_frag) | coll_bit,
            bitmap2: coll_bit,
            entries: vec![entry],
            children: vec![Child::Collision(leaf)],
        }
    }
}

// ---------------------------------------------------------------------------
// Derived occupancy maps and arities
// ---------------------------------------------------------------------------

impl<K, V, P: SharedPointerKind> BitmapNode<K, V, P> {
    /// Bitmap of positions occupied by collision children.
    #[must_use]
    pub(crate) const fn coll_map(&self) -> u32 {
        self.bitmap1 & self.bitmap2
    }

    /// Bitmap of positions occupied by inline entries.
    #[must_use]
    pub(crate) const fn data_map(&self) -> u32 {
        self.bitmap1 ^ self.coll_map()
    }

    /// Bitmap of positions occupied by bitmap-indexed children.
    #[must_use]
    pub(crate) const fn node_map(&self) -> u32 {
        self.bitmap2 ^ self.coll_map()
    }

    /// Number of inline entries.
    #[must_use]
    pub(crate) const fn payload_arity(&self) -> usize {
        self.data_map().count_ones() as usize
    }

    /// Number of bitmap-indexed children.
    #[must_use]
    pub(crate) const fn node_arity(&self) -> usize {
        self.node_map().count_ones() as usize
    }

    /// Number of collision children.
    #[must_use]
    pub(crate) const fn coll_arity(&self) -> usize {
        self.coll_map().count_ones() as usize
    }

    /// `true` when no slot is occupied.
    #[must_use]
    pub(crate) const fn is_empty(&self) -> bool {
        (self.bitmap1 | self.bitmap2) == 0
    }

    /// `true` when the node holds one inline entry and nothing else.
    #[must_use]
    pub(crate) const fn is_single_payload(&self) -> bool {
        self.payload_arity() == 1 && self.node_arity() == 0 && self.coll_arity() == 0
    }

    /// `true` when the node holds one bitmap-indexed child and nothing else.
    #[must_use]
    pub(crate) const fn is_single_node(&self) -> bool {
        self.payload_arity() == 0 && self.node_arity() == 1 && self.coll_arity() == 0
    }

    /// `true` when the node holds one collision child and nothing else.
    #[must_use]
    pub(crate) const fn is_single_collision(&self) -> bool {
        self.payload_arity() == 0 && self.node_arity() == 0 && self.coll_arity() == 1
    }
}

// ---------------------------------------------------------------------------
// Region indexing
// ---------------------------------------------------------------------------

impl<K, V, P: SharedPointerKind> BitmapNode<K, V, P> {
    /// Position of `bit`'s inline entry within `entries`.
    #[must_use]
    pub(crate) const fn data_index(&self, bit: u32) -> usize {
        index(self.data_map(), bit)
    }

    /// Position of `bit`'s bitmap-indexed child within `children`.
    #[must_use]
    pub(crate) const fn node_index(&self, bit: u32) -> usize {
        index(self.node_map(), bit)
    }

    /// Position of `bit`'s collision child within `children`.
    ///
    /// Collision children sit after the bitmap-indexed children.
    #[must_use]
    pub(crate) const fn coll_index(&self, bit: u32) -> usize {
        self.node_arity() + index(self.coll_map(), bit)
    }
}

// ---------------------------------------------------------------------------
// Slot transitions
// ---------------------------------------------------------------------------

impl<K, V, P: SharedPointerKind> BitmapNode<K, V, P> {
    /// Marks `bit` as an inline-entry slot. The slot must be free.
    pub(crate) fn set_data_bit(&mut self, bit: u32) {
        debug_assert_eq!((self.bitmap1 | self.bitmap2) & bit, 0);
        self.bitmap1 |= bit;
    }

    /// Frees `bit` from the inline-entry class.
    pub(crate) fn clear_data_bit(&mut self, bit: u32) {
        debug_assert_ne!(self.data_map() & bit, 0);
        self.bitmap1 &= !bit;
    }

    /// Marks `bit` as a bitmap-indexed-child slot. The slot must be free.
    pub(crate) fn set_node_bit(&mut self, bit: u32) {
        debug_assert_eq!((self.bitmap1 | self.bitmap2) & bit, 0);
        self.bitmap2 |= bit;
    }

    /// Frees `bit` from the bitmap-indexed-child class.
    pub(crate) fn clear_node_bit(&mut self, bit: u32) {
        debug_assert_ne!(self.node_map() & bit, 0);
        self.bitmap2 &= !bit;
    }

    /// Marks `bit` as a collision-child slot. The slot must be free.
    pub(crate) fn set_coll_bit(&mut self, bit: u32) {
        debug_assert_eq!((self.bitmap1 | self.bitmap2) & bit, 0);
        self.bitmap1 |= bit;
        self.bitmap2 |= bit;
    }

    /// Frees `bit` from the collision-child class.
    pub(crate) fn clear_coll_bit(&mut self, bit: u32) {
        debug_assert_ne!(self.coll_map() & bit, 0);
        self.bitmap1 &= !bit;
        self.bitmap2 &= !bit;
    }
}

// ---------------------------------------------------------------------------
// Manual trait impls — avoid false `K: Trait, V: Trait` bounds.
// ---------------------------------------------------------------------------

// Children clone by sharing pointers; no `K: Clone` is needed.
impl<K, V, P: SharedPointerKind> Clone for Child<K, V, P> {
    fn clone(&self) -> Self {
        match self {
            Self::Node(node) => Self::Node(SharedPointer::clone(node)),
            Self::Collision(leaf) => Self::Collision(SharedPointer::clone(leaf)),
        }
    }
}

// Cloning a node copies its inline entries and shares its children. This is
// the copy half of copy-on-write.
impl<K: Clone, V: Clone, P: SharedPointerKind> Clone for BitmapNode<K, V, P> {
    fn clone(&self) -> Self {
        Self {
            bitmap1: self.bitmap1,
            bitmap2: self.bitmap2,
            entries: self.entries.clone(),
            children: self.children.clone(),
        }
    }
}

impl<K, V, P: SharedPointerKind> fmt::Debug for BitmapNode<K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapNode")
            .field("data_map", &format_args!("{:#034b}", self.data_map()))
            .field("node_map", &format_args!("{:#034b}", self.node_map()))
            .field("coll_map", &format_args!("{:#034b}", self.coll_map()))
            .finish_non_exhaustive()
    }
}

impl<K, V> fmt::Debug for CollisionLeaf<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionLeaf")
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("entries_len", &self.entries.len())
            .finish_non_exhaustive()
    }
}
