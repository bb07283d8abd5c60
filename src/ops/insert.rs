//! Insertion operation — copy-on-write update with an in-place fast path.

use std::mem;

use archery::{SharedPointer, SharedPointerKind};

use crate::node::{self, BitmapNode, Child, CollisionLeaf, Entry};
use crate::ops::Effect;

/// Inserts `entry` into the subtree behind `slot`.
///
/// Every level on the descent path changes, so each one is taken through
/// [`SharedPointer::make_mut`]: a node whose sole holder is this slot is
/// edited in place, a shared node is cloned first. Cloning a shared node
/// raises the share count of all its children, so a child of a copied parent
/// is never observed unique — exclusivity propagates one frame at a time.
pub fn update_recursive<K, V, P>(
    slot: &mut SharedPointer<BitmapNode<K, V, P>, P>,
    entry: Entry<K, V>,
    shift: u32,
    effect: &mut Effect<V>,
) where
    K: Eq + Clone,
    V: Clone,
    P: SharedPointerKind,
{
    let node = SharedPointer::make_mut(slot);
    let frag = node::fragment(entry.hash, shift);
    let bit = node::mask(frag);

    if node.data_map() & bit != 0 {
        let pos = node.data_index(bit);
        let existing = &mut node.entries[pos];
        if existing.hash == entry.hash && existing.key == entry.key {
            // Same key — overwrite the value.
            effect.replaced = Some(mem::replace(&mut existing.value, entry.value));
        } else if existing.hash == entry.hash {
            // Same full hash, different key: inline → collision.
            let existing = node.entries.remove(pos);
            node.clear_data_bit(bit);
            let leaf = CollisionLeaf::new(entry.hash, existing, entry);
            node.set_coll_bit(bit);
            let at = node.coll_index(bit);
            node.children
                .insert(at, Child::Collision(SharedPointer::new(leaf)));
            effect.modified = true;
        } else {
            // Same fragment, different hash: inline → node via a split chain.
            let existing = node.entries.remove(pos);
            node.clear_data_bit(bit);
            let subtree = split_entries(existing, entry, shift + node::BITS_PER_LEVEL);
            node.set_node_bit(bit);
            let at = node.node_index(bit);
            node.children
                .insert(at, Child::Node(SharedPointer::new(subtree)));
            effect.modified = true;
        }
    } else if node.node_map() & bit != 0 {
        // Position has a child subtree — recurse.
        let pos = node.node_index(bit);
        match &mut node.children[pos] {
            Child::Node(child) => {
                update_recursive(child, entry, shift + node::BITS_PER_LEVEL, effect);
            }
            Child::Collision(_) => unreachable!("bitmap-indexed slot holds a collision child"),
        }
    } else if node.coll_map() & bit != 0 {
        let pos = node.coll_index(bit);
        let leaf_hash = match &node.children[pos] {
            Child::Collision(leaf) => leaf.hash,
            Child::Node(_) => unreachable!("collision slot holds a bitmap-indexed child"),
        };
        if leaf_hash == entry.hash {
            // The bucket's hash — replace or append inside it.
            let Child::Collision(leaf) = &mut node.children[pos] else {
                unreachable!("collision slot holds a bitmap-indexed child")
            };
            update_collision(SharedPointer::make_mut(leaf), entry, effect);
        } else {
            // Hash misses the bucket: collision → node via a merge chain.
            let Child::Collision(leaf) = node.children.remove(pos) else {
                unreachable!("collision slot holds a bitmap-indexed child")
            };
            node.clear_coll_bit(bit);
            let subtree = merge_with_leaf(entry, leaf, shift + node::BITS_PER_LEVEL);
            node.set_node_bit(bit);
            let at = node.node_index(bit);
            node.children
                .insert(at, Child::Node(SharedPointer::new(subtree)));
            effect.modified = true;
        }
    } else {
        // Position empty — add an inline entry.
        node.set_data_bit(bit);
        let at = node.data_index(bit);
        node.entries.insert(at, entry);
        effect.modified = true;
    }
}

/// Replaces or appends within a collision bucket.
fn update_collision<K: Eq, V>(leaf: &mut CollisionLeaf<K, V>, entry: Entry<K, V>, effect: &mut Effect<V>) {
    debug_assert_eq!(leaf.hash, entry.hash);
    for existing in &mut leaf.entries {
        if existing.key == entry.key {
            effect.replaced = Some(mem::replace(&mut existing.value, entry.value));
            return;
        }
    }
    leaf.entries.push(entry);
    effect.modified = true;
}

// ---------------------------------------------------------------------------
// Chain builders
// ---------------------------------------------------------------------------

/// Builds the subtree separating two entries that collide at the caller's
/// level.
///
/// Descends until the hash fragments diverge; once fragments are exhausted
/// the full hashes are equal and a collision bucket terminates the chain.
fn split_entries<K, V, P>(e1: Entry<K, V>, e2: Entry<K, V>, shift: u32) -> BitmapNode<K, V, P>
where
    P: SharedPointerKind,
{
    let f1 = node::fragment(e1.hash, shift);
    let f2 = node::fragment(e2.hash, shift);

    if f1 != f2 {
        return BitmapNode::two_payloads(f1, e1, f2, e2);
    }

    let bit = node::mask(f1);
    if shift >= node::MAX_SHIFT {
        let leaf = CollisionLeaf::new(e1.hash, e1, e2);
        return BitmapNode::with_collision_child(bit, SharedPointer::new(leaf));
    }
    let child = split_entries(e1, e2, shift + node::BITS_PER_LEVEL);
    BitmapNode::with_node_child(bit, SharedPointer::new(child))
}

/// Builds the subtree separating an entry from a collision bucket whose hash
/// differs but collides at the caller's level.
///
/// At the diverging level the entry lands in the data region and the bucket
/// is carried over into the collision region unchanged.
fn merge_with_leaf<K, V, P>(
    entry: Entry<K, V>,
    leaf: SharedPointer<CollisionLeaf<K, V>, P>,
    shift: u32,
) -> BitmapNode<K, V, P>
where
    P: SharedPointerKind,
{
    // Distinct hashes diverge before the fragments run out.
    debug_assert!(shift <= node::MAX_SHIFT);
    debug_assert_ne!(entry.hash, leaf.hash);

    let f1 = node::fragment(entry.hash, shift);
    let f2 = node::fragment(leaf.hash, shift);

    if f1 == f2 {
        let child = merge_with_leaf(entry, leaf, shift + node::BITS_PER_LEVEL);
        return BitmapNode::with_node_child(node::mask(f1), SharedPointer::new(child));
    }

    BitmapNode::payload_and_collision(f1, entry, f2, leaf)
}
