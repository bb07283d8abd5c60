//! Removal operation — copy-on-write delete with canonical compaction.

use archery::{SharedPointer, SharedPointerKind};

use crate::node::{self, BitmapNode, Child, CollisionLeaf, Entry};
use crate::ops::Effect;

/// What a subtree reduced to after a removal, as seen by its parent.
///
/// A parent whose only occupant collapsed passes the residue further up;
/// otherwise it re-absorbs the residue into its own slot via the matching
/// migration. The handle turns a residue that reaches the root into the
/// canonical root node.
pub enum Residue<K, V, P>
where
    P: SharedPointerKind,
{
    /// Subtree still carries two or more elements; its slot is up to date.
    Intact,
    /// Subtree reduced to a single entry.
    Payload(Entry<K, V>),
    /// Subtree reduced to a bare collision bucket.
    Leaf(SharedPointer<CollisionLeaf<K, V>, P>),
    /// Subtree emptied out. Only the root may observe this.
    Empty,
}

/// Removes `key` from the subtree behind `slot`.
///
/// The key must be present: the handle verifies that with a read-only probe
/// first, so the descent never clones a node just to discover absence.
pub fn remove_recursive<K, V, P>(
    slot: &mut SharedPointer<BitmapNode<K, V, P>, P>,
    hash: u64,
    key: &K,
    shift: u32,
    effect: &mut Effect<V>,
) -> Residue<K, V, P>
where
    K: Eq + Clone,
    V: Clone,
    P: SharedPointerKind,
{
    let node = SharedPointer::make_mut(slot);
    let frag = node::fragment(hash, shift);
    let bit = node::mask(frag);

    if node.data_map() & bit != 0 {
        let pos = node.data_index(bit);
        debug_assert!(node.entries[pos].hash == hash && node.entries[pos].key == *key);
        remove_payload(node, bit, pos, effect)
    } else if node.node_map() & bit != 0 {
        let pos = node.node_index(bit);
        let residue = match &mut node.children[pos] {
            Child::Node(child) => {
                remove_recursive(child, hash, key, shift + node::BITS_PER_LEVEL, effect)
            }
            Child::Collision(_) => unreachable!("bitmap-indexed slot holds a collision child"),
        };
        absorb_node_residue(node, bit, pos, residue)
    } else if node.coll_map() & bit != 0 {
        remove_from_collision(node, bit, key, effect)
    } else {
        unreachable!("key vanished between containment probe and removal")
    }
}

// ---------------------------------------------------------------------------
// Inline entry removal
// ---------------------------------------------------------------------------

fn remove_payload<K, V, P>(
    node: &mut BitmapNode<K, V, P>,
    bit: u32,
    pos: usize,
    effect: &mut Effect<V>,
) -> Residue<K, V, P>
where
    P: SharedPointerKind,
{
    let removed = node.entries.remove(pos);
    node.clear_data_bit(bit);
    effect.modified = true;
    effect.replaced = Some(removed.value);
    collapse(node)
}

/// Canonical form: a node left with a single occupant hands it to the
/// caller instead of keeping a one-element subtree alive.
///
/// The node's own buffers are raided for the residue; the caller discards
/// the node afterwards.
fn collapse<K, V, P>(node: &mut BitmapNode<K, V, P>) -> Residue<K, V, P>
where
    P: SharedPointerKind,
{
    if node.is_empty() {
        Residue::Empty
    } else if node.is_single_payload() {
        Residue::Payload(node.entries.pop().expect("single inline entry present"))
    } else if node.is_single_collision() {
        match node.children.pop().expect("single collision child present") {
            Child::Collision(leaf) => Residue::Leaf(leaf),
            Child::Node(_) => unreachable!("collision slot holds a bitmap-indexed child"),
        }
    } else {
        Residue::Intact
    }
}

// ---------------------------------------------------------------------------
// Bitmap-indexed child residue
// ---------------------------------------------------------------------------

/// Re-absorbs what a bitmap-indexed child reduced to.
fn absorb_node_residue<K, V, P>(
    node: &mut BitmapNode<K, V, P>,
    bit: u32,
    pos: usize,
    residue: Residue<K, V, P>,
) -> Residue<K, V, P>
where
    P: SharedPointerKind,
{
    match residue {
        Residue::Intact => Residue::Intact,
        Residue::Payload(entry) => {
            if node.is_single_node() {
                // Sole occupant collapsed — escalate.
                return Residue::Payload(entry);
            }
            // node → inline
            node.children.remove(pos);
            node.clear_node_bit(bit);
            node.set_data_bit(bit);
            let at = node.data_index(bit);
            node.entries.insert(at, entry);
            Residue::Intact
        }
        Residue::Leaf(leaf) => {
            if node.is_single_node() {
                return Residue::Leaf(leaf);
            }
            // node → collision
            node.children.remove(pos);
            node.clear_node_bit(bit);
            node.set_coll_bit(bit);
            let at = node.coll_index(bit);
            node.children.insert(at, Child::Collision(leaf));
            Residue::Intact
        }
        Residue::Empty => unreachable!("non-root subtree emptied by removal"),
    }
}

// ---------------------------------------------------------------------------
// Collision child removal
// ---------------------------------------------------------------------------

fn remove_from_collision<K, V, P>(
    node: &mut BitmapNode<K, V, P>,
    bit: u32,
    key: &K,
    effect: &mut Effect<V>,
) -> Residue<K, V, P>
where
    K: Eq + Clone,
    V: Clone,
    P: SharedPointerKind,
{
    let pos = node.coll_index(bit);
    let survivor = {
        let Child::Collision(leaf) = &mut node.children[pos] else {
            unreachable!("collision slot holds a bitmap-indexed child")
        };
        let leaf = SharedPointer::make_mut(leaf);
        let at = leaf
            .entries
            .iter()
            .position(|e| e.key == *key)
            .expect("key present in collision bucket");
        let removed = leaf.entries.remove(at);
        effect.modified = true;
        effect.replaced = Some(removed.value);
        debug_assert!(!leaf.entries.is_empty());

        if leaf.entries.len() == 1 {
            // A one-entry bucket residue is rewrapped here, not by the leaf.
            Some(leaf.entries.pop().expect("surviving collision entry"))
        } else {
            None
        }
    };

    match survivor {
        None => Residue::Intact,
        Some(entry) => {
            node.children.remove(pos);
            node.clear_coll_bit(bit);
            if node.is_empty() {
                // Sole occupant collapsed — escalate.
                return Residue::Payload(entry);
            }
            // collision → inline
            node.set_data_bit(bit);
            let at = node.data_index(bit);
            node.entries.insert(at, entry);
            Residue::Intact
        }
    }
}
