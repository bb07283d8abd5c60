//! Lookup operation — traverses the trie to find a key.

use archery::SharedPointerKind;

use crate::node::{self, BitmapNode, Child};

/// Searches for `key` in the subtree rooted at `node`.
///
/// Returns a reference to the value if found.
pub fn get_recursive<'a, K, V, P>(
    node: &'a BitmapNode<K, V, P>,
    hash: u64,
    key: &K,
    shift: u32,
) -> Option<&'a V>
where
    K: Eq,
    P: SharedPointerKind,
{
    let frag = node::fragment(hash, shift);
    let bit = node::mask(frag);

    if node.data_map() & bit != 0 {
        // Position has an inline entry.
        let entry = &node.entries[node.data_index(bit)];
        if entry.hash == hash && entry.key == *key {
            Some(&entry.value)
        } else {
            None
        }
    } else if node.node_map() & bit != 0 {
        // Position has a child subtree — recurse.
        match &node.children[node.node_index(bit)] {
            Child::Node(child) => get_recursive(child, hash, key, shift + node::BITS_PER_LEVEL),
            Child::Collision(_) => unreachable!("bitmap-indexed slot holds a collision child"),
        }
    } else if node.coll_map() & bit != 0 {
        // Position has a collision bucket — linear scan gated on the hash.
        match &node.children[node.coll_index(bit)] {
            Child::Collision(leaf) => {
                if leaf.hash != hash {
                    return None;
                }
                leaf.entries.iter().find(|e| e.key == *key).map(|e| &e.value)
            }
            Child::Node(_) => unreachable!("collision slot holds a bitmap-indexed child"),
        }
    } else {
        // Position is empty.
        None
    }
}
