mod basic;
mod stress;

use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use archery::SharedPointerKind;

use crate::node::{BitmapNode, Child};

/// A key type with a controllable hash value for testing hash collisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CollidingKey {
    pub(crate) id: u32,
    forced_hash: u64,
}

impl CollidingKey {
    pub(crate) const fn new(id: u32, hash: u64) -> Self {
        Self {
            id,
            forced_hash: hash,
        }
    }
}

impl Hash for CollidingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.forced_hash.hash(state);
    }
}

/// Asserts that two tries are equal slot for slot: same occupancy maps, same
/// buffer contents, same child shapes.
pub(crate) fn assert_same_shape<K, V, P>(a: &BitmapNode<K, V, P>, b: &BitmapNode<K, V, P>)
where
    K: PartialEq + Debug,
    V: PartialEq + Debug,
    P: SharedPointerKind,
{
    assert_eq!(a.data_map(), b.data_map());
    assert_eq!(a.node_map(), b.node_map());
    assert_eq!(a.coll_map(), b.coll_map());

    assert_eq!(a.entries.len(), b.entries.len());
    for (x, y) in a.entries.iter().zip(&b.entries) {
        assert_eq!(x.hash, y.hash);
        assert_eq!(x.key, y.key);
        assert_eq!(x.value, y.value);
    }

    assert_eq!(a.children.len(), b.children.len());
    for (x, y) in a.children.iter().zip(&b.children) {
        match (x, y) {
            (Child::Node(m), Child::Node(n)) => assert_same_shape(m, n),
            (Child::Collision(m), Child::Collision(n)) => {
                assert_eq!(m.hash, n.hash);
                assert_eq!(m.entries.len(), n.entries.len());
                for entry in &m.entries {
                    assert!(n.entries.iter().any(|e| e.key == entry.key && e.value == entry.value));
                }
            }
            _ => panic!("child occupancy class mismatch"),
        }
    }
}
