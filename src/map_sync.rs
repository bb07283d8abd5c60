//! Multi-threaded CHAMP map.

use archery::ArcTK;

use crate::map::ChampMap;

/// Persistent hash map based on a CHAMP trie, multi-threaded.
///
/// Identical API to [`ChampMap`](crate::ChampMap), but node references are
/// atomically counted, so the map is `Send + Sync` whenever `K` and `V`
/// are. Each clone is still an independent value; there is no shared
/// mutable state between clones.
pub type ChampMapSync<K, V> = ChampMap<K, V, ArcTK>;

impl<K, V> ChampMap<K, V, ArcTK> {
    /// Creates an empty map backed by atomically counted pointers.
    #[must_use]
    pub const fn new_sync() -> Self {
        Self::new_with_ptr_kind()
    }
}
