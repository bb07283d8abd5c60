//! Recursive trie operations and their effect channel.

pub mod get;
pub mod insert;
pub mod remove;

/// Out-channel recording what a mutating descent did.
///
/// Exactly one of the two fields is set per successful operation: `modified`
/// when the key population changed, `replaced` when an existing value was
/// displaced by an overwrite or a removal.
pub struct Effect<V> {
    /// A key was added or removed.
    pub modified: bool,
    /// Prior value of the touched key, when one existed.
    pub replaced: Option<V>,
}

impl<V> Effect<V> {
    /// Fresh channel with both flags unset.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modified: false,
            replaced: None,
        }
    }
}
