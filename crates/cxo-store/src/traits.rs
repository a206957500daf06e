use std::fmt;

use cxo_crypto::ContentHasher;
use cxo_types::Reference;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

bitflags::bitflags! {
    /// Behaviour flags a backend carries for the structures built on top
    /// of it.
    ///
    /// The store only keeps and reports them; their meaning belongs to the
    /// list structures that read them.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Flags: u8 {
        /// Keep a hash-table index over list elements.
        const HASH_TABLE_INDEX = 1 << 0;
        /// Load entire reference trees instead of walking them lazily.
        const ENTIRE_REFS = 1 << 1;
        /// Defer index updates until the tree is saved.
        const LAZY_UPDATING = 1 << 2;
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<_> = self
            .iter_names()
            .map(|(name, _)| name.to_ascii_lowercase().replace('_', "-"))
            .collect();
        f.write_str(&names.join("|"))
    }
}

/// Content-addressed object storage.
///
/// Implementations must satisfy these invariants:
/// - Objects are immutable once written; the same bytes always map to the
///   same reference.
/// - Concurrent reads are always safe.
/// - The store never interprets object contents.
pub trait ObjectStore: Send + Sync {
    /// Read an object. Fails with `NotFound` when absent.
    fn get(&self, reference: &Reference) -> StoreResult<Vec<u8>>;

    /// Store `data` under `reference`. Writing an existing reference is a
    /// no-op.
    fn set(&self, reference: Reference, data: Vec<u8>) -> StoreResult<()>;

    /// Store `data` under its own digest and return that digest.
    fn add(&self, data: Vec<u8>) -> StoreResult<Reference> {
        let reference = ContentHasher::object_ref(&data);
        self.set(reference, data)?;
        Ok(reference)
    }

    /// Check whether an object exists.
    fn contains(&self, reference: &Reference) -> StoreResult<bool>;

    /// Current behaviour flags.
    fn flags(&self) -> Flags;

    /// Turn the given flags on.
    fn set_flags(&self, flags: Flags);

    /// Turn the given flags off.
    fn unset_flags(&self, flags: Flags);
}
