use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::RwLock;

use cxo_types::Reference;

use crate::error::{StoreError, StoreResult};
use crate::traits::{Flags, ObjectStore};

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock` for
/// safe concurrent access and cloned on read.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<Reference, Vec<u8>>>,
    flags: AtomicU8,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_flags(Flags::empty())
    }

    /// Create an empty store with the given behaviour flags.
    pub fn with_flags(flags: Flags) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            flags: AtomicU8::new(flags.bits()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.objects.read().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> StoreResult<usize> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.values().map(Vec::len).sum())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get(&self, reference: &Reference) -> StoreResult<Vec<u8>> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        map.get(reference)
            .cloned()
            .ok_or(StoreError::NotFound(*reference))
    }

    fn set(&self, reference: Reference, data: Vec<u8>) -> StoreResult<()> {
        let mut map = self.objects.write().map_err(|_| StoreError::LockPoisoned)?;
        tracing::debug!(object = %reference.short_hex(), size = data.len(), "store object");
        map.entry(reference).or_insert(data);
        Ok(())
    }

    fn contains(&self, reference: &Reference) -> StoreResult<bool> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.contains_key(reference))
    }

    fn flags(&self) -> Flags {
        Flags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    fn set_flags(&self, flags: Flags) {
        self.flags.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    fn unset_flags(&self, flags: Flags) {
        self.flags.fetch_and(!flags.bits(), Ordering::AcqRel);
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        let bytes = self.total_bytes().unwrap_or_default();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .field("total_bytes", &bytes)
            .field("flags", &self.flags())
            .finish()
    }
}
