//! In-memory blob store.
//!
//! Not persistent across process restarts. Used by tests and by hosts that
//! only want session-scoped permissions.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{AtomicBlobStore, StorageResult};

/// In-memory atomic blob store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    /// Storage for blobs, keyed by name.
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates a new empty memory blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no blobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AtomicBlobStore for MemoryBlobStore {
    fn read(&self, name: String) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name)
            .cloned())
    }

    fn write_atomic(&self, name: String, bytes: Vec<u8>) -> StorageResult<()> {
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, bytes);
        Ok(())
    }

    fn delete(&self, name: String) -> StorageResult<()> {
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let store = MemoryBlobStore::new();
        assert!(store.is_empty());

        store
            .write_atomic("a.json".to_string(), b"{}".to_vec())
            .unwrap();
        assert_eq!(store.read("a.json".to_string()).unwrap(), Some(b"{}".to_vec()));
        assert_eq!(store.len(), 1);

        store.delete("a.json".to_string()).unwrap();
        assert_eq!(store.read("a.json".to_string()).unwrap(), None);

        // deleting a missing blob is not an error
        store.delete("a.json".to_string()).unwrap();
    }
}
