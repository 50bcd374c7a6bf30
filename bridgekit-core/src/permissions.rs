//! Per-origin "accounts connected" grants.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::defaults::SITE_PERMISSIONS_BLOB;
use crate::storage::{AtomicBlobStore, StorageError, StorageResult};

/// Origins the user allowed to see the wallet address.
///
/// The table is written through to the blob store on every change as a JSON
/// object mapping origin to `true`. Only an explicit user decision (Allow in
/// the connect prompt, or a revoke from settings) mutates it.
#[derive(uniffi::Object)]
pub struct SitePermissions {
    store: Arc<dyn AtomicBlobStore>,
    grants: Mutex<BTreeMap<String, bool>>,
}

impl std::fmt::Debug for SitePermissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitePermissions")
            .field("grants", &self.granted_origins())
            .finish_non_exhaustive()
    }
}

#[uniffi::export]
impl SitePermissions {
    /// Loads the table from `store`. A missing blob is an empty table.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be read or is not a JSON object of
    /// booleans.
    #[uniffi::constructor]
    pub fn load(store: Arc<dyn AtomicBlobStore>) -> Result<Self, StorageError> {
        let grants = match store.read(SITE_PERMISSIONS_BLOB.to_string())? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => BTreeMap::new(),
        };
        Ok(Self {
            store,
            grants: Mutex::new(grants),
        })
    }

    /// Whether `origin` holds a grant.
    #[must_use]
    pub fn is_granted(&self, origin: &str) -> bool {
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(origin)
            .copied()
            .unwrap_or(false)
    }

    /// Records a grant for `origin` and persists the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written.
    pub fn grant(&self, origin: &str) -> StorageResult<()> {
        let mut grants = self.grants.lock().unwrap_or_else(PoisonError::into_inner);
        grants.insert(origin.to_string(), true);
        self.persist(&grants)
    }

    /// Removes the grant of `origin`, if any, and persists the table.
    ///
    /// Returns whether a grant was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written.
    pub fn revoke(&self, origin: &str) -> StorageResult<bool> {
        let mut grants = self.grants.lock().unwrap_or_else(PoisonError::into_inner);
        if grants.remove(origin).is_none() {
            return Ok(false);
        }
        self.persist(&grants)?;
        Ok(true)
    }

    /// Origins currently holding a grant, sorted.
    #[must_use]
    pub fn granted_origins(&self) -> Vec<String> {
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, granted)| **granted)
            .map(|(origin, _)| origin.clone())
            .collect()
    }
}

impl SitePermissions {
    fn persist(&self, grants: &BTreeMap<String, bool>) -> StorageResult<()> {
        let bytes = serde_json::to_vec(grants)?;
        self.store
            .write_atomic(SITE_PERMISSIONS_BLOB.to_string(), bytes)
    }
}
