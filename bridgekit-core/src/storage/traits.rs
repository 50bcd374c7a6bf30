//! Platform interface for bridge persistence.

use super::error::StorageResult;

/// Atomic blob store for small named documents (e.g. `site_permissions.json`).
///
/// Implemented by the host platform. Writes MUST be atomic: a reader observes
/// either the complete old content or the complete new content, never a
/// partial write. On a filesystem this is the write-to-temp-then-rename
/// pattern, see [`super::FileBlobStore`].
#[uniffi::export(with_foreign)]
pub trait AtomicBlobStore: Send + Sync {
    /// Reads the blob named `name`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails. A missing blob is `Ok(None)`.
    fn read(&self, name: String) -> StorageResult<Option<Vec<u8>>>;

    /// Writes `bytes` atomically under `name`, replacing any existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write_atomic(&self, name: String, bytes: Vec<u8>) -> StorageResult<()>;

    /// Deletes the blob named `name`.
    ///
    /// # Errors
    ///
    /// Returns `Ok(())` even if the blob doesn't exist.
    /// Only returns an error for actual I/O failures.
    fn delete(&self, name: String) -> StorageResult<()>;
}
