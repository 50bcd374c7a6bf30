//! Filesystem-backed blob store.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{AtomicBlobStore, StorageError, StorageResult};

const TEMP_SUFFIX: &str = ".tmp";

/// Blob store keeping one file per blob under a root directory.
///
/// Writes go to `<name>.tmp`, are synced, then renamed over the target so a
/// crash never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, name: &str) -> StorageResult<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.ends_with(TEMP_SUFFIX);
        if !valid {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

impl AtomicBlobStore for FileBlobStore {
    fn read(&self, name: String) -> StorageResult<Option<Vec<u8>>> {
        let path = self.blob_path(&name)?;
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_atomic(&self, name: String, bytes: Vec<u8>) -> StorageResult<()> {
        let path = self.blob_path(&name)?;
        let temp = self.root.join(format!("{name}{TEMP_SUFFIX}"));
        {
            let mut file = File::create(&temp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &path)?;
        Ok(())
    }

    fn delete(&self, name: String) -> StorageResult<()> {
        let path = self.blob_path(&name)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
