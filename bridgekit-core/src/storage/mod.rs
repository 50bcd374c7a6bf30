//! Persistence primitives: the host blob store interface and its built-in
//! implementations.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use traits::AtomicBlobStore;
