pub mod api;
pub mod entry;
pub mod error;
pub mod memory;
pub mod redb_store;

pub use api::{FileRef, StorageProvider, Store};
pub use entry::{Entry, normalize};
pub use error::StorageError;
pub use memory::MemoryProvider;
pub use redb_store::RedbProvider;
