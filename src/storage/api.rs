use std::io::Read;

use crate::storage::{entry::Entry, error::StorageError};

/// Readable byte stream over a stored file. Dropping it releases the stream.
pub type FileReader = Box<dyn Read + Send>;

/// Opens named stores. Opening is idempotent: an existing store is returned
/// with its content untouched, and the same name may be opened concurrently.
pub trait StorageProvider: Send + Sync {
    fn open(&self, name: &str) -> Result<Box<dyn Store>, StorageError>;
}

/// A named namespace of file-like objects.
pub trait Store: Send {
    /// Writes `data` under `name` and returns the new version of the file.
    fn write(&self, name: &str, data: &[u8], overwrite: bool) -> Result<u64, StorageError>;

    fn open_read(&self, name: &str) -> Result<FileReader, StorageError>;

    fn list_entries(&self) -> Result<Vec<Entry>, StorageError>;
}

impl dyn Store + '_ {
    /// Selects a file by name. Nothing touches the store until the ref is
    /// written or read.
    pub fn file(&self, name: impl Into<String>) -> FileRef<'_> {
        FileRef { store: self, name: name.into() }
    }
}

pub struct FileRef<'a> {
    store: &'a dyn Store,
    name: String,
}

impl FileRef<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write(&self, data: &[u8], overwrite: bool) -> Result<u64, StorageError> {
        self.store.write(&self.name, data, overwrite)
    }

    pub fn open_read(&self) -> Result<FileReader, StorageError> {
        self.store.open_read(&self.name)
    }
}
