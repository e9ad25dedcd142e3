use std::{io::Cursor, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry as MapEntry};

use crate::storage::{
    api::{FileReader, StorageProvider, Store},
    entry::Entry,
    error::StorageError,
};

#[derive(Debug, Clone)]
struct MemoryFile {
    data: Vec<u8>,
    version: u64,
}

type Files = Arc<DashMap<String, MemoryFile>>;

/// Keeps every store in process memory. Clones share the same stores.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    stores: Arc<DashMap<String, Files>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageProvider for MemoryProvider {
    fn open(&self, name: &str) -> Result<Box<dyn Store>, StorageError> {
        let files = self.stores.entry(name.to_string()).or_default().value().clone();
        Ok(Box::new(MemoryStore { files }))
    }
}

pub struct MemoryStore {
    files: Files,
}

impl Store for MemoryStore {
    fn write(&self, name: &str, data: &[u8], overwrite: bool) -> Result<u64, StorageError> {
        match self.files.entry(name.to_string()) {
            MapEntry::Occupied(mut slot) => {
                if !overwrite {
                    return Err(StorageError::AlreadyExists(name.to_string()));
                }
                let file = slot.get_mut();
                file.data = data.to_vec();
                file.version += 1;
                Ok(file.version)
            }
            MapEntry::Vacant(slot) => {
                slot.insert(MemoryFile { data: data.to_vec(), version: 1 });
                Ok(1)
            }
        }
    }

    fn open_read(&self, name: &str) -> Result<FileReader, StorageError> {
        match self.files.get(name) {
            Some(file) => Ok(Box::new(Cursor::new(file.data.clone()))),
            None => Err(StorageError::NotFound(name.to_string())),
        }
    }

    fn list_entries(&self) -> Result<Vec<Entry>, StorageError> {
        let mut names: Vec<String> = self.files.iter().map(|f| f.key().clone()).collect();
        names.sort();
        Ok(names.into_iter().map(Entry::Name).collect())
    }
}
