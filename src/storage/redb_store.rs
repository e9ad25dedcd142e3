use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use redb::{Database, ReadableTable, TableDefinition};
use serde_json::json;

use crate::storage::{
    api::{FileReader, StorageProvider, Store},
    entry::Entry,
    error::StorageError,
};

static FILES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("files");
static VERSIONS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("versions");

/// One redb database per store, under a common root directory.
///
/// redb locks its file for the lifetime of a `Database`, so the provider keeps
/// the handle of every store it opened and hands out clones of it.
pub struct RedbProvider {
    root: PathBuf,
    databases: DashMap<String, Arc<Database>>,
}

impl RedbProvider {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root.as_ref())?;
        Ok(RedbProvider { root: root.as_ref().to_path_buf(), databases: DashMap::new() })
    }

    fn database(&self, stem: String) -> Result<Arc<Database>, StorageError> {
        let path = self.root.join(format!("{stem}.redb"));
        let db = self
            .databases
            .entry(stem)
            .or_try_insert_with(|| create_database(&path))?
            .value()
            .clone();
        Ok(db)
    }
}

fn create_database(path: &Path) -> Result<Arc<Database>, StorageError> {
    let db = Database::create(path)?;

    // tables must exist before the first read transaction
    let txn = db.begin_write()?;
    txn.open_table(FILES_TABLE)?;
    txn.open_table(VERSIONS_TABLE)?;
    txn.commit()?;

    tracing::debug!(path = %path.display(), "Opened redb store");
    Ok(Arc::new(db))
}

/// Maps a store identifier such as `pastebin` or `/storage` to a file stem.
///
/// Leading and trailing slashes are ignored. Inner slashes become `+`, which
/// identifiers may not contain, so distinct identifiers never share a file.
fn file_stem(name: &str) -> Result<String, StorageError> {
    let trimmed = name.trim_matches('/');
    let valid = !trimmed.is_empty()
        && trimmed
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..")
        && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || "-_./".contains(c));

    if !valid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(trimmed.replace('/', "+"))
}

impl StorageProvider for RedbProvider {
    fn open(&self, name: &str) -> Result<Box<dyn Store>, StorageError> {
        let db = self.database(file_stem(name)?)?;
        Ok(Box::new(RedbStore { db }))
    }
}

pub struct RedbStore {
    db: Arc<Database>,
}

impl Store for RedbStore {
    fn write(&self, name: &str, data: &[u8], overwrite: bool) -> Result<u64, StorageError> {
        let txn = self.db.begin_write()?;

        let version = {
            let mut files = txn.open_table(FILES_TABLE)?;
            if !overwrite && files.get(name)?.is_some() {
                return Err(StorageError::AlreadyExists(name.to_string()));
            }
            files.insert(name, data)?;

            let mut versions = txn.open_table(VERSIONS_TABLE)?;
            let version = versions.get(name)?.map_or(0, |v| v.value()) + 1;
            versions.insert(name, version)?;
            version
        };

        txn.commit()?;
        Ok(version)
    }

    fn open_read(&self, name: &str) -> Result<FileReader, StorageError> {
        let txn = self.db.begin_read()?;
        let files = txn.open_table(FILES_TABLE)?;
        match files.get(name)? {
            Some(data) => Ok(Box::new(Cursor::new(data.value().to_vec()))),
            None => Err(StorageError::NotFound(name.to_string())),
        }
    }

    fn list_entries(&self) -> Result<Vec<Entry>, StorageError> {
        let txn = self.db.begin_read()?;
        let files = txn.open_table(FILES_TABLE)?;
        let versions = txn.open_table(VERSIONS_TABLE)?;

        let mut entries = Vec::new();
        for item in files.iter()? {
            let (name, data) = item?;
            let version = versions.get(name.value())?.map_or(0, |v| v.value());
            entries.push(Entry::record([
                ("name", json!(name.value())),
                ("version", json!(version)),
                ("size", json!(data.value().len())),
            ]));
        }
        Ok(entries)
    }
}
