use redb::{
    CommitError, DatabaseError, StorageError as RedbStorageError, TableError, TransactionError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The named file does not exist in the store.
    #[error("file `{0}` not found")]
    NotFound(String),

    /// A write without overwrite hit an existing file.
    #[error("file `{0}` already exists")]
    AlreadyExists(String),

    #[error("invalid store name: `{0}`")]
    InvalidName(String),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Redb database error.
    #[error("storage engine error: {0}")]
    Redb(#[from] DatabaseError),

    #[error("transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("table error: {0}")]
    TableError(#[from] TableError),

    #[error("internal redb storage error: {0}")]
    RedbStorageError(#[from] RedbStorageError),

    #[error("redb commit error: {0}")]
    CommitError(#[from] CommitError),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
