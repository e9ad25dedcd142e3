use http::StatusCode;
use thiserror::Error;

use crate::{config::NotFoundPolicy, storage::StorageError};

/// The inbound event carries no HTTP request, so no response can be written.
#[derive(Debug, Error)]
#[error("event is not an HTTP request (got {kind})")]
pub struct AdapterError {
    pub kind: String,
}

/// Failures a handler reports to the caller through the response.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("query parameter `{0}` not found")]
    MissingQuery(&'static str),

    #[error("invalid request body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to open store `{store}`: {source}")]
    StorageOpen {
        store: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to write file: {0}")]
    StorageWrite(#[source] StorageError),

    #[error("failed to read file: {0}")]
    StorageRead(#[source] StorageError),

    #[error("failed to list files: {0}")]
    StorageList(#[source] StorageError),

    #[error("failed to copy file content: {0}")]
    Copy(#[source] std::io::Error),

    #[error("failed to encode listing: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl HandlerError {
    /// Status paired with this error in the failure response.
    pub fn status(&self, not_found: NotFoundPolicy) -> StatusCode {
        match self {
            HandlerError::MissingQuery(_) => StatusCode::BAD_REQUEST,
            HandlerError::StorageRead(e) if e.is_not_found() => not_found.status(),
            HandlerError::Decode(_)
            | HandlerError::StorageOpen { .. }
            | HandlerError::StorageWrite(_)
            | HandlerError::StorageRead(_)
            | HandlerError::StorageList(_)
            | HandlerError::Copy(_)
            | HandlerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
