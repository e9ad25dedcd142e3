//! The three request handlers and the plumbing they share.
//!
//! Every handler narrows the event to HTTP, applies CORS, performs a single
//! storage call and emits exactly one response. Nothing survives the call:
//! the store is reopened through the provider for each invocation.

mod download;
mod list;
mod upload;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use http::StatusCode;

use crate::{
    config::Config,
    error::HandlerError,
    net::{HttpEvent, Response},
    storage::{StorageProvider, Store},
};

pub use list::filenames;
pub use upload::{UPLOAD_OK, UploadRequest};

pub struct Handlers {
    config: Arc<Config>,
    storage: Arc<dyn StorageProvider>,
}

impl Handlers {
    pub fn new(config: Arc<Config>, storage: Arc<dyn StorageProvider>) -> Self {
        Handlers { config, storage }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn open_store(&self) -> Result<Box<dyn Store>, HandlerError> {
        let store = &self.config.store_identifier;
        self.storage
            .open(store)
            .map_err(|source| HandlerError::StorageOpen { store: store.clone(), source })
    }

    /// Reports `err` with the status its kind maps to.
    fn fail(&self, event: HttpEvent, err: &HandlerError) -> Response {
        failed(event, err, err.status(self.config.not_found))
    }
}

/// Replaces whatever body was written with the error message and finishes the
/// response with `status`. Headers set earlier, CORS included, are kept.
pub fn failed(mut event: HttpEvent, err: &HandlerError, status: StatusCode) -> Response {
    tracing::warn!(
        error = %err,
        %status,
        method = %event.method(),
        path = event.path(),
        "Request failed"
    );

    let response = event.response_mut();
    response.clear_body();
    response.write_body(err.to_string().as_bytes());
    event.finish(status)
}
