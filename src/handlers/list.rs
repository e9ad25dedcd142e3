use http::{HeaderValue, StatusCode, header::CONTENT_TYPE};

use crate::{
    error::{AdapterError, HandlerError},
    handlers::Handlers,
    net::{InboundEvent, Response, cors},
    storage::{Entry, normalize},
};

const EMPTY_LISTING: &[u8] = b"[]";

impl Handlers {
    /// Lists file names as a JSON array of strings.
    ///
    /// Listing is best effort and always answers 200: a store that cannot be
    /// opened or enumerated, or a listing that cannot be encoded, is reported
    /// as `[]`, the same as a store with no files yet.
    pub fn list(&self, event: InboundEvent) -> Result<Response, AdapterError> {
        let mut event = event.http()?;
        cors::apply(event.response_mut());

        let body = self.try_list().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Listing failed, answering with an empty list");
            EMPTY_LISTING.to_vec()
        });

        let response = event.response_mut();
        response.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response.write_body(&body);
        Ok(event.finish(StatusCode::OK))
    }

    fn try_list(&self) -> Result<Vec<u8>, HandlerError> {
        let store = self.open_store()?;
        let entries = store.list_entries().map_err(HandlerError::StorageList)?;
        let names = filenames(&entries);
        tracing::debug!(count = names.len(), "Listed files");
        serde_json::to_vec(&names).map_err(HandlerError::Serialization)
    }
}

/// Bare file names of `entries`, in listing order. Records that carry no
/// name are skipped.
pub fn filenames(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| {
            let name = normalize(entry);
            if name.is_none() {
                tracing::warn!(?entry, "Skipping listing entry without a name");
            }
            name
        })
        .collect()
}
