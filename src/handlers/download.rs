use std::io;

use http::StatusCode;

use crate::{
    error::{AdapterError, HandlerError},
    handlers::Handlers,
    net::{HttpEvent, InboundEvent, Response, cors},
};

impl Handlers {
    /// Streams the content of the file named by the `filename` query
    /// parameter.
    pub fn download(&self, event: InboundEvent) -> Result<Response, AdapterError> {
        let mut event = event.http()?;
        cors::apply(event.response_mut());

        match self.try_download(&mut event) {
            Ok(()) => Ok(event.finish(StatusCode::OK)),
            Err(e) => Ok(self.fail(event, &e)),
        }
    }

    fn try_download(&self, event: &mut HttpEvent) -> Result<(), HandlerError> {
        let filename = event.query().get("filename")?.to_owned();
        let store = self.open_store()?;

        let file = store.file(filename);
        let mut reader = file.open_read().map_err(HandlerError::StorageRead)?;
        let size = io::copy(&mut reader, event.response_mut()).map_err(HandlerError::Copy)?;

        tracing::info!(filename = file.name(), size, "File downloaded");
        Ok(())
    }
}
