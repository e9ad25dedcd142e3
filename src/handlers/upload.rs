use http::StatusCode;
use serde::Deserialize;

use crate::{
    error::{AdapterError, HandlerError},
    handlers::Handlers,
    net::{HttpEvent, InboundEvent, Response, cors},
};

pub const UPLOAD_OK: &str = "File uploaded successfully";

/// Body of `POST /api/upload`. Both fields are required.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadRequest {
    pub filename: String,
    pub data: String,
}

impl Handlers {
    /// Stores `data` under `filename`, replacing any previous content.
    pub fn upload(&self, event: InboundEvent) -> Result<Response, AdapterError> {
        let mut event = event.http()?;
        cors::apply(event.response_mut());

        match self.try_upload(&mut event) {
            Ok(()) => {
                event.response_mut().write_body(UPLOAD_OK.as_bytes());
                Ok(event.finish(StatusCode::OK))
            }
            Err(e) => Ok(self.fail(event, &e)),
        }
    }

    fn try_upload(&self, event: &mut HttpEvent) -> Result<(), HandlerError> {
        let store = self.open_store()?;

        // the body is consumed by the decoder and closed on every outcome
        let request: UploadRequest =
            serde_json::from_reader(event.take_body()).map_err(HandlerError::Decode)?;

        let file = store.file(request.filename);
        let version =
            file.write(request.data.as_bytes(), true).map_err(HandlerError::StorageWrite)?;

        tracing::info!(
            filename = file.name(),
            version,
            size = request.data.len(),
            "File uploaded"
        );
        Ok(())
    }
}
