use std::path::PathBuf;

use http::StatusCode;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STORE: &str = "pastebin";
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Status returned by download when the requested file does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundPolicy {
    /// 404 Not Found.
    #[default]
    NotFound,
    /// 500 Internal Server Error, for clients written against that mapping.
    ServerError,
}

impl NotFoundPolicy {
    pub fn status(self) -> StatusCode {
        match self {
            NotFoundPolicy::NotFound => StatusCode::NOT_FOUND,
            NotFoundPolicy::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl TryFrom<u16> for NotFoundPolicy {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            404 => Ok(NotFoundPolicy::NotFound),
            500 => Ok(NotFoundPolicy::ServerError),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Backend {
    Memory,
    #[default]
    Redb,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Identifier of the store every handler opens.
    pub store_identifier: String,
    pub not_found: NotFoundPolicy,
    pub backend: Backend,
    /// Root directory of the redb backend.
    pub data_dir: PathBuf,
    /// Largest request body the transport buffers before handing it over.
    pub max_body_bytes: usize,
}

impl Config {
    #[cfg(test)]
    pub fn new_test(store_identifier: &str, not_found: NotFoundPolicy) -> Self {
        Self {
            port: 0,
            store_identifier: store_identifier.to_string(),
            not_found,
            backend: Backend::Memory,
            data_dir: PathBuf::new(),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            store_identifier: DEFAULT_STORE.to_string(),
            not_found: NotFoundPolicy::default(),
            backend: Backend::default(),
            data_dir: PathBuf::from("data"),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}
