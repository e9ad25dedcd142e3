use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use pastebin::{
    config::{Backend, Config, NotFoundPolicy},
    handlers::Handlers,
    net::server,
    storage::{MemoryProvider, RedbProvider, StorageProvider},
    util::logging::init_logging,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(version, about = "Pastebin file-sharing API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "PASTEBIN_PORT")]
    port: Option<u16>,

    /// Identifier of the store the handlers read and write
    #[arg(long = "store", env = "PASTEBIN_STORE")]
    store_identifier: Option<String>,

    #[arg(long, env = "PASTEBIN_BACKEND", value_enum)]
    backend: Option<Backend>,

    /// Root directory of the redb backend
    #[arg(long, env = "PASTEBIN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Status answered by download for unknown files (404 or 500)
    #[arg(long, env = "PASTEBIN_NOT_FOUND_STATUS", value_parser = parse_not_found)]
    not_found_status: Option<NotFoundPolicy>,

    #[arg(long, env = "PASTEBIN_MAX_BODY_BYTES")]
    max_body_bytes: Option<usize>,
}

fn parse_not_found(raw: &str) -> Result<NotFoundPolicy, String> {
    let code: u16 = raw.parse().map_err(|_| format!("`{raw}` is not a status code"))?;
    NotFoundPolicy::try_from(code).map_err(|code| format!("unsupported not-found status {code}"))
}

impl Cli {
    fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            port: self.port.unwrap_or(defaults.port),
            store_identifier: self.store_identifier.unwrap_or(defaults.store_identifier),
            not_found: self.not_found_status.unwrap_or(defaults.not_found),
            backend: self.backend.unwrap_or(defaults.backend),
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            max_body_bytes: self.max_body_bytes.unwrap_or(defaults.max_body_bytes),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let config = Arc::new(Cli::parse().into_config());
    info!(
        config.port,
        store = %config.store_identifier,
        backend = ?config.backend,
        not_found = %config.not_found.status(),
        "pastebin starting up"
    );

    let storage: Arc<dyn StorageProvider> = match config.backend {
        Backend::Memory => Arc::new(MemoryProvider::new()),
        Backend::Redb => match RedbProvider::new(&config.data_dir) {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                error!(error = %e, data_dir = %config.data_dir.display(), "Cannot prepare data directory");
                return ExitCode::FAILURE;
            }
        },
    };

    let handlers = Arc::new(Handlers::new(config, storage));
    if let Err(e) = server::serve(handlers).await {
        error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
