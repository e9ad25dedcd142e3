use tracing_subscriber::EnvFilter;

pub fn init_logging() {
    // RUST_LOG, falling back to info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true) // shows the module path
        .with_level(true) // shows log level
        .init();
}
