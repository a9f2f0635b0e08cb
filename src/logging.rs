// File: src/logging.rs
use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber.
///
/// `-v` raises the level to info, `-vv` to debug. Without flags, `RUST_LOG`
/// wins over the configured default.
pub fn init(verbosity: u8, default_level: &str) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    // stdout stays clean for generated dialog
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .try_init()
    {
        // a subscriber is already installed; keep it
        tracing::debug!("log subscriber not replaced: {}", e);
    }
}
