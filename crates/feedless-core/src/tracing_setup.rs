use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable naming an optional debug log file.
pub const LOG_FILE_ENV: &str = "FEEDLESS_LOG_FILE";

pub fn init_tracing() {
    init_tracing_with_service("feedless");
}

/// Installs the global subscriber: human-readable output on stderr filtered
/// by `RUST_LOG` (default `info`), plus a debug-level file layer when
/// `FEEDLESS_LOG_FILE` is set. A second call is a no-op.
pub fn init_tracing_with_service(service_name: &str) {
    let file_logging = std::env::var(LOG_FILE_ENV).ok();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file_layer = file_logging.as_deref().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
            ),
            Err(err) => {
                eprintln!("Failed to open log file {log_path}: {err}");
                None
            }
        }
    });
    let file_enabled = file_layer.is_some();

    let installed = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(service = service_name, "Tracing initialized");
        if let (true, Some(log_path)) = (file_enabled, file_logging) {
            eprintln!("File logging enabled: {}", log_path);
        }
    }
}
