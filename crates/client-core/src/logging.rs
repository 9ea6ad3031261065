//! Logging initialization for the client.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Initialize the logging system.
///
/// Sets up tracing with a formatted stderr layer. The filter comes from the
/// `RUST_LOG` env var when set, otherwise from the provided default level.
///
/// # Example
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("client started");
/// ```
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}
