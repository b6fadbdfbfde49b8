//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable read before `RUST_LOG` for the log filter.
pub const LOG_ENV_VAR: &str = "API_MATRIX_LOG";

/// Installs the global subscriber. Logs go to stderr so console output and
/// reports stay clean. `--verbose` raises the default level to `debug`; an
/// explicit filter in the environment always wins.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = std::env::var(LOG_ENV_VAR)
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| EnvFilter::new(default_level),
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}
