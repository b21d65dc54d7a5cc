//! Logging
//!
//! Two separate streams:
//! - `tracing` diagnostics on stderr, for developers (`--verbose`, `RUST_LOG`)
//! - `ActivityLog`, the bounded user-facing record of sends and connection changes

pub mod entry;
pub mod store;

pub use entry::{LogEntry, LogKind};
pub use store::ActivityLog;

/// Initialize tracing output
///
/// Call early in main() before any logging occurs.
/// `RUST_LOG` wins when set; otherwise `warn`, or `debug` with `verbose`.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(filter)
        .try_init();
}
