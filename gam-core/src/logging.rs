use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the process-wide subscriber. `RUST_LOG` wins over `default_level`.
///
/// Logs go to stderr so command output on stdout stays machine readable.
/// Calling it twice is harmless.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
