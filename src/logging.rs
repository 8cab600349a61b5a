use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. Logs go to stderr so the run summary on
/// stdout stays readable; `RUST_LOG` takes precedence over `verbosity`.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("roster_splitter={}", level)));

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
