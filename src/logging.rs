//! Tracing subscriber setup for the CLI.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a verbosity level (count of `-v` flags).
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "climcast=info",
        1 => "climcast=debug",
        _ => "climcast=trace",
    }
}

/// Installs a fmt subscriber writing to stderr. `RUST_LOG` takes precedence
/// over `verbosity`. Calling this more than once is a no-op.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // Fails only if a global subscriber is already set.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
