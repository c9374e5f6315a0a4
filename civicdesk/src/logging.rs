//! Log output for the binaries. Logs go to stderr; stdout carries the
//! conversation or the protocol.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

pub fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
