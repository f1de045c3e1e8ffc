use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: human-readable on stderr, JSON in `logs/depict.log.*`.
///
/// `RUST_LOG` overrides the default `info` level for this crate.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let (json_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily("logs", "depict.log"));

    // stdout is reserved for command output
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
    let json_layer = fmt::layer().json().with_writer(json_writer);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("depict_control=info,depict=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(json_layer)
        .init();

    // The CLI logs until exit; dropping the guard would stop the file writer
    std::mem::forget(guard);
}
