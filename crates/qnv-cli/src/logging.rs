//! Log output setup.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `QNV_LOG_FORMAT=json` switches to structured JSON lines.

use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Console,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Read `QNV_LOG_FORMAT` ("console" or "json", default console).
    pub fn from_env() -> Self {
        match std::env::var("QNV_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Console,
        }
    }
}

/// Install the global subscriber.
///
/// Without `-v` flags `RUST_LOG` is honored, falling back to `warn`.
pub fn init(verbose: u8, format: LogFormat) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Console => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
