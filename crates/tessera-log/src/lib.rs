//! Tracing setup for tessera
//!
//! The library crates only emit `tracing` events. Installing a subscriber
//! is left to the application, which calls one of the `init_*` functions
//! here once at startup. Tests call [`init_tracing_test`], which tolerates
//! being called from many tests in one process.

use serde::{Deserialize, Serialize};

pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};
pub use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Output format of the installed subscriber
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Human readable single-line output
    Compact,
}

/// Logging settings, usually read from the application config
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `tessera_client=debug,info`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Install a subscriber from `config`; `RUST_LOG` wins over `config.level`
pub fn init_with_config(config: &LogConfig) -> Result<(), InitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .try_init()?,
        LogFormat::Compact => registry
            .with(fmt::layer().with_target(true).compact())
            .try_init()?,
    }

    Ok(())
}

/// JSON output filtered by `RUST_LOG`, defaulting to `info`
pub fn init_tracing() -> Result<(), InitError> {
    init_with_config(&LogConfig::default())
}

/// JSON output with an explicit filter directive
pub fn init_tracing_with_level(level: &str) -> Result<(), InitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
        .try_init()?;

    Ok(())
}

/// Debug-level output captured by the test harness
///
/// A second call in the same process is a no-op.
pub fn init_tracing_test() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();
}
