//! Tracing/logging initialization

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the tracing subscriber based on configuration
///
/// Opt-in helper for binary consumers; library code only emits through
/// the `tracing` macros. `RUST_LOG` takes precedence over the configured
/// level when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true);
            subscriber.with(fmt_layer).try_init()?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer().with_target(true);
            subscriber.with(fmt_layer).try_init()?;
        }
    }

    Ok(())
}
