//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for command output. `RUST_LOG`
//! overrides `logging.filter` when set.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_env_filter(config)?;

    let layer = match config.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        _ => fmt::layer()
            .with_target(false)
            .with_ansi(atty::is(atty::Stream::Stderr))
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .context("failed to initialize tracing subscriber")
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .with_context(|| format!("failed to parse RUST_LOG '{}'", directives)),
        _ => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("failed to parse logging.filter '{}'", config.filter)),
    }
}
