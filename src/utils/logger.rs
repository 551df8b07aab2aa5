//! Logging setup
//!
//! One tracing subscriber for the binary: a compact stderr layer plus an
//! optional append-only file layer.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "info,execwarden=debug";

/// Initialise the global subscriber
///
/// # Arguments
/// * `log_level` - filter directive; falls back to `RUST_LOG`, then [`DEFAULT_FILTER`]
/// * `log_file` - also append plain-text logs here
///
/// # Examples
/// ```no_run
/// use execwarden::utils::logger::init_logger;
///
/// init_logger(Some("warn"), None).unwrap();
/// ```
pub fn init_logger(log_level: Option<&str>, log_file: Option<PathBuf>) -> Result<()> {
    let env_filter = build_filter(log_level)?;

    // stdout carries the child's response body, so logs go to stderr
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if let Some(log_path) = log_file {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(std::sync::Arc::new(file))
            .with_target(true)
            .with_ansi(false)
            .with_level(true);

        registry.with(file_layer).try_init()?;
    } else {
        registry.try_init()?;
    }

    Ok(())
}

/// Explicit directive, else `RUST_LOG`, else [`DEFAULT_FILTER`]
fn build_filter(log_level: Option<&str>) -> Result<EnvFilter> {
    Ok(match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        assert!(build_filter(None).is_ok());
    }

    #[test]
    fn test_explicit_level() {
        assert!(build_filter(Some("warn")).is_ok());
        assert!(build_filter(Some("execwarden=loud")).is_err());
    }
}
