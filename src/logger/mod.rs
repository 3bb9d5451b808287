//! Diagnostics via `tracing` plus the JSONL activity log.

#![allow(missing_docs)]

pub mod jsonl;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::errors::{FinsError, Result};

/// Where diagnostic output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticSink {
    /// One-shot commands.
    Stderr,
    /// Interactive dashboard; keeps the screen clean.
    File(PathBuf),
    Discard,
}

/// Parse an env-filter directive such as `info` or `file_insights=debug`.
pub fn parse_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level.trim()).map_err(|error| FinsError::InvalidConfig {
        details: format!("logging.level {level:?}: {error}"),
    })
}

/// Install the global `tracing` subscriber.
///
/// # Errors
/// Invalid filter directive, unopenable log file, or a subscriber that is
/// already installed.
pub fn init_tracing(level: &str, sink: &DiagnosticSink) -> Result<()> {
    let filter = parse_filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match sink {
        DiagnosticSink::Stderr => builder.with_writer(std::io::stderr).try_init(),
        DiagnosticSink::File(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|source| FinsError::io(parent, source))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| FinsError::io(path, source))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        DiagnosticSink::Discard => builder.with_writer(std::io::sink).try_init(),
    };
    installed.map_err(|error| FinsError::Runtime {
        details: format!("tracing subscriber: {error}"),
    })
}
