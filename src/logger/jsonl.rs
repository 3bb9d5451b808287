//! JSONL activity log: one self-contained JSON object per completed backend
//! operation.
//!
//! Lines are assembled in memory and written with a single `write_all`, so a
//! concurrent `tail -f` never sees a partial line.
//!
//! Degradation chain:
//! 1. Primary file path
//! 2. stderr with `[FINS-JSONL]` prefix
//! 3. Silent discard (an operation never fails because logging did)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{FinsError, Result};
use crate::dashboard::orchestrator::{Completion, CompletionResult, duration_ms};

/// A single activity record. Never carries credential data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Operation label (`process_folder`, `fetch_metadata`, ...).
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Fidelity mode of a metadata fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub ok: bool,
    pub duration_ms: u64,
    /// Outcome text as shown to the operator.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ActivityEntry {
    /// Summarize a completion, stamped with the current UTC time.
    #[must_use]
    pub fn from_completion(completion: &Completion) -> Self {
        let request = &completion.request;
        let message = match (&completion.result, completion.error()) {
            (_, Some(error)) => error.message().to_owned(),
            (CompletionResult::Processed(Ok(m)) | CompletionResult::Deleted(Ok(m)), None) => {
                m.clone()
            }
            (CompletionResult::Metadata(Ok(list)), None) => {
                format!("{} {} record(s)", list.len(), list.mode())
            }
            (CompletionResult::Analytics(Ok(view)), None) => format!(
                "{} age bucket(s), {} type bucket(s)",
                view.by_age.len(),
                view.by_type.len()
            ),
            _ => String::new(),
        };
        Self {
            ts: format_utc_now(),
            operation: request.operation().label().to_owned(),
            path: request.path().map(str::to_owned),
            mode: request.mode().map(|m| m.as_str().to_owned()),
            ok: completion.is_ok(),
            duration_ms: duration_ms(completion.elapsed),
            message,
            error_kind: completion.error().map(|e| e.kind().to_owned()),
        }
    }
}

/// Degradation state of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

/// Configuration for the activity log writer.
#[derive(Debug, Clone)]
pub struct ActivityLogConfig {
    pub path: PathBuf,
    /// Maximum file size before rotation (bytes). Default: 10 MiB.
    pub max_size_bytes: u64,
    /// Number of rotated files to keep. Default: 3.
    pub max_rotated_files: u32,
}

impl ActivityLogConfig {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

/// Append-only activity log with rotation and fallback.
pub struct ActivityLog {
    config: ActivityLogConfig,
    file: Option<File>,
    state: WriterState,
    bytes_written: u64,
}

impl ActivityLog {
    /// Open the log file. Falls through the degradation chain on failure.
    #[must_use]
    pub fn open(config: ActivityLogConfig) -> Self {
        let mut log = Self {
            config,
            file: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&log.config.path) {
            Ok((file, size)) => {
                log.file = Some(file);
                log.state = WriterState::Normal;
                log.bytes_written = size;
            }
            Err(error) => {
                let _ = writeln!(io::stderr(), "[FINS-JSONL] {error}; using stderr");
                log.state = WriterState::Stderr;
            }
        }
        log
    }

    /// A log that drops everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            config: ActivityLogConfig::new(PathBuf::new()),
            file: None,
            state: WriterState::Discard,
            bytes_written: 0,
        }
    }

    /// Write a single entry as one JSONL line.
    pub fn record(&mut self, entry: &ActivityEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[FINS-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    /// Current degradation state.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.state == WriterState::Normal
            && self.bytes_written > 0
            && self.bytes_written + len > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                let written = self
                    .file
                    .as_mut()
                    .is_some_and(|f| f.write_all(line.as_bytes()).is_ok());
                if written {
                    self.bytes_written += len;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[FINS-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.file = None;
        self.state = match self.state {
            WriterState::Normal => {
                let _ = writeln!(
                    io::stderr(),
                    "[FINS-JSONL] write to {} failed, using stderr",
                    self.config.path.display()
                );
                WriterState::Stderr
            }
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }

    fn rotate(&mut self) {
        self.file = None;
        let base = self.config.path.clone();

        // .N-1 → .N, ..., .1 → .2, current → .1
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        if self.config.max_rotated_files > 0 {
            let _ = rename(&base, rotated_name(&base, 1));
        } else {
            let _ = fs::remove_file(&base);
        }

        match open_append(&base) {
            Ok((file, size)) => {
                self.file = Some(file);
                self.bytes_written = size;
            }
            Err(_) => self.degrade(),
        }
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
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
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `activity.jsonl` → `activity.jsonl.2`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────────── tests ────────────────────────
