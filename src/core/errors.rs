//! FINS-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, FinsError>;

/// Top-level fault type for File Insights.
///
/// Operation outcomes shown to the operator (empty path, backend failure,
/// empty result) are not faults; see `dashboard::orchestrator::OperationError`.
#[derive(Debug, Error)]
pub enum FinsError {
    #[error("[FINS-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[FINS-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[FINS-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[FINS-2001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[FINS-2101] HTTP client setup failure: {details}")]
    HttpClient { details: String },

    #[error("[FINS-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[FINS-3002] terminal failure: {source}")]
    Terminal {
        #[source]
        source: std::io::Error,
    },

    #[error("[FINS-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl FinsError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "FINS-1001",
            Self::MissingConfig { .. } => "FINS-1002",
            Self::ConfigParse { .. } => "FINS-1003",
            Self::Serialization { .. } => "FINS-2001",
            Self::HttpClient { .. } => "FINS-2101",
            Self::Io { .. } => "FINS-3001",
            Self::Terminal { .. } => "FINS-3002",
            Self::Runtime { .. } => "FINS-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Terminal { .. } | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for FinsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for FinsError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for FinsError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for FinsError {
    fn from(value: reqwest::Error) -> Self {
        Self::HttpClient {
            details: value.to_string(),
        }
    }
}
