//! Transport boundary to the remote file-indexing service.
//!
//! The dashboard core talks to the backend exclusively through the
//! [`Backend`] trait. Response payloads are modeled as partial wire types
//! (see [`wire`]) and are normalized by the dashboard before they reach any
//! view state.

#![allow(missing_docs)]

pub mod http;
pub mod wire;

use std::fmt;
use std::future::Future;

use crate::dashboard::model::FidelityMode;

pub use http::HttpBackend;
pub use wire::{
    ProcessResponse, RawAdvancedRecord, RawBasicRecord, RawDistribution, RawMetadata,
};

/// Default base URL of the indexing service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// `POST`: ingest a folder (`folderPath`).
pub const PROCESS_PATH: &str = "/api/files/process";
/// `GET`: per-file metadata (`folderPath`, `type`).
pub const METADATA_PATH: &str = "/api/files/metadata";
/// `DELETE`: drop indexed state for a folder (`folderPath`).
pub const RESET_INDEX_PATH: &str = "/api/files/reset-index";
/// `GET`: file count per age bucket.
pub const ANALYTICS_BY_AGE_PATH: &str = "/api/analytics/by-age";
/// `GET`: file count per type bucket.
pub const ANALYTICS_BY_TYPE_PATH: &str = "/api/analytics/by-type";

/// Coarse classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection could not be established.
    Connect,
    /// Request or connect timeout elapsed.
    Timeout,
    /// The server answered with a non-success status.
    Status,
    /// Success status but the body did not match the expected shape.
    Decode,
    /// Anything else reported by the HTTP stack.
    Other,
}

impl TransportErrorKind {
    /// Stable lowercase label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Status => "status",
            Self::Decode => "decode",
            Self::Other => "other",
        }
    }
}

/// A network or server failure for a single backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Failure classification.
    pub kind: TransportErrorKind,
    /// HTTP status when the server answered.
    pub status: Option<u16>,
    /// Raw, non-empty response body when the server sent one.
    pub body: Option<String>,
    /// `message` (or `error`) string extracted from a JSON error body.
    pub server_message: Option<String>,
    /// Diagnostic detail from the HTTP stack (never shown verbatim to operators).
    pub detail: String,
}

impl TransportError {
    /// Failure without any server-supplied payload.
    #[must_use]
    pub fn new(kind: TransportErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            body: None,
            server_message: None,
            detail: detail.into(),
        }
    }

    /// Non-success HTTP answer. Extracts a server message from a JSON body.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        let body = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        let server_message = body.as_deref().and_then(wire::server_message_from_body);
        Self {
            kind: TransportErrorKind::Status,
            status: Some(status),
            body,
            server_message,
            detail: format!("HTTP {status}"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure: {}", self.kind.label(), self.detail)?;
        if let Some(body) = &self.body {
            write!(f, " ({body})")?;
        }
        Ok(())
    }
}

impl std::error::Error for TransportError {}

/// Result alias for a single backend call.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// The five endpoints consumed by the dashboard.
///
/// Implementations must be cheap to share: the terminal runtime clones the
/// backend into every spawned request.
pub trait Backend: Send + Sync {
    /// Ask the service to ingest `folder_path`.
    fn process_folder(
        &self,
        folder_path: &str,
    ) -> impl Future<Output = TransportResult<ProcessResponse>> + Send;

    /// Retrieve per-file metadata for `folder_path` at the given fidelity.
    fn fetch_metadata(
        &self,
        folder_path: &str,
        mode: FidelityMode,
    ) -> impl Future<Output = TransportResult<RawMetadata>> + Send;

    /// Delete indexed state for `folder_path`.
    fn reset_index(&self, folder_path: &str) -> impl Future<Output = TransportResult<()>> + Send;

    /// File counts per age bucket.
    fn analytics_by_age(&self) -> impl Future<Output = TransportResult<RawDistribution>> + Send;

    /// File counts per type bucket.
    fn analytics_by_type(&self) -> impl Future<Output = TransportResult<RawDistribution>> + Send;
}
