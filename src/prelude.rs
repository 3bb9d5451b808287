//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use file_insights::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{FinsError, Result};

// Backend
pub use crate::backend::http::HttpBackend;
pub use crate::backend::{Backend, TransportError, TransportErrorKind};

// Dashboard
pub use crate::dashboard::analytics::{AnalyticsView, Series};
pub use crate::dashboard::controller::{DashboardController, DashboardSnapshot};
pub use crate::dashboard::credentials::{Credential, CredentialStore};
pub use crate::dashboard::model::{FidelityMode, Outcome, Section};
pub use crate::dashboard::normalizer::{FileRecordAdvanced, FileRecordBasic, MetadataList};
pub use crate::dashboard::orchestrator::{OperationError, RequestOrchestrator};

// Logging
pub use crate::logger::jsonl::{ActivityEntry, ActivityLog};
