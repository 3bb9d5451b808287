#![forbid(unsafe_code)]

//! File Insights: operator dashboard for a remote file-indexing service.
//!
//! The service ingests folders, serves per-file metadata at two levels of
//! detail, resets indexed state, and reports file-count distributions. This
//! crate holds the client-side core:
//! 1. **Backend**: typed access to the five HTTP endpoints
//! 2. **Dashboard**: per-section state and request orchestration
//! 3. **Presentation**: pure line rendering plus a terminal runtime (`cli` feature)
//!
//! # Library usage
//!
//! ```rust,no_run
//! use file_insights::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use file_insights::core::config::Config;
//! use file_insights::backend::http::HttpBackend;
//! ```

pub mod prelude;

pub mod backend;
pub mod core;
pub mod dashboard;
pub mod logger;
