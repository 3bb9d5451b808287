//! Request lifecycle for the four backend operations.
//!
//! An operation runs in three steps:
//! 1. [`begin`]: reset the section's previous outcome and result slot,
//!    validate input, mark the section loading, and produce a [`Request`].
//! 2. [`RequestOrchestrator::execute`]: perform the backend call(s) and
//!    normalize the response into a [`Completion`].
//! 3. [`finish`]: apply the completion to the model, leaving the section
//!    in a terminal outcome.
//!
//! Steps 1 and 3 are pure model mutations; only step 2 does I/O. Every
//! issued request yields exactly one completion, so loading is always
//! cleared.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::analytics::AnalyticsView;
use super::model::{DashboardModel, FidelityMode, Operation, Outcome};
use super::normalizer::{self, MetadataList, TimestampStyle};
use crate::backend::{Backend, TransportError};

pub const PROCESS_SUCCESS: &str = "Folder processed successfully!";
pub const PROCESS_FAILURE: &str = "Error processing folder.";
pub const FETCH_FAILURE: &str = "Error fetching metadata.";
pub const DELETE_SUCCESS: &str = "Metadata deleted successfully!";
pub const DELETE_FAILURE: &str = "Error deleting metadata.";
pub const ANALYTICS_SUCCESS: &str = "Analytics loaded.";
pub const ANALYTICS_FAILURE: &str = "Error fetching analytics data.";

const DELETE_FAILURE_PREFIX: &str = "Error deleting metadata";

/// Operator-facing failure of a single operation.
///
/// Always recovered into a section outcome; never a process fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// Required input missing; no request was issued.
    #[error("{0}")]
    Validation(String),
    /// Network or server failure.
    #[error("{0}")]
    Transport(String),
    /// Well-formed, successful, but empty response.
    #[error("{0}")]
    EmptyResult(String),
}

impl OperationError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::Transport(m) | Self::EmptyResult(m) => m,
        }
    }

    /// Stable label for logs and JSON output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport(_) => "transport",
            Self::EmptyResult(_) => "empty_result",
        }
    }
}

/// A validated backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ProcessFolder { path: String },
    FetchMetadata { path: String, mode: FidelityMode },
    DeleteMetadata { path: String },
    FetchAnalytics,
}

impl Request {
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::ProcessFolder { .. } => Operation::ProcessFolder,
            Self::FetchMetadata { .. } => Operation::FetchMetadata,
            Self::DeleteMetadata { .. } => Operation::DeleteMetadata,
            Self::FetchAnalytics => Operation::FetchAnalytics,
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::ProcessFolder { path }
            | Self::FetchMetadata { path, .. }
            | Self::DeleteMetadata { path } => Some(path),
            Self::FetchAnalytics => None,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Option<FidelityMode> {
        match self {
            Self::FetchMetadata { mode, .. } => Some(*mode),
            _ => None,
        }
    }
}

/// Normalized result of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    Processed(Result<String, OperationError>),
    Metadata(Result<MetadataList, OperationError>),
    Deleted(Result<String, OperationError>),
    Analytics(Result<AnalyticsView, OperationError>),
}

/// A finished request, ready to be applied by [`finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub request: Request,
    pub elapsed: Duration,
    pub result: CompletionResult,
}

impl Completion {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error().is_none()
    }

    #[must_use]
    pub fn error(&self) -> Option<&OperationError> {
        match &self.result {
            CompletionResult::Processed(r) | CompletionResult::Deleted(r) => r.as_ref().err(),
            CompletionResult::Metadata(r) => r.as_ref().err(),
            CompletionResult::Analytics(r) => r.as_ref().err(),
        }
    }
}

// ──────────────────── lifecycle ────────────────────

/// Start `op` from the current model state.
///
/// Returns `None` when no request must be issued: either the section is
/// already loading (the new invocation is ignored) or validation failed,
/// in which case the section holds a `Validation` failure.
pub fn begin(model: &mut DashboardModel, op: Operation) -> Option<Request> {
    let section = op.section();
    if model.section(section).outcome.is_loading() {
        debug!(operation = op.label(), "ignored: already in flight");
        return None;
    }

    reset(model, op);
    model.section_mut(section).outcome = Outcome::Loading;

    match validate(model, op) {
        Ok(request) => Some(request),
        Err(error) => {
            debug!(operation = op.label(), "validation failed");
            model.section_mut(section).outcome = Outcome::Failed(error);
            None
        }
    }
}

/// Clear the previous outcome and the result slot `op` owns.
///
/// Processing or deleting changes indexed state, so any displayed listing
/// is dropped together with its "Found N files" banner.
fn reset(model: &mut DashboardModel, op: Operation) {
    model.section_mut(op.section()).outcome = Outcome::Idle;
    match op {
        Operation::ProcessFolder | Operation::DeleteMetadata => model.drop_listing(),
        Operation::FetchMetadata => model.clear_metadata(),
        Operation::FetchAnalytics => model.analytics = AnalyticsView::default(),
    }
}

fn validate(model: &DashboardModel, op: Operation) -> Result<Request, OperationError> {
    let path = model.section(op.section()).input.trim();
    let missing = |action: &str| {
        OperationError::Validation(format!("Please enter a folder path to {action}."))
    };
    match op {
        Operation::ProcessFolder if path.is_empty() => Err(missing("process")),
        Operation::FetchMetadata if path.is_empty() => Err(missing("fetch metadata")),
        Operation::DeleteMetadata if path.is_empty() => Err(missing("delete metadata")),
        Operation::ProcessFolder => Ok(Request::ProcessFolder {
            path: path.to_owned(),
        }),
        Operation::FetchMetadata => Ok(Request::FetchMetadata {
            path: path.to_owned(),
            mode: model.fidelity,
        }),
        Operation::DeleteMetadata => Ok(Request::DeleteMetadata {
            path: path.to_owned(),
        }),
        Operation::FetchAnalytics => Ok(Request::FetchAnalytics),
    }
}

/// Apply a completion. Results are applied even when their section is no
/// longer visible, except a metadata listing whose fidelity differs from the
/// currently selected one, which is dropped.
pub fn finish(model: &mut DashboardModel, completion: Completion) {
    let section = completion.request.operation().section();
    let outcome = match completion.result {
        CompletionResult::Processed(result) | CompletionResult::Deleted(result) => {
            result.map_or_else(Outcome::Failed, Outcome::Succeeded)
        }
        CompletionResult::Metadata(result) => {
            let requested = completion.request.mode().unwrap_or(model.fidelity);
            if requested == model.fidelity {
                apply_metadata(model, result)
            } else {
                debug!(
                    requested = requested.as_str(),
                    selected = model.fidelity.as_str(),
                    "dropping metadata for a deselected fidelity"
                );
                Outcome::Idle
            }
        }
        CompletionResult::Analytics(result) => match result {
            Ok(view) => {
                model.analytics = view;
                Outcome::Succeeded(ANALYTICS_SUCCESS.to_owned())
            }
            Err(error) => {
                model.analytics = AnalyticsView::default();
                Outcome::Failed(error)
            }
        },
    };
    model.section_mut(section).outcome = outcome;
}

fn apply_metadata(
    model: &mut DashboardModel,
    result: Result<MetadataList, OperationError>,
) -> Outcome {
    model.clear_metadata();
    match result {
        Ok(list) => {
            let message = match list.len() {
                1 => format!("Found 1 file ({} metadata).", list.mode()),
                n => format!("Found {n} files ({} metadata).", list.mode()),
            };
            model.metadata = Some(list);
            Outcome::Succeeded(message)
        }
        Err(error) => Outcome::Failed(error),
    }
}

// ──────────────────── execution ────────────────────

/// Executes validated requests against a [`Backend`].
#[derive(Debug, Clone)]
pub struct RequestOrchestrator<B> {
    backend: B,
    style: TimestampStyle,
}

impl<B: Backend> RequestOrchestrator<B> {
    #[must_use]
    pub fn new(backend: B, style: TimestampStyle) -> Self {
        Self { backend, style }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Perform the backend call(s) for `request`. Never fails: transport
    /// problems become an `OperationError` inside the completion.
    pub async fn execute(&self, request: Request) -> Completion {
        let started = Instant::now();
        info!(
            operation = request.operation().label(),
            path = request.path().unwrap_or(""),
            "issuing request"
        );
        let result = match &request {
            Request::ProcessFolder { path } => {
                CompletionResult::Processed(self.process(path).await)
            }
            Request::FetchMetadata { path, mode } => {
                CompletionResult::Metadata(self.metadata(path, *mode).await)
            }
            Request::DeleteMetadata { path } => CompletionResult::Deleted(self.delete(path).await),
            Request::FetchAnalytics => CompletionResult::Analytics(self.analytics().await),
        };
        let completion = Completion {
            request,
            elapsed: started.elapsed(),
            result,
        };
        info!(
            operation = completion.request.operation().label(),
            ok = completion.is_ok(),
            elapsed_ms = duration_ms(completion.elapsed),
            "request finished"
        );
        completion
    }

    async fn process(&self, path: &str) -> Result<String, OperationError> {
        match self.backend.process_folder(path).await {
            Ok(response) => Ok(response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| PROCESS_SUCCESS.to_owned())),
            Err(error) => Err(transport_failure("process_folder", error, PROCESS_FAILURE)),
        }
    }

    async fn metadata(
        &self,
        path: &str,
        mode: FidelityMode,
    ) -> Result<MetadataList, OperationError> {
        match self.backend.fetch_metadata(path, mode).await {
            Ok(raw) if raw.is_empty() => Err(OperationError::EmptyResult(format!(
                "No {mode} metadata found for the specified folder path."
            ))),
            Ok(raw) => Ok(normalizer::normalize(&raw, &self.style)),
            Err(error) => Err(transport_failure("fetch_metadata", error, FETCH_FAILURE)),
        }
    }

    async fn delete(&self, path: &str) -> Result<String, OperationError> {
        match self.backend.reset_index(path).await {
            Ok(()) => Ok(DELETE_SUCCESS.to_owned()),
            Err(error) => {
                warn!(operation = "delete_metadata", %error, "backend call failed");
                let message = match error.body {
                    Some(body) => format!("{DELETE_FAILURE_PREFIX}: {body}"),
                    None => DELETE_FAILURE.to_owned(),
                };
                Err(OperationError::Transport(message))
            }
        }
    }

    /// Both calls are awaited before the operation completes; any failure
    /// leaves both series empty.
    async fn analytics(&self) -> Result<AnalyticsView, OperationError> {
        let (by_age, by_type) = tokio::join!(
            self.backend.analytics_by_age(),
            self.backend.analytics_by_type()
        );
        match (by_age, by_type) {
            (Ok(age), Ok(kind)) => Ok(AnalyticsView::from_distributions(&age, &kind)),
            (age, kind) => {
                if let Err(error) = &age {
                    warn!(operation = "analytics_by_age", %error, "backend call failed");
                }
                if let Err(error) = &kind {
                    warn!(operation = "analytics_by_type", %error, "backend call failed");
                }
                Err(OperationError::Transport(ANALYTICS_FAILURE.to_owned()))
            }
        }
    }
}

fn transport_failure(
    operation: &'static str,
    error: TransportError,
    fallback: &str,
) -> OperationError {
    warn!(operation, %error, "backend call failed");
    OperationError::Transport(
        error
            .server_message
            .unwrap_or_else(|| fallback.to_owned()),
    )
}

/// Whole milliseconds, saturating.
#[must_use]
pub fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::model::Section;
    use crate::dashboard::normalizer::FileRecordAdvanced;

    fn completion(request: Request, result: CompletionResult) -> Completion {
        Completion {
            request,
            elapsed: Duration::from_millis(5),
            result,
        }
    }

    #[test]
    fn blank_path_fails_validation_without_request() {
        let mut model = DashboardModel::default();
        model.section_mut(Section::Process).input = "   ".into();
        assert!(begin(&mut model, Operation::ProcessFolder).is_none());
        let outcome = &model.section(Section::Process).outcome;
        assert!(matches!(outcome, Outcome::Failed(OperationError::Validation(_))));
        assert!(!model.is_loading());
    }

    #[test]
    fn each_path_operation_validates() {
        for op in [
            Operation::ProcessFolder,
            Operation::FetchMetadata,
            Operation::DeleteMetadata,
        ] {
            let mut model = DashboardModel::default();
            assert!(begin(&mut model, op).is_none(), "{op:?} must not issue");
            assert!(matches!(
                model.section(op.section()).outcome,
                Outcome::Failed(OperationError::Validation(_))
            ));
        }
    }

    #[test]
    fn begin_trims_path_and_sets_loading() {
        let mut model = DashboardModel::default();
        model.section_mut(Section::FindMetadata).input = "  /data  ".into();
        model.fidelity = FidelityMode::Advanced;
        let request = begin(&mut model, Operation::FetchMetadata).unwrap();
        assert_eq!(
            request,
            Request::FetchMetadata {
                path: "/data".into(),
                mode: FidelityMode::Advanced
            }
        );
        assert!(model.section(Section::FindMetadata).outcome.is_loading());
    }

    #[test]
    fn begin_resets_previous_message_and_result() {
        let mut model = DashboardModel::default();
        model.section_mut(Section::FindMetadata).input = "/data".into();
        model.section_mut(Section::FindMetadata).outcome =
            Outcome::Failed(OperationError::Transport("old".into()));
        model.metadata = Some(MetadataList::Advanced(vec![FileRecordAdvanced {
            file_name: "a".into(),
            file_path: "/a".into(),
            attributes: Default::default(),
        }]));
        model.expanded_rows.insert(0);
        begin(&mut model, Operation::FetchMetadata).unwrap();
        assert!(model.metadata.is_none());
        assert!(model.expanded_rows.is_empty());
        assert_eq!(model.section(Section::FindMetadata).outcome, Outcome::Loading);
    }

    #[test]
    fn begin_while_loading_is_ignored() {
        let mut model = DashboardModel::default();
        assert!(begin(&mut model, Operation::FetchAnalytics).is_some());
        assert!(begin(&mut model, Operation::FetchAnalytics).is_none());
        assert!(model.section(Section::Analytics).outcome.is_loading());
    }

    #[test]
    fn analytics_begin_clears_previous_series() {
        let mut model = DashboardModel::default();
        model.analytics.by_age.labels.push("old".into());
        model.analytics.by_age.values.push(1);
        begin(&mut model, Operation::FetchAnalytics).unwrap();
        assert!(model.analytics.is_empty());
    }

    #[test]
    fn finish_applies_success_and_clears_loading() {
        let mut model = DashboardModel::default();
        model.section_mut(Section::Delete).input = "/d".into();
        let request = begin(&mut model, Operation::DeleteMetadata).unwrap();
        finish(
            &mut model,
            completion(request, CompletionResult::Deleted(Ok(DELETE_SUCCESS.into()))),
        );
        assert_eq!(
            model.section(Section::Delete).outcome,
            Outcome::Succeeded(DELETE_SUCCESS.into())
        );
        assert!(!model.is_loading());
    }

    #[test]
    fn begin_delete_drops_listing_and_found_banner() {
        let mut model = DashboardModel::default();
        model.metadata = Some(MetadataList::Basic(Vec::new()));
        model.section_mut(Section::FindMetadata).outcome =
            Outcome::Succeeded("Found 2 files (basic metadata).".into());
        model.section_mut(Section::Delete).input = "/d".into();

        assert!(begin(&mut model, Operation::DeleteMetadata).is_some());
        assert!(model.metadata.is_none());
        assert_eq!(model.section(Section::FindMetadata).outcome, Outcome::Idle);
        assert_eq!(model.section(Section::Delete).outcome, Outcome::Loading);
    }

    #[test]
    fn finish_drops_metadata_of_deselected_fidelity() {
        let mut model = DashboardModel::default();
        model.section_mut(Section::FindMetadata).input = "/d".into();
        let request = begin(&mut model, Operation::FetchMetadata).unwrap();
        model.set_fidelity(FidelityMode::Advanced);
        finish(
            &mut model,
            completion(
                request,
                CompletionResult::Metadata(Ok(MetadataList::Basic(Vec::new()))),
            ),
        );
        assert!(model.metadata.is_none());
        assert_eq!(model.section(Section::FindMetadata).outcome, Outcome::Idle);
    }

    #[test]
    fn finish_applies_results_for_hidden_sections() {
        let mut model = DashboardModel::default();
        let request = begin(&mut model, Operation::FetchAnalytics).unwrap();
        model.navigate_to(Section::Datasources);
        finish(
            &mut model,
            completion(
                request,
                CompletionResult::Analytics(Err(OperationError::Transport(
                    ANALYTICS_FAILURE.into(),
                ))),
            ),
        );
        assert!(matches!(
            model.section(Section::Analytics).outcome,
            Outcome::Failed(_)
        ));
        assert!(model.analytics.is_empty());
    }

    #[test]
    fn operation_error_kinds() {
        assert_eq!(OperationError::Validation("x".into()).kind(), "validation");
        assert_eq!(OperationError::Transport("x".into()).kind(), "transport");
        assert_eq!(OperationError::EmptyResult("x".into()).kind(), "empty_result");
        assert_eq!(OperationError::EmptyResult("msg".into()).to_string(), "msg");
    }

    #[test]
    fn duration_ms_truncates() {
        assert_eq!(duration_ms(Duration::from_micros(2_999)), 2);
    }
}
