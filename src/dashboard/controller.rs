//! Top-level composition of the dashboard core.
//!
//! [`DashboardController`] exclusively owns the model (and through it the
//! credential store), the request orchestrator and the activity log. The
//! presentation layer reads [`DashboardSnapshot`]s and drives the controller
//! through messages or the awaited convenience actions.

#![allow(missing_docs)]

use serde::Serialize;
use tracing::debug;

use super::analytics::AnalyticsView;
use super::credentials::Credential;
use super::model::{
    DashboardCmd, DashboardModel, DashboardMsg, FidelityMode, Operation, Outcome, Section,
};
use super::normalizer::{MetadataList, TimestampStyle};
use super::orchestrator::{self, Completion, Request, RequestOrchestrator};
use super::update::update;
use crate::backend::Backend;
use crate::core::config::Config;
use crate::logger::jsonl::{ActivityEntry, ActivityLog, ActivityLogConfig};

pub struct DashboardController<B> {
    model: DashboardModel,
    orchestrator: RequestOrchestrator<B>,
    activity: ActivityLog,
}

impl<B: Backend> DashboardController<B> {
    #[must_use]
    pub fn new(
        model: DashboardModel,
        orchestrator: RequestOrchestrator<B>,
        activity: ActivityLog,
    ) -> Self {
        Self {
            model,
            orchestrator,
            activity,
        }
    }

    /// Build a controller with initial state, timestamp style and activity
    /// log taken from configuration.
    #[must_use]
    pub fn from_config(backend: B, config: &Config) -> Self {
        let model = DashboardModel::new(
            config.dashboard.start_section,
            config.dashboard.default_fidelity,
            config.dashboard.auto_fetch_analytics,
        );
        let orchestrator =
            RequestOrchestrator::new(backend, TimestampStyle::from(&config.display));
        let activity = if config.logging.activity_log_enabled {
            ActivityLog::open(ActivityLogConfig::new(&config.logging.activity_log))
        } else {
            ActivityLog::disabled()
        };
        Self::new(model, orchestrator, activity)
    }

    #[must_use]
    pub fn model(&self) -> &DashboardModel {
        &self.model
    }

    #[must_use]
    pub fn orchestrator(&self) -> &RequestOrchestrator<B> {
        &self.orchestrator
    }

    #[must_use]
    pub fn activity_log(&self) -> &ActivityLog {
        &self.activity
    }

    /// Apply a message. Completions are recorded in the activity log.
    pub fn dispatch(&mut self, msg: DashboardMsg) -> DashboardCmd {
        if let DashboardMsg::Completed(completion) = &msg {
            self.activity.record(&ActivityEntry::from_completion(completion));
        }
        update(&mut self.model, msg)
    }

    /// Run an issued request to completion and apply it.
    pub async fn execute(&mut self, request: Request) {
        let completion = self.orchestrator.execute(request).await;
        self.complete(completion);
    }

    /// Apply a completion produced elsewhere (e.g. a spawned task).
    pub fn complete(&mut self, completion: Completion) {
        self.dispatch(DashboardMsg::Completed(completion));
    }

    /// Make a section visible without triggering navigation side-effects.
    pub fn show(&mut self, section: Section) {
        self.model.navigate_to(section);
    }

    pub async fn process_folder(&mut self, path: &str) -> Outcome {
        self.model.section_mut(Section::Process).input = path.to_owned();
        self.perform(Operation::ProcessFolder).await
    }

    /// Selecting a different `mode` clears the displayed listing first.
    pub async fn fetch_metadata(&mut self, path: &str, mode: FidelityMode) -> Outcome {
        self.model.set_fidelity(mode);
        self.model.section_mut(Section::FindMetadata).input = path.to_owned();
        self.perform(Operation::FetchMetadata).await
    }

    pub async fn delete_metadata(&mut self, path: &str) -> Outcome {
        self.model.section_mut(Section::Delete).input = path.to_owned();
        self.perform(Operation::DeleteMetadata).await
    }

    pub async fn fetch_analytics(&mut self) -> Outcome {
        self.perform(Operation::FetchAnalytics).await
    }

    /// Expand every row of a displayed advanced listing.
    pub fn expand_all_rows(&mut self) -> usize {
        self.model.expand_all_rows()
    }

    pub fn save_credential(&mut self, record: Credential) {
        self.dispatch(DashboardMsg::SaveCredential(record));
    }

    /// Remove by position. Out-of-range indices are ignored.
    pub fn remove_credential(&mut self, index: usize) -> Option<Credential> {
        let removed = self.model.credentials.remove(index);
        self.model.clamp_credential_cursor();
        removed
    }

    async fn perform(&mut self, op: Operation) -> Outcome {
        match orchestrator::begin(&mut self.model, op) {
            Some(request) => self.execute(request).await,
            None => debug!(operation = op.label(), "no request issued"),
        }
        self.model.section(op.section()).outcome.clone()
    }

    /// Read-only view of everything the presentation layer may show.
    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot::of(&self.model)
    }
}

// ──────────────────── snapshot ────────────────────

/// Serializable outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeView {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl From<&Outcome> for OutcomeView {
    fn from(outcome: &Outcome) -> Self {
        Self {
            state: outcome.label(),
            message: outcome.message().map(str::to_owned),
            error_kind: match outcome {
                Outcome::Failed(error) => Some(error.kind()),
                _ => None,
            },
        }
    }
}

/// Credential as the view may show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialView {
    pub host: String,
    pub username: String,
    pub secret: &'static str,
    pub share_path: String,
}

impl From<&Credential> for CredentialView {
    fn from(record: &Credential) -> Self {
        Self {
            host: record.host.clone(),
            username: record.username.clone(),
            secret: record.masked_secret(),
            share_path: record.share_path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub active_section: Section,
    pub loading: bool,
    pub outcome: OutcomeView,
    pub fidelity: FidelityMode,
    pub metadata: Option<MetadataList>,
    pub expanded_rows: Vec<usize>,
    pub analytics: AnalyticsView,
    pub credentials: Vec<CredentialView>,
}

impl DashboardSnapshot {
    #[must_use]
    pub fn of(model: &DashboardModel) -> Self {
        Self {
            active_section: model.active,
            loading: model.is_loading(),
            outcome: OutcomeView::from(model.active_outcome()),
            fidelity: model.fidelity,
            metadata: model.metadata.clone(),
            expanded_rows: model.expanded_rows.iter().copied().collect(),
            analytics: model.analytics.clone(),
            credentials: model.credentials.iter().map(CredentialView::from).collect(),
        }
    }
}
