//! Elm-style state model for the operator dashboard.
//!
//! All display state lives in [`DashboardModel`]. User actions and backend
//! completions arrive as [`DashboardMsg`] values; side-effects are represented
//! as [`DashboardCmd`] values returned from the update function.
//!
//! **Design invariant:** no I/O happens in this module.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::analytics::AnalyticsView;
use super::credentials::{Credential, CredentialStore};
use super::normalizer::MetadataList;
use super::orchestrator::{Completion, OperationError, Request};

// ──────────────────── sections ────────────────────

/// Top-level sections of the dashboard. Exactly one is visible at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Trigger folder ingestion.
    #[default]
    Process,
    /// Retrieve per-file metadata.
    FindMetadata,
    /// Delete indexed state for a folder.
    Delete,
    /// Age/type distributions.
    Analytics,
    /// Capture-only datasource credentials.
    Datasources,
}

/// Total number of sections (used for prev/next wrapping).
pub const SECTION_COUNT: usize = 5;

impl Section {
    /// All sections in navigation order.
    pub const ALL: [Self; SECTION_COUNT] = [
        Self::Process,
        Self::FindMetadata,
        Self::Delete,
        Self::Analytics,
        Self::Datasources,
    ];

    /// Zero-based position in navigation order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Process => 0,
            Self::FindMetadata => 1,
            Self::Delete => 2,
            Self::Analytics => 3,
            Self::Datasources => 4,
        }
    }

    /// 1-based section number for hotkey mapping.
    #[must_use]
    pub const fn number(self) -> u8 {
        // index() < SECTION_COUNT, which fits in u8.
        #[allow(clippy::cast_possible_truncation)]
        let n = self.index() as u8;
        n + 1
    }

    /// Resolve a 1-based number key to a section. Returns `None` for out-of-range.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Process),
            2 => Some(Self::FindMetadata),
            3 => Some(Self::Delete),
            4 => Some(Self::Analytics),
            5 => Some(Self::Datasources),
            _ => None,
        }
    }

    /// Next section, wrapping the last back to the first.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % SECTION_COUNT]
    }

    /// Previous section, wrapping the first to the last.
    #[must_use]
    pub const fn prev(self) -> Self {
        Self::ALL[(self.index() + SECTION_COUNT - 1) % SECTION_COUNT]
    }

    /// Tab title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Process => "Process Folder",
            Self::FindMetadata => "Find Metadata",
            Self::Delete => "Delete Metadata",
            Self::Analytics => "Analytics",
            Self::Datasources => "Datasources",
        }
    }

    /// The backend operation this section drives, if any.
    #[must_use]
    pub const fn operation(self) -> Option<Operation> {
        match self {
            Self::Process => Some(Operation::ProcessFolder),
            Self::FindMetadata => Some(Operation::FetchMetadata),
            Self::Delete => Some(Operation::DeleteMetadata),
            Self::Analytics => Some(Operation::FetchAnalytics),
            Self::Datasources => None,
        }
    }

    /// Whether the section has a folder-path input buffer.
    #[must_use]
    pub const fn takes_path(self) -> bool {
        matches!(self, Self::Process | Self::FindMetadata | Self::Delete)
    }
}

// ──────────────────── operations ────────────────────

/// The four backend operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ProcessFolder,
    FetchMetadata,
    DeleteMetadata,
    FetchAnalytics,
}

impl Operation {
    /// Section whose outcome this operation reports into.
    #[must_use]
    pub const fn section(self) -> Section {
        match self {
            Self::ProcessFolder => Section::Process,
            Self::FetchMetadata => Section::FindMetadata,
            Self::DeleteMetadata => Section::Delete,
            Self::FetchAnalytics => Section::Analytics,
        }
    }

    /// Stable label for logs and JSON output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProcessFolder => "process_folder",
            Self::FetchMetadata => "fetch_metadata",
            Self::DeleteMetadata => "delete_metadata",
            Self::FetchAnalytics => "fetch_analytics",
        }
    }
}

// ──────────────────── fidelity ────────────────────

/// Metadata retrieval fidelity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum FidelityMode {
    /// Filesystem attributes: name, path, size, timestamps.
    #[default]
    Basic,
    /// Extended key/value attribute map.
    Advanced,
}

impl FidelityMode {
    /// Query-parameter value expected by the service.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }

    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Basic => Self::Advanced,
            Self::Advanced => Self::Basic,
        }
    }
}

impl fmt::Display for FidelityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────── outcomes ────────────────────

/// Lifecycle of the last operation issued from a section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    Idle,
    Loading,
    Succeeded(String),
    Failed(OperationError),
}

impl Outcome {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Banner text, if the outcome carries one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Idle | Self::Loading => None,
            Self::Succeeded(message) => Some(message),
            Self::Failed(error) => Some(error.message()),
        }
    }

    /// Stable label for logs and JSON output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Per-section input buffer and last outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionState {
    /// Folder path typed by the operator (unused by analytics/datasources).
    pub input: String,
    pub outcome: Outcome,
}

// ──────────────────── credential form ────────────────────

/// Focusable fields of the datasource credential form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialField {
    #[default]
    Host,
    Username,
    Secret,
    SharePath,
}

impl CredentialField {
    pub const ALL: [Self; 4] = [Self::Host, Self::Username, Self::Secret, Self::SharePath];

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Host => Self::Username,
            Self::Username => Self::Secret,
            Self::Secret => Self::SharePath,
            Self::SharePath => Self::Host,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Host => Self::SharePath,
            Self::Username => Self::Host,
            Self::Secret => Self::Username,
            Self::SharePath => Self::Secret,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::Username => "Username",
            Self::Secret => "Password",
            Self::SharePath => "Share path",
        }
    }
}

/// Input buffers of the credential form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialForm {
    pub host: String,
    pub username: String,
    pub secret: String,
    pub share_path: String,
    pub focus: CredentialField,
}

impl CredentialForm {
    /// Buffer for a given field.
    #[must_use]
    pub fn field(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::Host => &self.host,
            CredentialField::Username => &self.username,
            CredentialField::Secret => &self.secret,
            CredentialField::SharePath => &self.share_path,
        }
    }

    /// Mutable buffer of the focused field.
    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            CredentialField::Host => &mut self.host,
            CredentialField::Username => &mut self.username,
            CredentialField::Secret => &mut self.secret,
            CredentialField::SharePath => &mut self.share_path,
        }
    }

    /// Take the buffers as a credential record and reset the form.
    pub fn take(&mut self) -> Credential {
        let form = std::mem::take(self);
        Credential {
            host: form.host,
            username: form.username,
            secret: form.secret,
            share_path: form.share_path,
        }
    }
}

// ──────────────────── model ────────────────────

/// Complete display state for the dashboard.
///
/// This struct is the single source of truth for the view layer. The update
/// function mutates it; the render function reads it immutably.
#[derive(Debug)]
pub struct DashboardModel {
    /// Visible section.
    pub active: Section,
    /// Input buffers and outcomes, indexed by [`Section::index`].
    pub sections: [SectionState; SECTION_COUNT],
    /// Selected metadata fidelity.
    pub fidelity: FidelityMode,
    /// Displayed metadata list (None when nothing is displayed).
    pub metadata: Option<MetadataList>,
    /// Expanded advanced-mode rows.
    pub expanded_rows: BTreeSet<usize>,
    /// Cursor position in the metadata list.
    pub selected_row: usize,
    /// Chart-ready analytics series.
    pub analytics: AnalyticsView,
    /// Session-only datasource credentials.
    pub credentials: CredentialStore,
    /// Datasource form buffers.
    pub credential_form: CredentialForm,
    /// Cursor position in the credential list.
    pub selected_credential: usize,
    /// Issue an analytics fetch when entering the analytics section.
    pub auto_fetch_analytics: bool,
    /// Whether the user has requested quit.
    pub quit: bool,
}

impl Default for DashboardModel {
    fn default() -> Self {
        Self::new(Section::default(), FidelityMode::default(), true)
    }
}

impl DashboardModel {
    /// Create a new model.
    #[must_use]
    pub fn new(start: Section, fidelity: FidelityMode, auto_fetch_analytics: bool) -> Self {
        Self {
            active: start,
            sections: Default::default(),
            fidelity,
            metadata: None,
            expanded_rows: BTreeSet::new(),
            selected_row: 0,
            analytics: AnalyticsView::default(),
            credentials: CredentialStore::default(),
            credential_form: CredentialForm::default(),
            selected_credential: 0,
            auto_fetch_analytics,
            quit: false,
        }
    }

    #[must_use]
    pub fn section(&self, section: Section) -> &SectionState {
        &self.sections[section.index()]
    }

    pub fn section_mut(&mut self, section: Section) -> &mut SectionState {
        &mut self.sections[section.index()]
    }

    /// Outcome of the visible section. Other sections' outcomes are kept but not surfaced.
    #[must_use]
    pub fn active_outcome(&self) -> &Outcome {
        &self.section(self.active).outcome
    }

    /// True while any operation is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.sections.iter().any(|s| s.outcome.is_loading())
    }

    /// Switch the visible section. Returns `true` if the section changed.
    pub fn navigate_to(&mut self, target: Section) -> bool {
        if target == self.active {
            return false;
        }
        self.active = target;
        true
    }

    /// Drop the displayed metadata list along with its row state.
    pub fn clear_metadata(&mut self) {
        self.metadata = None;
        self.expanded_rows.clear();
        self.selected_row = 0;
    }

    /// Drop the displayed listing and its result banner. An in-flight fetch
    /// keeps its Loading outcome.
    pub fn drop_listing(&mut self) {
        self.clear_metadata();
        let outcome = &mut self.section_mut(Section::FindMetadata).outcome;
        if !outcome.is_loading() {
            *outcome = Outcome::Idle;
        }
    }

    /// Change fidelity, clearing any displayed list so results of one mode are
    /// never shown under the other. Returns `true` on change.
    pub fn set_fidelity(&mut self, mode: FidelityMode) -> bool {
        if mode == self.fidelity {
            return false;
        }
        self.fidelity = mode;
        self.drop_listing();
        true
    }

    /// Expand every advanced-mode row. Returns the number of expanded rows.
    pub fn expand_all_rows(&mut self) -> usize {
        let Some(MetadataList::Advanced(records)) = &self.metadata else {
            return 0;
        };
        let count = records.len();
        self.expanded_rows = (0..count).collect();
        count
    }

    /// Toggle expansion of an advanced-mode row. Idempotent in pairs; never
    /// touches outcomes. No-op unless advanced metadata is displayed.
    pub fn toggle_row(&mut self, index: usize) -> bool {
        let Some(MetadataList::Advanced(records)) = &self.metadata else {
            return false;
        };
        if index >= records.len() {
            return false;
        }
        if !self.expanded_rows.remove(&index) {
            self.expanded_rows.insert(index);
        }
        true
    }

    /// Move the metadata cursor up. Returns `true` if the cursor moved.
    pub fn row_cursor_up(&mut self) -> bool {
        if self.selected_row > 0 {
            self.selected_row -= 1;
            true
        } else {
            false
        }
    }

    /// Move the metadata cursor down. Returns `true` if the cursor moved.
    pub fn row_cursor_down(&mut self) -> bool {
        let len = self.metadata.as_ref().map_or(0, MetadataList::len);
        if self.selected_row + 1 < len {
            self.selected_row += 1;
            true
        } else {
            false
        }
    }

    /// Move the credential cursor up. Returns `true` if the cursor moved.
    pub fn credential_cursor_up(&mut self) -> bool {
        if self.selected_credential > 0 {
            self.selected_credential -= 1;
            true
        } else {
            false
        }
    }

    /// Move the credential cursor down. Returns `true` if the cursor moved.
    pub fn credential_cursor_down(&mut self) -> bool {
        if self.selected_credential + 1 < self.credentials.len() {
            self.selected_credential += 1;
            true
        } else {
            false
        }
    }

    /// Keep the credential cursor inside the list after a removal.
    pub fn clamp_credential_cursor(&mut self) {
        let len = self.credentials.len();
        if len == 0 {
            self.selected_credential = 0;
        } else if self.selected_credential >= len {
            self.selected_credential = len - 1;
        }
    }

    /// Buffer that receives typed characters in the visible section.
    pub fn focused_input_mut(&mut self) -> Option<&mut String> {
        match self.active {
            Section::Process | Section::FindMetadata | Section::Delete => {
                Some(&mut self.sections[self.active.index()].input)
            }
            Section::Datasources => Some(self.credential_form.focused_mut()),
            Section::Analytics => None,
        }
    }
}

// ──────────────────── messages ────────────────────

/// Events that drive state transitions in the dashboard model.
#[derive(Debug, Clone)]
pub enum DashboardMsg {
    /// Show a section.
    Navigate(Section),
    /// Show the next section (wrapping).
    NavigateNext,
    /// Show the previous section (wrapping).
    NavigatePrev,
    /// Replace the path buffer of a section.
    SetInput { section: Section, value: String },
    /// Append a character to the focused buffer.
    InputChar(char),
    /// Remove the last character of the focused buffer.
    InputBackspace,
    /// Clear the focused buffer.
    InputClear,
    /// Select a metadata fidelity.
    SetFidelity(FidelityMode),
    /// Flip between basic and advanced fidelity.
    ToggleFidelity,
    /// Run the visible section's primary action.
    Submit,
    /// Run a specific backend operation.
    Run(Operation),
    /// Toggle expansion of an advanced-mode row.
    ToggleRow(usize),
    /// Toggle expansion of the row under the cursor.
    ToggleSelectedRow,
    /// Move the list cursor of the visible section up.
    CursorUp,
    /// Move the list cursor of the visible section down.
    CursorDown,
    /// Focus the next credential form field.
    FocusNextField,
    /// Focus the previous credential form field.
    FocusPrevField,
    /// Append a credential record.
    SaveCredential(Credential),
    /// Append the credential form contents and reset the form.
    SaveCredentialForm,
    /// Remove a credential by position.
    RemoveCredential(usize),
    /// Remove the credential under the cursor.
    RemoveSelectedCredential,
    /// A backend request finished.
    Completed(Completion),
    /// Leave the dashboard.
    Quit,
}

// ──────────────────── commands ────────────────────

/// Side-effects returned by the update function for the runtime to execute.
///
/// All async work is represented as a command. The update function never
/// performs I/O directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCmd {
    /// No side-effect.
    None,
    /// Execute a backend request and deliver a `Completed` message.
    Issue(Request),
    /// Terminate the dashboard event loop.
    Quit,
}

// ──────────────────── tests ────────────────────
