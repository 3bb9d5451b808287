//! Text rendering of the dashboard model.
//!
//! `render()` is pure: it turns a model into a list of toned lines. The
//! terminal runtime paints them with colors; one-shot CLI commands print
//! them directly. Every line fits within the requested width.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use serde_json::Value;

use super::analytics::Series;
use super::credentials::Credential;
use super::model::{CredentialField, DashboardModel, FidelityMode, Outcome, Section};
use super::normalizer::{
    FileRecordAdvanced, FileRecordBasic, FileSize, MetadataList, NOT_AVAILABLE,
};

pub const NO_METADATA: &str = "No metadata available";
pub const NO_DATA: &str = "No data available";
pub const LOADING: &str = "Loading...";

/// Visual role of a line; mapped to colors by the painter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Heading,
    Muted,
    Accent,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub tone: Tone,
    pub text: String,
}

impl Line {
    #[must_use]
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }
}

/// Render options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Terminal width in columns.
    pub width: usize,
    /// Width in columns of the longest analytics bar.
    pub chart_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 100,
            chart_width: 40,
        }
    }
}

// ──────────────────── full frame ────────────────────

/// Render the whole dashboard: tab bar, active section, outcome banner, key hints.
#[must_use]
pub fn render(model: &DashboardModel, options: RenderOptions) -> Vec<Line> {
    let mut lines = vec![
        Line::new(Tone::Heading, section_header("File Insights", options.width)),
        Line::new(Tone::Accent, tab_bar(model.active)),
        Line::new(Tone::Normal, ""),
    ];
    lines.extend(render_section(model, options));
    if let Some(banner) = banner(model.active_outcome()) {
        lines.push(Line::new(Tone::Normal, ""));
        lines.push(banner);
    }
    lines.push(Line::new(Tone::Normal, ""));
    lines.push(Line::new(Tone::Muted, key_hints(model.active)));
    fit_all(lines, options.width)
}

/// Render only the active section's body (used by one-shot commands).
#[must_use]
pub fn render_section(model: &DashboardModel, options: RenderOptions) -> Vec<Line> {
    let mut lines = Vec::new();
    match model.active {
        Section::Process | Section::Delete => {
            lines.push(path_input(model, model.active));
        }
        Section::FindMetadata => {
            lines.push(path_input(model, Section::FindMetadata));
            lines.push(Line::new(Tone::Normal, mode_selector(model.fidelity)));
            lines.push(Line::new(Tone::Normal, ""));
            if let Some(list) = &model.metadata {
                lines.extend(metadata_lines(list, model));
            }
        }
        Section::Analytics => {
            lines.extend(chart("Files by age", &model.analytics.by_age, options.chart_width));
            lines.push(Line::new(Tone::Normal, ""));
            lines.extend(chart("Files by type", &model.analytics.by_type, options.chart_width));
        }
        Section::Datasources => lines.extend(datasource_lines(model)),
    }
    fit_all(lines, options.width)
}

/// Outcome banner, if the outcome carries one.
#[must_use]
pub fn banner(outcome: &Outcome) -> Option<Line> {
    match outcome {
        Outcome::Idle => None,
        Outcome::Loading => Some(Line::new(Tone::Muted, LOADING)),
        Outcome::Succeeded(message) => Some(Line::new(Tone::Success, message.clone())),
        Outcome::Failed(error) => Some(Line::new(Tone::Error, error.message().to_owned())),
    }
}

fn tab_bar(active: Section) -> String {
    Section::ALL
        .iter()
        .map(|&section| {
            if section == active {
                format!("[{} {}]", section.number(), section.title())
            } else {
                format!(" {} {} ", section.number(), section.title())
            }
        })
        .collect::<Vec<_>>()
        .join("│")
}

fn key_hints(active: Section) -> String {
    let specific = match active {
        Section::Process => "Enter process",
        Section::FindMetadata => "Enter fetch  Ctrl-T mode  ↑/↓ row  Ctrl-E expand",
        Section::Delete => "Enter delete",
        Section::Analytics => "Enter refresh",
        Section::Datasources => "Tab field  Enter save  ↑/↓ list  Ctrl-D remove",
    };
    format!("Alt-1..5 or Ctrl-←/→ section  {specific}  Esc quit")
}

fn path_input(model: &DashboardModel, section: Section) -> Line {
    Line::new(
        Tone::Normal,
        format!("Folder path: {}▏", model.section(section).input),
    )
}

fn mode_selector(mode: FidelityMode) -> String {
    let mark = |m: FidelityMode| if m == mode { "(•)" } else { "( )" };
    format!(
        "Mode: {} basic  {} advanced",
        mark(FidelityMode::Basic),
        mark(FidelityMode::Advanced)
    )
}

// ──────────────────── metadata ────────────────────

/// Metadata table lines for either fidelity.
#[must_use]
pub fn metadata_lines(list: &MetadataList, model: &DashboardModel) -> Vec<Line> {
    match list {
        MetadataList::Basic(records) => basic_table(records, model.selected_row),
        MetadataList::Advanced(records) => advanced_rows(records, model),
    }
}

fn basic_table(records: &[FileRecordBasic], selected: usize) -> Vec<Line> {
    const HEADERS: [&str; 6] = ["Name", "Path", "Size", "Created", "Modified", "Accessed"];
    let rows: Vec<[String; 6]> = records
        .iter()
        .map(|r| {
            [
                r.file_name.clone(),
                r.file_path.clone(),
                size_label(r.size),
                r.created_at.clone(),
                r.modified_at.clone(),
                r.accessed_at.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let join = |cells: &[String; 6]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| pad(cell, width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    let mut lines = vec![Line::new(
        Tone::Heading,
        format!("  {}", join(&HEADERS.map(str::to_owned))),
    )];
    for (i, row) in rows.iter().enumerate() {
        let cursor = if i == selected { '>' } else { ' ' };
        lines.push(Line::new(Tone::Normal, format!("{cursor} {}", join(row))));
    }
    lines
}

fn advanced_rows(records: &[FileRecordAdvanced], model: &DashboardModel) -> Vec<Line> {
    let mut lines = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let expanded = model.expanded_rows.contains(&i);
        let cursor = if i == model.selected_row { '>' } else { ' ' };
        let arrow = if expanded { '▾' } else { '▸' };
        let summary = match record.attributes.len() {
            0 => NO_METADATA.to_owned(),
            1 => "1 attribute".to_owned(),
            n => format!("{n} attributes"),
        };
        lines.push(Line::new(
            Tone::Normal,
            format!(
                "{cursor} {arrow} {}  {}  ({summary})",
                record.file_name, record.file_path
            ),
        ));
        if !expanded {
            continue;
        }
        if record.has_attributes() {
            let key_width = record
                .attributes
                .keys()
                .map(|k| k.chars().count())
                .max()
                .unwrap_or(0);
            for (key, value) in &record.attributes {
                lines.push(Line::new(
                    Tone::Normal,
                    format!("      {}  {}", pad(key, key_width), attribute_text(value)),
                ));
            }
        } else {
            lines.push(Line::new(Tone::Muted, format!("      {NO_METADATA}")));
        }
    }
    lines
}

/// Display text of an attribute value. Strings lose their quotes.
#[must_use]
pub fn attribute_text(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_owned(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn size_label(size: FileSize) -> String {
    match size {
        FileSize::Bytes(n) => human_bytes(n),
        FileSize::Unknown => size.to_string(),
    }
}

// ──────────────────── analytics ────────────────────

/// Horizontal bar chart, or a placeholder for an empty series.
#[must_use]
pub fn chart(title: &str, series: &Series, bar_width: usize) -> Vec<Line> {
    let mut lines = vec![Line::new(Tone::Heading, title.to_owned())];
    if series.is_empty() {
        lines.push(Line::new(Tone::Muted, format!("  {NO_DATA}")));
        return lines;
    }
    let label_width = series
        .labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    let max = series.max_value();
    for (label, value) in series.points() {
        lines.push(Line::new(
            Tone::Accent,
            format!(
                "  {}  {} {value}",
                pad(label, label_width),
                bar(value, max, bar_width)
            ),
        ));
    }
    lines
}

/// Bar scaled to `max`; any non-zero value gets at least one cell.
#[must_use]
pub fn bar(value: u64, max: u64, width: usize) -> String {
    if max == 0 || width == 0 {
        return String::new();
    }
    let filled = ((value as f64 / max as f64) * width as f64).round() as usize;
    let filled = if value > 0 { filled.clamp(1, width) } else { 0 };
    "█".repeat(filled)
}

// ──────────────────── datasources ────────────────────

fn datasource_lines(model: &DashboardModel) -> Vec<Line> {
    let form = &model.credential_form;
    let mut lines = vec![Line::new(Tone::Heading, "Add datasource")];
    for field in CredentialField::ALL {
        let focused = field == form.focus;
        let raw = form.field(field);
        let shown = if field == CredentialField::Secret {
            "*".repeat(raw.chars().count())
        } else {
            raw.to_owned()
        };
        let marker = if focused { '>' } else { ' ' };
        let caret = if focused { "▏" } else { "" };
        lines.push(Line::new(
            if focused { Tone::Accent } else { Tone::Normal },
            format!("{marker} {:<11} {shown}{caret}", format!("{}:", field.label())),
        ));
    }
    lines.push(Line::new(Tone::Normal, ""));
    lines.push(Line::new(Tone::Heading, "Saved datasources"));
    if model.credentials.is_empty() {
        lines.push(Line::new(Tone::Muted, "  (none)"));
    }
    for (i, record) in model.credentials.iter().enumerate() {
        let cursor = if i == model.selected_credential { '>' } else { ' ' };
        lines.push(Line::new(
            Tone::Normal,
            format!("{cursor} {}", credential_summary(record)),
        ));
    }
    lines
}

/// One-line credential description with the secret masked.
#[must_use]
pub fn credential_summary(record: &Credential) -> String {
    format!(
        "{}@{}  {}  secret {}",
        record.username,
        record.host,
        record.share_path,
        record.masked_secret()
    )
}

// ──────────────────── format helpers ────────────────────

/// Human-readable byte size.
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size * 1024.0)
}

/// `── Title ─────` filling `width` columns.
#[must_use]
pub fn section_header(title: &str, width: usize) -> String {
    let used = title.chars().count() + 4;
    format!("── {title} {}", "─".repeat(width.saturating_sub(used)))
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

/// Truncate to `width` characters, marking the cut with `…`.
#[must_use]
pub fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

fn fit_all(lines: Vec<Line>, width: usize) -> Vec<Line> {
    lines
        .into_iter()
        .map(|line| Line {
            text: fit(&line.text, width),
            ..line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::dashboard::orchestrator::OperationError;

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    fn advanced(attrs: &[(&str, Value)]) -> FileRecordAdvanced {
        FileRecordAdvanced {
            file_name: "r.pdf".into(),
            file_path: "/d/r.pdf".into(),
            attributes: attrs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn human_bytes_formatting() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(1023), "1023 B");
        assert_eq!(human_bytes(1024), "1.0 KB");
        assert_eq!(human_bytes(1_536), "1.5 KB");
        assert_eq!(human_bytes(1_073_741_824), "1.0 GB");
    }

    #[test]
    fn fit_truncates_with_ellipsis() {
        assert_eq!(fit("abcdef", 10), "abcdef");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("abcdef", 0), "");
    }

    #[test]
    fn every_line_fits_width() {
        let mut model = DashboardModel::default();
        model.section_mut(Section::Process).input = "/a/very/long/path/".repeat(10);
        for width in [20, 60, 120] {
            let lines = render(
                &model,
                RenderOptions {
                    width,
                    chart_width: 10,
                },
            );
            assert!(lines.iter().all(|l| l.text.chars().count() <= width));
        }
    }

    #[test]
    fn tab_bar_marks_active_section() {
        let bar = tab_bar(Section::Delete);
        assert!(bar.contains("[3 Delete Metadata]"));
        assert!(bar.contains(" 1 Process Folder "));
    }

    #[test]
    fn banner_tones_follow_outcome() {
        assert!(banner(&Outcome::Idle).is_none());
        assert_eq!(banner(&Outcome::Loading).unwrap().text, LOADING);
        assert_eq!(
            banner(&Outcome::Succeeded("ok".into())).unwrap().tone,
            Tone::Success
        );
        let failed = banner(&Outcome::Failed(OperationError::Transport("bad".into()))).unwrap();
        assert_eq!(failed.tone, Tone::Error);
        assert_eq!(failed.text, "bad");
    }

    #[test]
    fn empty_series_renders_placeholder() {
        let lines = chart("Files by age", &Series::default(), 20);
        assert_eq!(texts(&lines), vec!["Files by age", "  No data available"]);
    }

    #[test]
    fn chart_scales_bars_to_max() {
        let series = Series {
            labels: vec!["old".into(), "new".into()],
            values: vec![10, 5],
        };
        let lines = chart("t", &series, 10);
        assert_eq!(lines[1].text, format!("  old  {} 10", "█".repeat(10)));
        assert_eq!(lines[2].text, format!("  new  {} 5", "█".repeat(5)));
    }

    #[test]
    fn bar_edge_cases() {
        assert_eq!(bar(0, 0, 10), "");
        assert_eq!(bar(0, 5, 10), "");
        assert_eq!(bar(1, 1000, 10), "█");
    }

    #[test]
    fn advanced_row_without_attributes_shows_marker_when_expanded() {
        let mut model = DashboardModel::default();
        model.metadata = Some(MetadataList::Advanced(vec![advanced(&[])]));
        model.expanded_rows.insert(0);
        let lines = metadata_lines(model.metadata.as_ref().unwrap(), &model);
        assert!(lines[0].text.contains(NO_METADATA));
        assert_eq!(lines[1].text.trim(), NO_METADATA);
    }

    #[test]
    fn advanced_row_expands_attributes() {
        let mut model = DashboardModel::default();
        model.metadata = Some(MetadataList::Advanced(vec![advanced(&[
            ("Author", json!("kim")),
            ("Pages", json!(12)),
        ])]));
        let collapsed = metadata_lines(model.metadata.as_ref().unwrap(), &model);
        assert_eq!(collapsed.len(), 1);
        assert!(collapsed[0].text.contains("2 attributes"));

        model.expanded_rows.insert(0);
        let expanded = metadata_lines(model.metadata.as_ref().unwrap(), &model);
        assert_eq!(expanded.len(), 3);
        assert!(expanded[1].text.contains("Author"));
        assert!(expanded[1].text.contains("kim"));
        assert!(expanded[2].text.ends_with("  12"));
    }

    #[test]
    fn expand_all_rows_prints_every_attribute_value() {
        let mut model = DashboardModel::default();
        let second = FileRecordAdvanced {
            file_name: "s.png".into(),
            ..advanced(&[("Width", json!(640)), ("Camera", Value::Null)])
        };
        model.metadata = Some(MetadataList::Advanced(vec![
            advanced(&[("Author", json!("kim"))]),
            second,
        ]));
        model.expand_all_rows();
        let lines = metadata_lines(model.metadata.as_ref().unwrap(), &model);
        let shown = texts(&lines);
        assert!(shown.iter().any(|t| t.contains("Author") && t.ends_with("kim")));
        assert!(shown.iter().any(|t| t.contains("Width") && t.ends_with("640")));
        assert!(shown.iter().any(|t| t.contains("Camera") && t.ends_with(NOT_AVAILABLE)));
        assert!(!shown.iter().any(|t| t.contains('"')));
    }

    #[test]
    fn attribute_text_drops_string_quotes() {
        assert_eq!(attribute_text(&json!("kim")), "kim");
        assert_eq!(attribute_text(&json!(640)), "640");
        assert_eq!(attribute_text(&json!(true)), "true");
        assert_eq!(attribute_text(&Value::Null), NOT_AVAILABLE);
    }

    #[test]
    fn basic_table_shows_fallbacks() {
        let record = FileRecordBasic {
            file_name: "a.txt".into(),
            file_path: "/a.txt".into(),
            size: FileSize::Unknown,
            created_at: "N/A".into(),
            modified_at: "N/A".into(),
            accessed_at: "N/A".into(),
        };
        let lines = basic_table(&[record], 0);
        assert!(lines[0].text.contains("Name"));
        assert!(lines[1].text.starts_with("> a.txt"));
        assert!(lines[1].text.contains("Unknown Size"));
    }

    #[test]
    fn secret_is_masked_in_form_and_list() {
        let mut model = DashboardModel::default();
        model.navigate_to(Section::Datasources);
        model.credential_form.secret = "hunter2".into();
        model.credentials.save(Credential {
            host: "nas".into(),
            username: "ops".into(),
            secret: "s3cret".into(),
            share_path: "/share".into(),
        });
        let lines = render(&model, RenderOptions::default());
        let all = texts(&lines).join("\n");
        assert!(!all.contains("hunter2"));
        assert!(!all.contains("s3cret"));
        assert!(all.contains("*******"));
        assert!(all.contains("ops@nas"));
    }

    #[test]
    fn find_metadata_without_listing_shows_no_table() {
        let mut model = DashboardModel::default();
        model.navigate_to(Section::FindMetadata);
        let lines = render_section(&model, RenderOptions::default());
        assert!(texts(&lines).iter().any(|t| t.contains("(•) basic")));
        assert!(!texts(&lines).iter().any(|t| t.contains("Name")));
    }
}
