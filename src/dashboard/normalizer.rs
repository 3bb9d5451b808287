//! Raw backend records → canonical view records.
//!
//! Pure and side-effect free. Every output field is defined: partial input
//! is absorbed here and never reaches the model.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::backend::wire::{RawAdvancedRecord, RawBasicRecord, RawMetadata};
use crate::core::config::{DisplayConfig, TimeZoneChoice};
use crate::dashboard::model::FidelityMode;

pub const UNKNOWN_FILE: &str = "Unknown File";
pub const UNKNOWN_PATH: &str = "Unknown Path";
pub const UNKNOWN_SIZE: &str = "Unknown Size";
pub const NOT_AVAILABLE: &str = "N/A";

/// Size column of a basic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSize {
    Bytes(u64),
    Unknown,
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(n) => write!(f, "{n}"),
            Self::Unknown => f.write_str(UNKNOWN_SIZE),
        }
    }
}

impl Serialize for FileSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bytes(n) => serializer.serialize_u64(*n),
            Self::Unknown => serializer.serialize_str(UNKNOWN_SIZE),
        }
    }
}

/// Canonical basic-fidelity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecordBasic {
    pub file_name: String,
    pub file_path: String,
    #[serde(rename = "sizeBytes")]
    pub size: FileSize,
    pub created_at: String,
    pub modified_at: String,
    pub accessed_at: String,
}

/// Canonical advanced-fidelity record. Attribute values are kept as sent and
/// sorted by key for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecordAdvanced {
    pub file_name: String,
    pub file_path: String,
    pub attributes: BTreeMap<String, Value>,
}

impl FileRecordAdvanced {
    /// Whether the view should show the "no metadata" marker instead of a table.
    #[must_use]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }
}

/// Normalized listing, tagged by fidelity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "records", rename_all = "lowercase")]
pub enum MetadataList {
    Basic(Vec<FileRecordBasic>),
    Advanced(Vec<FileRecordAdvanced>),
}

impl MetadataList {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Basic(records) => records.len(),
            Self::Advanced(records) => records.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn mode(&self) -> FidelityMode {
        match self {
            Self::Basic(_) => FidelityMode::Basic,
            Self::Advanced(_) => FidelityMode::Advanced,
        }
    }
}

/// How timestamps are rendered into canonical strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampStyle {
    /// chrono strftime pattern.
    pub format: String,
    pub zone: TimeZoneChoice,
}

impl Default for TimestampStyle {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

impl From<&DisplayConfig> for TimestampStyle {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            format: config.timestamp_format.clone(),
            zone: config.time_zone,
        }
    }
}

impl TimestampStyle {
    /// Render a raw timestamp field; absent/null/blank → `N/A`.
    ///
    /// Numbers are epoch milliseconds. Strings are RFC 3339, naive ISO-8601
    /// (interpreted as UTC), or numeric epoch milliseconds; any other text is
    /// shown as sent.
    #[must_use]
    pub fn render(&self, raw: Option<&Value>) -> String {
        match raw {
            None | Some(Value::Null) => NOT_AVAILABLE.to_owned(),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map_or_else(|| NOT_AVAILABLE.to_owned(), |dt| self.format_utc(dt)),
            Some(Value::String(text)) => self.render_text(text),
            Some(_) => NOT_AVAILABLE.to_owned(),
        }
    }

    fn render_text(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return NOT_AVAILABLE.to_owned();
        }
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(text) {
            return self.format_utc(dt.with_timezone(&Utc));
        }
        for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, pattern) {
                return self.format_utc(Utc.from_utc_datetime(&naive));
            }
        }
        if let Some(dt) = text
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        {
            return self.format_utc(dt);
        }
        text.to_owned()
    }

    fn format_utc(&self, dt: DateTime<Utc>) -> String {
        match self.zone {
            TimeZoneChoice::Utc => dt.format(&self.format).to_string(),
            TimeZoneChoice::Local => dt.with_timezone(&Local).format(&self.format).to_string(),
        }
    }
}

/// Normalize a raw listing. The output fidelity always matches the raw tag.
#[must_use]
pub fn normalize(raw: &RawMetadata, style: &TimestampStyle) -> MetadataList {
    match raw {
        RawMetadata::Basic(records) => MetadataList::Basic(
            records
                .iter()
                .map(|record| normalize_basic(record, style))
                .collect(),
        ),
        RawMetadata::Advanced(records) => {
            MetadataList::Advanced(records.iter().map(normalize_advanced).collect())
        }
    }
}

#[must_use]
pub fn normalize_basic(raw: &RawBasicRecord, style: &TimestampStyle) -> FileRecordBasic {
    FileRecordBasic {
        file_name: text_or(raw.name.as_deref(), UNKNOWN_FILE),
        file_path: text_or(raw.path.as_deref(), UNKNOWN_PATH),
        size: size_of(raw.size.as_ref()),
        created_at: style.render(raw.ctime.as_ref()),
        modified_at: style.render(raw.mtime.as_ref()),
        accessed_at: style.render(raw.atime.as_ref()),
    }
}

#[must_use]
pub fn normalize_advanced(raw: &RawAdvancedRecord) -> FileRecordAdvanced {
    let attributes = raw
        .attributes
        .iter()
        .flatten()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    FileRecordAdvanced {
        file_name: text_or(raw.file_name.as_deref(), UNKNOWN_FILE),
        file_path: text_or(raw.file_path.as_deref(), UNKNOWN_PATH),
        attributes,
    }
}

fn text_or(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text.to_owned(),
        _ => fallback.to_owned(),
    }
}

fn size_of(raw: Option<&Value>) -> FileSize {
    let bytes = match raw {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    bytes.map_or(FileSize::Unknown, FileSize::Bytes)
}
