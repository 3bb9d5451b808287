//! Partial wire types for backend responses.
//!
//! Every field is optional and loose-typed where the service is known to
//! drift (`size` may arrive as a number or a numeric string, timestamps as
//! epoch milliseconds or ISO-8601 text). Nothing here is rendered directly.

#![allow(missing_docs)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a successful `process` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessResponse {
    pub message: Option<String>,
}

/// One element of a `type=basic` metadata listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBasicRecord {
    pub name: Option<String>,
    pub path: Option<String>,
    pub size: Option<Value>,
    pub ctime: Option<Value>,
    pub mtime: Option<Value>,
    pub atime: Option<Value>,
}

/// One element of a `type=advanced` metadata listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAdvancedRecord {
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub attributes: Option<IndexMap<String, Value>>,
}

/// Decoded metadata listing, tagged by the fidelity it was requested with.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMetadata {
    Basic(Vec<RawBasicRecord>),
    Advanced(Vec<RawAdvancedRecord>),
}

impl RawMetadata {
    /// Number of raw elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Basic(records) => records.len(),
            Self::Advanced(records) => records.len(),
        }
    }

    /// True when the service returned no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `bucket → count` in the order the service emitted the keys.
pub type RawDistribution = IndexMap<String, u64>;

/// Decode a metadata listing where a JSON `null` body means "no records".
///
/// Elements that are not JSON objects decode to all-`None` records so one
/// malformed element never hides the rest of the listing.
pub fn decode_list<T>(body: &str) -> serde_json::Result<Vec<T>>
where
    T: Default + for<'de> Deserialize<'de>,
{
    let values: Option<Vec<Value>> = serde_json::from_str(body)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap_or_default())
        .collect())
}

/// Decode an analytics distribution; `null` decodes as empty.
pub fn decode_distribution(body: &str) -> serde_json::Result<RawDistribution> {
    let dist: Option<RawDistribution> = serde_json::from_str(body)?;
    Ok(dist.unwrap_or_default())
}

/// Decode a `process` body. An empty or non-JSON body is a success without a message.
#[must_use]
pub fn decode_process_response(body: &str) -> ProcessResponse {
    serde_json::from_str::<Option<ProcessResponse>>(body)
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Extract the server-supplied message from a JSON error body.
#[must_use]
pub fn server_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| {
            value
                .get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|message| !message.is_empty())
        })
        .map(str::to_owned)
}
