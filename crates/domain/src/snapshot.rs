//! Snapshot — the last-known full device status for one cadence.
//!
//! A snapshot is immutable once built. Replacing it means swapping the whole
//! value, so a reader always sees fields from a single poll.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::MalformedResponse;
use crate::value::RawValue;

/// UTC timestamp used for fetch times and events.
pub type Timestamp = DateTime<Utc>;

/// Field-name → value map obtained from one status fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    sequence: u64,
    fetched_at: Timestamp,
    fields: BTreeMap<String, RawValue>,
}

impl Snapshot {
    /// Build a snapshot from the raw status blob returned by the cloud.
    ///
    /// `sequence` is the fetch-start order of the poll that produced it and
    /// is what stale-result rejection compares. `null` fields are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedResponse::NotAnObject`] when the blob is not a JSON
    /// object.
    pub fn from_blob(
        sequence: u64,
        fetched_at: Timestamp,
        blob: serde_json::Value,
    ) -> Result<Self, MalformedResponse> {
        let serde_json::Value::Object(map) = blob else {
            return Err(MalformedResponse::NotAnObject {
                found: json_kind(&blob),
            });
        };
        let fields = map
            .into_iter()
            .filter_map(|(name, value)| RawValue::from_json(value).map(|raw| (name, raw)))
            .collect();
        Ok(Self {
            sequence,
            fetched_at,
            fields,
        })
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether this snapshot comes from a fetch that started after `other`'s.
    #[must_use]
    pub fn supersedes(&self, other: &Self) -> bool {
        self.sequence > other.sequence
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
