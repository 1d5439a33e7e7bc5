//! Raw status values and the typed values entities report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single field of a status blob, as sent by the cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl RawValue {
    /// Convert one JSON field. `null` means the field carries nothing.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::String(s)),
            other => Some(Self::Json(other)),
        }
    }

    /// Integer code carried by this value, if any.
    ///
    /// Booleans read as `0`/`1` and numeric strings are parsed, since the
    /// vendor library is inconsistent about both.
    #[must_use]
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::String(s) => s.trim().parse().ok(),
            Self::Float(_) | Self::Json(_) => None,
        }
    }

    /// Whether the cloud used a placeholder instead of a real value.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        match self {
            Self::String(s) => {
                let s = s.trim();
                s.is_empty() || s.eq_ignore_ascii_case("not set")
            }
            Self::Json(serde_json::Value::Object(map)) => map.is_empty(),
            Self::Json(serde_json::Value::Array(items)) => items.is_empty(),
            _ => false,
        }
    }
}

/// The value an entity reports after projection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    Flag(bool),
    Number(i64),
    Decimal(f64),
    Label(String),
    /// Missing, placeholder, sentinel or unrecognised value.
    #[default]
    Unknown,
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(true) => f.write_str("on"),
            Self::Flag(false) => f.write_str("off"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Label(label) => f.write_str(label),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}
