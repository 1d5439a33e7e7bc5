//! Entity projection — pure mappings from a [`Snapshot`] field to the value
//! an entity reports.
//!
//! Projection never fails. A field that is missing, carries a placeholder or
//! a sentinel, or holds a code the tables do not know projects to
//! [`EntityValue::Unknown`].

use crate::cadence::Cadence;
use crate::codes::CodeTable;
use crate::snapshot::Snapshot;
use crate::value::{EntityValue, RawValue};

/// Raw numbers the protocol uses for "no value".
pub const SENTINELS: [i64; 2] = [-1, 65_535];

/// How a raw field is turned into an entity value.
#[derive(Debug, Clone, Copy)]
pub enum Translation {
    /// Plain integer (minutes, counters).
    Number,
    /// Enumerated code translated through a static table.
    Code(&'static CodeTable),
    /// On/off flag.
    Flag,
}

/// Selects one status field and declares how and how often it is read.
#[derive(Debug)]
pub struct FieldSpec {
    pub field: &'static str,
    pub translation: Translation,
    pub cadence: Cadence,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(field: &'static str, translation: Translation, cadence: Cadence) -> Self {
        Self {
            field,
            translation,
            cadence,
        }
    }

    /// Project this field out of `snapshot`.
    #[must_use]
    pub fn project(&self, snapshot: &Snapshot) -> EntityValue {
        project(snapshot, self)
    }

    /// Protocol code currently held by this field, if any.
    ///
    /// Labels are mapped back through the code table, and flags read as
    /// `0`/`1`. Used to read back the effect of a write.
    #[must_use]
    pub fn code_in(&self, snapshot: &Snapshot) -> Option<i64> {
        let raw = present(snapshot, self.field)?;
        match self.translation {
            Translation::Number => number(raw),
            Translation::Code(table) => match raw.as_code() {
                Some(code) => table.label(code).map(|_| code),
                None => match raw {
                    RawValue::String(label) => table.code(label.trim()),
                    _ => None,
                },
            },
            Translation::Flag => flag(raw).map(i64::from),
        }
    }
}

/// Project `spec.field` of `snapshot` into a typed value.
#[must_use]
pub fn project(snapshot: &Snapshot, spec: &FieldSpec) -> EntityValue {
    let Some(raw) = present(snapshot, spec.field) else {
        return EntityValue::Unknown;
    };
    match spec.translation {
        Translation::Number => match raw {
            RawValue::Float(f) if !is_sentinel_float(*f) => EntityValue::Decimal(*f),
            _ => number(raw).map_or(EntityValue::Unknown, EntityValue::Number),
        },
        Translation::Code(table) => label(raw, table)
            .map_or(EntityValue::Unknown, |l| EntityValue::Label(l.to_string())),
        Translation::Flag => flag(raw).map_or(EntityValue::Unknown, EntityValue::Flag),
    }
}

fn present<'s>(snapshot: &'s Snapshot, field: &str) -> Option<&'s RawValue> {
    snapshot.get(field).filter(|raw| !raw.is_placeholder())
}

fn number(raw: &RawValue) -> Option<i64> {
    match raw {
        RawValue::Int(_) | RawValue::String(_) => raw.as_code(),
        _ => None,
    }
    .filter(|n| !SENTINELS.contains(n))
}

#[allow(clippy::cast_precision_loss)]
fn is_sentinel_float(value: f64) -> bool {
    SENTINELS.iter().any(|s| (*s as f64 - value).abs() < f64::EPSILON)
}

fn label(raw: &RawValue, table: &CodeTable) -> Option<&'static str> {
    match raw.as_code() {
        Some(code) if SENTINELS.contains(&code) => None,
        Some(code) => table.label(code),
        None => match raw {
            RawValue::String(label) => table.canonical(label.trim()),
            _ => None,
        },
    }
}

fn flag(raw: &RawValue) -> Option<bool> {
    match raw {
        RawValue::Bool(b) => Some(*b),
        RawValue::Int(0) => Some(false),
        RawValue::Int(1) => Some(true),
        RawValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "false" | "off" => Some(false),
            "1" | "true" | "on" => Some(true),
            _ => None,
        },
        _ => None,
    }
}
