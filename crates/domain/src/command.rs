//! Pending commands and the effect they are expected to have.

use crate::codes::Phase;
use crate::id::DeviceId;
use crate::projection::FieldSpec;
use crate::snapshot::Snapshot;
use crate::value::EntityValue;

/// A validated write, ready to be sent to the cloud.
///
/// Lives only for the duration of one dispatch.
#[derive(Debug, Clone)]
pub struct PendingCommand {
    pub device_id: DeviceId,
    pub capability: &'static str,
    /// Canonical form of the value the user asked for.
    pub value: &'static str,
    /// Cloud protocol code to write.
    pub code: u16,
    /// Parameter written with `code`.
    pub param: i64,
    pub expectation: Expectation,
}

/// What a refreshed snapshot should show once the command took effect.
#[derive(Debug, Clone, Copy)]
pub struct Expectation {
    pub spec: &'static FieldSpec,
    pub target: Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The field reads back exactly this protocol code.
    Code(i64),
    /// The status field maps to one of these phases.
    Phases(&'static [Phase]),
}

impl Expectation {
    /// Whether `snapshot` shows the expected effect.
    #[must_use]
    pub fn met_by(&self, snapshot: &Snapshot) -> bool {
        let Some(code) = self.spec.code_in(snapshot) else {
            return false;
        };
        match self.target {
            Target::Code(expected) => code == expected,
            Target::Phases(phases) => Phase::of_status(code).is_some_and(|p| phases.contains(&p)),
        }
    }

    /// The value actually observed on the expectation's field.
    #[must_use]
    pub fn observed(&self, snapshot: &Snapshot) -> EntityValue {
        self.spec.project(snapshot)
    }
}
