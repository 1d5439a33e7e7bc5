//! Entity readings — what the host renders for one entity.

use serde::Serialize;

use crate::cadence::Cadence;
use crate::catalog::{EntityDescriptor, EntityKind};
use crate::snapshot::{Snapshot, Timestamp};
use crate::value::EntityValue;

/// The current value of one entity plus its availability.
///
/// `last_updated` is when the snapshot the value came from was fetched, so a
/// host can show how old a kept value is while the entity is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityReading {
    pub entity_id: &'static str,
    pub kind: EntityKind,
    pub cadence: Cadence,
    pub value: EntityValue,
    pub available: bool,
    pub last_updated: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
}

impl EntityReading {
    /// Read `entity` from the snapshot of its cadence.
    ///
    /// With no snapshot yet the value is [`EntityValue::Unknown`].
    #[must_use]
    pub fn read(entity: &EntityDescriptor, snapshot: Option<&Snapshot>, available: bool) -> Self {
        Self {
            entity_id: entity.id,
            kind: entity.kind,
            cadence: entity.cadence(),
            value: snapshot.map(|s| entity.spec.project(s)).unwrap_or_default(),
            available,
            last_updated: snapshot.map(Snapshot::fetched_at),
            options: entity.options(),
            unit: entity.unit,
        }
    }
}
