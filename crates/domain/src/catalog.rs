//! The washer catalog: every exposed entity and writable capability,
//! described as data.
//!
//! Entities and capabilities are not types of their own. Each one is a row
//! that names a [`FieldSpec`] (field, translation, cadence) and, for
//! capabilities, the cloud protocol code and the accepted-value domain. One
//! generic projection and dispatch engine processes every row.

use serde::{Deserialize, Serialize};

use crate::cadence::Cadence;
use crate::codes::{
    CodeTable, DETERGENT_TYPE, DRYING_MODE, ERROR, MODE, PROGRAM, Phase, RINSE_TIMES, SPIN_LEVEL,
    STATUS, TEMPERATURE,
};
use crate::command::{Expectation, PendingCommand, Target};
use crate::error::InvalidInput;
use crate::id::DeviceId;
use crate::projection::{FieldSpec, Translation};

pub static STATUS_FIELD: FieldSpec =
    FieldSpec::new("status", Translation::Code(&STATUS), Cadence::Fast);
pub static COUNTDOWN_FIELD: FieldSpec =
    FieldSpec::new("countdown", Translation::Number, Cadence::Fast);
pub static WASHING_LEFT_FIELD: FieldSpec =
    FieldSpec::new("washing_left", Translation::Number, Cadence::Fast);
pub static ERROR_FIELD: FieldSpec =
    FieldSpec::new("error", Translation::Code(&ERROR), Cadence::Slow);
pub static TIMES_AFTER_CLEAN_FIELD: FieldSpec =
    FieldSpec::new("times_after_clean", Translation::Number, Cadence::Slow);
pub static DETERGENT_EMPTY_FIELD: FieldSpec =
    FieldSpec::new("detergent_empty", Translation::Flag, Cadence::Slow);
pub static MODE_FIELD: FieldSpec = FieldSpec::new("mode", Translation::Code(&MODE), Cadence::Slow);
pub static PROGRAM_FIELD: FieldSpec =
    FieldSpec::new("program", Translation::Code(&PROGRAM), Cadence::Slow);
pub static TEMP_FIELD: FieldSpec =
    FieldSpec::new("temp", Translation::Code(&TEMPERATURE), Cadence::Slow);
pub static SPIN_LEVEL_FIELD: FieldSpec =
    FieldSpec::new("spin_level", Translation::Code(&SPIN_LEVEL), Cadence::Slow);
pub static RINSE_TIMES_FIELD: FieldSpec =
    FieldSpec::new("rinse_times", Translation::Code(&RINSE_TIMES), Cadence::Slow);
pub static DRYING_MODE_FIELD: FieldSpec =
    FieldSpec::new("drying_mode", Translation::Code(&DRYING_MODE), Cadence::Slow);
pub static DETERGENT_TYPE_FIELD: FieldSpec = FieldSpec::new(
    "detergent_type",
    Translation::Code(&DETERGENT_TYPE),
    Cadence::Slow,
);
pub static SOUND_SET_FIELD: FieldSpec =
    FieldSpec::new("sound_set", Translation::Flag, Cadence::Slow);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Sensor,
    Select,
    Switch,
}

/// One entity exposed per washer.
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Host-facing id, `<kind>.<key>`.
    pub id: &'static str,
    pub kind: EntityKind,
    pub spec: &'static FieldSpec,
    pub unit: Option<&'static str>,
}

impl EntityDescriptor {
    #[must_use]
    pub fn cadence(&self) -> Cadence {
        self.spec.cadence
    }

    /// Values a select entity accepts, `None` for other kinds.
    #[must_use]
    pub fn options(&self) -> Option<Vec<&'static str>> {
        match (self.kind, self.spec.translation) {
            (EntityKind::Select, Translation::Code(table)) => Some(table.labels().collect()),
            _ => None,
        }
    }
}

const fn sensor(id: &'static str, spec: &'static FieldSpec) -> EntityDescriptor {
    EntityDescriptor {
        id,
        kind: EntityKind::Sensor,
        spec,
        unit: None,
    }
}

const fn minutes(id: &'static str, spec: &'static FieldSpec) -> EntityDescriptor {
    EntityDescriptor {
        id,
        kind: EntityKind::Sensor,
        spec,
        unit: Some("min"),
    }
}

const fn select(id: &'static str, spec: &'static FieldSpec) -> EntityDescriptor {
    EntityDescriptor {
        id,
        kind: EntityKind::Select,
        spec,
        unit: None,
    }
}

pub static ENTITIES: [EntityDescriptor; 22] = [
    sensor("sensor.status", &STATUS_FIELD),
    minutes("sensor.countdown", &COUNTDOWN_FIELD),
    minutes("sensor.washing_left", &WASHING_LEFT_FIELD),
    sensor("sensor.error", &ERROR_FIELD),
    sensor("sensor.times_after_clean", &TIMES_AFTER_CLEAN_FIELD),
    sensor("sensor.detergent_empty", &DETERGENT_EMPTY_FIELD),
    sensor("sensor.mode", &MODE_FIELD),
    sensor("sensor.program", &PROGRAM_FIELD),
    sensor("sensor.temp", &TEMP_FIELD),
    sensor("sensor.spin_level", &SPIN_LEVEL_FIELD),
    sensor("sensor.rinse_times", &RINSE_TIMES_FIELD),
    sensor("sensor.drying_mode", &DRYING_MODE_FIELD),
    sensor("sensor.detergent_type", &DETERGENT_TYPE_FIELD),
    sensor("sensor.sound_set", &SOUND_SET_FIELD),
    select("select.mode", &MODE_FIELD),
    select("select.program", &PROGRAM_FIELD),
    select("select.temperature", &TEMP_FIELD),
    select("select.spin_level", &SPIN_LEVEL_FIELD),
    select("select.rinse_times", &RINSE_TIMES_FIELD),
    select("select.drying_mode", &DRYING_MODE_FIELD),
    select("select.detergent_type", &DETERGENT_TYPE_FIELD),
    EntityDescriptor {
        id: "switch.sound_set",
        kind: EntityKind::Switch,
        spec: &SOUND_SET_FIELD,
        unit: None,
    },
];

/// Look up an entity by its host-facing id.
#[must_use]
pub fn entity(id: &str) -> Option<&'static EntityDescriptor> {
    ENTITIES.iter().find(|e| e.id == id)
}

/// One button of a power-action capability.
#[derive(Debug)]
pub struct ActionSpec {
    pub label: &'static str,
    pub code: u16,
    pub value: i64,
    /// Phases the status should reach once the action took effect.
    pub expect: &'static [Phase],
}

#[derive(Debug)]
pub enum CapabilityKind {
    /// A set of fire-and-forget actions (power).
    Action(&'static [ActionSpec]),
    /// Choose one label of the field's code table.
    Select {
        code: u16,
        spec: &'static FieldSpec,
        table: &'static CodeTable,
    },
    /// On/off flag.
    Toggle { code: u16, spec: &'static FieldSpec },
}

/// A writable capability of the washer.
#[derive(Debug)]
pub struct Capability {
    pub key: &'static str,
    pub kind: CapabilityKind,
    /// Fields whose value a write may change.
    pub affects: &'static [&'static FieldSpec],
}

const TOGGLE_VALUES: [(&str, bool); 6] = [
    ("on", true),
    ("off", false),
    ("true", true),
    ("false", false),
    ("1", true),
    ("0", false),
];

impl Capability {
    /// Canonical accepted values, in display order.
    #[must_use]
    pub fn allowed_values(&self) -> Vec<&'static str> {
        match &self.kind {
            CapabilityKind::Action(actions) => actions.iter().map(|a| a.label).collect(),
            CapabilityKind::Select { table, .. } => table.labels().collect(),
            CapabilityKind::Toggle { .. } => vec!["on", "off"],
        }
    }

    /// Cadences that any field affected by this capability is read on,
    /// sorted and without duplicates.
    #[must_use]
    pub fn refresh_cadences(&self) -> Vec<Cadence> {
        let mut cadences: Vec<Cadence> = self.affects.iter().map(|f| f.cadence).collect();
        cadences.sort_unstable();
        cadences.dedup();
        cadences
    }

    /// Validate `value` against this capability's domain and turn it into a
    /// command for `device_id`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::OutOfDomain`] when `value` is not accepted.
    pub fn resolve(
        &self,
        device_id: &DeviceId,
        value: &str,
    ) -> Result<PendingCommand, InvalidInput> {
        let wanted = value.trim();
        let resolved = match &self.kind {
            CapabilityKind::Action(actions) => actions
                .iter()
                .find(|a| a.label.eq_ignore_ascii_case(wanted))
                .map(|a| {
                    (
                        a.label,
                        a.code,
                        a.value,
                        Expectation {
                            spec: &STATUS_FIELD,
                            target: Target::Phases(a.expect),
                        },
                    )
                }),
            CapabilityKind::Select { code, spec, table } => table
                .labels()
                .find(|label| label.eq_ignore_ascii_case(wanted))
                .and_then(|label| table.code(label).map(|c| (label, c)))
                .map(|(label, param)| {
                    (
                        label,
                        *code,
                        param,
                        Expectation {
                            spec: *spec,
                            target: Target::Code(param),
                        },
                    )
                }),
            CapabilityKind::Toggle { code, spec } => TOGGLE_VALUES
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(wanted))
                .map(|(_, on)| {
                    let param = i64::from(*on);
                    (
                        if *on { "on" } else { "off" },
                        *code,
                        param,
                        Expectation {
                            spec: *spec,
                            target: Target::Code(param),
                        },
                    )
                }),
        };

        let (canonical, code, param, expectation) =
            resolved.ok_or_else(|| InvalidInput::OutOfDomain {
                capability: self.key,
                value: value.to_string(),
                allowed: self.allowed_values(),
            })?;

        Ok(PendingCommand {
            device_id: device_id.clone(),
            capability: self.key,
            value: canonical,
            code,
            param,
            expectation,
        })
    }
}

pub static POWER_ACTIONS: [ActionSpec; 3] = [
    ActionSpec {
        label: "start",
        code: 200,
        value: 1,
        expect: &[Phase::Running],
    },
    ActionSpec {
        label: "pause",
        code: 201,
        value: 1,
        expect: &[Phase::Paused],
    },
    ActionSpec {
        label: "stop",
        code: 202,
        value: 1,
        expect: &[Phase::Standby],
    },
];

const fn select_capability(
    key: &'static str,
    code: u16,
    spec: &'static FieldSpec,
    table: &'static CodeTable,
    affects: &'static [&'static FieldSpec],
) -> Capability {
    Capability {
        key,
        kind: CapabilityKind::Select { code, spec, table },
        affects,
    }
}

pub static CAPABILITIES: [Capability; 9] = [
    Capability {
        key: "power",
        kind: CapabilityKind::Action(&POWER_ACTIONS),
        affects: &[&STATUS_FIELD, &COUNTDOWN_FIELD, &WASHING_LEFT_FIELD],
    },
    select_capability(
        "mode",
        204,
        &MODE_FIELD,
        &MODE,
        &[&MODE_FIELD, &WASHING_LEFT_FIELD],
    ),
    select_capability(
        "program",
        205,
        &PROGRAM_FIELD,
        &PROGRAM,
        &[&PROGRAM_FIELD, &WASHING_LEFT_FIELD],
    ),
    select_capability("temperature", 207, &TEMP_FIELD, &TEMPERATURE, &[&TEMP_FIELD]),
    select_capability(
        "rinse_times",
        208,
        &RINSE_TIMES_FIELD,
        &RINSE_TIMES,
        &[&RINSE_TIMES_FIELD],
    ),
    select_capability(
        "spin_level",
        209,
        &SPIN_LEVEL_FIELD,
        &SPIN_LEVEL,
        &[&SPIN_LEVEL_FIELD],
    ),
    select_capability(
        "drying_mode",
        210,
        &DRYING_MODE_FIELD,
        &DRYING_MODE,
        &[&DRYING_MODE_FIELD],
    ),
    select_capability(
        "detergent_type",
        213,
        &DETERGENT_TYPE_FIELD,
        &DETERGENT_TYPE,
        &[&DETERGENT_TYPE_FIELD],
    ),
    Capability {
        key: "sound_set",
        kind: CapabilityKind::Toggle {
            code: 223,
            spec: &SOUND_SET_FIELD,
        },
        affects: &[&SOUND_SET_FIELD],
    },
];

/// Look up a capability by key.
///
/// # Errors
///
/// Returns [`InvalidInput::UnknownCapability`] for keys not in the catalog.
pub fn capability(key: &str) -> Result<&'static Capability, InvalidInput> {
    CAPABILITIES
        .iter()
        .find(|c| c.key == key)
        .ok_or_else(|| InvalidInput::UnknownCapability(key.to_string()))
}
