//! Static lookup tables between washer protocol codes and labels.
//!
//! Firmware may report codes added after these tables were written. Lookups
//! return `None` for those instead of failing.

use serde::{Deserialize, Serialize};

/// Bidirectional code ↔ label table for one enumerated field.
#[derive(Debug)]
pub struct CodeTable {
    entries: &'static [(i64, &'static str)],
}

impl CodeTable {
    #[must_use]
    pub const fn new(entries: &'static [(i64, &'static str)]) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn label(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    #[must_use]
    pub fn code(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(code, _)| *code)
    }

    /// Canonical label for `label`, or `None` if the table does not know it.
    #[must_use]
    pub fn canonical(&self, label: &str) -> Option<&'static str> {
        self.code(label).and_then(|code| self.label(code))
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(_, label)| *label)
    }
}

pub static STATUS: CodeTable = CodeTable::new(&[
    (1, "standby"),
    (2, "washing"),
    (3, "rinsing"),
    (4, "spinning"),
    (5, "drying"),
    (6, "weighing"),
    (7, "soaking"),
    (8, "cooling"),
    (9, "delayed_start"),
    (10, "paused"),
    (11, "finished"),
    (12, "ready"),
]);

pub static ERROR: CodeTable = CodeTable::new(&[
    (0, "none"),
    (1, "refill_error"),
    (2, "drain_error"),
    (3, "door_lock_error"),
    (4, "water_level_error"),
    (5, "inverter_error"),
    (6, "heating_error"),
    (7, "temperature_error"),
    (10, "communication_error"),
    (11, "drying_error"),
    (12, "drying_error_e_12"),
    (13, "drying_error_e_13"),
    (14, "drying_error_e_14"),
    (15, "drying_error_e_15"),
    (16, "drying_error_e_16"),
    (17, "drying_error_water_flow"),
    (18, "drying_error_restart"),
    (19, "spin_error"),
]);

pub static MODE: CodeTable = CodeTable::new(&[(1, "wash"), (2, "wash_and_dry"), (3, "dry")]);

pub static PROGRAM: CodeTable = CodeTable::new(&[
    (1, "standard"),
    (2, "quick"),
    (3, "sanitize"),
    (4, "wool"),
    (5, "air_refresh"),
    (6, "custom"),
    (7, "bedding"),
    (8, "down"),
    (9, "silk"),
    (10, "rinse_and_spin"),
    (11, "spin"),
    (12, "down_clean"),
    (13, "baby_care"),
    (14, "anti_allergen"),
    (15, "sportswear"),
    (16, "night"),
    (17, "new_clothes"),
    (18, "shirts"),
    (19, "synthetics"),
    (20, "underwear"),
    (21, "gentle"),
    (22, "intensive"),
    (23, "cotton_linen"),
    (24, "season"),
    (25, "warming"),
    (26, "bra"),
    (27, "panties"),
    (28, "boiling_wash"),
    (30, "socks"),
    (31, "towels"),
    (32, "anti_mite"),
    (33, "exo_40_60"),
    (34, "twenty_c"),
    (35, "t_shirts"),
    (38, "stain_removal"),
]);

pub static TEMPERATURE: CodeTable = CodeTable::new(&[
    (1, "normal"),
    (2, "low"),
    (3, "medium"),
    (4, "high"),
    (5, "max"),
    (6, "twenty_c"),
]);

pub static SPIN_LEVEL: CodeTable = CodeTable::new(&[
    (1, "none"),
    (2, "very_low"),
    (3, "low"),
    (4, "mid"),
    (5, "high"),
    (6, "very_high"),
    (7, "max"),
]);

pub static RINSE_TIMES: CodeTable = CodeTable::new(&[
    (0, "none"),
    (1, "min"),
    (2, "low"),
    (3, "mid"),
    (4, "high"),
    (5, "max"),
]);

pub static DRYING_MODE: CodeTable =
    CodeTable::new(&[(0, "none"), (1, "quick"), (2, "iron"), (3, "store")]);

pub static DETERGENT_TYPE: CodeTable =
    CodeTable::new(&[(0, "empty"), (1, "low"), (2, "medium"), (3, "high")]);

/// Coarse power/cycle state derived from the status code.
///
/// `standby ⇄ ready ⇄ running ⇄ {paused, finished} ⇄ standby`. Firmware owns
/// the transitions; this is only used to read back what a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Standby,
    Ready,
    Running,
    Paused,
    Finished,
}

impl Phase {
    /// Phase for a raw status code, or `None` for codes outside [`STATUS`].
    #[must_use]
    pub fn of_status(code: i64) -> Option<Self> {
        match STATUS.label(code)? {
            "standby" => Some(Self::Standby),
            "ready" => Some(Self::Ready),
            "paused" => Some(Self::Paused),
            "finished" => Some(Self::Finished),
            _ => Some(Self::Running),
        }
    }
}
