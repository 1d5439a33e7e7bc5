//! Polling cadences.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A named polling frequency class.
///
/// Fast-changing fields (cycle status, remaining time) are read on the fast
/// cadence; settings and maintenance counters on the slow one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Fast,
    Slow,
}

impl Cadence {
    pub const ALL: [Self; 2] = [Self::Fast, Self::Slow];

    /// Interval used when nothing else is configured.
    #[must_use]
    pub fn default_interval(self) -> Duration {
        match self {
            Self::Fast => Duration::from_secs(60),
            Self::Slow => Duration::from_secs(6 * 60 * 60),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Slow => "slow",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
