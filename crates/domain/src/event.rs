//! Sync events — records of what the poller did.
//!
//! Events are produced when a snapshot slot is replaced or a poll fails.
//! They carry no field values; subscribers re-project from the store.

use serde::{Deserialize, Serialize};

use crate::cadence::Cadence;
use crate::id::DeviceId;
use crate::snapshot::Timestamp;

/// Something that happened to one `(device, cadence)` snapshot slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub device_id: DeviceId,
    pub cadence: Cadence,
    pub kind: SyncEventKind,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEventKind {
    /// A newer snapshot was stored.
    SnapshotReplaced { sequence: u64 },
    /// A fetch failed and the previous snapshot was kept.
    PollFailed {
        consecutive_failures: u32,
        available: bool,
        reason: String,
    },
}

impl SyncEvent {
    #[must_use]
    pub fn new(
        device_id: DeviceId,
        cadence: Cadence,
        kind: SyncEventKind,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            device_id,
            cadence,
            kind,
            timestamp,
        }
    }
}
